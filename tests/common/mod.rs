// ABOUTME: Common utilities and helpers for integration tests
// ABOUTME: Provides offer snapshot builders and temporary file environments

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use std::path::PathBuf;
use tempfile::TempDir;
use tokio::fs;

use offerdoc::model::{Amount, Clinic, OfferInfo, OfferSnapshot, Patient, Treatment};

pub struct SnapshotBuilder {
    snapshot: OfferSnapshot,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self {
            snapshot: OfferSnapshot::default(),
        }
    }

    pub fn with_clinic(mut self, name: &str) -> Self {
        self.snapshot.clinic = Some(Clinic {
            name: Some(name.to_string()),
            email: Some("info@clinic.example".to_string()),
            phone: Some("+90 212 555 0101".to_string()),
            ..Default::default()
        });
        self
    }

    pub fn with_patient(mut self, name: &str) -> Self {
        self.snapshot.patient = Some(Patient {
            name: Some(name.to_string()),
            email: Some("patient@mail.example".to_string()),
            ..Default::default()
        });
        self
    }

    pub fn with_offer(mut self, number: &str, currency: &str) -> Self {
        self.snapshot.offer = Some(OfferInfo {
            number: Some(number.to_string()),
            currency: Some(currency.to_string()),
            ..Default::default()
        });
        self
    }

    pub fn with_grand_total(mut self, total: f64) -> Self {
        let offer = self.snapshot.offer.get_or_insert_with(OfferInfo::default);
        offer.grand_total = Some(Amount(total));
        self
    }

    pub fn add_treatment(mut self, name: &str, price: f64) -> Self {
        self.snapshot
            .treatments
            .get_or_insert_with(Vec::new)
            .push(Treatment {
                name: Some(name.to_string()),
                price: Some(Amount(price)),
                ..Default::default()
            });
        self
    }

    pub fn add_treatment_for_teeth(mut self, name: &str, price: f64, teeth: &[u16]) -> Self {
        self.snapshot
            .treatments
            .get_or_insert_with(Vec::new)
            .push(Treatment {
                name: Some(name.to_string()),
                price: Some(Amount(price)),
                quantity: Some(teeth.len() as u32),
                teeth: Some(teeth.to_vec()),
                currency: None,
            });
        self
    }

    pub fn with_empty_treatments(mut self) -> Self {
        self.snapshot.treatments = Some(Vec::new());
        self
    }

    pub fn rendered_on(mut self, year: i32, month: u32, day: u32) -> Self {
        self.snapshot.rendered_at = Utc.with_ymd_and_hms(year, month, day, 10, 0, 0).single();
        self
    }

    pub fn build(self) -> OfferSnapshot {
        self.snapshot
    }
}

/// A typical clinic offer used across tests.
pub fn sample_snapshot() -> OfferSnapshot {
    SnapshotBuilder::new()
        .with_clinic("Bosphorus Dental")
        .with_patient("Jane Doe")
        .with_offer("2025-001", "EUR")
        .add_treatment_for_teeth("Implant", 750.0, &[36, 46])
        .add_treatment("Cleaning", 80.0)
        .rendered_on(2025, 3, 14)
        .build()
}

pub const SAMPLE_TEMPLATE: &str = r#"<html><body>
<h1>{{clinic.name}}</h1>
<p>Offer {{offer.number}} for {{patient.name}} ({{system.date}})</p>
<table>{{#each treatments}}<tr><td>{{@number}}</td><td>{{name}}</td><td>{{teeth}}</td><td>{{total}} {{../offer.currency}}</td></tr>{{/each}}</table>
<p>Total: {{offer.grandTotal}} {{offer.currency}}</p>
</body></html>"#;

pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    pub async fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, content)
            .await
            .expect("Failed to write test file");
        path
    }

    pub async fn write_snapshot(&self, name: &str, snapshot: &OfferSnapshot) -> PathBuf {
        let json = serde_json::to_string_pretty(snapshot).expect("Failed to serialize snapshot");
        self.write_file(name, &json).await
    }
}
