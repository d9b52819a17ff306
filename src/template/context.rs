// ABOUTME: Builds the namespaced render context from an offer snapshot
// ABOUTME: Centralizes safe defaults and pre-formats totals, dates and treatment rows

use chrono::Datelike;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use super::error::{Result, TemplateError};
use super::format::{
    format_amount, format_date_text, format_datetime, DEFAULT_DATE_FORMAT, DEFAULT_TIME_FORMAT,
};
use crate::model::{Clinic, OfferInfo, OfferSnapshot, Patient, Treatment};

/// Formatting policy applied while building the context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextOptions {
    /// Used when neither the offer nor a treatment names a currency.
    pub default_currency: String,
    pub date_format: String,
    pub time_format: String,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            default_currency: String::new(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OfferContext {
    pub clinic: ClinicContext,
    pub patient: PatientContext,
    pub offer: OfferSummary,
    pub treatments: Vec<TreatmentRow>,
    pub system: SystemInfo,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicContext {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub website: String,
    pub logo_url: String,
    pub primary_color: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientContext {
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    pub city: String,
    pub birth_date: String,
    pub instagram: String,
    pub facebook: String,
    pub whatsapp: String,
    pub notes: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferSummary {
    pub id: String,
    pub number: String,
    pub status: String,
    pub status_label: String,
    pub currency: String,
    pub created_at: String,
    pub valid_until: String,
    pub subtotal: String,
    pub discount: String,
    pub grand_total: String,
    pub item_count: usize,
    pub notes: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentRow {
    /// 1-based row number.
    pub index: usize,
    pub name: String,
    pub teeth: String,
    pub tooth_count: usize,
    pub price: String,
    pub quantity: u32,
    pub total: String,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub date: String,
    pub time: String,
    pub year: String,
    pub timestamp: String,
    pub page: u32,
    pub page_count: u32,
}

impl OfferContext {
    /// Build the context for one render. Pure: the same snapshot and options
    /// always produce the same context.
    pub fn build(snapshot: &OfferSnapshot, options: &ContextOptions) -> Self {
        let clinic = match &snapshot.clinic {
            Some(clinic) => ClinicContext::from_clinic(clinic),
            None => {
                debug!("Snapshot has no clinic, using defaults");
                ClinicContext::default()
            }
        };

        let patient = match &snapshot.patient {
            Some(patient) => PatientContext::from_patient(patient, options),
            None => {
                debug!("Snapshot has no patient, using defaults");
                PatientContext::default()
            }
        };

        let info = snapshot.offer.clone().unwrap_or_else(|| {
            debug!("Snapshot has no offer details, using defaults");
            OfferInfo::default()
        });

        let offer_currency = non_empty(&info.currency)
            .unwrap_or(options.default_currency.as_str())
            .to_string();

        let treatments: Vec<TreatmentRow> = snapshot
            .treatments()
            .iter()
            .enumerate()
            .map(|(i, treatment)| TreatmentRow::from_treatment(i, treatment, &offer_currency))
            .collect();

        let offer = OfferSummary::from_info(&info, snapshot.treatments(), offer_currency, options);
        let system = SystemInfo::from_snapshot(snapshot, options);

        Self {
            clinic,
            patient,
            offer,
            treatments,
            system,
        }
    }

    /// Convert context to JSON for rendering
    pub fn to_json(&self) -> Result<JsonValue> {
        serde_json::to_value(self).map_err(TemplateError::JsonError)
    }
}

impl ClinicContext {
    fn from_clinic(clinic: &Clinic) -> Self {
        Self {
            name: text(&clinic.name),
            email: text(&clinic.email),
            phone: text(&clinic.phone),
            address: text(&clinic.address),
            website: text(&clinic.website),
            logo_url: text(&clinic.logo_url),
            primary_color: text(&clinic.primary_color),
        }
    }
}

impl PatientContext {
    fn from_patient(patient: &Patient, options: &ContextOptions) -> Self {
        let first_name = text(&patient.first_name);
        let last_name = text(&patient.last_name);
        let name = match non_empty(&patient.name) {
            Some(name) => name.to_string(),
            None => [first_name.trim(), last_name.trim()]
                .iter()
                .filter(|part| !part.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(" "),
        };

        Self {
            name,
            first_name,
            last_name,
            email: text(&patient.email),
            phone: text(&patient.phone),
            country: text(&patient.country),
            city: text(&patient.city),
            birth_date: date_text(&patient.birth_date, options),
            instagram: text(&patient.instagram),
            facebook: text(&patient.facebook),
            whatsapp: text(&patient.whatsapp),
            notes: text(&patient.notes),
        }
    }
}

impl OfferSummary {
    fn from_info(
        info: &OfferInfo,
        treatments: &[Treatment],
        currency: String,
        options: &ContextOptions,
    ) -> Self {
        let subtotal: f64 = treatments.iter().map(Treatment::line_total).sum();
        let discount = info.discount.map(|d| d.value()).unwrap_or(0.0);
        let grand_total = match info.grand_total {
            Some(total) => total.value(),
            None => subtotal - discount,
        };
        let status = info.status.unwrap_or_default();

        Self {
            id: text(&info.id),
            number: text(&info.number),
            status: status.as_str().to_string(),
            status_label: status.label().to_string(),
            currency,
            created_at: date_text(&info.created_at, options),
            valid_until: date_text(&info.valid_until, options),
            subtotal: format_amount(subtotal),
            discount: format_amount(discount),
            grand_total: format_amount(grand_total),
            item_count: treatments.len(),
            notes: text(&info.notes),
        }
    }
}

impl TreatmentRow {
    fn from_treatment(position: usize, treatment: &Treatment, offer_currency: &str) -> Self {
        let teeth = treatment.teeth.as_deref().unwrap_or_default();
        Self {
            index: position + 1,
            name: text(&treatment.name),
            teeth: teeth
                .iter()
                .map(|tooth| tooth.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            tooth_count: teeth.len(),
            price: format_amount(treatment.price()),
            quantity: treatment.quantity(),
            total: format_amount(treatment.line_total()),
            currency: non_empty(&treatment.currency)
                .unwrap_or(offer_currency)
                .to_string(),
        }
    }
}

impl SystemInfo {
    fn from_snapshot(snapshot: &OfferSnapshot, options: &ContextOptions) -> Self {
        let (date, time, year, timestamp) = match &snapshot.rendered_at {
            Some(at) => (
                format_datetime(at, &options.date_format),
                format_datetime(at, &options.time_format),
                at.year().to_string(),
                at.to_rfc3339(),
            ),
            None => Default::default(),
        };

        Self {
            date,
            time,
            year,
            timestamp,
            page: snapshot.page.unwrap_or(1),
            page_count: snapshot.page_count.unwrap_or(1),
        }
    }
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn date_text(value: &Option<String>, options: &ContextOptions) -> String {
    value
        .as_deref()
        .map(|raw| format_date_text(raw, &options.date_format))
        .unwrap_or_default()
}
