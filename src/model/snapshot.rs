// ABOUTME: Read-only offer aggregate consumed by the document renderer
// ABOUTME: Every field is optional so sparse data from the data layer never fails to load

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::debug;

use super::error::{ModelError, Result};

/// Snapshot of one offer as supplied by the data layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferSnapshot {
    #[serde(default)]
    pub clinic: Option<Clinic>,
    #[serde(default)]
    pub patient: Option<Patient>,
    #[serde(default)]
    pub offer: Option<OfferInfo>,
    #[serde(default, deserialize_with = "skip_empty_rows")]
    pub treatments: Option<Vec<Treatment>>,
    /// Timestamp exposed as `system.date` / `system.time`.
    #[serde(default)]
    pub rendered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_count: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clinic {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Display name; derived from first and last name when absent.
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub birth_date: Option<String>,
    pub instagram: Option<String>,
    pub facebook: Option<String>,
    pub whatsapp: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferInfo {
    pub id: Option<String>,
    pub number: Option<String>,
    pub status: Option<OfferStatus>,
    pub currency: Option<String>,
    pub created_at: Option<String>,
    pub valid_until: Option<String>,
    pub discount: Option<Amount>,
    /// Supplied total; the context builder computes one when absent.
    pub grand_total: Option<Amount>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    #[default]
    Draft,
    Sent,
    Accepted,
    Rejected,
    Expired,
    #[serde(other)]
    Unknown,
}

impl OfferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferStatus::Draft => "draft",
            OfferStatus::Sent => "sent",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Rejected => "rejected",
            OfferStatus::Expired => "expired",
            OfferStatus::Unknown => "unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OfferStatus::Draft => "Draft",
            OfferStatus::Sent => "Sent",
            OfferStatus::Accepted => "Accepted",
            OfferStatus::Rejected => "Rejected",
            OfferStatus::Expired => "Expired",
            OfferStatus::Unknown => "",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Treatment {
    pub name: Option<String>,
    /// FDI tooth numbers this treatment applies to.
    #[serde(default, deserialize_with = "lenient_teeth")]
    pub teeth: Option<Vec<u16>>,
    pub price: Option<Amount>,
    #[serde(default, deserialize_with = "lenient_quantity")]
    pub quantity: Option<u32>,
    pub currency: Option<String>,
}

/// Monetary amount. Accepts JSON/YAML numbers and numeric strings
/// (decimal columns often arrive as text).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Amount(pub f64);

impl Amount {
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Amount(value)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Scalar::deserialize(deserializer)?;
        let amount = raw.as_f64().unwrap_or_else(|| {
            debug!("Unparsable amount {:?}, using 0", raw);
            0.0
        });
        Ok(Amount(amount))
    }
}

/// Loosely typed scalar as it arrives from the data layer.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

impl Scalar {
    fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Scalar::Number(n) => *n,
            Scalar::Text(text) => text.trim().parse::<f64>().ok()?,
            Scalar::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Non-negative whole number that fits `T`
    fn as_whole<T: TryFrom<u64>>(&self) -> Option<T> {
        let value = self.as_f64()?;
        if value < 0.0 || value.fract() != 0.0 || value > u64::MAX as f64 {
            return None;
        }
        T::try_from(value as u64).ok()
    }
}

fn lenient_quantity<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<Scalar>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let quantity = raw.as_whole::<u32>();
    if quantity.is_none() {
        debug!("Unusable quantity {:?}, using 1", raw);
    }
    Ok(quantity)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TeethRepr {
    List(Vec<Option<Scalar>>),
    Single(Scalar),
}

fn tooth_number(raw: Scalar) -> Option<u16> {
    let tooth = raw.as_whole::<u16>();
    if tooth.is_none() {
        debug!("Skipping unusable tooth number {:?}", raw);
    }
    tooth
}

/// Accepts `[11, "21"]`, `"11, 21"` or a single number; bad entries are dropped
fn lenient_teeth<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<u16>>, D::Error>
where
    D: Deserializer<'de>,
{
    let teeth = match Option::<TeethRepr>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(TeethRepr::List(items)) => items
            .into_iter()
            .flatten()
            .filter_map(tooth_number)
            .collect(),
        Some(TeethRepr::Single(Scalar::Text(text))) => text
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(|part| Scalar::Text(part.to_string()))
            .filter_map(tooth_number)
            .collect(),
        Some(TeethRepr::Single(other)) => tooth_number(other).into_iter().collect(),
    };
    Ok(Some(teeth))
}

fn skip_empty_rows<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Vec<Treatment>>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows = Option::<Vec<Option<Treatment>>>::deserialize(deserializer)?;
    Ok(rows.map(|rows| {
        let supplied = rows.len();
        let rows: Vec<Treatment> = rows.into_iter().flatten().collect();
        if rows.len() < supplied {
            debug!("Skipped {} null treatment rows", supplied - rows.len());
        }
        rows
    }))
}

/// Serialization format of a snapshot or template library file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Yaml,
}

impl SnapshotFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(SnapshotFormat::Json),
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Ok(SnapshotFormat::Yaml)
            }
            _ => Err(ModelError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }
}

impl OfferSnapshot {
    /// Parse a snapshot from JSON
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(ModelError::JsonError)
    }

    /// Parse a snapshot from YAML
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(ModelError::YamlError)
    }

    pub fn parse(content: &str, format: SnapshotFormat) -> Result<Self> {
        match format {
            SnapshotFormat::Json => Self::from_json(content),
            SnapshotFormat::Yaml => Self::from_yaml(content),
        }
    }

    /// Load a snapshot file, choosing the format by extension
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let format = SnapshotFormat::from_path(path)?;
        let content = fs::read_to_string(path).await?;
        Self::parse(&content, format)
    }

    pub fn with_rendered_at(mut self, rendered_at: DateTime<Utc>) -> Self {
        self.rendered_at = Some(rendered_at);
        self
    }

    pub fn treatments(&self) -> &[Treatment] {
        self.treatments.as_deref().unwrap_or_default()
    }
}

impl Treatment {
    pub fn quantity(&self) -> u32 {
        self.quantity.unwrap_or(1)
    }

    pub fn price(&self) -> f64 {
        self.price.map(|p| p.value()).unwrap_or(0.0)
    }

    pub fn line_total(&self) -> f64 {
        self.price() * f64::from(self.quantity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_snapshot_parses() {
        let snapshot = OfferSnapshot::from_json("{}").unwrap();
        assert!(snapshot.patient.is_none());
        assert!(snapshot.treatments().is_empty());
    }

    #[test]
    fn test_nulls_are_tolerated() {
        let json = r#"{
            "patient": { "firstName": "Ayşe", "email": null },
            "treatments": null,
            "offer": { "grandTotal": null, "currency": "TRY" }
        }"#;

        let snapshot = OfferSnapshot::from_json(json).unwrap();
        let patient = snapshot.patient.unwrap();
        assert_eq!(patient.first_name.as_deref(), Some("Ayşe"));
        assert!(patient.email.is_none());
        assert!(snapshot.treatments.is_none());
        assert!(snapshot.offer.unwrap().grand_total.is_none());
    }

    #[test]
    fn test_amount_accepts_numbers_and_strings() {
        let json = r#"[
            { "price": 7500 },
            { "price": 99.5 },
            { "price": "1500.25" },
            { "price": "n/a" }
        ]"#;

        let rows: Vec<Treatment> = serde_json::from_str(json).unwrap();
        assert_eq!(rows[0].price(), 7500.0);
        assert_eq!(rows[1].price(), 99.5);
        assert_eq!(rows[2].price(), 1500.25);
        assert_eq!(rows[3].price(), 0.0);
    }

    #[test]
    fn test_quantity_accepts_numbers_and_strings() {
        let json = r#"[
            { "quantity": 2 },
            { "quantity": "3" },
            { "quantity": " 4 " },
            { "quantity": "two" },
            { "quantity": -1 },
            { "quantity": 1.5 },
            { "quantity": true },
            { "quantity": null },
            {}
        ]"#;

        let rows: Vec<Treatment> = serde_json::from_str(json).unwrap();
        let quantities: Vec<Option<u32>> = rows.iter().map(|row| row.quantity).collect();
        assert_eq!(
            quantities,
            vec![Some(2), Some(3), Some(4), None, None, None, None, None, None]
        );
        assert_eq!(rows[3].quantity(), 1);
    }

    #[test]
    fn test_teeth_accept_numbers_and_strings() {
        let json = r#"[
            { "teeth": [11, "21", " 36 "] },
            { "teeth": "11, 21 22" },
            { "teeth": 46 },
            { "teeth": [11, "x", null, -3, 70000] },
            { "teeth": null }
        ]"#;

        let rows: Vec<Treatment> = serde_json::from_str(json).unwrap();
        assert_eq!(rows[0].teeth.as_deref(), Some(&[11, 21, 36][..]));
        assert_eq!(rows[1].teeth.as_deref(), Some(&[11, 21, 22][..]));
        assert_eq!(rows[2].teeth.as_deref(), Some(&[46][..]));
        assert_eq!(rows[3].teeth.as_deref(), Some(&[11][..]));
        assert!(rows[4].teeth.is_none());
    }

    #[test]
    fn test_null_treatment_rows_are_skipped() {
        let json = r#"{
            "treatments": [
                { "name": "Implant", "quantity": "2", "teeth": ["11", "21"], "price": "750" },
                null,
                { "name": "Cleaning" }
            ]
        }"#;

        let snapshot = OfferSnapshot::from_json(json).unwrap();
        let rows = snapshot.treatments();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].quantity(), 2);
        assert_eq!(rows[0].line_total(), 1500.0);
        assert_eq!(rows[1].name.as_deref(), Some("Cleaning"));
    }

    #[test]
    fn test_unknown_status_does_not_fail() {
        let info: OfferInfo = serde_json::from_str(r#"{ "status": "archived" }"#).unwrap();
        assert_eq!(info.status, Some(OfferStatus::Unknown));

        let info: OfferInfo = serde_json::from_str(r#"{ "status": "accepted" }"#).unwrap();
        assert_eq!(info.status.unwrap().label(), "Accepted");
    }

    #[test]
    fn test_treatment_defaults() {
        let row = Treatment::default();
        assert_eq!(row.quantity(), 1);
        assert_eq!(row.line_total(), 0.0);

        let row = Treatment {
            price: Some(Amount(250.0)),
            quantity: Some(3),
            ..Default::default()
        };
        assert_eq!(row.line_total(), 750.0);
    }

    #[test]
    fn test_yaml_snapshot() {
        let yaml = r#"
clinic:
  name: Smile Clinic
offer:
  currency: EUR
treatments:
  - name: Crown
    teeth: [11, 12]
    price: 400
    quantity: 2
"#;
        let snapshot = OfferSnapshot::from_yaml(yaml).unwrap();
        assert_eq!(snapshot.clinic.as_ref().unwrap().name.as_deref(), Some("Smile Clinic"));
        assert_eq!(snapshot.treatments()[0].teeth.as_deref(), Some(&[11, 12][..]));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            SnapshotFormat::from_path(Path::new("offer.JSON")).unwrap(),
            SnapshotFormat::Json
        );
        assert_eq!(
            SnapshotFormat::from_path(Path::new("offer.yml")).unwrap(),
            SnapshotFormat::Yaml
        );
        assert!(SnapshotFormat::from_path(Path::new("offer.txt")).is_err());
    }
}
