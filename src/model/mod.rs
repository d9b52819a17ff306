// ABOUTME: Data model module for offer snapshots and stored document templates
// ABOUTME: Exports the read-only offer aggregate and the template library used for selection

pub mod error;
pub mod snapshot;
pub mod template;

pub use error::{ModelError, Result};
pub use snapshot::{
    Amount, Clinic, OfferInfo, OfferSnapshot, OfferStatus, Patient, SnapshotFormat, Treatment,
};
pub use template::{OfferTemplate, TemplateLibrary};
