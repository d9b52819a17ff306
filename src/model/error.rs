// ABOUTME: Error types for loading offer snapshots and template libraries
// ABOUTME: Defines specific error types for model module operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unsupported file format: {path} (expected .json, .yaml or .yml)")]
    UnsupportedFormat { path: String },

    #[error("Duplicate template id: {id}")]
    DuplicateTemplate { id: String },

    #[error("Template '{second}' cannot be default: '{first}' is already the default template")]
    MultipleDefaults { first: String, second: String },

    #[error("Template not found: {id}")]
    TemplateNotFound { id: String },

    #[error("No template id given and the library has no default template")]
    NoDefaultTemplate,

    #[error("Missing required field: {0}")]
    MissingField(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
