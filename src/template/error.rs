// ABOUTME: Error types for offer template parsing and rendering
// ABOUTME: Separates fatal render errors from non-fatal diagnostics reported to authoring tools

use serde::Serialize;
use thiserror::Error;

use super::lexer::Position;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Malformed directive at line {}, column {}: {message}", .position.line, .position.column)]
    MalformedDirective { message: String, position: Position },

    #[error("Render limit exceeded: {limit} (maximum {max})")]
    LimitExceeded { limit: &'static str, max: usize },

    #[error("Context serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl TemplateError {
    pub(crate) fn malformed(message: impl Into<String>, position: Position) -> Self {
        TemplateError::MalformedDirective {
            message: message.into(),
            position,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, TemplateError::MalformedDirective { .. })
    }
}

/// Problems that degrade output without failing the render.
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Diagnostic {
    #[error("Missing field '{path}' at line {}, column {}", .position.line, .position.column)]
    MissingField { path: String, position: Position },

    #[error("Field '{path}' at line {}, column {} is not a list; loop skipped", .position.line, .position.column)]
    TypeMismatch { path: String, position: Position },
}

pub type Result<T> = std::result::Result<T, TemplateError>;
