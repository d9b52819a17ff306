// ABOUTME: Offer document template engine
// ABOUTME: Tokenizes templates, builds the render context and expands blocks and placeholders into HTML

pub mod ast;
pub mod context;
pub mod engine;
pub mod error;
mod expander;
pub mod format;
pub mod lexer;
pub mod path;
pub mod substitute;

pub use context::{ContextOptions, OfferContext};
pub use engine::{ExportDocument, RenderLimits, RenderOutput, TemplateEngine};
pub use error::{Diagnostic, Result, TemplateError};
pub use lexer::Position;
pub use substitute::escape_html;
