// ABOUTME: Main library module for the offerdoc offer document renderer
// ABOUTME: Exports all core modules and provides the public API

pub mod cli;
pub mod model;
pub mod template;

// Re-export commonly used types
pub use cli::{App, Args, Config};
pub use model::{OfferSnapshot, OfferTemplate, TemplateLibrary};
pub use template::{RenderLimits, RenderOutput, TemplateEngine, TemplateError};

// Error handling
pub type Result<T> = anyhow::Result<T>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
