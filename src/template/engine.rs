// ABOUTME: Renderer facade for offer documents
// ABOUTME: Builds the context, parses the template and expands it; backs both preview and export

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use super::ast;
use super::context::{ContextOptions, OfferContext};
use super::error::{Diagnostic, Result};
use super::expander::Expander;
use crate::model::{OfferSnapshot, OfferTemplate};

pub const DEFAULT_MAX_DEPTH: usize = 8;
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Upper bounds on the work one render may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderLimits {
    /// Maximum `{{#each}}` nesting depth.
    pub max_depth: usize,
    /// Maximum loop iterations summed over the whole render.
    pub max_iterations: usize,
}

impl Default for RenderLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderOutput {
    pub html: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Markup handed to the external PDF rasterizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportDocument {
    pub template_id: String,
    pub file_stem: String,
    pub html: String,
}

/// Stateless offer renderer. Safe to share across threads; every call
/// builds its own context.
#[derive(Debug, Clone, Default)]
pub struct TemplateEngine {
    limits: RenderLimits,
    options: ContextOptions,
}

impl TemplateEngine {
    /// Create a new template engine with default limits and formatting
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(mut self, limits: RenderLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_context_options(mut self, options: ContextOptions) -> Self {
        self.options = options;
        self
    }

    /// Build the JSON context a snapshot renders against
    pub fn build_context(&self, snapshot: &OfferSnapshot) -> Result<JsonValue> {
        OfferContext::build(snapshot, &self.options).to_json()
    }

    /// Render a template body against an offer snapshot
    pub fn render(&self, template: &str, snapshot: &OfferSnapshot) -> Result<String> {
        Ok(self.render_with_report(template, snapshot)?.html)
    }

    /// Render and also return the fields that were missing or mistyped
    pub fn render_with_report(&self, template: &str, snapshot: &OfferSnapshot) -> Result<RenderOutput> {
        let context = self.build_context(snapshot)?;
        self.render_json_with_report(template, &context)
    }

    /// Render a template string against an already built context
    pub fn render_with_json(&self, template: &str, context: &JsonValue) -> Result<String> {
        Ok(self.render_json_with_report(template, context)?.html)
    }

    fn render_json_with_report(&self, template: &str, context: &JsonValue) -> Result<RenderOutput> {
        let nodes = ast::parse(template, self.limits.max_depth).inspect_err(|e| {
            warn!("Template rejected: {}", e);
        })?;

        let mut expander = Expander::new(context, self.limits.max_iterations);
        let mut html = String::with_capacity(template.len());
        expander.expand(&nodes, &mut html).inspect_err(|e| {
            warn!("Render aborted: {}", e);
        })?;

        let diagnostics = expander.finish();
        debug!(
            "Rendered {} bytes with {} diagnostics",
            html.len(),
            diagnostics.len()
        );

        Ok(RenderOutput { html, diagnostics })
    }

    /// Markup for the in-app preview
    pub fn preview(&self, template: &OfferTemplate, snapshot: &OfferSnapshot) -> Result<String> {
        debug!("Rendering preview with template '{}'", template.id);
        self.render(&template.content, snapshot)
    }

    /// Markup for PDF export; identical to [`TemplateEngine::preview`] for the same input
    pub fn export(&self, template: &OfferTemplate, snapshot: &OfferSnapshot) -> Result<ExportDocument> {
        debug!("Rendering export with template '{}'", template.id);
        let html = self.render(&template.content, snapshot)?;
        Ok(ExportDocument {
            template_id: template.id.clone(),
            file_stem: export_file_stem(snapshot),
            html,
        })
    }

    /// Check directive syntax without rendering; returns the referenced paths
    pub fn validate_template(&self, template: &str) -> Result<Vec<String>> {
        let nodes = ast::parse(template, self.limits.max_depth)?;
        Ok(ast::referenced_paths(&nodes))
    }

    /// Check if a string contains template expressions
    pub fn has_templates(&self, text: &str) -> bool {
        text.contains("{{") && text.contains("}}")
    }
}

/// `offer-<number>`, falling back to the offer id, with unsafe characters replaced
fn export_file_stem(snapshot: &OfferSnapshot) -> String {
    let reference = snapshot
        .offer
        .as_ref()
        .and_then(|offer| {
            [offer.number.as_deref(), offer.id.as_deref()]
                .into_iter()
                .flatten()
                .map(str::trim)
                .find(|s| !s.is_empty())
        })
        .unwrap_or("");

    let sanitized: String = reference
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let sanitized = sanitized.trim_matches('-');

    if sanitized.is_empty() {
        "offer".to_string()
    } else {
        format!("offer-{}", sanitized)
    }
}
