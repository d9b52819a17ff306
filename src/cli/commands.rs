// ABOUTME: Command implementations for the offerdoc CLI
// ABOUTME: Handles execution of render, export, validate and context commands

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use super::args::{Args, TemplateSource};
use super::config::Config;
use crate::model::{OfferSnapshot, OfferTemplate, TemplateLibrary};
use crate::template::TemplateEngine;

/// Build the engine configured by the application config
pub fn engine_from_config(config: &Config) -> TemplateEngine {
    TemplateEngine::new()
        .with_limits(config.render_limits())
        .with_context_options(config.context_options())
}

/// Resolve the template body from a file or a library
pub async fn load_template(source: &TemplateSource) -> Result<OfferTemplate> {
    if let Some(path) = &source.template {
        return OfferTemplate::from_file(path)
            .await
            .with_context(|| format!("Failed to read template '{}'", path.display()));
    }

    let Some(library_path) = &source.library else {
        anyhow::bail!("Either --template or --library is required");
    };

    let library = TemplateLibrary::load(library_path)
        .await
        .with_context(|| format!("Failed to load template library '{}'", library_path.display()))?;
    info!(
        "Loaded {} templates from {}",
        library.len(),
        library_path.display()
    );

    let template = library.select(source.template_id.as_deref())?;
    Ok(template.clone())
}

async fn load_snapshot(path: &Path, at: Option<&str>) -> Result<OfferSnapshot> {
    let rendered_at = Args::parse_timestamp(at)?;
    let snapshot = OfferSnapshot::load(path)
        .await
        .with_context(|| format!("Failed to load offer '{}'", path.display()))?;
    Ok(snapshot.with_rendered_at(rendered_at))
}

/// Render the preview HTML for an offer
pub async fn render_offer(
    offer_path: PathBuf,
    source: TemplateSource,
    output: Option<PathBuf>,
    at: Option<String>,
    report: bool,
    config: &Config,
) -> Result<()> {
    info!("Rendering offer: {}", offer_path.display());

    let template = load_template(&source).await?;
    let snapshot = load_snapshot(&offer_path, at.as_deref()).await?;
    let engine = engine_from_config(config);

    let rendered = engine
        .render_with_report(&template.content, &snapshot)
        .with_context(|| format!("Failed to render template '{}'", template.id))?;

    if report {
        for diagnostic in &rendered.diagnostics {
            warn!("{}", diagnostic);
            eprintln!("warning: {}", diagnostic);
        }
    }

    match output {
        Some(path) => {
            fs::write(&path, &rendered.html)
                .await
                .with_context(|| format!("Failed to write output file '{}'", path.display()))?;
            info!("Preview written to: {}", path.display());
        }
        None => print!("{}", rendered.html),
    }

    Ok(())
}

/// Write the export HTML for an offer into a directory
pub async fn export_offer(
    offer_path: PathBuf,
    source: TemplateSource,
    output_dir: PathBuf,
    at: Option<String>,
    config: &Config,
) -> Result<()> {
    info!("Exporting offer: {}", offer_path.display());

    let template = load_template(&source).await?;
    let snapshot = load_snapshot(&offer_path, at.as_deref()).await?;
    let engine = engine_from_config(config);

    let document = engine
        .export(&template, &snapshot)
        .with_context(|| format!("Failed to render template '{}'", template.id))?;

    fs::create_dir_all(&output_dir).await?;
    let output_path = output_dir.join(format!("{}.html", document.file_stem));
    fs::write(&output_path, &document.html)
        .await
        .with_context(|| format!("Failed to write '{}'", output_path.display()))?;

    println!("✓ Exported {}", output_path.display());
    info!("Export written with template '{}'", document.template_id);

    Ok(())
}

/// Validate a template file
pub async fn validate_template(template_path: PathBuf, config: &Config) -> Result<()> {
    info!("Validating template: {}", template_path.display());

    let content = fs::read_to_string(&template_path)
        .await
        .with_context(|| format!("Failed to read template '{}'", template_path.display()))?;

    let engine = engine_from_config(config);
    let paths = engine
        .validate_template(&content)
        .with_context(|| format!("Template '{}' is invalid", template_path.display()))?;

    println!("✓ Template '{}' is valid", template_path.display());
    println!("  Referenced fields: {}", paths.len());
    for path in paths {
        println!("    {}", path);
    }

    Ok(())
}

/// Print the render context for an offer as JSON
pub async fn print_context(offer_path: PathBuf, at: Option<String>, config: &Config) -> Result<()> {
    let snapshot = load_snapshot(&offer_path, at.as_deref()).await?;
    let engine = engine_from_config(config);
    let context = engine.build_context(&snapshot)?;

    println!("{}", serde_json::to_string_pretty(&context)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_template_from_library_default() {
        let temp_dir = tempdir().unwrap();
        let library_path = temp_dir.path().join("templates.yaml");
        std::fs::write(
            &library_path,
            r#"
templates:
  - id: classic
    name: Classic
    content: "<h1>{{clinic.name}}</h1>"
  - id: modern
    name: Modern
    isDefault: true
    content: "<h2>{{clinic.name}}</h2>"
"#,
        )
        .unwrap();

        let source = TemplateSource {
            template: None,
            library: Some(library_path.clone()),
            template_id: None,
        };
        assert_eq!(load_template(&source).await.unwrap().id, "modern");

        let source = TemplateSource {
            template: None,
            library: Some(library_path),
            template_id: Some("classic".to_string()),
        };
        assert_eq!(
            load_template(&source).await.unwrap().content,
            "<h1>{{clinic.name}}</h1>"
        );
    }

    #[tokio::test]
    async fn test_export_writes_named_file() {
        let temp_dir = tempdir().unwrap();
        let template_path = temp_dir.path().join("standard.html");
        let offer_path = temp_dir.path().join("offer.json");
        let out_dir = temp_dir.path().join("out");

        std::fs::write(&template_path, "<p>{{patient.name}} {{offer.grandTotal}}</p>").unwrap();
        std::fs::write(
            &offer_path,
            r#"{ "patient": { "name": "Ana" }, "offer": { "number": "A-7", "grandTotal": 900 } }"#,
        )
        .unwrap();

        let source = TemplateSource {
            template: Some(template_path),
            library: None,
            template_id: None,
        };
        export_offer(
            offer_path,
            source,
            out_dir.clone(),
            Some("2025-01-01T00:00:00Z".to_string()),
            &Config::default(),
        )
        .await
        .unwrap();

        let html = std::fs::read_to_string(out_dir.join("offer-A-7.html")).unwrap();
        assert_eq!(html, "<p>Ana 900</p>");
    }
}
