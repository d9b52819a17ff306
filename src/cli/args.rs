// ABOUTME: Command line argument definitions and parsing using Clap
// ABOUTME: Defines the main CLI structure and subcommands for offerdoc

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "offerdoc")]
#[command(about = "Render dental treatment offers from HTML templates")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Path to configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,
}

/// Where the template body comes from.
#[derive(clap::Args, Debug, Clone)]
pub struct TemplateSource {
    #[arg(
        short,
        long,
        conflicts_with = "library",
        required_unless_present = "library",
        help = "Path to a template body file"
    )]
    pub template: Option<PathBuf>,

    #[arg(short, long, help = "Path to a template library (YAML or JSON)")]
    pub library: Option<PathBuf>,

    #[arg(
        long,
        requires = "library",
        help = "Template id within the library (defaults to the default template)"
    )]
    pub template_id: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render the preview HTML for an offer
    Render {
        #[arg(help = "Path to the offer snapshot (JSON or YAML)")]
        offer: PathBuf,

        #[command(flatten)]
        source: TemplateSource,

        #[arg(short, long, help = "Output file (stdout when omitted)")]
        output: Option<PathBuf>,

        #[arg(long, help = "Render timestamp (RFC 3339), defaults to now")]
        at: Option<String>,

        #[arg(long, help = "Print missing-field diagnostics")]
        report: bool,
    },

    /// Write the HTML handed to PDF export
    Export {
        #[arg(help = "Path to the offer snapshot (JSON or YAML)")]
        offer: PathBuf,

        #[command(flatten)]
        source: TemplateSource,

        #[arg(short, long, help = "Output directory", default_value = ".")]
        output_dir: PathBuf,

        #[arg(long, help = "Render timestamp (RFC 3339), defaults to now")]
        at: Option<String>,
    },

    /// Check template directive syntax without rendering
    Validate {
        #[arg(help = "Path to a template body file")]
        template: PathBuf,
    },

    /// Print the render context built from an offer snapshot
    Context {
        #[arg(help = "Path to the offer snapshot (JSON or YAML)")]
        offer: PathBuf,

        #[arg(long, help = "Render timestamp (RFC 3339), defaults to now")]
        at: Option<String>,
    },
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parse an optional RFC 3339 timestamp, defaulting to the current time
    pub fn parse_timestamp(at: Option<&str>) -> anyhow::Result<DateTime<Utc>> {
        match at {
            Some(value) => DateTime::parse_from_rfc3339(value)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| anyhow::anyhow!("Invalid timestamp '{}': {}", value, e)),
            None => Ok(Utc::now()),
        }
    }
}
