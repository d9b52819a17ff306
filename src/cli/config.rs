// ABOUTME: Configuration management for the offerdoc application
// ABOUTME: Handles loading and merging configuration from files and environment variables

use anyhow::{bail, Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::template::format::{is_valid_format, DEFAULT_DATE_FORMAT, DEFAULT_TIME_FORMAT};
use crate::template::{ContextOptions, RenderLimits};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub context: ContextConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub max_depth: usize,
    pub max_iterations: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub default_currency: String,
    pub date_format: String,
    pub time_format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        let limits = RenderLimits::default();
        Self {
            max_depth: limits.max_depth,
            max_iterations: limits.max_iterations,
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            default_currency: String::new(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file path or default locations
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => Self::find_config_file(),
        };

        let mut config = if config_path.exists() {
            Self::from_file(&config_path)?
        } else {
            Config::default()
        };

        // Merge with environment variables
        config.merge_env()?;
        config.validate()?;

        Ok(config)
    }

    /// Parse a configuration file without environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        serde_yaml::from_str(&contents)
            .with_context(|| format!("Invalid config '{}'", path.display()))
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> PathBuf {
        let possible_paths = [
            PathBuf::from("offerdoc.yaml"),
            PathBuf::from("offerdoc.yml"),
            PathBuf::from(".offerdoc.yaml"),
            PathBuf::from(".offerdoc.yml"),
        ];

        // Check current directory
        for path in possible_paths {
            if path.exists() {
                return path;
            }
        }

        // Check home directory
        if let Some(home_dir) = dirs::home_dir() {
            let home_config = home_dir.join(".offerdoc").join("config.yaml");
            if home_config.exists() {
                return home_config;
            }
        }

        // Return default path (may not exist)
        PathBuf::from("offerdoc.yaml")
    }

    /// Merge environment variables into configuration
    fn merge_env(&mut self) -> Result<()> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Apply `OFFERDOC_*` overrides from any variable source
    fn merge_vars<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Logging configuration
        if let Some(level) = lookup("OFFERDOC_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("OFFERDOC_LOG_FORMAT") {
            self.logging.format = format;
        }

        // Render limits
        if let Some(depth) = lookup("OFFERDOC_MAX_DEPTH") {
            self.render.max_depth = depth
                .trim()
                .parse()
                .with_context(|| format!("OFFERDOC_MAX_DEPTH must be a number, got '{}'", depth))?;
        }
        if let Some(iterations) = lookup("OFFERDOC_MAX_ITERATIONS") {
            self.render.max_iterations = iterations.trim().parse().with_context(|| {
                format!("OFFERDOC_MAX_ITERATIONS must be a number, got '{}'", iterations)
            })?;
        }

        // Context formatting
        if let Some(currency) = lookup("OFFERDOC_DEFAULT_CURRENCY") {
            self.context.default_currency = currency;
        }
        if let Some(format) = lookup("OFFERDOC_DATE_FORMAT") {
            self.context.date_format = format;
        }

        Ok(())
    }

    /// Reject settings the renderer cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.render.max_depth == 0 {
            bail!("render.max_depth must be at least 1");
        }
        if self.render.max_iterations == 0 {
            bail!("render.max_iterations must be at least 1");
        }
        for (key, format) in [
            ("context.date_format", &self.context.date_format),
            ("context.time_format", &self.context.time_format),
        ] {
            if !is_valid_format(format) {
                bail!("Invalid {} '{}'", key, format);
            }
        }
        Ok(())
    }

    pub fn render_limits(&self) -> RenderLimits {
        RenderLimits {
            max_depth: self.render.max_depth,
            max_iterations: self.render.max_iterations,
        }
    }

    pub fn context_options(&self) -> ContextOptions {
        ContextOptions {
            default_currency: self.context.default_currency.clone(),
            date_format: self.context.date_format.clone(),
            time_format: self.context.time_format.clone(),
        }
    }
}
