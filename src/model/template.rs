// ABOUTME: Stored offer document templates and per-tenant template selection
// ABOUTME: Keeps templates in insertion order and enforces a single default template

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

use super::error::{ModelError, Result};
use super::snapshot::SnapshotFormat;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
    /// Fixed templates ship with the product and are not editable by tenants.
    #[serde(default)]
    pub is_fixed: bool,
    #[serde(default)]
    pub is_public: bool,
    pub content: String,
}

impl OfferTemplate {
    pub fn new(id: &str, name: &str, content: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            is_default: false,
            is_fixed: false,
            is_public: false,
            content: content.to_string(),
        }
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Load a bare template body from a file; the id and name come from the file stem
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("template");
        Ok(Self::new(stem, stem, &content))
    }
}

#[derive(Debug, Deserialize)]
struct LibraryFile {
    #[serde(default)]
    templates: Vec<OfferTemplate>,
}

/// The set of templates available to one tenant.
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: IndexMap<String, OfferTemplate>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template, rejecting duplicate ids and a second default
    pub fn insert(&mut self, template: OfferTemplate) -> Result<()> {
        if template.id.trim().is_empty() {
            return Err(ModelError::MissingField("id".to_string()));
        }

        if self.templates.contains_key(&template.id) {
            return Err(ModelError::DuplicateTemplate {
                id: template.id.clone(),
            });
        }

        if template.is_default {
            if let Some(existing) = self.default_template() {
                return Err(ModelError::MultipleDefaults {
                    first: existing.id.clone(),
                    second: template.id.clone(),
                });
            }
        }

        self.templates.insert(template.id.clone(), template);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&OfferTemplate> {
        self.templates.get(id)
    }

    pub fn default_template(&self) -> Option<&OfferTemplate> {
        self.templates.values().find(|t| t.is_default)
    }

    /// Select by id when given, otherwise fall back to the default template
    pub fn select(&self, id: Option<&str>) -> Result<&OfferTemplate> {
        match id {
            Some(id) => self.get(id).ok_or_else(|| ModelError::TemplateNotFound {
                id: id.to_string(),
            }),
            None => self.default_template().ok_or(ModelError::NoDefaultTemplate),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &OfferTemplate> {
        self.templates.values()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let file: LibraryFile = serde_yaml::from_str(content)?;
        Self::from_templates(file.templates)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file: LibraryFile = serde_json::from_str(content)?;
        Self::from_templates(file.templates)
    }

    /// Load a library file, choosing the format by extension
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let format = SnapshotFormat::from_path(path)?;
        let content = fs::read_to_string(path).await?;
        match format {
            SnapshotFormat::Json => Self::from_json(&content),
            SnapshotFormat::Yaml => Self::from_yaml(&content),
        }
    }

    fn from_templates(templates: Vec<OfferTemplate>) -> Result<Self> {
        let mut library = Self::new();
        for template in templates {
            library.insert(template)?;
        }
        Ok(library)
    }
}
