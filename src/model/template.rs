//! Template descriptors and the template registry.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Immutable descriptor selecting which template bytes to load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Stable identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Byte-source location, interpreted by the template provider
    pub path: String,

    /// Short description for pickers
    #[serde(default)]
    pub description: String,

    /// Accent color (e.g. "#2563eb")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Preview image location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

impl Template {
    /// Create a template with only the required fields.
    pub fn new(id: impl Into<String>, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            path: path.into(),
            description: String::new(),
            color: None,
            preview: None,
        }
    }

    /// Set description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set accent color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

#[derive(Debug, Deserialize)]
struct Manifest {
    templates: Vec<Template>,
}

/// Ordered set of selectable templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: Vec<Template>,
}

impl TemplateRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON manifest of the form `{"templates": [...]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for template in manifest.templates {
            registry.register(template)?;
        }
        Ok(registry)
    }

    /// Read a JSON manifest from disk.
    pub fn from_manifest_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Add a template. Ids must be unique.
    pub fn register(&mut self, template: Template) -> Result<()> {
        if self.get(&template.id).is_some() {
            return Err(Error::Manifest(format!(
                "duplicate template id: {}",
                template.id
            )));
        }
        self.templates.push(template);
        Ok(())
    }

    /// Look up a template by id.
    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Look up a template by id, failing if absent.
    pub fn require(&self, id: &str) -> Result<&Template> {
        self.get(id)
            .ok_or_else(|| Error::TemplateNotFound(id.to_string()))
    }

    /// The template selected when nothing else is: the first registered.
    pub fn default_template(&self) -> Option<&Template> {
        self.templates.first()
    }

    /// Iterate templates in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Template> {
        self.templates.iter()
    }

    /// Number of templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether no templates are registered.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
