//! Template byte providers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::model::Template;

/// Source of raw template bytes.
#[async_trait]
pub trait TemplateProvider: Send + Sync {
    /// Fetch the bytes behind `template`. Failures are [`Error::Fetch`].
    async fn fetch(&self, template: &Template) -> Result<Vec<u8>>;
}

/// Reads templates from disk, resolving relative paths against a root.
#[derive(Debug, Clone)]
pub struct FsTemplateProvider {
    root: PathBuf,
}

impl FsTemplateProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of a template on disk. Manifest paths such as
    /// `/templates/flyer.pdf` are taken relative to the root.
    pub fn resolve(&self, template: &Template) -> PathBuf {
        if self.root.as_os_str().is_empty() {
            return PathBuf::from(&template.path);
        }
        self.root.join(template.path.trim_start_matches('/'))
    }
}

#[async_trait]
impl TemplateProvider for FsTemplateProvider {
    async fn fetch(&self, template: &Template) -> Result<Vec<u8>> {
        let path = self.resolve(template);
        log::debug!("Fetching template {} from {}", template.id, path.display());
        tokio::fs::read(&path)
            .await
            .map_err(|e| Error::Fetch(format!("{}: {}", path.display(), e)))
    }
}

/// In-memory templates keyed by template id.
#[derive(Debug, Clone, Default)]
pub struct MemoryTemplateProvider {
    templates: HashMap<String, Vec<u8>>,
}

impl MemoryTemplateProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the bytes for a template id.
    pub fn insert(&mut self, id: impl Into<String>, bytes: Vec<u8>) {
        self.templates.insert(id.into(), bytes);
    }

    pub fn with(mut self, id: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(id, bytes);
        self
    }
}

#[async_trait]
impl TemplateProvider for MemoryTemplateProvider {
    async fn fetch(&self, template: &Template) -> Result<Vec<u8>> {
        self.templates
            .get(&template.id)
            .cloned()
            .ok_or_else(|| Error::Fetch(format!("no bytes for template {}", template.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_provider() {
        let provider = MemoryTemplateProvider::new().with("a", b"%PDF-1.7".to_vec());
        let bytes = provider
            .fetch(&Template::new("a", "A", "a.pdf"))
            .await
            .unwrap();
        assert_eq!(bytes, b"%PDF-1.7");

        let err = provider
            .fetch(&Template::new("b", "B", "b.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
    }

    #[tokio::test]
    async fn test_fs_provider_reads_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("flyer.pdf"), b"%PDF-1.4 body").unwrap();
        let provider = FsTemplateProvider::new(dir.path());

        let bytes = provider
            .fetch(&Template::new("flyer", "Flyer", "/flyer.pdf"))
            .await
            .unwrap();
        assert_eq!(bytes, b"%PDF-1.4 body");

        let err = provider
            .fetch(&Template::new("gone", "Gone", "missing.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
    }
}
