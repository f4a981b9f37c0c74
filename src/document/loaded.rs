//! Documents loaded from disk, kept as both text and tree.

use super::structured::StructuredDocument;
use crate::error::{ReconcileError, Result};
use crate::namespace::{Layout, Namespace};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// LoadedDocument pairs the raw text of a document with its parsed tree.
///
/// Analysis reads `tree`; patches are computed against `text`.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub path: PathBuf,
    pub text: String,
    pub tree: StructuredDocument,
}

impl LoadedDocument {
    /// Reads and parses a document.
    pub fn load(path: &Path, layout: Layout) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| ReconcileError::io(path, e))?;
        debug!(path = %path.display(), bytes = text.len(), "loaded document");
        Self::from_text(path, text, layout)
    }

    /// Parses already-read text.
    pub fn from_text(path: impl Into<PathBuf>, text: String, layout: Layout) -> Result<Self> {
        let path = path.into();
        let tree =
            StructuredDocument::parse(&text, layout).map_err(|e| ReconcileError::parse(&path, e))?;
        Ok(LoadedDocument { path, text, tree })
    }

    pub fn layout(&self) -> Layout {
        self.tree.layout()
    }

    /// Name used when reporting on this document.
    pub fn name(&self) -> String {
        self.path.display().to_string()
    }
}

/// ReferenceSet is the multi-file source of truth.
///
/// Schemas (and their fields) come from the flat models file when one is
/// given; parameters and paths always come from the main document.
#[derive(Debug, Clone)]
pub struct ReferenceSet {
    pub main: LoadedDocument,
    pub models: Option<LoadedDocument>,
}

impl ReferenceSet {
    pub fn load(main: &Path, models: Option<&Path>) -> Result<Self> {
        let main = LoadedDocument::load(main, Layout::Components)?;
        let models = models
            .map(|p| LoadedDocument::load(p, Layout::Models))
            .transpose()?;
        Ok(ReferenceSet { main, models })
    }

    pub fn new(main: LoadedDocument, models: Option<LoadedDocument>) -> Self {
        ReferenceSet { main, models }
    }

    /// The document that defines the given namespace.
    pub fn source_for(&self, namespace: &Namespace) -> &LoadedDocument {
        match namespace {
            Namespace::Schema | Namespace::Field(_) => self.models.as_ref().unwrap_or(&self.main),
            Namespace::Parameter | Namespace::Path => &self.main,
        }
    }

    /// Structural view of the given namespace's source.
    pub fn tree_for(&self, namespace: &Namespace) -> &StructuredDocument {
        &self.source_for(namespace).tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_is_not_found() {
        let err = LoadedDocument::load(Path::new("/nonexistent/openapi.yaml"), Layout::Components)
            .unwrap_err();
        assert!(matches!(err, ReconcileError::NotFound { .. }));
    }

    #[test]
    fn test_malformed_text_is_parse_error() {
        let err = LoadedDocument::from_text(
            "bad.yaml",
            "key: [unclosed\n".to_string(),
            Layout::Components,
        )
        .unwrap_err();
        assert!(matches!(err, ReconcileError::Parse { .. }));
    }

    #[test]
    fn test_schemas_prefer_models_file() {
        let main = LoadedDocument::from_text(
            "openapi.yaml",
            "components:\n  schemas:\n    Inline:\n      type: string\n".to_string(),
            Layout::Components,
        )
        .unwrap();
        let models = LoadedDocument::from_text(
            "models.yaml",
            "Foo:\n  type: object\n".to_string(),
            Layout::Models,
        )
        .unwrap();
        let reference = ReferenceSet::new(main.clone(), Some(models));
        assert!(reference.tree_for(&Namespace::Schema).names(&Namespace::Schema).contains("Foo"));
        assert_eq!(reference.source_for(&Namespace::Parameter).path, main.path);

        let without_models = ReferenceSet::new(main, None);
        assert!(without_models
            .tree_for(&Namespace::Schema)
            .names(&Namespace::Schema)
            .contains("Inline"));
    }
}
