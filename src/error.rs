//! Error types shared by every stage of a reconciliation run.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::validate::ValidationErrors;

/// ReconcileError covers both document-level failures (which abort a stage
/// before anything is written) and entity-level failures (which are recorded
/// in an outcome list while the run continues).
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("{}: failed to parse document: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("{}: not found", path.display())]
    NotFound { path: PathBuf },

    #[error("{namespace} '{name}' not found in {document}")]
    EntityNotFound {
        namespace: String,
        name: String,
        document: String,
    },

    #[error("pattern mismatch at {location}: {message}")]
    PatternMismatch { location: String, message: String },

    #[error("unresolved external references: {}", names.join(", "))]
    UnresolvedReferences { names: Vec<String> },

    #[error("document failed validation:\n{0}")]
    Validation(ValidationErrors),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ReconcileError {
    /// Creates a parse error for the given document.
    pub fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        ReconcileError::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Creates an entity-not-found error.
    pub fn entity_not_found(
        namespace: impl Into<String>,
        name: impl Into<String>,
        document: impl Into<String>,
    ) -> Self {
        ReconcileError::EntityNotFound {
            namespace: namespace.into(),
            name: name.into(),
            document: document.into(),
        }
    }

    /// Creates a pattern mismatch error.
    pub fn pattern_mismatch(location: impl Into<String>, message: impl Into<String>) -> Self {
        ReconcileError::PatternMismatch {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Wraps an I/O error, mapping a missing file to `NotFound`.
    pub fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            ReconcileError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ReconcileError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

pub type Result<T, E = ReconcileError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_not_found_maps_to_not_found() {
        let err = ReconcileError::io(
            Path::new("missing.yaml"),
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, ReconcileError::NotFound { .. }));
        assert_eq!(err.to_string(), "missing.yaml: not found");
    }

    #[test]
    fn test_unresolved_lists_every_name() {
        let err = ReconcileError::UnresolvedReferences {
            names: vec!["Missing".into(), "Other".into()],
        };
        assert_eq!(err.to_string(), "unresolved external references: Missing, Other");
    }
}
