//! Run configuration loaded from YAML.

use crate::error::{ReconcileError, Result};
use crate::refs::RefRules;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default document locations, relative to the working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultPaths {
    pub reference: PathBuf,
    pub target: PathBuf,
    pub report: PathBuf,
    /// Flat models file; used only when it exists.
    pub models: PathBuf,
}

impl Default for DefaultPaths {
    fn default() -> Self {
        DefaultPaths {
            reference: PathBuf::from("reference/openapi.yaml"),
            target: PathBuf::from("openapi/openapi.yml"),
            report: PathBuf::from("openapi_diff.json"),
            models: PathBuf::from("reference/schemas/models.yaml"),
        }
    }
}

/// ReconcileConfig tunes how documents are read and patched.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconcileConfig {
    /// Spaces per nesting level in the target document.
    pub indent_unit: usize,
    /// Appended to the target path to name its backup.
    pub backup_suffix: String,
    /// How external references map to namespaces.
    pub external_refs: RefRules,
    pub paths: DefaultPaths,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        ReconcileConfig {
            indent_unit: 2,
            backup_suffix: ".bak".to_string(),
            external_refs: RefRules::default(),
            paths: DefaultPaths::default(),
        }
    }
}

impl ReconcileConfig {
    /// Loads a configuration file, or the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(ReconcileConfig::default());
        };
        let text = fs::read_to_string(path).map_err(|e| ReconcileError::io(path, e))?;
        let config = Self::from_yaml(&text).map_err(|e| match e {
            ReconcileError::Config(message) => {
                ReconcileError::Config(format!("{}: {}", path.display(), message))
            }
            other => other,
        })?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parses and checks a YAML configuration.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: ReconcileConfig = if text.trim().is_empty() {
            ReconcileConfig::default()
        } else {
            serde_yaml::from_str(text).map_err(|e| ReconcileError::Config(e.to_string()))?
        };
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if self.indent_unit == 0 {
            return Err(ReconcileError::Config(
                "indent_unit must be at least 1".to_string(),
            ));
        }
        if self.backup_suffix.is_empty() {
            return Err(ReconcileError::Config(
                "backup_suffix must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The models file to use when none is given explicitly.
    pub fn default_models(&self) -> Option<&Path> {
        let models = self.paths.models.as_path();
        models.exists().then_some(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refs::RefNamespace;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(ReconcileConfig::from_yaml("").unwrap(), ReconcileConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let config = ReconcileConfig::from_yaml(
            "\
indent_unit: 4
external_refs:
  rules:
    - file: params.yaml
      namespace: parameters
paths:
  target: api/openapi.yaml
",
        )
        .unwrap();
        assert_eq!(config.indent_unit, 4);
        assert_eq!(config.backup_suffix, ".bak");
        assert_eq!(config.external_refs.rules.len(), 1);
        assert_eq!(config.external_refs.rules[0].namespace, RefNamespace::Parameters);
        assert_eq!(config.external_refs.fallback, RefNamespace::Schemas);
        assert_eq!(config.paths.target, PathBuf::from("api/openapi.yaml"));
        assert_eq!(config.paths.reference, PathBuf::from("reference/openapi.yaml"));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            ReconcileConfig::from_yaml("indent_unit: 0\n"),
            Err(ReconcileError::Config(_))
        ));
        assert!(matches!(
            ReconcileConfig::from_yaml("indent: 2\n"),
            Err(ReconcileError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("oas-sync.yaml");
        fs::write(&path, "backup_suffix: .orig\n").unwrap();
        let config = ReconcileConfig::load(Some(&path)).unwrap();
        assert_eq!(config.backup_suffix, ".orig");
        assert!(ReconcileConfig::load(None).unwrap().indent_unit == 2);
    }
}
