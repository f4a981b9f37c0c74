//! Transactional access to the target document on disk.

use super::loaded::LoadedDocument;
use crate::error::{ReconcileError, Result};
use crate::namespace::Layout;
use std::cell::{Cell, RefCell};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// ApplyOptions controls how a stage mutates the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Stage name used in logs.
    pub stage: &'static str,
    /// Keep a copy of the pre-stage bytes next to the target.
    pub backup: bool,
}

impl ApplyOptions {
    pub fn stage(stage: &'static str) -> Self {
        ApplyOptions {
            stage,
            backup: false,
        }
    }

    pub fn with_backup(mut self) -> Self {
        self.backup = true;
        self
    }
}

/// Edit is the outcome of computing a stage against the current text.
#[derive(Debug, Clone)]
pub struct Edit<T> {
    /// Replacement text; `None` leaves the target untouched.
    pub text: Option<String>,
    pub value: T,
}

impl<T> Edit<T> {
    pub fn unchanged(value: T) -> Self {
        Edit { text: None, value }
    }

    pub fn replace(text: String, value: T) -> Self {
        Edit {
            text: Some(text),
            value,
        }
    }
}

/// TargetFile is the handle to the single mutable document of a run.
///
/// Every stage rereads the file instead of trusting an earlier copy, and
/// writes go through a temporary file that is renamed over the target.
/// In a dry run the file is never written; edits are kept in memory so
/// that later stages read what earlier stages would have written. Inside
/// a [`transaction`](TargetFile::transaction) stages are staged the same
/// way and only the final text is written.
#[derive(Debug, Clone)]
pub struct TargetFile {
    path: PathBuf,
    backup_suffix: String,
    dry_run: bool,
    staging: Cell<bool>,
    pending: RefCell<Option<String>>,
}

impl TargetFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TargetFile {
            path: path.into(),
            backup_suffix: ".bak".to_string(),
            dry_run: false,
            staging: Cell::new(false),
            pending: RefCell::new(None),
        }
    }

    pub fn with_backup_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.backup_suffix = suffix.into();
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(&self.backup_suffix);
        PathBuf::from(name)
    }

    /// Reads the current bytes of the target.
    pub fn read(&self) -> Result<String> {
        if let Some(pending) = self.pending.borrow().as_ref() {
            return Ok(pending.clone());
        }
        fs::read_to_string(&self.path).map_err(|e| ReconcileError::io(&self.path, e))
    }

    /// Text a dry run would have written, if any stage changed it.
    pub fn pending(&self) -> Option<String> {
        self.pending.borrow().clone()
    }

    /// Reads and parses the current target.
    pub fn load(&self) -> Result<LoadedDocument> {
        LoadedDocument::from_text(&self.path, self.read()?, Layout::Components)
    }

    /// Replaces the target's content through a temp-file-then-rename.
    pub fn write(&self, text: &str) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ReconcileError::io(dir, e))?;
        tmp.write_all(text.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| ReconcileError::io(tmp.path(), e))?;
        if let Ok(meta) = fs::metadata(&self.path) {
            if let Err(e) = fs::set_permissions(tmp.path(), meta.permissions()) {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "could not carry permissions over to the rewritten target"
                );
            }
        }
        tmp.persist(&self.path)
            .map_err(|e| ReconcileError::io(&self.path, e.error))?;
        Ok(())
    }

    /// Runs one stage against the target as a transaction.
    ///
    /// `edit` sees the freshly read text. When it produces new text, the new
    /// text is written and then checked: it must still parse, and `verify`
    /// must accept it. On any check failure the original bytes are put back
    /// and the error is returned.
    pub fn apply<T, F, V>(&self, options: ApplyOptions, edit: F, verify: V) -> Result<T>
    where
        F: FnOnce(&str) -> Result<Edit<T>>,
        V: FnOnce(&str) -> Result<()>,
    {
        let original = self.read()?;
        let Edit { text, value } = edit(&original)?;
        let updated = match text {
            Some(updated) if updated != original => updated,
            _ => {
                debug!(stage = options.stage, "no changes to write");
                return Ok(value);
            }
        };

        if self.dry_run || self.staging.get() {
            self.check(&updated, verify)?;
            *self.pending.borrow_mut() = Some(updated.clone());
            debug!(stage = options.stage, bytes = updated.len(), "staged edit");
            return Ok(value);
        }

        if options.backup {
            let backup = self.backup_path();
            fs::write(&backup, &original).map_err(|e| ReconcileError::io(&backup, e))?;
            debug!(stage = options.stage, backup = %backup.display(), "backed up target");
        }

        self.write(&updated)?;
        let written = self.read()?;
        if let Err(err) = self.check(&written, verify) {
            warn!(stage = options.stage, error = %err, "post-condition failed; restoring target");
            self.write(&original)?;
            return Err(err);
        }
        info!(
            stage = options.stage,
            before = original.len(),
            after = updated.len(),
            "target updated"
        );
        Ok(value)
    }

    /// Runs several stages as one transaction.
    ///
    /// Stages applied inside `body` are staged in memory and see each
    /// other's edits. The target is written once, after `body` succeeds,
    /// with a backup of the pre-transaction bytes when `options` asks for
    /// one. When `body` fails nothing is written and the staged edits are
    /// discarded. Nested transactions join the outer one.
    pub fn transaction<T, F>(&self, options: ApplyOptions, body: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let before = self.pending();
        let original = self.read()?;
        let nested = self.staging.replace(true);
        let result = body();
        self.staging.set(nested);

        let value = match result {
            Ok(value) => value,
            Err(err) => {
                *self.pending.borrow_mut() = before;
                warn!(stage = options.stage, error = %err, "stage failed; staged edits discarded");
                return Err(err);
            }
        };
        if nested {
            return Ok(value);
        }
        if self.dry_run {
            if self.pending() != before {
                info!(stage = options.stage, "dry run; target left untouched");
            }
            return Ok(value);
        }

        let updated = match self.pending.borrow_mut().take() {
            Some(updated) if updated != original => updated,
            _ => {
                debug!(stage = options.stage, "no changes to write");
                return Ok(value);
            }
        };
        if options.backup {
            let backup = self.backup_path();
            fs::write(&backup, &original).map_err(|e| ReconcileError::io(&backup, e))?;
            debug!(stage = options.stage, backup = %backup.display(), "backed up target");
        }
        self.write(&updated)?;
        let written = self.read()?;
        if let Err(err) = self.check(&written, no_verify) {
            warn!(stage = options.stage, error = %err, "post-condition failed; restoring target");
            self.write(&original)?;
            return Err(err);
        }
        info!(
            stage = options.stage,
            before = original.len(),
            after = updated.len(),
            "target updated"
        );
        Ok(value)
    }

    fn check<V>(&self, text: &str, verify: V) -> Result<()>
    where
        V: FnOnce(&str) -> Result<()>,
    {
        serde_yaml::from_str::<serde_yaml::Value>(text)
            .map_err(|e| ReconcileError::parse(&self.path, e))?;
        verify(text)
    }
}

/// Verification that accepts any parseable text.
pub fn no_verify(_: &str) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn target_with(dir: &TempDir, text: &str) -> TargetFile {
        let path = dir.path().join("openapi.yml");
        fs::write(&path, text).unwrap();
        TargetFile::new(path)
    }

    #[test]
    fn test_apply_writes_and_backs_up() {
        let dir = TempDir::new().unwrap();
        let target = target_with(&dir, "a: 1\n");
        let count = target
            .apply(
                ApplyOptions::stage("test").with_backup(),
                |text| Ok(Edit::replace(format!("{}b: 2\n", text), 1)),
                no_verify,
            )
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(target.read().unwrap(), "a: 1\nb: 2\n");
        assert_eq!(fs::read_to_string(target.backup_path()).unwrap(), "a: 1\n");
    }

    #[test]
    fn test_apply_restores_on_failed_verification() {
        let dir = TempDir::new().unwrap();
        let target = target_with(&dir, "a: 1\n");
        let err = target
            .apply(
                ApplyOptions::stage("test"),
                |_| Ok(Edit::replace("a: 2\n".to_string(), ())),
                |_| Err(ReconcileError::pattern_mismatch("test", "rejected")),
            )
            .unwrap_err();
        assert!(matches!(err, ReconcileError::PatternMismatch { .. }));
        assert_eq!(target.read().unwrap(), "a: 1\n");
    }

    #[test]
    fn test_apply_restores_unparseable_result() {
        let dir = TempDir::new().unwrap();
        let target = target_with(&dir, "a: 1\n");
        let err = target
            .apply(
                ApplyOptions::stage("test"),
                |_| Ok(Edit::replace("a: [\n".to_string(), ())),
                no_verify,
            )
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Parse { .. }));
        assert_eq!(target.read().unwrap(), "a: 1\n");
    }

    fn append(line: &'static str) -> impl Fn(&str) -> Result<Edit<()>> {
        move |text: &str| Ok(Edit::replace(format!("{}{}", text, line), ()))
    }

    #[test]
    fn test_transaction_writes_once_with_backup() {
        let dir = TempDir::new().unwrap();
        let target = target_with(&dir, "a: 1\n");
        target
            .transaction(ApplyOptions::stage("run").with_backup(), || {
                target.apply(ApplyOptions::stage("first"), append("b: 2\n"), no_verify)?;
                assert_eq!(fs::read_to_string(target.path()).unwrap(), "a: 1\n");
                target.apply(ApplyOptions::stage("second"), append("c: 3\n"), no_verify)
            })
            .unwrap();
        assert_eq!(fs::read_to_string(target.path()).unwrap(), "a: 1\nb: 2\nc: 3\n");
        assert_eq!(fs::read_to_string(target.backup_path()).unwrap(), "a: 1\n");
        assert_eq!(target.pending(), None);
    }

    #[test]
    fn test_failed_transaction_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let target = target_with(&dir, "a: 1\n");
        let err = target
            .transaction(ApplyOptions::stage("run").with_backup(), || {
                target.apply(ApplyOptions::stage("first"), append("b: 2\n"), no_verify)?;
                target.apply(
                    ApplyOptions::stage("second"),
                    |_| -> Result<Edit<()>> {
                        Err(ReconcileError::UnresolvedReferences {
                            names: vec!["Missing".to_string()],
                        })
                    },
                    no_verify,
                )
            })
            .unwrap_err();
        assert!(matches!(err, ReconcileError::UnresolvedReferences { .. }));
        assert_eq!(target.read().unwrap(), "a: 1\n");
        assert!(!target.backup_path().exists());
    }

    #[test]
    fn test_dry_run_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let target = target_with(&dir, "a: 1\n").with_dry_run(true);
        target
            .apply(
                ApplyOptions::stage("test").with_backup(),
                |_| Ok(Edit::replace("a: 2\n".to_string(), ())),
                no_verify,
            )
            .unwrap();
        assert_eq!(fs::read_to_string(target.path()).unwrap(), "a: 1\n");
        assert!(!target.backup_path().exists());
        assert_eq!(target.read().unwrap(), "a: 2\n");
        assert_eq!(target.pending().as_deref(), Some("a: 2\n"));
    }
}
