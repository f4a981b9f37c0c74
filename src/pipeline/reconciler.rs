//! The stage runner.

use super::summary::RunSummary;
use crate::config::ReconcileConfig;
use crate::diff::{DiffSet, Differ};
use crate::document::{no_verify, ApplyOptions, Edit, LoadedDocument, ReferenceSet, TargetFile};
use crate::error::{ReconcileError, Result};
use crate::namespace::{Layout, Namespace};
use crate::patch::{Outcome, Outcomes, Patcher};
use crate::refs::{KnownEntities, ReferenceRewriter};
use crate::report::DiffReport;
use crate::validate::{dangling_references, validate_document, ValidationError, ValidationErrors};
use tracing::{info, warn};

/// Reconciler runs reconciliation stages of one reference set against one
/// target file.
#[derive(Debug)]
pub struct Reconciler {
    reference: ReferenceSet,
    target: TargetFile,
    patcher: Patcher,
}

impl Reconciler {
    pub fn new(reference: ReferenceSet, target: TargetFile) -> Self {
        Reconciler {
            reference,
            target,
            patcher: Patcher::default(),
        }
    }

    /// Applies indentation, backup naming and reference rules from a configuration.
    pub fn from_config(config: &ReconcileConfig, reference: ReferenceSet, target: TargetFile) -> Self {
        let rewriter = ReferenceRewriter::new(config.external_refs.clone());
        Reconciler {
            reference,
            target: target.with_backup_suffix(config.backup_suffix.clone()),
            patcher: Patcher::new(config.indent_unit, rewriter),
        }
    }

    pub fn reference(&self) -> &ReferenceSet {
        &self.reference
    }

    pub fn target(&self) -> &TargetFile {
        &self.target
    }

    fn current(&self, text: &str) -> Result<LoadedDocument> {
        LoadedDocument::from_text(self.target.path(), text.to_string(), Layout::Components)
    }

    /// Diffs the reference against the current target.
    pub fn diff(&self) -> Result<DiffSet> {
        let target = self.target.load()?;
        let diffs = Differ::new(&self.reference, &target.tree).all();
        info!(
            missing_schemas = diffs.schemas.missing.len(),
            missing_parameters = diffs.parameters.missing.len(),
            missing_paths = diffs.paths.missing.len(),
            schemas_with_field_drift = diffs.fields.len(),
            findings = diffs.findings.len(),
            "computed diff"
        );
        Ok(diffs)
    }

    /// Builds the report of the current diff.
    pub fn report(&self) -> Result<DiffReport> {
        Ok(DiffReport::build(&self.diff()?, &self.reference))
    }

    /// Adds missing schemas, parameters, paths and fields, in that order.
    pub fn add_missing(&self) -> Result<Outcomes> {
        let mut outcomes = Outcomes::new();
        for (stage, namespace) in [
            ("add schemas", Namespace::Schema),
            ("add parameters", Namespace::Parameter),
            ("add paths", Namespace::Path),
        ] {
            outcomes.extend(self.add_namespace(stage, &namespace)?);
        }
        outcomes.extend(self.add_fields()?);
        Ok(outcomes)
    }

    fn add_namespace(&self, stage: &'static str, namespace: &Namespace) -> Result<Outcomes> {
        let source = self.reference.source_for(namespace);
        self.target.apply(
            ApplyOptions::stage(stage),
            |text| {
                let current = self.current(text)?;
                let diff = Differ::new(&self.reference, &current.tree).namespace(namespace);
                if !diff.has_missing() {
                    return Ok(Edit::unchanged(Outcomes::new()));
                }
                let patched = self.patcher.add(text, source, namespace, &diff.missing)?;
                Ok(Edit::replace(patched.text, patched.outcomes))
            },
            no_verify,
        )
    }

    fn add_fields(&self) -> Result<Outcomes> {
        let source = self.reference.source_for(&Namespace::Schema);
        self.target.apply(
            ApplyOptions::stage("add fields"),
            |text| {
                let current = self.current(text)?;
                let diffs = Differ::new(&self.reference, &current.tree).fields();
                let mut text = text.to_string();
                let mut outcomes = Outcomes::new();
                for diff in diffs.iter().filter(|d| d.has_missing()) {
                    match self.patcher.add(&text, source, &diff.namespace, &diff.missing) {
                        Ok(patched) => {
                            text = patched.text;
                            outcomes.extend(patched.outcomes);
                        }
                        // The schema's own layout is unusual; the other schemas still get their fields.
                        Err(ReconcileError::PatternMismatch { location, message }) => {
                            warn!(namespace = %diff.namespace, %location, %message, "skipping schema");
                            for name in &diff.missing {
                                outcomes.record(
                                    &diff.namespace,
                                    name.as_str(),
                                    Outcome::Skipped(ReconcileError::pattern_mismatch(
                                        location.clone(),
                                        message.clone(),
                                    )),
                                );
                            }
                        }
                        Err(err) => return Err(err),
                    }
                }
                Ok(Edit::replace(text, outcomes))
            },
            no_verify,
        )
    }

    /// Replaces inline path parameters with references to components.
    pub fn convert(&self) -> Result<Outcomes> {
        self.target.apply(
            ApplyOptions::stage("convert"),
            |text| {
                let current = self.current(text)?;
                let components = current.tree.section(&Namespace::Parameter);
                let patched = self.patcher.convert_inline_parameters(text, components)?;
                Ok(Edit::replace(patched.text, patched.outcomes))
            },
            no_verify,
        )
    }

    /// Removes fields, schemas, parameters and paths the reference lacks.
    ///
    /// The target is backed up first. The removal is rolled back when it
    /// leaves an internal reference dangling that resolved before.
    pub fn remove_extra(&self) -> Result<Outcomes> {
        let before = dangling_references(&self.target.load()?.tree);
        self.target.apply(
            ApplyOptions::stage("prune").with_backup(),
            |text| {
                let current = self.current(text)?;
                let diffs = Differ::new(&self.reference, &current.tree).all();
                let mut text = text.to_string();
                let mut outcomes = Outcomes::new();
                for diff in diffs
                    .fields
                    .iter()
                    .chain([&diffs.schemas, &diffs.parameters, &diffs.paths])
                {
                    if !diff.has_extra() {
                        continue;
                    }
                    let patched = self.patcher.remove(&text, &diff.namespace, &diff.extra)?;
                    text = patched.text;
                    outcomes.extend(patched.outcomes);
                }
                Ok(Edit::replace(text, outcomes))
            },
            |text| {
                let after = dangling_references(&self.current(text)?.tree);
                let mut errors = ValidationErrors::new();
                for reference in after.difference(&before) {
                    errors.add(ValidationError::DanglingReference {
                        path: "after removal".to_string(),
                        reference: reference.clone(),
                    });
                }
                errors.into_result().map_err(ReconcileError::Validation)
            },
        )
    }

    /// Rewrites external references into internal ones.
    ///
    /// Either every external reference resolves and all are rewritten, or
    /// the target is left untouched.
    pub fn rewrite(&self) -> Result<Vec<(String, String)>> {
        let rewriter = self.patcher.rewriter();
        self.target.apply(
            ApplyOptions::stage("rewrite").with_backup(),
            |text| {
                if rewriter.scan(text).is_empty() {
                    return Ok(Edit::unchanged(Vec::new()));
                }
                let current = self.current(text)?;
                let rewrite = rewriter.rewrite(text, &KnownEntities::from_document(&current.tree))?;
                Ok(Edit::replace(rewrite.text, rewrite.rewritten))
            },
            |text| rewriter.verify(text),
        )
    }

    /// Copies drifting `type`, `nullable` and `example` attributes from the reference.
    pub fn align_fields(&self) -> Result<Outcomes> {
        let source = self.reference.source_for(&Namespace::Schema);
        self.target.apply(
            ApplyOptions::stage("fix-fields"),
            |text| {
                let current = self.current(text)?;
                let findings = Differ::new(&self.reference, &current.tree).field_findings();
                if findings.is_empty() {
                    return Ok(Edit::unchanged(Outcomes::new()));
                }
                let patched = self.patcher.align_fields(text, source, &findings)?;
                Ok(Edit::replace(patched.text, patched.outcomes))
            },
            no_verify,
        )
    }

    /// Validates the current target.
    pub fn validate(&self) -> Result<()> {
        let current = self.target.load()?;
        validate_document(&current.tree).map_err(ReconcileError::Validation)?;
        info!(target = %self.target.path().display(), "target is valid");
        Ok(())
    }

    /// Runs diff, add, convert, rewrite and validate as one transaction.
    ///
    /// The target is written only if every stage succeeds and the final
    /// text validates. On failure the summary carries the error together
    /// with whatever the stages before it reported.
    pub fn sync(&self) -> RunSummary {
        let mut summary = self.summary();
        let result = self
            .target
            .transaction(ApplyOptions::stage("sync").with_backup(), || {
                summary.report = Some(self.report()?);
                summary.outcomes.extend(self.add_missing()?);
                summary.outcomes.extend(self.convert()?);
                summary.rewritten = self.rewrite()?;
                self.validate()
            });
        self.finish("sync", summary, result)
    }

    /// Removes extra entities and validates the result, as one transaction.
    pub fn prune(&self) -> RunSummary {
        let mut summary = self.summary();
        let result = self
            .target
            .transaction(ApplyOptions::stage("prune").with_backup(), || {
                summary.outcomes.extend(self.remove_extra()?);
                self.validate()
            });
        self.finish("prune", summary, result)
    }

    /// Aligns field attributes and validates the result, as one transaction.
    pub fn fix_fields(&self) -> RunSummary {
        let mut summary = self.summary();
        let result = self
            .target
            .transaction(ApplyOptions::stage("fix-fields"), || {
                summary.outcomes.extend(self.align_fields()?);
                self.validate()
            });
        self.finish("fix-fields", summary, result)
    }

    fn summary(&self) -> RunSummary {
        RunSummary {
            dry_run: self.target.is_dry_run(),
            ..RunSummary::default()
        }
    }

    fn finish(&self, run: &'static str, mut summary: RunSummary, result: Result<()>) -> RunSummary {
        match result {
            Ok(()) => summary.validated = true,
            Err(err) => summary.failure = Some(err),
        }
        info!(
            run,
            applied = summary.outcomes.applied().count(),
            attention = summary.outcomes.needs_attention().count(),
            failed = summary.failure.is_some(),
            "run finished"
        );
        summary
    }
}
