//! Aligning attributes of fields present in both documents.

use super::outcome::{Outcome, Outcomes};
use super::patcher::{insertion, section_path, Patched, Patcher};
use crate::diff::FieldFinding;
use crate::document::LoadedDocument;
use crate::error::{ReconcileError, Result};
use crate::namespace::{Layout, Namespace};
use crate::text::{apply_regions, reindent, Lookup, Outline, Section, TextRegion};
use tracing::{debug, warn};

impl Patcher {
    /// Copies the drifting attribute of each finding from the reference
    /// field into the target field.
    ///
    /// The reference's child block (`type`, `nullable` or `example`) replaces
    /// the target's, or is appended to the field when the target lacks it.
    /// An attribute the reference leaves out is deleted from the target.
    /// Fields written in flow style are flagged and left alone.
    pub fn align_fields(
        &self,
        target: &str,
        reference: &LoadedDocument,
        findings: &[FieldFinding],
    ) -> Result<Patched> {
        let mut outcomes = Outcomes::new();
        let outline = Outline::new(target);
        let source = Outline::new(&reference.text);
        let mut regions = Vec::new();

        for finding in findings {
            let namespace = Namespace::Field(finding.schema().to_string());
            let field = finding.field();
            let attribute = finding.attribute();

            let located = self.field_section(&outline, &namespace, field, Layout::Components);
            let target_field = match located {
                Ok(Some(section)) => section,
                Ok(None) => {
                    outcomes.record(
                        &namespace,
                        field,
                        Outcome::Skipped(ReconcileError::entity_not_found(
                            "field",
                            namespace.qualify(field),
                            "target",
                        )),
                    );
                    continue;
                }
                Err(err) => {
                    warn!(field = %namespace.qualify(field), error = %err, "field layout not recognized");
                    outcomes.record(&namespace, field, Outcome::Flagged(err.to_string()));
                    continue;
                }
            };
            let located = self.field_section(&source, &namespace, field, reference.layout());
            let reference_field = match located {
                Ok(Some(section)) => section,
                Ok(None) | Err(_) => {
                    outcomes.record(
                        &namespace,
                        field,
                        Outcome::Skipped(ReconcileError::entity_not_found(
                            "field",
                            namespace.qualify(field),
                            reference.name(),
                        )),
                    );
                    continue;
                }
            };

            let current = outline.child(&target_field, attribute);
            let region = match source.child(&reference_field, attribute) {
                Some(block) => {
                    let text = reindent(
                        source.slice(block.lines()),
                        reference_field.indent,
                        target_field.indent,
                    );
                    match current {
                        Some(existing) => {
                            TextRegion::replace(outline.byte_range(existing.lines()), text)
                        }
                        None => {
                            let at = outline.offset(outline.end_of_entries(&target_field));
                            insertion(target, at, text)
                        }
                    }
                }
                None => match current {
                    Some(existing) => TextRegion::delete(outline.byte_range(existing.lines())),
                    None => {
                        outcomes.record(&namespace, field, Outcome::AlreadyPresent);
                        continue;
                    }
                },
            };
            debug!(field = %namespace.qualify(field), attribute, "aligning attribute");
            regions.push(region);
            outcomes.record(&namespace, field, Outcome::Applied);
        }

        if regions.is_empty() {
            return Ok(Patched::unchanged(target, outcomes));
        }
        let text = apply_regions(target, regions)?;
        Ok(Patched { text, outcomes })
    }

    /// Locates the mapping of a single field.
    fn field_section(
        &self,
        outline: &Outline<'_>,
        namespace: &Namespace,
        field: &str,
        layout: Layout,
    ) -> Result<Option<Section>> {
        let mut path = section_path(namespace, layout)?;
        path.push(field.to_string());
        match outline.section(&path, self.unit)? {
            Lookup::Found(section) => Ok(Some(section)),
            Lookup::Missing { .. } => Ok(None),
        }
    }
}
