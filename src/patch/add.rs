//! Adding missing entities from the reference.

use super::outcome::{Outcome, Outcomes};
use super::patcher::{insertion, section_path, yaml_key, Patched, Patcher};
use crate::document::LoadedDocument;
use crate::error::{ReconcileError, Result};
use crate::namespace::{Layout, Namespace};
use crate::text::{apply_regions, reindent, Lookup, Outline, Section, TextRegion};
use tracing::{debug, warn};

impl Patcher {
    /// Copies the definitions of `names` from the reference into the target.
    ///
    /// Names already present in the target are skipped, and names the
    /// reference does not define are recorded as skipped. All copied blocks
    /// are re-indented to the target depth, have their references made
    /// internal, and are inserted together at the end of the destination
    /// section. A destination section that does not exist yet is created.
    pub fn add<'n>(
        &self,
        target: &str,
        reference: &LoadedDocument,
        namespace: &Namespace,
        names: impl IntoIterator<Item = &'n String>,
    ) -> Result<Patched> {
        let mut outcomes = Outcomes::new();
        let outline = Outline::new(target);
        let lookup = self.target_section(&outline, namespace)?;
        let target_indent = section_path(namespace, Layout::Components)?.len() * self.unit;

        let source = Outline::new(&reference.text);
        let source_section = match namespace.section_path(reference.layout()) {
            Some(path) => match source.section(&path, self.unit)? {
                Lookup::Found(section) => Some(section),
                Lookup::Missing { .. } => None,
            },
            None => None,
        };

        let mut blocks = String::new();
        for name in names {
            if let Lookup::Found(section) = &lookup {
                if outline.child(section, name).is_some() {
                    debug!(namespace = %namespace, name = %name, "already present");
                    outcomes.record(namespace, name.as_str(), Outcome::AlreadyPresent);
                    continue;
                }
            }
            let Some(block) = source_section
                .as_ref()
                .and_then(|section| source.child(section, name))
            else {
                warn!(namespace = %namespace, name = %name, "definition not found in reference");
                outcomes.record(
                    namespace,
                    name.as_str(),
                    Outcome::Skipped(ReconcileError::entity_not_found(
                        namespace.noun(),
                        namespace.qualify(name),
                        reference.name(),
                    )),
                );
                continue;
            };
            let copied = reindent(source.slice(block.lines()), block.indent, target_indent);
            blocks.push_str(&self.rewriter.rewrite_inline(&copied, reference.layout()));
            debug!(namespace = %namespace, name = %name, "adding definition");
            outcomes.record(namespace, name.as_str(), Outcome::Applied);
        }

        if blocks.is_empty() {
            return Ok(Patched::unchanged(target, outcomes));
        }

        let region = match lookup {
            Lookup::Found(section) => {
                let at = outline.offset(outline.end_of_entries(&section));
                insertion(target, at, blocks)
            }
            Lookup::Missing { parent, remaining } => {
                self.synthesize(&outline, namespace, &parent, &remaining, blocks)
            }
        };
        let text = apply_regions(target, vec![region])?;
        Ok(Patched { text, outcomes })
    }

    /// Builds the headers of a missing section and places them with `blocks`.
    fn synthesize(
        &self,
        outline: &Outline<'_>,
        namespace: &Namespace,
        parent: &Section,
        remaining: &[String],
        blocks: String,
    ) -> TextRegion {
        let mut text = String::new();
        for (depth, segment) in remaining.iter().enumerate() {
            let indent = parent.indent + depth * self.unit;
            text.push_str(&" ".repeat(indent));
            text.push_str(&yaml_key(segment));
            text.push_str(":\n");
        }
        text.push_str(&blocks);

        let sentinel = namespace
            .sentinel()
            .filter(|s| s.parent.iter().copied().eq(parent.path.iter().map(String::as_str)))
            .and_then(|s| outline.child(parent, s.before));
        let line = match sentinel {
            Some(block) => block.header,
            None => outline.end_of_entries(parent),
        };
        debug!(
            namespace = %namespace,
            parent = %parent.location(),
            "creating section"
        );
        insertion(outline.source(), outline.offset(line), text)
    }
}
