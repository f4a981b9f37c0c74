//! Removing extra entities from the target.

use super::outcome::{Outcome, Outcomes};
use super::patcher::{Patched, Patcher};
use crate::error::{ReconcileError, Result};
use crate::namespace::Namespace;
use crate::text::{apply_regions, Lookup, Outline, TextRegion};
use std::ops::Range;
use tracing::{debug, warn};

impl Patcher {
    /// Deletes the definitions of `names` from the target.
    ///
    /// Each removed block takes one run of separator blank lines with it:
    /// the run after it when a sibling follows, otherwise the run before it.
    /// A section whose entries sit at an unexpected indentation leaves the
    /// text alone and marks every name as skipped.
    pub fn remove<'n>(
        &self,
        target: &str,
        namespace: &Namespace,
        names: impl IntoIterator<Item = &'n String>,
    ) -> Result<Patched> {
        let mut outcomes = Outcomes::new();
        let outline = Outline::new(target);
        let section = match self.target_section(&outline, namespace) {
            Ok(Lookup::Found(section)) => section,
            Ok(Lookup::Missing { .. }) => {
                for name in names {
                    outcomes.record(namespace, name.as_str(), Outcome::AlreadyAbsent);
                }
                return Ok(Patched::unchanged(target, outcomes));
            }
            Err(ReconcileError::PatternMismatch { location, message }) => {
                warn!(namespace = %namespace, %location, %message, "section layout not recognized");
                for name in names {
                    outcomes.record(
                        namespace,
                        name.as_str(),
                        Outcome::Skipped(ReconcileError::pattern_mismatch(
                            location.clone(),
                            message.clone(),
                        )),
                    );
                }
                return Ok(Patched::unchanged(target, outcomes));
            }
            Err(err) => return Err(err),
        };

        let children = outline.children(section.body.clone(), section.indent);
        let mut ranges = Vec::new();
        for name in names {
            let Some(index) = children.iter().position(|b| &b.name == name) else {
                debug!(namespace = %namespace, name = %name, "already absent");
                outcomes.record(namespace, name.as_str(), Outcome::AlreadyAbsent);
                continue;
            };
            let block = &children[index];
            let mut lines = block.lines();
            if let Some(next) = children.get(index + 1) {
                while lines.end < next.header && outline.line(lines.end).is_blank() {
                    lines.end += 1;
                }
            } else {
                while lines.start > section.body.start && outline.line(lines.start - 1).is_blank() {
                    lines.start -= 1;
                }
            }
            debug!(namespace = %namespace, name = %name, lines = ?lines, "removing definition");
            ranges.push(lines);
            outcomes.record(namespace, name.as_str(), Outcome::Applied);
        }

        if ranges.is_empty() {
            return Ok(Patched::unchanged(target, outcomes));
        }
        let regions = merge_ranges(ranges)
            .into_iter()
            .map(|lines| TextRegion::delete(outline.byte_range(lines)))
            .collect();
        let text = apply_regions(target, regions)?;
        Ok(Patched { text, outcomes })
    }
}

/// Merges overlapping or touching line ranges.
fn merge_ranges(mut ranges: Vec<Range<usize>>) -> Vec<Range<usize>> {
    ranges.sort_by_key(|r| r.start);
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_ranges() {
        assert_eq!(merge_ranges(vec![5..8, 0..2, 2..4, 7..9]), vec![0..4, 5..9]);
    }
}
