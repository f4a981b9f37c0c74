//! The patch applier and its shared helpers.

use super::outcome::Outcomes;
use crate::error::{ReconcileError, Result};
use crate::namespace::{Layout, Namespace};
use crate::refs::ReferenceRewriter;
use crate::text::{Lookup, Outline, TextRegion};

/// Patched is the text produced by an operation and what happened per entity.
#[derive(Debug)]
pub struct Patched {
    pub text: String,
    pub outcomes: Outcomes,
}

impl Patched {
    pub fn unchanged(text: &str, outcomes: Outcomes) -> Self {
        Patched {
            text: text.to_string(),
            outcomes,
        }
    }
}

/// Patcher applies add, remove, convert and align operations to raw text.
///
/// It owns no document; every call takes the current target text and
/// returns the new text.
#[derive(Debug, Clone)]
pub struct Patcher {
    pub(super) unit: usize,
    pub(super) rewriter: ReferenceRewriter,
}

impl Default for Patcher {
    fn default() -> Self {
        Patcher::new(2, ReferenceRewriter::default())
    }
}

impl Patcher {
    pub fn new(unit: usize, rewriter: ReferenceRewriter) -> Self {
        Patcher { unit, rewriter }
    }

    pub fn indent_unit(&self) -> usize {
        self.unit
    }

    pub fn rewriter(&self) -> &ReferenceRewriter {
        &self.rewriter
    }

    /// Locates a namespace's section in a target (components layout) outline.
    pub(super) fn target_section(&self, outline: &Outline<'_>, namespace: &Namespace) -> Result<Lookup> {
        let path = section_path(namespace, Layout::Components)?;
        outline.section(&path, self.unit)
    }
}

pub(super) fn section_path(namespace: &Namespace, layout: Layout) -> Result<Vec<String>> {
    namespace.section_path(layout).ok_or_else(|| {
        ReconcileError::pattern_mismatch(
            namespace.label(),
            format!("a {:?} document has no {} section", layout, namespace.label()),
        )
    })
}

/// Renders a mapping key, quoting it when a plain scalar would not read back.
pub(super) fn yaml_key(name: &str) -> String {
    let plain = !name.is_empty()
        && !name.contains(": ")
        && !name.contains(" #")
        && !name.ends_with(':')
        && !name.starts_with(|c: char| "-?:,[]{}#&*!|>'\"%@`".contains(c) || c.is_whitespace());
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

/// Inserts `text` at a byte offset, adding the newline a final line may lack.
pub(super) fn insertion(source: &str, at: usize, text: String) -> TextRegion {
    if at == source.len() && !source.is_empty() && !source.ends_with('\n') {
        TextRegion::insert(at, format!("\n{}", text))
    } else {
        TextRegion::insert(at, text)
    }
}
