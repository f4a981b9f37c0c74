//! Rewriting external references into internal pointers.

use super::pointer::{scan_refs, RefNamespace, RefOccurrence, RefRules};
use crate::document::StructuredDocument;
use crate::error::{ReconcileError, Result};
use crate::namespace::{Layout, Namespace};
use crate::text::{apply_regions, TextRegion};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// KnownEntities lists the components a target document actually defines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownEntities {
    pub schemas: BTreeSet<String>,
    pub parameters: BTreeSet<String>,
}

impl KnownEntities {
    pub fn from_document(document: &StructuredDocument) -> Self {
        KnownEntities {
            schemas: document.names(&Namespace::Schema),
            parameters: document.names(&Namespace::Parameter),
        }
    }

    pub fn contains(&self, namespace: RefNamespace, name: &str) -> bool {
        match namespace {
            RefNamespace::Schemas => self.schemas.contains(name),
            RefNamespace::Parameters => self.parameters.contains(name),
        }
    }
}

/// Rewrite is the result of a successful rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    /// Rewritten references as `(from, to)`, in document order.
    pub rewritten: Vec<(String, String)>,
}

/// ReferenceRewriter turns external references into internal ones.
#[derive(Debug, Clone, Default)]
pub struct ReferenceRewriter {
    rules: RefRules,
}

impl ReferenceRewriter {
    pub fn new(rules: RefRules) -> Self {
        ReferenceRewriter { rules }
    }

    pub fn rules(&self) -> &RefRules {
        &self.rules
    }

    /// External references in `text`.
    pub fn scan(&self, text: &str) -> Vec<RefOccurrence> {
        scan_refs(text)
            .into_iter()
            .filter(RefOccurrence::is_external)
            .collect()
    }

    /// Computes the edits for every external reference.
    ///
    /// Fails without producing any edit when at least one reference does not
    /// name an entity in `known`; the error lists every such name.
    pub fn plan(&self, text: &str, known: &KnownEntities) -> Result<Vec<(RefOccurrence, String)>> {
        let mut planned = Vec::new();
        let mut unresolved = BTreeSet::new();
        for occurrence in self.scan(text) {
            match self.rules.classify(&occurrence) {
                Some((namespace, name)) if known.contains(namespace, &name) => {
                    let pointer = namespace.pointer(&name);
                    planned.push((occurrence, pointer));
                }
                Some((_, name)) => {
                    unresolved.insert(name);
                }
                None => {
                    unresolved.insert(occurrence.raw.clone());
                }
            }
        }
        if !unresolved.is_empty() {
            return Err(ReconcileError::UnresolvedReferences {
                names: unresolved.into_iter().collect(),
            });
        }
        Ok(planned)
    }

    /// Rewrites every external reference, or nothing at all.
    pub fn rewrite(&self, text: &str, known: &KnownEntities) -> Result<Rewrite> {
        let planned = self.plan(text, known)?;
        let mut rewritten = Vec::with_capacity(planned.len());
        let regions: Vec<TextRegion> = planned
            .into_iter()
            .map(|(occurrence, pointer)| {
                debug!(from = %occurrence.raw, to = %pointer, "rewriting reference");
                let region = TextRegion::replace(
                    occurrence.range.clone(),
                    occurrence.replacement(&pointer),
                );
                rewritten.push((occurrence.raw, pointer));
                region
            })
            .collect();
        let text = apply_regions(text, regions)?;
        info!(count = rewritten.len(), "rewrote external references");
        Ok(Rewrite { text, rewritten })
    }

    /// Post-condition: no external reference remains.
    pub fn verify(&self, text: &str) -> Result<()> {
        let remaining: BTreeSet<String> = self.scan(text).into_iter().map(|o| o.raw).collect();
        if remaining.is_empty() {
            Ok(())
        } else {
            Err(ReconcileError::UnresolvedReferences {
                names: remaining.into_iter().collect(),
            })
        }
    }

    /// Rewrites references inside a block copied out of a reference document.
    ///
    /// No resolution check happens here. External references that classify
    /// are made internal, and in a models file the local `#/Name` form means
    /// a schema.
    pub fn rewrite_inline(&self, block: &str, layout: Layout) -> String {
        let regions: Vec<TextRegion> = scan_refs(block)
            .into_iter()
            .filter_map(|occurrence| {
                let pointer = if occurrence.is_external() {
                    let (namespace, name) = self.rules.classify(&occurrence)?;
                    namespace.pointer(&name)
                } else if layout == Layout::Models && occurrence.pointer.len() == 1 {
                    RefNamespace::Schemas.pointer(&occurrence.pointer[0])
                } else {
                    return None;
                };
                Some(TextRegion::replace(
                    occurrence.range.clone(),
                    occurrence.replacement(&pointer),
                ))
            })
            .collect();
        // Regions come from one scan and cannot overlap.
        apply_regions(block, regions).unwrap_or_else(|_| block.to_string())
    }
}
