//! Computing diffs between a reference set and a target document.

use super::diff::{Diff, FieldFinding};
use crate::document::{ReferenceSet, StructuredDocument};
use crate::namespace::Namespace;
use crate::openapi::typed_properties;
use serde_yaml::Value;
use std::fmt;

/// Differ compares the reference against the target. It never mutates either.
#[derive(Debug, Clone, Copy)]
pub struct Differ<'a> {
    reference: &'a ReferenceSet,
    target: &'a StructuredDocument,
}

impl<'a> Differ<'a> {
    pub fn new(reference: &'a ReferenceSet, target: &'a StructuredDocument) -> Self {
        Differ { reference, target }
    }

    /// Diffs a single namespace.
    pub fn namespace(&self, namespace: &Namespace) -> Diff {
        let reference = self.reference.tree_for(namespace).names(namespace);
        let target = self.target.names(namespace);
        Diff::between(namespace.clone(), &reference, &target)
    }

    /// Field diffs of every schema present in both documents.
    ///
    /// Only diffs with missing or extra fields are returned, ordered by
    /// schema name.
    pub fn fields(&self) -> Vec<Diff> {
        self.namespace(&Namespace::Schema)
            .common
            .iter()
            .map(|schema| self.namespace(&Namespace::Field(schema.clone())))
            .filter(|diff| !diff.is_same())
            .collect()
    }

    /// Attribute drift on fields common to both documents.
    pub fn field_findings(&self) -> Vec<FieldFinding> {
        let mut findings = Vec::new();
        for schema in &self.namespace(&Namespace::Schema).common {
            let (Some(reference), Some(target)) = (
                self.reference
                    .tree_for(&Namespace::Schema)
                    .entity(&Namespace::Schema, schema),
                self.target.entity(&Namespace::Schema, schema),
            ) else {
                continue;
            };
            let reference_fields = typed_properties(reference);
            let target_fields = typed_properties(target);

            for (field, expected) in &reference_fields {
                let Some(actual) = target_fields.get(field) else {
                    continue;
                };
                if expected.type_name() != actual.type_name() {
                    findings.push(FieldFinding::TypeMismatch {
                        schema: schema.clone(),
                        field: field.clone(),
                        reference: expected.type_name(),
                        target: actual.type_name(),
                    });
                }
                if expected.is_nullable() != actual.is_nullable() {
                    findings.push(FieldFinding::NullableMismatch {
                        schema: schema.clone(),
                        field: field.clone(),
                        reference: expected.is_nullable(),
                        target: actual.is_nullable(),
                    });
                }
                if expected.has_example && !actual.has_example {
                    findings.push(FieldFinding::MissingExample {
                        schema: schema.clone(),
                        field: field.clone(),
                        example: expected.example.clone().unwrap_or(Value::Null),
                    });
                }
            }
        }
        findings
    }

    /// Every namespace plus field findings.
    pub fn all(&self) -> DiffSet {
        DiffSet {
            schemas: self.namespace(&Namespace::Schema),
            parameters: self.namespace(&Namespace::Parameter),
            paths: self.namespace(&Namespace::Path),
            fields: self.fields(),
            findings: self.field_findings(),
        }
    }
}

/// DiffSet is the full result of one diff pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffSet {
    pub schemas: Diff,
    pub parameters: Diff,
    pub paths: Diff,
    /// Per-schema field diffs, only for schemas with missing or extra fields.
    pub fields: Vec<Diff>,
    pub findings: Vec<FieldFinding>,
}

impl DiffSet {
    /// Returns true if no namespace has missing or extra entities.
    ///
    /// Field findings do not count; they are fixed by a separate operation.
    pub fn is_reconciled(&self) -> bool {
        self.namespaces().all(Diff::is_same)
    }

    /// Every diff in the set, fields last.
    pub fn namespaces(&self) -> impl Iterator<Item = &Diff> {
        [&self.schemas, &self.parameters, &self.paths]
            .into_iter()
            .chain(self.fields.iter())
    }
}

impl fmt::Display for DiffSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diff) in self.namespaces().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", diff)?;
        }
        for finding in &self.findings {
            write!(f, "\n  ~ {}", finding)?;
        }
        Ok(())
    }
}
