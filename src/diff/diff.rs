//! Diff result types.

use crate::namespace::Namespace;
use serde_yaml::Value;
use std::collections::BTreeSet;
use std::fmt;

/// Diff holds the three-way split of one namespace's names.
///
/// `missing` and `extra` are disjoint; `missing ∪ common` is the reference's
/// name set and `extra ∪ common` is the target's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    pub namespace: Namespace,
    /// Names in the reference but not the target.
    pub missing: BTreeSet<String>,
    /// Names in the target but not the reference.
    pub extra: BTreeSet<String>,
    /// Names in both.
    pub common: BTreeSet<String>,
}

impl Diff {
    /// Computes the diff of two name sets.
    pub fn between(
        namespace: Namespace,
        reference: &BTreeSet<String>,
        target: &BTreeSet<String>,
    ) -> Self {
        Diff {
            namespace,
            missing: reference.difference(target).cloned().collect(),
            extra: target.difference(reference).cloned().collect(),
            common: reference.intersection(target).cloned().collect(),
        }
    }

    /// Returns true if nothing needs to be added or removed.
    pub fn is_same(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }

    pub fn has_missing(&self) -> bool {
        !self.missing.is_empty()
    }

    pub fn has_extra(&self) -> bool {
        !self.extra.is_empty()
    }
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} missing, {} extra, {} common",
            self.namespace,
            self.missing.len(),
            self.extra.len(),
            self.common.len()
        )?;
        for name in &self.missing {
            write!(f, "\n  + {}", self.namespace.qualify(name))?;
        }
        for name in &self.extra {
            write!(f, "\n  - {}", self.namespace.qualify(name))?;
        }
        Ok(())
    }
}

/// FieldFinding is attribute drift on a field present in both documents.
///
/// Findings are reported but never fixed by add or remove.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFinding {
    TypeMismatch {
        schema: String,
        field: String,
        reference: Option<String>,
        target: Option<String>,
    },
    NullableMismatch {
        schema: String,
        field: String,
        reference: bool,
        target: bool,
    },
    MissingExample {
        schema: String,
        field: String,
        example: Value,
    },
}

impl FieldFinding {
    pub fn schema(&self) -> &str {
        match self {
            FieldFinding::TypeMismatch { schema, .. }
            | FieldFinding::NullableMismatch { schema, .. }
            | FieldFinding::MissingExample { schema, .. } => schema,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            FieldFinding::TypeMismatch { field, .. }
            | FieldFinding::NullableMismatch { field, .. }
            | FieldFinding::MissingExample { field, .. } => field,
        }
    }

    /// The schema attribute the finding concerns.
    pub fn attribute(&self) -> &'static str {
        match self {
            FieldFinding::TypeMismatch { .. } => "type",
            FieldFinding::NullableMismatch { .. } => "nullable",
            FieldFinding::MissingExample { .. } => "example",
        }
    }
}

impl fmt::Display for FieldFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |t: &Option<String>| t.clone().unwrap_or_else(|| "<none>".to_string());
        match self {
            FieldFinding::TypeMismatch {
                schema,
                field,
                reference,
                target,
            } => write!(
                f,
                "{}.{}: type {} in reference, {} in target",
                schema,
                field,
                show(reference),
                show(target)
            ),
            FieldFinding::NullableMismatch {
                schema,
                field,
                reference,
                target,
            } => write!(
                f,
                "{}.{}: nullable {} in reference, {} in target",
                schema, field, reference, target
            ),
            FieldFinding::MissingExample { schema, field, .. } => {
                write!(f, "{}.{}: example missing in target", schema, field)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_between_partitions_names() {
        let reference = set(&["a", "b", "c"]);
        let target = set(&["b", "c", "d"]);
        let diff = Diff::between(Namespace::Schema, &reference, &target);

        assert_eq!(diff.missing, set(&["a"]));
        assert_eq!(diff.extra, set(&["d"]));
        assert_eq!(diff.common, set(&["b", "c"]));
        assert!(diff.missing.is_disjoint(&diff.extra));
        assert_eq!(&diff.missing | &diff.common, reference);
        assert_eq!(&diff.extra | &diff.common, target);
    }

    #[test]
    fn test_display() {
        let diff = Diff::between(
            Namespace::Field("Foo".into()),
            &set(&["a"]),
            &set(&["b"]),
        );
        let display = diff.to_string();
        assert!(display.contains("+ Foo.a"));
        assert!(display.contains("- Foo.b"));
    }
}
