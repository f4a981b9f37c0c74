//! Markdown narrative of a diff report.

use super::report::DiffReport;
use crate::error::{ReconcileError, Result};
use std::fmt;
use std::fs;
use std::path::Path;

/// Severity of a difference for consumers of the target document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Removing or changing something clients may rely on.
    Breaking,
    NonBreaking,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Breaking => f.write_str("Breaking"),
            Severity::NonBreaking => f.write_str("Non-breaking"),
        }
    }
}

/// Item is one line of the narrative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub severity: Severity,
    pub text: String,
}

/// Narrative is a human-readable rendering of a [`DiffReport`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Narrative {
    items: Vec<Item>,
}

impl Narrative {
    pub fn from_report(report: &DiffReport) -> Self {
        let mut narrative = Narrative::default();
        for name in &report.extra_schemas {
            narrative.push(Severity::Breaking, format!("schema `{}` is not in the reference", name));
        }
        for (schema, fields) in &report.extra_fields {
            for field in fields {
                narrative.push(
                    Severity::Breaking,
                    format!("field `{}.{}` is not in the reference", schema, field),
                );
            }
        }
        for name in &report.extra_parameters {
            narrative.push(
                Severity::Breaking,
                format!("parameter `{}` is not in the reference", name),
            );
        }
        for path in &report.extra_paths {
            narrative.push(Severity::Breaking, format!("path `{}` is not in the reference", path));
        }
        for mismatch in &report.field_type_mismatches {
            narrative.push(
                Severity::Breaking,
                format!(
                    "field `{}.{}` has type `{}`, reference has `{}`",
                    mismatch.schema,
                    mismatch.field,
                    mismatch.target_type.as_deref().unwrap_or("none"),
                    mismatch.reference_type.as_deref().unwrap_or("none"),
                ),
            );
        }
        for mismatch in &report.nullable_mismatches {
            narrative.push(
                Severity::Breaking,
                format!(
                    "field `{}.{}` is {}nullable, reference says {}",
                    mismatch.schema,
                    mismatch.field,
                    if mismatch.target_nullable { "" } else { "not " },
                    mismatch.reference_nullable,
                ),
            );
        }

        for schema in &report.missing_schemas {
            narrative.push(
                Severity::NonBreaking,
                format!("add schema `{}` ({} fields)", schema.name, schema.fields.len()),
            );
        }
        for (schema, fields) in &report.missing_fields_in_schemas {
            for field in fields {
                let kind = field
                    .field_type
                    .as_deref()
                    .or(field.reference.as_deref())
                    .unwrap_or("untyped");
                narrative.push(
                    Severity::NonBreaking,
                    format!("add field `{}.{}` ({})", schema, field.field, kind),
                );
            }
        }
        for parameter in &report.missing_parameters {
            let location = parameter.location.as_deref().unwrap_or("unspecified");
            narrative.push(
                Severity::NonBreaking,
                format!("add parameter `{}` (in {})", parameter.name, location),
            );
        }
        for path in &report.missing_paths {
            narrative.push(
                Severity::NonBreaking,
                format!("add path `{}` ({})", path.path, path.methods.join(", ")),
            );
        }
        for missing in &report.missing_examples {
            narrative.push(
                Severity::NonBreaking,
                format!("add example to field `{}.{}`", missing.schema, missing.field),
            );
        }
        narrative
    }

    fn push(&mut self, severity: Severity, text: String) {
        self.items.push(Item { severity, text });
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn of_severity(&self, severity: Severity) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(move |i| i.severity == severity)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Writes the Markdown rendering.
    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_string()).map_err(|e| ReconcileError::io(path, e))
    }
}

impl fmt::Display for Narrative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# OpenAPI differences")?;
        if self.is_empty() {
            writeln!(f)?;
            return writeln!(f, "The target matches the reference.");
        }
        for severity in [Severity::Breaking, Severity::NonBreaking] {
            let items: Vec<&Item> = self.of_severity(severity).collect();
            if items.is_empty() {
                continue;
            }
            writeln!(f)?;
            writeln!(f, "## {} ({})", severity, items.len())?;
            writeln!(f)?;
            for item in items {
                writeln!(f, "- {}", item.text)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{MissingExample, NullableMismatch, PathDetail, SchemaDetail};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_grouping_by_severity() {
        let report = DiffReport {
            missing_schemas: vec![SchemaDetail {
                name: "Foo".into(),
                schema_type: Some("object".into()),
                description: None,
                fields: vec!["a".into(), "b".into()],
            }],
            missing_paths: vec![PathDetail {
                path: "/users".into(),
                methods: vec!["get".into()],
            }],
            missing_examples: vec![MissingExample {
                schema: "Qux".into(),
                field: "amount".into(),
                example: serde_json::json!(12.5),
            }],
            nullable_mismatches: vec![NullableMismatch {
                schema: "Qux".into(),
                field: "amount".into(),
                reference_nullable: true,
                target_nullable: false,
            }],
            extra_schemas: vec!["Bar".into()],
            ..DiffReport::default()
        };
        let narrative = Narrative::from_report(&report);
        assert_eq!(narrative.of_severity(Severity::Breaking).count(), 2);
        assert_eq!(narrative.of_severity(Severity::NonBreaking).count(), 3);
        assert_eq!(
            narrative.to_string(),
            "\
# OpenAPI differences

## Breaking (2)

- schema `Bar` is not in the reference
- field `Qux.amount` is not nullable, reference says true

## Non-breaking (3)

- add schema `Foo` (2 fields)
- add path `/users` (get)
- add example to field `Qux.amount`
"
        );
    }

    #[test]
    fn test_empty_narrative() {
        let narrative = Narrative::from_report(&DiffReport::default());
        assert!(narrative.is_empty());
        assert!(narrative.to_string().contains("matches the reference"));
    }
}
