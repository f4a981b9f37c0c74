//! The structured diff report.

use crate::diff::{Diff, DiffSet, FieldFinding};
use crate::document::ReferenceSet;
use crate::error::{ReconcileError, Result};
use crate::namespace::Namespace;
use crate::openapi::{operation_methods, ParameterObject, SchemaObject};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// A schema the target lacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDetail {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<String>,
}

/// A field the target's copy of a schema lacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDetail {
    pub field: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub nullable: bool,
    /// Target of a `$ref` field.
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// A component parameter the target lacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDetail {
    pub name: String,
    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A path the target lacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathDetail {
    pub path: String,
    #[serde(default)]
    pub methods: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeMismatch {
    pub schema: String,
    pub field: String,
    pub reference_type: Option<String>,
    pub target_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullableMismatch {
    pub schema: String,
    pub field: String,
    pub reference_nullable: bool,
    pub target_nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingExample {
    pub schema: String,
    pub field: String,
    pub example: serde_json::Value,
}

/// Counts for one namespace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceCounts {
    pub missing: usize,
    pub extra: usize,
    pub common: usize,
}

impl NamespaceCounts {
    fn of(diff: &Diff) -> Self {
        NamespaceCounts {
            missing: diff.missing.len(),
            extra: diff.extra.len(),
            common: diff.common.len(),
        }
    }
}

/// Summary holds the per-namespace counts of a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub schemas: NamespaceCounts,
    pub parameters: NamespaceCounts,
    pub paths: NamespaceCounts,
    /// Missing and extra fields summed over every common schema.
    pub fields: NamespaceCounts,
    pub field_type_mismatches: usize,
    pub nullable_mismatches: usize,
    pub missing_examples: usize,
}

/// DiffReport is the persisted artifact of a diff.
///
/// Missing entries carry enough detail to drive an add without rereading
/// the reference. Keys for target-only entities keep their historical
/// `_in_mx` suffix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffReport {
    pub missing_schemas: Vec<SchemaDetail>,
    pub missing_fields_in_schemas: BTreeMap<String, Vec<FieldDetail>>,
    pub missing_parameters: Vec<ParameterDetail>,
    pub missing_paths: Vec<PathDetail>,
    pub field_type_mismatches: Vec<TypeMismatch>,
    pub missing_examples: Vec<MissingExample>,
    pub nullable_mismatches: Vec<NullableMismatch>,
    #[serde(rename = "extra_schemas_in_mx")]
    pub extra_schemas: Vec<String>,
    #[serde(rename = "extra_fields_in_schemas")]
    pub extra_fields: BTreeMap<String, Vec<String>>,
    #[serde(rename = "extra_parameters_in_mx")]
    pub extra_parameters: Vec<String>,
    #[serde(rename = "extra_paths_in_mx")]
    pub extra_paths: Vec<String>,
    pub summary: Summary,
}

impl DiffReport {
    /// Builds the report of a diff, reading details from the reference.
    pub fn build(diffs: &DiffSet, reference: &ReferenceSet) -> Self {
        let schemas = reference.tree_for(&Namespace::Schema);
        let main = reference.tree_for(&Namespace::Path);

        let missing_schemas = diffs
            .schemas
            .missing
            .iter()
            .map(|name| {
                let value = schemas.entity(&Namespace::Schema, name);
                let schema = value.map(SchemaObject::from_value).unwrap_or_default();
                SchemaDetail {
                    name: name.clone(),
                    schema_type: schema.type_name(),
                    description: schema.description.clone(),
                    fields: schema
                        .properties
                        .keys()
                        .filter_map(crate::document::key_name)
                        .collect(),
                }
            })
            .collect();

        let mut summary = Summary {
            schemas: NamespaceCounts::of(&diffs.schemas),
            parameters: NamespaceCounts::of(&diffs.parameters),
            paths: NamespaceCounts::of(&diffs.paths),
            ..Summary::default()
        };

        let mut missing_fields = BTreeMap::new();
        let mut extra_fields = BTreeMap::new();
        for diff in &diffs.fields {
            summary.fields.missing += diff.missing.len();
            summary.fields.extra += diff.extra.len();
            summary.fields.common += diff.common.len();
            let Some(owner) = diff.namespace.owner() else {
                continue;
            };
            if diff.has_missing() {
                let details = diff
                    .missing
                    .iter()
                    .map(|field| {
                        let value = schemas.entity(&diff.namespace, field);
                        field_detail(field, value)
                    })
                    .collect();
                missing_fields.insert(owner.to_string(), details);
            }
            if diff.has_extra() {
                extra_fields.insert(owner.to_string(), diff.extra.iter().cloned().collect());
            }
        }

        let missing_parameters = diffs
            .parameters
            .missing
            .iter()
            .map(|name| {
                let parameter = main
                    .entity(&Namespace::Parameter, name)
                    .map(ParameterObject::from_value)
                    .unwrap_or_default();
                ParameterDetail {
                    name: name.clone(),
                    location: parameter.location,
                    required: parameter.required,
                    description: parameter.description,
                }
            })
            .collect();

        let missing_paths = diffs
            .paths
            .missing
            .iter()
            .map(|path| PathDetail {
                path: path.clone(),
                methods: main
                    .entity(&Namespace::Path, path)
                    .map(operation_methods)
                    .unwrap_or_default(),
            })
            .collect();

        let mut report = DiffReport {
            missing_schemas,
            missing_fields_in_schemas: missing_fields,
            missing_parameters,
            missing_paths,
            extra_schemas: diffs.schemas.extra.iter().cloned().collect(),
            extra_fields,
            extra_parameters: diffs.parameters.extra.iter().cloned().collect(),
            extra_paths: diffs.paths.extra.iter().cloned().collect(),
            ..DiffReport::default()
        };

        for finding in &diffs.findings {
            match finding {
                FieldFinding::TypeMismatch {
                    schema,
                    field,
                    reference,
                    target,
                } => report.field_type_mismatches.push(TypeMismatch {
                    schema: schema.clone(),
                    field: field.clone(),
                    reference_type: reference.clone(),
                    target_type: target.clone(),
                }),
                FieldFinding::NullableMismatch {
                    schema,
                    field,
                    reference,
                    target,
                } => report.nullable_mismatches.push(NullableMismatch {
                    schema: schema.clone(),
                    field: field.clone(),
                    reference_nullable: *reference,
                    target_nullable: *target,
                }),
                FieldFinding::MissingExample {
                    schema,
                    field,
                    example,
                } => report.missing_examples.push(MissingExample {
                    schema: schema.clone(),
                    field: field.clone(),
                    example: json_value(example),
                }),
            }
        }
        summary.field_type_mismatches = report.field_type_mismatches.len();
        summary.nullable_mismatches = report.nullable_mismatches.len();
        summary.missing_examples = report.missing_examples.len();
        report.summary = summary;
        report
    }

    /// Returns true if the report lists nothing at all.
    pub fn is_empty(&self) -> bool {
        let summary = &self.summary;
        summary.schemas.missing
            + summary.schemas.extra
            + summary.parameters.missing
            + summary.parameters.extra
            + summary.paths.missing
            + summary.paths.extra
            + summary.fields.missing
            + summary.fields.extra
            + summary.field_type_mismatches
            + summary.nullable_mismatches
            + summary.missing_examples
            == 0
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ReconcileError::Config(format!("cannot serialize report: {}", e)))
    }

    /// Writes the JSON artifact.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut json = self.to_json()?;
        json.push('\n');
        fs::write(path, json).map_err(|e| ReconcileError::io(path, e))?;
        info!(path = %path.display(), "wrote diff report");
        Ok(())
    }
}

fn field_detail(field: &str, value: Option<&Value>) -> FieldDetail {
    let schema = value.map(SchemaObject::from_value).unwrap_or_default();
    FieldDetail {
        field: field.to_string(),
        field_type: schema.type_name(),
        example: schema.example.as_ref().map(json_value),
        description: schema.description.clone(),
        nullable: schema.is_nullable(),
        reference: schema.ref_path.clone(),
    }
}

/// Converts a YAML scalar or tree into JSON, dropping what JSON cannot hold.
fn json_value(value: &Value) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::Differ;
    use crate::document::{LoadedDocument, StructuredDocument};
    use crate::namespace::Layout;
    use pretty_assertions::assert_eq;

    const REFERENCE: &str = "\
openapi: 3.0.0
paths:
  /accounts:
    get: {}
    post: {}
components:
  parameters:
    page:
      name: page
      in: query
      required: false
";

    const MODELS: &str = "\
Foo:
  type: object
  description: A foo
  properties:
    a:
      type: string
      example: hello
Qux:
  type: object
  properties:
    amount:
      type: number
    code:
      type: string
";

    const TARGET: &str = "\
openapi: 3.0.0
paths:
  /legacy:
    get: {}
components:
  schemas:
    Qux:
      type: object
      properties:
        amount:
          type: integer
        legacy:
          type: string
    Old:
      type: string
";

    fn report() -> DiffReport {
        let reference = ReferenceSet::new(
            LoadedDocument::from_text("openapi.yaml", REFERENCE.to_string(), Layout::Components)
                .unwrap(),
            Some(
                LoadedDocument::from_text("models.yaml", MODELS.to_string(), Layout::Models)
                    .unwrap(),
            ),
        );
        let target = StructuredDocument::parse(TARGET, Layout::Components).unwrap();
        let diffs = Differ::new(&reference, &target).all();
        DiffReport::build(&diffs, &reference)
    }

    #[test]
    fn test_report_details() {
        let report = report();
        assert_eq!(
            report.missing_schemas,
            vec![SchemaDetail {
                name: "Foo".into(),
                schema_type: Some("object".into()),
                description: Some("A foo".into()),
                fields: vec!["a".into()],
            }]
        );
        assert_eq!(report.missing_fields_in_schemas["Qux"][0].field, "code");
        assert_eq!(
            report.missing_fields_in_schemas["Qux"][0].field_type.as_deref(),
            Some("string")
        );
        assert_eq!(report.missing_parameters[0].location.as_deref(), Some("query"));
        assert_eq!(report.missing_paths[0].methods, vec!["get", "post"]);
        assert_eq!(report.extra_schemas, vec!["Old"]);
        assert_eq!(report.extra_fields["Qux"], vec!["legacy"]);
        assert_eq!(report.extra_paths, vec!["/legacy"]);
        assert_eq!(
            report.field_type_mismatches,
            vec![TypeMismatch {
                schema: "Qux".into(),
                field: "amount".into(),
                reference_type: Some("number".into()),
                target_type: Some("integer".into()),
            }]
        );
        assert_eq!(report.summary.schemas.missing, 1);
        assert_eq!(report.summary.fields.extra, 1);
        assert!(!report.is_empty());
    }

    #[test]
    fn test_json_keys() {
        let json: serde_json::Value = serde_json::from_str(&report().to_json().unwrap()).unwrap();
        let keys: Vec<&str> = json
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        for key in [
            "missing_schemas",
            "missing_fields_in_schemas",
            "missing_parameters",
            "missing_paths",
            "field_type_mismatches",
            "missing_examples",
            "nullable_mismatches",
            "extra_schemas_in_mx",
            "extra_fields_in_schemas",
            "extra_parameters_in_mx",
            "extra_paths_in_mx",
            "summary",
        ] {
            assert!(keys.contains(&key), "missing key {}", key);
        }
        assert_eq!(json["missing_schemas"][0]["type"], "object");
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("openapi_diff.json");
        let report = report();
        report.write(&path).unwrap();
        let written: DiffReport =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, report);
    }
}
