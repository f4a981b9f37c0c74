//! Typed views over OpenAPI v3 documents.
//!
//! These are read-only projections used for reporting and validation. The
//! untyped tree remains authoritative; anything these types cannot express
//! falls back to defaults.

use crate::document::key_name;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// HTTP methods that introduce an operation inside a path item.
pub const OPERATION_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// OpenAPI v3 document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// OpenAPI version (should be "3.0.x"); unquoted versions parse as numbers.
    #[serde(default)]
    pub openapi: Option<Value>,

    /// API info.
    #[serde(default)]
    pub info: Option<Info>,

    /// API paths.
    #[serde(default)]
    pub paths: Option<Mapping>,

    /// Components section.
    #[serde(default)]
    pub components: Option<Components>,

    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// API information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub version: Option<Value>,

    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// OpenAPI v3 components section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    #[serde(default)]
    pub schemas: Option<Mapping>,

    #[serde(default)]
    pub parameters: Option<Mapping>,

    #[serde(default)]
    pub security_schemes: Option<Mapping>,
}

/// OpenAPI v3 schema object, restricted to the attributes that are diffed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaObject {
    /// Schema type. A list in 3.1 documents, a string otherwise.
    #[serde(rename = "type", default)]
    pub schema_type: Option<Value>,

    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Reference to another schema.
    #[serde(rename = "$ref", default)]
    pub ref_path: Option<String>,

    #[serde(default)]
    pub nullable: Option<bool>,

    #[serde(default)]
    pub example: Option<Value>,

    /// Properties are kept untyped so one unusual property does not hide the rest.
    #[serde(default)]
    pub properties: Mapping,

    /// Usually a list of property names; some documents misuse it as a flag.
    #[serde(default)]
    pub required: Option<Value>,

    #[serde(rename = "enum", default)]
    pub enum_values: Option<Vec<Value>>,

    /// Whether an `example` key is present at all (even with a null value).
    #[serde(skip)]
    pub has_example: bool,
}

impl SchemaObject {
    /// Projects a schema definition, falling back to an empty schema.
    pub fn from_value(value: &Value) -> Self {
        let mut schema: SchemaObject = match serde_yaml::from_value(value.clone()) {
            Ok(schema) => schema,
            Err(e) => {
                debug!(error = %e, "schema does not fit the typed view");
                SchemaObject::default()
            }
        };
        schema.has_example = value.get("example").is_some();
        schema
    }

    /// Rendered type; list types are joined with `|`.
    pub fn type_name(&self) -> Option<String> {
        match self.schema_type.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Sequence(items) => Some(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join("|"),
            ),
            _ => None,
        }
    }

    /// Nullability with the OpenAPI default of `false`.
    pub fn is_nullable(&self) -> bool {
        self.nullable.unwrap_or(false)
    }
}

/// OpenAPI v3 parameter object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParameterObject {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(rename = "in", default)]
    pub location: Option<String>,

    #[serde(default)]
    pub required: Option<bool>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(rename = "$ref", default)]
    pub ref_path: Option<String>,

    #[serde(default)]
    pub schema: Option<Value>,
}

impl ParameterObject {
    pub fn from_value(value: &Value) -> Self {
        serde_yaml::from_value(value.clone()).unwrap_or_else(|e| {
            debug!(error = %e, "parameter does not fit the typed view");
            ParameterObject::default()
        })
    }
}

/// Operation methods defined on a path item, in document order.
pub fn operation_methods(path_item: &Value) -> Vec<String> {
    path_item
        .as_mapping()
        .map(|m| {
            m.keys()
                .filter_map(Value::as_str)
                .filter(|k| OPERATION_METHODS.contains(k))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Properties of a schema keyed by name, projected to the typed view.
pub fn typed_properties(schema: &Value) -> BTreeMap<String, SchemaObject> {
    SchemaObject::from_value(schema)
        .properties
        .iter()
        .filter_map(|(k, v)| Some((key_name(k)?, SchemaObject::from_value(v))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_schema_object_projection() {
        let schema = SchemaObject::from_value(&yaml(
            "type: number\nnullable: true\nexample: 1.5\ndescription: Amount\n",
        ));
        assert_eq!(schema.type_name().as_deref(), Some("number"));
        assert!(schema.is_nullable());
        assert!(schema.has_example);
        assert_eq!(schema.description.as_deref(), Some("Amount"));
    }

    #[test]
    fn test_null_example_still_counts_as_present() {
        let schema = SchemaObject::from_value(&yaml("type: string\nexample: null\n"));
        assert!(schema.has_example);
        assert!(!schema.is_nullable());
    }

    #[test]
    fn test_list_type() {
        let schema = SchemaObject::from_value(&yaml("type: [string, 'null']\n"));
        assert_eq!(schema.type_name().as_deref(), Some("string|null"));
    }

    #[test]
    fn test_typed_properties_keep_non_string_keys() {
        let properties = typed_properties(&yaml(
            "properties:\n  200:\n    type: string\n  true:\n    type: boolean\n  name:\n    type: string\n",
        ));
        let names: Vec<&str> = properties.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["200", "name", "true"]);
        assert_eq!(properties["200"].type_name().as_deref(), Some("string"));
    }

    #[test]
    fn test_operation_methods() {
        let item = yaml("parameters: []\nget: {}\npost: {}\nsummary: x\n");
        assert_eq!(operation_methods(&item), vec!["get", "post"]);
    }

    #[test]
    fn test_parameter_projection() {
        let param = ParameterObject::from_value(&yaml("name: page\nin: query\nrequired: false\n"));
        assert_eq!(param.name.as_deref(), Some("page"));
        assert_eq!(param.location.as_deref(), Some("query"));
    }

    #[test]
    fn test_document_components() {
        let doc: OpenApiDocument = serde_yaml::from_value(yaml(
            "openapi: 3.0.0\ninfo:\n  title: API\n  version: '1'\ncomponents:\n  securitySchemes:\n    basic:\n      type: http\n",
        ))
        .unwrap();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.is_some());
        assert!(components.schemas.is_none());
    }
}
