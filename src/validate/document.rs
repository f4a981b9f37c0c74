//! Document-level validation of an OpenAPI target.

use super::validation::{ValidationError, ValidationErrors};
use crate::document::{key_name, lookup, StructuredDocument};
use crate::openapi::OpenApiDocument;
use serde_yaml::Value;
use std::collections::BTreeSet;

/// Validates a reconciled target document.
///
/// Checks the required top-level fields, the shape of the sections the
/// reconciler edits, path keys, and every `$ref` in the document: none may
/// point outside it, and each internal pointer must resolve.
pub fn validate_document(document: &StructuredDocument) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let root = document.root();
    let Some(top) = root.as_mapping() else {
        errors.add(ValidationError::type_mismatch("", "mapping", kind(root)));
        return errors.into_result();
    };

    for field in ["openapi", "info", "paths"] {
        if lookup(top, field).is_none() {
            errors.add(ValidationError::missing_field("", field));
        }
    }

    match serde_yaml::from_value::<OpenApiDocument>(root.clone()) {
        Ok(typed) => {
            if let Some(version) = typed.openapi.as_ref() {
                let version = scalar_text(version);
                if !version.starts_with('3') {
                    errors.add(ValidationError::invalid_value(
                        ".openapi",
                        format!("unsupported version {}", version),
                    ));
                }
            }
            if let Some(info) = typed.info.as_ref() {
                if info.title.is_none() {
                    errors.add(ValidationError::missing_field(".info", "title"));
                }
                if info.version.is_none() {
                    errors.add(ValidationError::missing_field(".info", "version"));
                }
            }
        }
        Err(e) => errors.add(ValidationError::invalid_value("", e.to_string())),
    }

    if let Some(paths) = lookup(top, "paths") {
        match paths {
            Value::Mapping(paths) => {
                for key in paths.keys() {
                    let name = key_name(key).unwrap_or_default();
                    if !name.starts_with('/') {
                        errors.add(ValidationError::invalid_value(
                            format!(".paths.{}", name),
                            "path must start with '/'",
                        ));
                    }
                }
            }
            Value::Null => {}
            other => errors.add(ValidationError::type_mismatch(".paths", "mapping", kind(other))),
        }
    }

    if let Some(components) = lookup(top, "components") {
        match components {
            Value::Mapping(components) => {
                for section in ["schemas", "parameters"] {
                    match lookup(components, section) {
                        None | Some(Value::Null) | Some(Value::Mapping(_)) => {}
                        Some(other) => errors.add(ValidationError::type_mismatch(
                            format!(".components.{}", section),
                            "mapping",
                            kind(other),
                        )),
                    }
                }
            }
            other => errors.add(ValidationError::type_mismatch(
                ".components",
                "mapping",
                kind(other),
            )),
        }
    }

    let mut refs = Vec::new();
    collect_refs(root, String::new(), &mut refs);
    for (path, reference) in refs {
        match reference.split_once('#') {
            Some(("", pointer)) => {
                if resolve(root, pointer).is_none() {
                    errors.add(ValidationError::DanglingReference { path, reference });
                }
            }
            _ => errors.add(ValidationError::ExternalReference { path, reference }),
        }
    }

    errors.into_result()
}

/// Internal references that do not resolve, sorted and deduplicated.
pub fn dangling_references(document: &StructuredDocument) -> BTreeSet<String> {
    let root = document.root();
    let mut refs = Vec::new();
    collect_refs(root, String::new(), &mut refs);
    refs.into_iter()
        .filter_map(|(_, reference)| match reference.split_once('#') {
            Some(("", pointer)) if resolve(root, pointer).is_none() => Some(reference),
            _ => None,
        })
        .collect()
}

/// Gathers every `$ref` string with the dotted path of the mapping holding it.
fn collect_refs(value: &Value, path: String, refs: &mut Vec<(String, String)>) {
    match value {
        Value::Mapping(mapping) => {
            for (key, child) in mapping {
                let name = key_name(key).unwrap_or_default();
                if name == "$ref" {
                    if let Some(reference) = child.as_str() {
                        refs.push((path.clone(), reference.to_string()));
                    }
                    continue;
                }
                collect_refs(child, format!("{}.{}", path, name), refs);
            }
        }
        Value::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                collect_refs(item, format!("{}[{}]", path, i), refs);
            }
        }
        Value::Tagged(tagged) => collect_refs(&tagged.value, path, refs),
        _ => {}
    }
}

/// Resolves a JSON pointer fragment (without the leading `#`).
fn resolve<'a>(root: &'a Value, pointer: &str) -> Option<&'a Value> {
    let Some(rest) = pointer.strip_prefix('/') else {
        return pointer.is_empty().then_some(root);
    };
    rest.split('/').try_fold(root, |value, segment| {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        match value {
            Value::Mapping(mapping) => lookup(mapping, &segment),
            Value::Sequence(items) => items.get(segment.parse::<usize>().ok()?),
            _ => None,
        }
    })
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => kind(other).to_string(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::Layout;

    fn validate(text: &str) -> Result<(), ValidationErrors> {
        validate_document(&StructuredDocument::parse(text, Layout::Components).unwrap())
    }

    #[test]
    fn test_valid_document() {
        validate(
            "\
openapi: 3.0.3
info:
  title: Accounts
  version: '1.0'
paths:
  /users/{id}:
    get:
      parameters:
        - $ref: '#/components/parameters/id'
      responses:
        '200':
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/User'
components:
  parameters:
    id:
      name: id
      in: path
  schemas:
    User:
      type: object
",
        )
        .unwrap();
    }

    #[test]
    fn test_collects_every_violation() {
        let errors = validate(
            "\
openapi: 3.0.0
paths:
  users:
    get:
      parameters:
        - $ref: './parameters.yaml#/page'
components:
  schemas:
    - User
  parameters:
    limit:
      schema:
        $ref: '#/components/schemas/Missing'
",
        )
        .unwrap_err();
        let found: Vec<ValidationError> = errors.into_iter().collect();
        assert!(found.contains(&ValidationError::missing_field("", "info")));
        assert!(found.contains(&ValidationError::invalid_value(
            ".paths.users",
            "path must start with '/'"
        )));
        assert!(found.contains(&ValidationError::type_mismatch(
            ".components.schemas",
            "mapping",
            "sequence"
        )));
        assert!(found.contains(&ValidationError::ExternalReference {
            path: ".paths.users.get.parameters[0]".into(),
            reference: "./parameters.yaml#/page".into(),
        }));
        assert!(found.contains(&ValidationError::DanglingReference {
            path: ".components.parameters.limit.schema".into(),
            reference: "#/components/schemas/Missing".into(),
        }));
    }

    #[test]
    fn test_emptied_sections_are_accepted() {
        validate("openapi: 3.0.0\ninfo:\n  title: T\n  version: 1\npaths:\ncomponents:\n  schemas:\n")
            .unwrap();
    }

    #[test]
    fn test_dangling_references() {
        let doc = StructuredDocument::parse(
            "a:\n  $ref: '#/c'\nc:\n  $ref: '#/gone'\nd:\n  $ref: 'x.yaml#/e'\n",
            Layout::Components,
        )
        .unwrap();
        let dangling: Vec<String> = dangling_references(&doc).into_iter().collect();
        assert_eq!(dangling, vec!["#/gone"]);
    }

    #[test]
    fn test_resolve_escaped_pointer() {
        let root: Value = serde_yaml::from_str("paths:\n  /users:\n    get: {}\n").unwrap();
        assert!(resolve(&root, "/paths/~1users/get").is_some());
        assert!(resolve(&root, "/paths/~1accounts").is_none());
    }
}
