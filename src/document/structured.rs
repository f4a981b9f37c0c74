//! Structural view of a YAML document.

use crate::namespace::{Layout, Namespace};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeSet;

/// StructuredDocument is an ordered mapping tree parsed from YAML text.
///
/// It is only ever read. Mapping key order follows the source.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredDocument {
    root: Value,
    layout: Layout,
}

impl StructuredDocument {
    /// Parses YAML text. An empty source yields an empty document.
    pub fn parse(source: &str, layout: Layout) -> Result<Self, serde_yaml::Error> {
        let root = if source.trim().is_empty() {
            Value::Mapping(Mapping::new())
        } else {
            serde_yaml::from_str(source)?
        };
        Ok(StructuredDocument { root, layout })
    }

    pub fn from_value(root: Value, layout: Layout) -> Self {
        StructuredDocument { root, layout }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Follows a key path from the root.
    pub fn get_path(&self, path: &[String]) -> Option<&Value> {
        path.iter()
            .try_fold(&self.root, |value, key| lookup(value.as_mapping()?, key))
    }

    /// The mapping holding a namespace's entries, if the document has one.
    pub fn section(&self, namespace: &Namespace) -> Option<&Mapping> {
        let path = namespace.section_path(self.layout)?;
        self.get_path(&path)?.as_mapping()
    }

    /// Names of every entry in a namespace.
    pub fn names(&self, namespace: &Namespace) -> BTreeSet<String> {
        self.section(namespace)
            .map(|m| m.keys().filter_map(key_name).collect())
            .unwrap_or_default()
    }

    /// Definition of a single entity.
    pub fn entity(&self, namespace: &Namespace, name: &str) -> Option<&Value> {
        lookup(self.section(namespace)?, name)
    }
}

/// Looks a key up in a mapping, also matching non-string keys by their text.
pub fn lookup<'a>(mapping: &'a Mapping, key: &str) -> Option<&'a Value> {
    mapping.get(key).or_else(|| {
        mapping
            .iter()
            .find(|(k, _)| key_name(k).as_deref() == Some(key))
            .map(|(_, v)| v)
    })
}

/// Renders a scalar mapping key as a name.
pub fn key_name(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: &str = r#"
openapi: 3.0.0
paths:
  /users:
    get: {}
  /accounts:
    get: {}
components:
  parameters:
    page:
      name: page
      in: query
  schemas:
    Zeta:
      type: object
      properties:
        z:
          type: string
    Alpha:
      type: string
"#;

    #[test]
    fn test_names_are_sorted_sets() {
        let doc = StructuredDocument::parse(TARGET, Layout::Components).unwrap();
        let schemas: Vec<String> = doc.names(&Namespace::Schema).into_iter().collect();
        assert_eq!(schemas, vec!["Alpha", "Zeta"]);
        assert_eq!(doc.names(&Namespace::Path).len(), 2);
        assert!(doc.names(&Namespace::Parameter).contains("page"));
        assert!(doc.names(&Namespace::Field("Zeta".into())).contains("z"));
        assert!(doc.names(&Namespace::Field("Alpha".into())).is_empty());
    }

    #[test]
    fn test_section_preserves_source_order() {
        let doc = StructuredDocument::parse(TARGET, Layout::Components).unwrap();
        let keys: Vec<String> = doc
            .section(&Namespace::Schema)
            .unwrap()
            .keys()
            .filter_map(key_name)
            .collect();
        assert_eq!(keys, vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn test_models_layout() {
        let doc = StructuredDocument::parse(
            "Foo:\n  type: object\n  properties:\n    a:\n      type: string\n",
            Layout::Models,
        )
        .unwrap();
        assert!(doc.names(&Namespace::Schema).contains("Foo"));
        assert!(doc.names(&Namespace::Parameter).is_empty());
        assert!(doc.entity(&Namespace::Field("Foo".into()), "a").is_some());
    }

    #[test]
    fn test_empty_source() {
        let doc = StructuredDocument::parse("  \n", Layout::Components).unwrap();
        assert!(doc.names(&Namespace::Schema).is_empty());
    }
}
