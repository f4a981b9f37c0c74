//! Namespace and layout definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Layout describes how a document arranges its namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// A full OpenAPI document: `components.schemas`, `components.parameters`, `paths`.
    Components,
    /// A flat mapping of schema name to schema body with no `components` wrapper.
    Models,
}

/// Namespace is one of the four flat entity collections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    Schema,
    Parameter,
    Path,
    /// The `properties` of the named schema.
    Field(String),
}

/// Sentinel names the sibling a synthesized section is inserted in front of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentinel {
    /// Key path of the section that holds both the new section and the sentinel.
    pub parent: &'static [&'static str],
    /// Key of the sibling to insert before.
    pub before: &'static str,
}

impl Namespace {
    /// Short plural label used in logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Namespace::Schema => "schemas",
            Namespace::Parameter => "parameters",
            Namespace::Path => "paths",
            Namespace::Field(_) => "fields",
        }
    }

    /// Singular noun for a member of this namespace.
    pub fn noun(&self) -> &'static str {
        match self {
            Namespace::Schema => "schema",
            Namespace::Parameter => "parameter",
            Namespace::Path => "path",
            Namespace::Field(_) => "field",
        }
    }

    /// Returns the owning schema for the field namespace.
    pub fn owner(&self) -> Option<&str> {
        match self {
            Namespace::Field(owner) => Some(owner),
            _ => None,
        }
    }

    /// Key path from the document root to the mapping holding this namespace's entries.
    ///
    /// Returns `None` when the layout cannot carry the namespace at all
    /// (a models file has no parameters or paths).
    pub fn section_path(&self, layout: Layout) -> Option<Vec<String>> {
        let path: Vec<&str> = match (self, layout) {
            (Namespace::Schema, Layout::Components) => vec!["components", "schemas"],
            (Namespace::Parameter, Layout::Components) => vec!["components", "parameters"],
            (Namespace::Path, Layout::Components) => vec!["paths"],
            (Namespace::Field(owner), Layout::Components) => {
                vec!["components", "schemas", owner.as_str(), "properties"]
            }
            (Namespace::Schema, Layout::Models) => vec![],
            (Namespace::Field(owner), Layout::Models) => vec![owner.as_str(), "properties"],
            (Namespace::Parameter, Layout::Models) | (Namespace::Path, Layout::Models) => {
                return None
            }
        };
        Some(path.into_iter().map(String::from).collect())
    }

    /// Indentation (in spaces) of entry keys under the given layout.
    pub fn entry_indent(&self, layout: Layout, unit: usize) -> Option<usize> {
        self.section_path(layout).map(|p| p.len() * unit)
    }

    /// Where a section that does not exist yet should be synthesized.
    pub fn sentinel(&self) -> Option<Sentinel> {
        match self {
            Namespace::Schema | Namespace::Parameter => Some(Sentinel {
                parent: &["components"],
                before: "securitySchemes",
            }),
            Namespace::Path => Some(Sentinel {
                parent: &[],
                before: "components",
            }),
            Namespace::Field(_) => None,
        }
    }

    /// Qualified display name of an entity in this namespace.
    pub fn qualify(&self, name: &str) -> String {
        match self {
            Namespace::Field(owner) => format!("{}.{}", owner, name),
            _ => name.to_string(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Field(owner) => write!(f, "fields of {}", owner),
            other => f.write_str(other.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_paths() {
        assert_eq!(
            Namespace::Schema.section_path(Layout::Components),
            Some(vec!["components".to_string(), "schemas".to_string()])
        );
        assert_eq!(Namespace::Schema.section_path(Layout::Models), Some(vec![]));
        assert_eq!(Namespace::Path.section_path(Layout::Models), None);
    }

    #[test]
    fn test_entry_indent() {
        assert_eq!(Namespace::Schema.entry_indent(Layout::Components, 2), Some(4));
        assert_eq!(Namespace::Path.entry_indent(Layout::Components, 2), Some(2));
        assert_eq!(
            Namespace::Field("Foo".into()).entry_indent(Layout::Components, 2),
            Some(8)
        );
        assert_eq!(
            Namespace::Field("Foo".into()).entry_indent(Layout::Models, 2),
            Some(4)
        );
    }

    #[test]
    fn test_display_and_qualify() {
        let ns = Namespace::Field("Qux".into());
        assert_eq!(ns.to_string(), "fields of Qux");
        assert_eq!(ns.qualify("amount"), "Qux.amount");
        assert_eq!(Namespace::Parameter.qualify("page"), "page");
    }
}
