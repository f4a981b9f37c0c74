//! `$ref` occurrences and their classification.

use crate::namespace::Namespace;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;

static REF_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)(?:^|[\s{,])["']?\$ref["']?:[ \t]*(?P<open>["']?)(?P<value>[^"'\s]+)(?P<close>["']?)"#,
    )
    .expect("valid $ref pattern")
});

/// RefOccurrence is one `$ref` value found in raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefOccurrence {
    /// Byte range of the value, quotes excluded.
    pub range: Range<usize>,
    pub quoted: bool,
    /// Part before `#`; empty for internal references.
    pub file: String,
    /// Unescaped JSON-pointer segments after `#/`; empty when the value
    /// names a whole file or carries no `/` after the `#`.
    pub pointer: Vec<String>,
    pub raw: String,
}

impl RefOccurrence {
    pub fn is_external(&self) -> bool {
        !self.file.is_empty()
    }

    /// Text that replaces the value so that it reads as `pointer`.
    ///
    /// Unquoted values gain single quotes, since a bare `#` would start a comment.
    pub fn replacement(&self, pointer: &str) -> String {
        if self.quoted {
            pointer.to_string()
        } else {
            format!("'{}'", pointer)
        }
    }
}

/// Finds every `$ref` value outside comments: `file#/pointer`,
/// `'#/pointer'`, and whole-file references such as `./schemas/Account.yaml`.
pub fn scan_refs(text: &str) -> Vec<RefOccurrence> {
    REF_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            let open = caps.name("open").map_or("", |m| m.as_str());
            let close = caps.name("close").map_or("", |m| m.as_str());
            let value = caps.name("value")?;
            if open != close || in_comment(text, value.start()) {
                return None;
            }
            let raw = if open.is_empty() {
                value.as_str().trim_end_matches([',', '}', ']'])
            } else {
                value.as_str()
            };
            let (file, fragment) = raw.split_once('#').unwrap_or((raw, ""));
            let pointer = fragment
                .strip_prefix('/')
                .map(|rest| rest.split('/').map(unescape_segment).collect())
                .unwrap_or_default();
            Some(RefOccurrence {
                range: value.start()..value.start() + raw.len(),
                quoted: !open.is_empty(),
                file: file.to_string(),
                pointer,
                raw: raw.to_string(),
            })
        })
        .collect()
}

fn in_comment(text: &str, pos: usize) -> bool {
    let line_start = text[..pos].rfind('\n').map_or(0, |i| i + 1);
    let prefix = &text[line_start..pos];
    prefix.trim_start().starts_with('#') || prefix.contains(" #")
}

fn unescape_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// RefNamespace is a namespace external references can be rewritten into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefNamespace {
    Schemas,
    Parameters,
}

impl RefNamespace {
    pub fn namespace(&self) -> Namespace {
        match self {
            RefNamespace::Schemas => Namespace::Schema,
            RefNamespace::Parameters => Namespace::Parameter,
        }
    }

    fn component_key(&self) -> &'static str {
        match self {
            RefNamespace::Schemas => "schemas",
            RefNamespace::Parameters => "parameters",
        }
    }

    fn from_component_key(key: &str) -> Option<Self> {
        match key {
            "schemas" => Some(RefNamespace::Schemas),
            "parameters" => Some(RefNamespace::Parameters),
            _ => None,
        }
    }

    /// Internal pointer to the named component.
    pub fn pointer(&self, name: &str) -> String {
        format!("#/components/{}/{}", self.component_key(), escape_segment(name))
    }
}

/// ExternalRefRule maps a referenced file to the namespace its entries live in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRefRule {
    /// Matched against the end of the referenced file path.
    pub file: String,
    pub namespace: RefNamespace,
}

/// RefRules decides which namespace an external reference belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefRules {
    pub rules: Vec<ExternalRefRule>,
    /// Namespace for single-segment references no rule matches.
    pub fallback: RefNamespace,
}

impl Default for RefRules {
    fn default() -> Self {
        RefRules {
            rules: vec![
                ExternalRefRule {
                    file: "parameters.yaml".to_string(),
                    namespace: RefNamespace::Parameters,
                },
                ExternalRefRule {
                    file: "parameters.yml".to_string(),
                    namespace: RefNamespace::Parameters,
                },
            ],
            fallback: RefNamespace::Schemas,
        }
    }
}

impl RefRules {
    /// Namespace and entity name an external reference points at.
    ///
    /// Returns `None` for pointers outside schemas and parameters.
    pub fn classify(&self, occurrence: &RefOccurrence) -> Option<(RefNamespace, String)> {
        match occurrence.pointer.as_slice() {
            [components, key, name] if components == "components" => {
                RefNamespace::from_component_key(key).map(|ns| (ns, name.clone()))
            }
            [name] if !name.is_empty() => {
                let namespace = self
                    .rules
                    .iter()
                    .find(|rule| occurrence.file.ends_with(&rule.file))
                    .map_or(self.fallback, |rule| rule.namespace);
                Some((namespace, name.clone()))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_quoted_and_unquoted() {
        let text = "\
a:
  $ref: './schemas/models.yaml#/Baz'
b:
  $ref: \"#/components/schemas/Foo\"
c:
  $ref: parameters.yaml#/page
d: {$ref: '#/components/parameters/page'}
";
        let refs = scan_refs(text);
        assert_eq!(refs.len(), 4);

        assert!(refs[0].is_external());
        assert_eq!(refs[0].file, "./schemas/models.yaml");
        assert_eq!(refs[0].pointer, vec!["Baz"]);
        assert_eq!(&text[refs[0].range.clone()], "./schemas/models.yaml#/Baz");
        assert!(refs[0].quoted);

        assert!(!refs[1].is_external());
        assert_eq!(refs[1].pointer, vec!["components", "schemas", "Foo"]);

        assert!(!refs[2].quoted);
        assert_eq!(refs[2].replacement("#/x"), "'#/x'");

        assert_eq!(refs[3].raw, "#/components/parameters/page");
    }

    #[test]
    fn test_scan_whole_file_reference() {
        let refs = scan_refs("Account:\n  $ref: './schemas/Account.yaml'\nOther:\n  $ref: common.yaml\n");
        assert_eq!(refs.len(), 2);
        assert!(refs[0].is_external());
        assert_eq!(refs[0].file, "./schemas/Account.yaml");
        assert!(refs[0].pointer.is_empty());
        assert_eq!(refs[1].raw, "common.yaml");
        assert_eq!(RefRules::default().classify(&refs[0]), None);
    }

    #[test]
    fn test_scan_skips_comments() {
        let text = "# $ref: './models.yaml#/Old'\nkey: 1 # $ref: 'x.yaml#/Y'\n";
        assert!(scan_refs(text).is_empty());
    }

    #[test]
    fn test_pointer_escaping() {
        let refs = scan_refs("$ref: '#/paths/~1users~1{id}'\n");
        assert_eq!(refs[0].pointer, vec!["paths", "/users/{id}"]);
        assert_eq!(
            RefNamespace::Schemas.pointer("a/b"),
            "#/components/schemas/a~1b"
        );
    }

    #[test]
    fn test_classify() {
        let rules = RefRules::default();
        let refs = scan_refs(
            "\
- $ref: './schemas/models.yaml#/Baz'
- $ref: './parameters.yaml#/page'
- $ref: 'other.yaml#/components/parameters/limit'
- $ref: 'other.yaml#/components/responses/NotFound'
",
        );
        assert_eq!(
            rules.classify(&refs[0]),
            Some((RefNamespace::Schemas, "Baz".to_string()))
        );
        assert_eq!(
            rules.classify(&refs[1]),
            Some((RefNamespace::Parameters, "page".to_string()))
        );
        assert_eq!(
            rules.classify(&refs[2]),
            Some((RefNamespace::Parameters, "limit".to_string()))
        );
        assert_eq!(rules.classify(&refs[3]), None);
    }
}
