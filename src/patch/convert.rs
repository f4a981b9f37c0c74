//! Replacing inline path parameters with component references.

use super::outcome::{Outcome, Outcomes};
use super::patcher::{Patched, Patcher};
use crate::document::lookup;
use crate::error::Result;
use crate::namespace::Namespace;
use crate::refs::RefNamespace;
use crate::text::{apply_regions, Lookup, Outline, TextRegion};
use serde_yaml::{Mapping, Value};
use std::ops::Range;
use tracing::{debug, warn};

/// InlineParameter is one item of a `parameters:` sequence under `paths`.
#[derive(Debug, Clone)]
struct InlineParameter {
    lines: Range<usize>,
    indent: usize,
    value: Value,
}

impl InlineParameter {
    fn field(&self, key: &str) -> Option<&str> {
        lookup(self.value.as_mapping()?, key)?.as_str()
    }

    fn is_reference(&self) -> bool {
        self.value
            .as_mapping()
            .is_some_and(|m| lookup(m, "$ref").is_some())
    }
}

impl Patcher {
    /// Rewrites inline path parameters that have a component counterpart.
    ///
    /// An inline parameter matches the component stored under its `name`
    /// when their `in` values agree (or either omits it), and otherwise any
    /// component whose own `name` and `in` are the same. Matched items become
    /// `- $ref: '#/components/parameters/<key>'`; the rest are flagged.
    pub fn convert_inline_parameters(
        &self,
        target: &str,
        components: Option<&Mapping>,
    ) -> Result<Patched> {
        let mut outcomes = Outcomes::new();
        let outline = Outline::new(target);
        let paths = match outline.section(&["paths".to_string()], self.unit)? {
            Lookup::Found(section) => section,
            Lookup::Missing { .. } => return Ok(Patched::unchanged(target, outcomes)),
        };

        let mut regions = Vec::new();
        for parameter in inline_parameters(&outline, paths.body.clone()) {
            if parameter.is_reference() {
                continue;
            }
            let Some(name) = parameter.field("name") else {
                continue;
            };
            let label = format!("{} at line {}", name, parameter.lines.start + 1);
            match components.and_then(|c| match_component(c, name, parameter.field("in"))) {
                Some(key) => {
                    let replacement = format!(
                        "{}- $ref: '{}'\n",
                        " ".repeat(parameter.indent),
                        RefNamespace::Parameters.pointer(&key)
                    );
                    debug!(parameter = %label, component = %key, "converting to reference");
                    regions.push(TextRegion::replace(
                        outline.byte_range(parameter.lines.clone()),
                        replacement,
                    ));
                    outcomes.record(&Namespace::Parameter, label, Outcome::Applied);
                }
                None => {
                    warn!(parameter = %label, "no matching component parameter");
                    outcomes.record(
                        &Namespace::Parameter,
                        label,
                        Outcome::Flagged("no matching component parameter".to_string()),
                    );
                }
            }
        }

        if regions.is_empty() {
            return Ok(Patched::unchanged(target, outcomes));
        }
        let text = apply_regions(target, regions)?;
        Ok(Patched { text, outcomes })
    }
}

/// Finds the component key an inline parameter corresponds to.
fn match_component(components: &Mapping, name: &str, location: Option<&str>) -> Option<String> {
    let agrees = |component: &Value| {
        let other = component
            .as_mapping()
            .and_then(|m| lookup(m, "in"))
            .and_then(Value::as_str);
        match (location, other) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    };
    if lookup(components, name).is_some_and(agrees) {
        return Some(name.to_string());
    }
    components.iter().find_map(|(key, component)| {
        let own_name = component
            .as_mapping()
            .and_then(|m| lookup(m, "name"))
            .and_then(Value::as_str)?;
        if own_name == name && agrees(component) {
            crate::document::key_name(key)
        } else {
            None
        }
    })
}

/// Every item of every block-style `parameters:` sequence within `body`.
fn inline_parameters(outline: &Outline<'_>, body: Range<usize>) -> Vec<InlineParameter> {
    let mut parameters = Vec::new();
    let mut i = body.start;
    while i < body.end {
        let line = outline.line(i);
        let is_header = line.is_content()
            && line.key().as_deref() == Some("parameters")
            && line.inline_value().is_none();
        if !is_header {
            i += 1;
            continue;
        }
        let end = outline.block_end(i, line.indent(), body.end);
        parameters.extend(sequence_items(outline, i + 1..end));
        i = end;
    }
    parameters
}

/// Splits a block sequence into its items and parses each one.
fn sequence_items(outline: &Outline<'_>, body: Range<usize>) -> Vec<InlineParameter> {
    let Some(indent) = outline.child_indent(body.clone()) else {
        return Vec::new();
    };
    let starts: Vec<usize> = body
        .clone()
        .filter(|&i| {
            let line = outline.line(i);
            line.is_content() && line.indent() == indent && line.is_sequence_item()
        })
        .collect();

    let mut items = Vec::new();
    for (n, &start) in starts.iter().enumerate() {
        let limit = starts.get(n + 1).copied().unwrap_or(body.end);
        let end = (start + 1..limit)
            .filter(|&i| {
                let line = outline.line(i);
                line.is_content() && line.indent() > indent
            })
            .last()
            .map_or(start + 1, |i| i + 1);

        let text = outline.slice(start..end);
        // Swap the dash for a space so the item reads as a plain mapping.
        let mapping = format!("{} {}", &text[..indent], &text[indent + 1..]);
        match serde_yaml::from_str::<Value>(&mapping) {
            Ok(value) => items.push(InlineParameter {
                lines: start..end,
                indent,
                value,
            }),
            Err(err) => debug!(line = start + 1, error = %err, "skipping unparseable parameter"),
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_items_split_structurally() {
        let text = "\
parameters:
  - name: page
    in: query

  - $ref: '#/components/parameters/limit'
  -
    name: id
    in: path
";
        let outline = Outline::new(text);
        let items = sequence_items(&outline, 1..outline.len());
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].lines, 1..3);
        assert_eq!(items[0].field("name"), Some("page"));
        assert!(items[1].is_reference());
        assert_eq!(items[2].field("in"), Some("path"));
    }

    #[test]
    fn test_match_component() {
        let components: Mapping = serde_yaml::from_str(
            "\
page:
  name: page
  in: query
PageHeader:
  name: page
  in: header
",
        )
        .unwrap();
        assert_eq!(match_component(&components, "page", Some("query")), Some("page".into()));
        assert_eq!(
            match_component(&components, "page", Some("header")),
            Some("PageHeader".into())
        );
        assert_eq!(match_component(&components, "page", Some("cookie")), None);
        assert_eq!(match_component(&components, "limit", None), None);
    }
}
