//! Contiguous text replacements.

use crate::error::{ReconcileError, Result};
use std::ops::Range;

/// TextRegion replaces the bytes `start..end` of a source with `replacement`.
///
/// An insertion is a region with `start == end`; a deletion has an empty
/// replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRegion {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

impl TextRegion {
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        TextRegion {
            start: at,
            end: at,
            replacement: text.into(),
        }
    }

    pub fn delete(range: Range<usize>) -> Self {
        TextRegion {
            start: range.start,
            end: range.end,
            replacement: String::new(),
        }
    }

    pub fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        TextRegion {
            start: range.start,
            end: range.end,
            replacement: text.into(),
        }
    }
}

/// Applies non-overlapping regions to `source`.
///
/// Regions may be given in any order. Insertions at the same offset keep
/// their relative order.
pub fn apply_regions(source: &str, mut regions: Vec<TextRegion>) -> Result<String> {
    regions.sort_by_key(|r| (r.start, r.end));
    let added: usize = regions.iter().map(|r| r.replacement.len()).sum();
    let mut out = String::with_capacity(source.len() + added);
    let mut cursor = 0;
    for region in &regions {
        if region.start < cursor || region.end < region.start || region.end > source.len() {
            return Err(ReconcileError::pattern_mismatch(
                format!("bytes {}..{}", region.start, region.end),
                "edit overlaps another edit or falls outside the document",
            ));
        }
        out.push_str(&source[cursor..region.start]);
        out.push_str(&region.replacement);
        cursor = region.end;
    }
    out.push_str(&source[cursor..]);
    Ok(out)
}

/// Shifts every line of `block` from indentation `from` to indentation `to`.
///
/// Blank lines are emptied. The result always ends with a newline.
pub fn reindent(block: &str, from: usize, to: usize) -> String {
    let mut out = String::with_capacity(block.len());
    for raw in block.split_inclusive('\n') {
        let line = raw.trim_end_matches('\n').trim_end_matches('\r');
        if line.trim().is_empty() {
            out.push('\n');
            continue;
        }
        let leading = line.len() - line.trim_start_matches(' ').len();
        if to >= from {
            out.push_str(&" ".repeat(to - from));
            out.push_str(line);
        } else {
            let strip = leading.min(from - to);
            out.push_str(&line[strip..]);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_apply_regions_out_of_order() {
        let source = "a\nb\nc\n";
        let regions = vec![
            TextRegion::insert(6, "d\n"),
            TextRegion::delete(2..4),
            TextRegion::replace(0..1, "A"),
        ];
        assert_eq!(apply_regions(source, regions).unwrap(), "A\nc\nd\n");
    }

    #[test]
    fn test_apply_regions_rejects_overlap() {
        let regions = vec![TextRegion::delete(0..3), TextRegion::delete(2..4)];
        assert!(apply_regions("abcdef", regions).is_err());
    }

    #[test]
    fn test_reindent_deeper_and_shallower() {
        let block = "Foo:\n  type: object\n\n  description: x\n";
        assert_eq!(
            reindent(block, 0, 4),
            "    Foo:\n      type: object\n\n      description: x\n"
        );
        assert_eq!(reindent("    a:\n      b: 1", 4, 2), "  a:\n    b: 1\n");
    }
}
