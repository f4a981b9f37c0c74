//! Line outline of a YAML text.

use crate::error::{ReconcileError, Result};
use std::ops::Range;

/// Line is a single line of the source with its byte offsets.
///
/// `end` includes the line terminator; `text` does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    pub start: usize,
    pub end: usize,
    pub text: &'a str,
}

impl<'a> Line<'a> {
    /// Number of leading spaces.
    pub fn indent(&self) -> usize {
        self.text.len() - self.text.trim_start_matches(' ').len()
    }

    /// The line without indentation or trailing whitespace.
    pub fn content(&self) -> &'a str {
        self.text.trim_start_matches(' ').trim_end()
    }

    pub fn is_blank(&self) -> bool {
        self.content().is_empty()
    }

    pub fn is_comment(&self) -> bool {
        self.content().starts_with('#')
    }

    /// True for lines that carry YAML structure (neither blank nor a comment).
    pub fn is_content(&self) -> bool {
        !self.is_blank() && !self.is_comment()
    }

    pub fn is_sequence_item(&self) -> bool {
        let content = self.content();
        content == "-" || content.starts_with("- ")
    }

    /// The mapping key introduced by this line, if any.
    pub fn key(&self) -> Option<String> {
        parse_key(self.content()).map(|(key, _)| key)
    }

    /// The value written on the same line as the key, ignoring comments.
    pub fn inline_value(&self) -> Option<&'a str> {
        let content = self.content();
        let (_, after) = parse_key(content)?;
        let value = content[after..].trim();
        if value.is_empty() || value.starts_with('#') {
            None
        } else {
            Some(value)
        }
    }
}

/// Parses the key of a mapping entry line.
///
/// Returns the unquoted key and the byte index just past its colon.
pub fn parse_key(content: &str) -> Option<(String, usize)> {
    let first = content.chars().next()?;
    if content == "-" || content.starts_with("- ") {
        return None;
    }
    match first {
        '\'' => {
            let mut key = String::new();
            let mut chars = content.char_indices().skip(1).peekable();
            while let Some((i, c)) = chars.next() {
                if c == '\'' {
                    if let Some((_, '\'')) = chars.peek() {
                        key.push('\'');
                        chars.next();
                        continue;
                    }
                    return colon_after(content, i + 1).map(|end| (key, end));
                }
                key.push(c);
            }
            None
        }
        '"' => {
            let mut key = String::new();
            let mut chars = content.char_indices().skip(1);
            while let Some((i, c)) = chars.next() {
                match c {
                    '\\' => {
                        let (_, escaped) = chars.next()?;
                        key.push(escaped);
                    }
                    '"' => return colon_after(content, i + 1).map(|end| (key, end)),
                    _ => key.push(c),
                }
            }
            None
        }
        '#' | '{' | '[' | '&' | '*' | '!' | '|' | '>' | '?' | '%' => None,
        _ => {
            let mut search = 0;
            while let Some(pos) = content[search..].find(':') {
                let idx = search + pos;
                let rest = &content[idx + 1..];
                if rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t') {
                    let key = content[..idx].trim_end();
                    if key.is_empty() {
                        return None;
                    }
                    return Some((key.to_string(), idx + 1));
                }
                search = idx + 1;
            }
            None
        }
    }
}

fn colon_after(content: &str, quote_end: usize) -> Option<usize> {
    let rest = &content[quote_end..];
    let trimmed = rest.trim_start();
    let after = trimmed.strip_prefix(':')?;
    if after.is_empty() || after.starts_with(' ') || after.starts_with('\t') {
        Some(content.len() - after.len())
    } else {
        None
    }
}

/// Block is a mapping entry: its key line plus every continuation line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub name: String,
    /// Line index of the key line.
    pub header: usize,
    /// Exclusive line index past the last line of the block.
    pub end: usize,
    pub indent: usize,
}

impl Block {
    /// Line range covering the whole block.
    pub fn lines(&self) -> Range<usize> {
        self.header..self.end
    }

    /// Line range of the block's value, excluding the key line.
    pub fn body(&self) -> Range<usize> {
        self.header + 1..self.end
    }
}

/// Section is a mapping located by key path whose entries sit at `indent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub path: Vec<String>,
    /// Key line of the section; `None` for the document root.
    pub header: Option<usize>,
    pub body: Range<usize>,
    pub indent: usize,
}

impl Section {
    /// Human-readable location used in errors.
    pub fn location(&self) -> String {
        if self.path.is_empty() {
            "<root>".to_string()
        } else {
            self.path.join(".")
        }
    }
}

/// Lookup is the result of resolving a section path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(Section),
    /// The deepest existing ancestor and the path segments that do not exist yet.
    Missing {
        parent: Section,
        remaining: Vec<String>,
    },
}

/// Outline indexes the lines of a YAML source.
#[derive(Debug, Clone)]
pub struct Outline<'a> {
    source: &'a str,
    lines: Vec<Line<'a>>,
}

impl<'a> Outline<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut lines = Vec::new();
        let mut start = 0;
        for raw in source.split_inclusive('\n') {
            let end = start + raw.len();
            let text = raw.trim_end_matches('\n').trim_end_matches('\r');
            lines.push(Line { start, end, text });
            start = end;
        }
        Outline { source, lines }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, index: usize) -> &Line<'a> {
        &self.lines[index]
    }

    pub fn lines(&self) -> &[Line<'a>] {
        &self.lines
    }

    /// Byte offset at which the given line starts (or the end of the source).
    pub fn offset(&self, line: usize) -> usize {
        self.lines.get(line).map(|l| l.start).unwrap_or(self.source.len())
    }

    /// Byte range covering a range of lines, terminators included.
    pub fn byte_range(&self, lines: Range<usize>) -> Range<usize> {
        self.offset(lines.start)..self.offset(lines.end)
    }

    /// Source text of a range of lines.
    pub fn slice(&self, lines: Range<usize>) -> &'a str {
        &self.source[self.byte_range(lines)]
    }

    /// Exclusive end of the block whose key line is `header`.
    ///
    /// Continuation lines are deeper-indented lines, sequence items at the
    /// key's own indentation, and blank or shallow comment lines followed by
    /// more continuation. Trailing blank and shallow comment lines are left
    /// outside the block.
    pub fn block_end(&self, header: usize, indent: usize, limit: usize) -> usize {
        let mut last = header + 1;
        for i in header + 1..limit {
            let line = &self.lines[i];
            if line.is_blank() {
                continue;
            }
            if line.indent() > indent || (line.indent() == indent && line.is_sequence_item()) {
                last = i + 1;
                continue;
            }
            if line.is_comment() {
                continue;
            }
            break;
        }
        last
    }

    /// Mapping entries keyed at exactly `indent` within `body`.
    pub fn children(&self, body: Range<usize>, indent: usize) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut i = body.start;
        while i < body.end {
            let line = &self.lines[i];
            if line.is_content() && line.indent() == indent {
                if let Some(name) = line.key() {
                    let end = self.block_end(i, indent, body.end);
                    blocks.push(Block {
                        name,
                        header: i,
                        end,
                        indent,
                    });
                    i = end;
                    continue;
                }
            }
            i += 1;
        }
        blocks
    }

    /// Finds the named entry of a section.
    pub fn child(&self, section: &Section, name: &str) -> Option<Block> {
        self.children(section.body.clone(), section.indent)
            .into_iter()
            .find(|b| b.name == name)
    }

    /// Indentation of the first structural line in `body`.
    pub fn child_indent(&self, body: Range<usize>) -> Option<usize> {
        self.lines[body]
            .iter()
            .find(|l| l.is_content())
            .map(|l| l.indent())
    }

    /// The document root as a section whose entries sit at column zero.
    pub fn root(&self) -> Section {
        Section {
            path: Vec::new(),
            header: None,
            body: 0..self.lines.len(),
            indent: 0,
        }
    }

    /// Resolves a key path, expecting each level `unit` spaces deeper.
    pub fn section(&self, path: &[String], unit: usize) -> Result<Lookup> {
        let mut current = self.root();
        for (depth, segment) in path.iter().enumerate() {
            self.check_indent(&current)?;
            let Some(block) = self.child(&current, segment) else {
                return Ok(Lookup::Missing {
                    parent: current,
                    remaining: path[depth..].to_vec(),
                });
            };
            let mut sub_path = current.path.clone();
            sub_path.push(segment.clone());
            current = Section {
                path: sub_path,
                header: Some(block.header),
                body: block.body(),
                indent: current.indent + unit,
            };
        }
        self.check_indent(&current)?;
        Ok(Lookup::Found(current))
    }

    /// Line index just past the last entry of a section.
    pub fn end_of_entries(&self, section: &Section) -> usize {
        match self.children(section.body.clone(), section.indent).last() {
            Some(block) => block.end,
            None => match section.header {
                Some(header) => header + 1,
                None => section.body.end,
            },
        }
    }

    fn check_indent(&self, section: &Section) -> Result<()> {
        if let Some(header) = section.header {
            if let Some(value) = self.lines[header].inline_value() {
                return Err(ReconcileError::pattern_mismatch(
                    section.location(),
                    format!("section carries an inline value `{}`", value),
                ));
            }
        }
        match self.child_indent(section.body.clone()) {
            Some(actual) if actual != section.indent => Err(ReconcileError::pattern_mismatch(
                section.location(),
                format!(
                    "expected entries at indentation {}, found {}",
                    section.indent, actual
                ),
            )),
            _ => Ok(()),
        }
    }
}
