//! Java-style `.properties` files
//!
//! Blank lines and `#`/`!` comment lines are trivia and end up in the prefix
//! of the following entry. A value runs to the end of its logical line, so
//! backslash continuations stay inside the value token verbatim.

use super::{Language, ParseError};
use crate::tree::{ArtifactKind, Entry, Group, GroupKind, Node, Token, Tree};
use std::sync::Arc;

/// Key/value property files
pub struct PropertiesLanguage;

impl Default for PropertiesLanguage {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertiesLanguage {
    pub fn new() -> Self {
        Self
    }
}

impl Language for PropertiesLanguage {
    fn id(&self) -> &str {
        "properties"
    }

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Properties
    }

    fn extensions(&self) -> &[&str] {
        &["properties"]
    }

    fn parse(&self, source: &str) -> Result<Tree, ParseError> {
        Ok(Tree::new(ArtifactKind::Properties, parse_properties(source)))
    }
}

/// Parse a properties file; every input is accepted
pub fn parse_properties(source: &str) -> Node {
    let mut children = Vec::new();
    let mut trivia_start = 0;
    let mut pos = 0;

    while pos < source.len() {
        let line_end = logical_line_end(source, pos);
        let line = &source[pos..line_end];
        let content = line.trim_start_matches([' ', '\t', '\x0c']);
        let indent = line.len() - content.len();

        if content.is_empty() || content.starts_with('#') || content.starts_with('!') {
            pos = next_line(source, line_end);
            continue;
        }

        let key_start = pos + indent;
        let key_end = key_start + key_length(content);
        let sep_end = separator_end(source, key_end, line_end);

        children.push(Arc::new(Node::Entry(Entry {
            key: Token::new(&source[trivia_start..key_start], &source[key_start..key_end], key_start),
            separator: Token::new("", &source[key_end..sep_end], key_end),
            value: Token::new("", &source[sep_end..line_end], sep_end),
        })));

        trivia_start = line_end;
        pos = next_line(source, line_end);
    }

    if trivia_start < source.len() {
        children.push(Arc::new(Node::Token(Token {
            prefix: source[trivia_start..].to_string(),
            text: String::new(),
            offset: None,
        })));
    }

    Node::Group(Group {
        kind: GroupKind::Properties,
        children,
    })
}

/// End of the logical line starting at `pos`, before its terminator
fn logical_line_end(source: &str, pos: usize) -> usize {
    let bytes = source.as_bytes();
    let mut end = pos;
    loop {
        let line_end = source[end..]
            .find('\n')
            .map(|i| end + i)
            .unwrap_or(source.len());
        let content_end = if line_end > end && bytes[line_end - 1] == b'\r' {
            line_end - 1
        } else {
            line_end
        };
        let is_comment = end == pos && {
            let trimmed = source[end..content_end].trim_start();
            trimmed.starts_with('#') || trimmed.starts_with('!')
        };
        if is_comment || line_end == source.len() || !continues(&source[end..content_end]) {
            return content_end;
        }
        end = line_end + 1;
    }
}

/// A line continues when it ends in an odd number of backslashes
fn continues(line: &str) -> bool {
    line.bytes().rev().take_while(|b| *b == b'\\').count() % 2 == 1
}

fn next_line(source: &str, line_end: usize) -> usize {
    source[line_end..]
        .find('\n')
        .map(|i| line_end + i + 1)
        .unwrap_or(source.len())
}

/// Length of the key at the start of `content`, honouring backslash escapes
fn key_length(content: &str) -> usize {
    let mut escaped = false;
    for (i, c) in content.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' | '\x0c' | '\r' | '\n' => return i,
            _ => {}
        }
    }
    content.len()
}

/// End of `ws* [=:]? ws*` after the key
fn separator_end(source: &str, key_end: usize, line_end: usize) -> usize {
    let rest = &source[key_end..line_end];
    let ws = |s: &str| s.len() - s.trim_start_matches([' ', '\t', '\x0c']).len();
    let mut pos = ws(rest);
    if rest[pos..].starts_with('=') || rest[pos..].starts_with(':') {
        pos += 1;
        pos += ws(&rest[pos..]);
    }
    key_end + pos
}
