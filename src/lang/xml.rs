//! Lossless XML parsing on top of quick-xml events
//!
//! quick-xml validates the document and tells us where each event starts and
//! ends; the tree is built from the raw slices so attribute quoting, spacing
//! and entity spelling survive untouched. Comments and whitespace between
//! markup are trivia and land in the prefix of the next tag (or the closing
//! tag, or a trailing token at the end of the document).

use super::{Language, ParseError};
use crate::tree::{
    ArtifactKind, Attribute, ClosingTag, Group, GroupKind, LineIndex, Node, Tag, Token, Tree,
};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::sync::Arc;

/// XML configuration files
pub struct XmlLanguage;

impl Default for XmlLanguage {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlLanguage {
    pub fn new() -> Self {
        Self
    }
}

impl Language for XmlLanguage {
    fn id(&self) -> &str {
        "xml"
    }

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Markup
    }

    fn extensions(&self) -> &[&str] {
        &["xml"]
    }

    fn parse(&self, source: &str) -> Result<Tree, ParseError> {
        let root = parse_document(source)?;
        Ok(Tree::new(ArtifactKind::Markup, root))
    }
}

/// Parse a whole document into a `Document` group
pub fn parse_document(source: &str) -> Result<Node, ParseError> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(false);

    let index = LineIndex::new(source);
    let line_of = |pos: usize| index.line_col(pos).0;

    let mut buf = Vec::new();
    let mut document: Vec<Arc<Node>> = Vec::new();
    let mut open: Vec<Tag> = Vec::new();
    let mut pending = String::new();

    loop {
        buf.clear();
        let start = reader.buffer_position() as usize;
        let event = reader.read_event_into(&mut buf).map_err(|err| ParseError::Xml {
            line: line_of(reader.buffer_position() as usize),
            message: err.to_string(),
        })?;
        let end = reader.buffer_position() as usize;
        let raw = source.get(start..end).ok_or_else(|| ParseError::Xml {
            line: line_of(start),
            message: "event does not fall on a character boundary".to_string(),
        })?;

        match event {
            Event::Start(_) => {
                let mut tag = parse_start_tag(raw, start, false)
                    .map_err(|message| ParseError::Xml { line: line_of(start), message })?;
                tag.prefix = std::mem::take(&mut pending);
                open.push(tag);
            }
            Event::Empty(_) => {
                let mut tag = parse_start_tag(raw, start, true)
                    .map_err(|message| ParseError::Xml { line: line_of(start), message })?;
                tag.prefix = std::mem::take(&mut pending);
                push_child(&mut open, &mut document, Node::Tag(tag));
            }
            Event::End(_) => {
                let closing = parse_end_tag(raw, std::mem::take(&mut pending));
                let mut tag = open.pop().ok_or_else(|| ParseError::Xml {
                    line: line_of(start),
                    message: format!("unexpected closing tag </{}>", closing.name),
                })?;
                if tag.name != closing.name {
                    return Err(ParseError::Xml {
                        line: line_of(start),
                        message: format!(
                            "expected </{}>, found </{}>",
                            tag.name, closing.name
                        ),
                    });
                }
                tag.closing = Some(closing);
                push_child(&mut open, &mut document, Node::Tag(tag));
            }
            Event::Comment(_) => pending.push_str(raw),
            Event::Text(_) if raw.chars().all(char::is_whitespace) => pending.push_str(raw),
            Event::Eof => break,
            _ => {
                let token = Token::new(std::mem::take(&mut pending), raw, start);
                push_child(&mut open, &mut document, Node::Token(token));
            }
        }
    }

    if let Some(tag) = open.last() {
        return Err(ParseError::Xml {
            line: tag.offset.map(line_of).unwrap_or(0),
            message: format!("unclosed tag <{}>", tag.name),
        });
    }
    if !pending.is_empty() {
        document.push(Arc::new(Node::Token(Token {
            prefix: pending,
            text: String::new(),
            offset: None,
        })));
    }

    Ok(Node::Group(Group {
        kind: GroupKind::Document,
        children: document,
    }))
}

fn push_child(open: &mut [Tag], document: &mut Vec<Arc<Node>>, node: Node) {
    match open.last_mut() {
        Some(parent) => parent.children.push(Arc::new(node)),
        None => document.push(Arc::new(node)),
    }
}

/// Split `<name a="1"  b='2' >` (or `/>`) into its parts
fn parse_start_tag(raw: &str, offset: usize, self_closing: bool) -> Result<Tag, String> {
    let close_len = if self_closing { 2 } else { 1 };
    let body = raw
        .get(1..raw.len().saturating_sub(close_len))
        .ok_or_else(|| format!("malformed tag {}", raw))?;

    let name_len = body
        .find(|c: char| c.is_whitespace())
        .unwrap_or(body.len());
    let name = &body[..name_len];
    if name.is_empty() {
        return Err(format!("missing element name in {}", raw));
    }

    let mut attributes = Vec::new();
    let mut pos = name_len;
    let before_close = loop {
        let ws_end = skip_whitespace(body, pos);
        let ws = &body[pos..ws_end];
        if ws_end == body.len() {
            break ws.to_string();
        }
        let attr_start = ws_end;

        let key_end = body[attr_start..]
            .find(|c: char| c.is_whitespace() || c == '=')
            .map(|i| attr_start + i)
            .unwrap_or(body.len());
        let key = &body[attr_start..key_end];
        let eq = skip_whitespace(body, key_end);
        if key.is_empty() || !body[eq..].starts_with('=') {
            return Err(format!("attribute without value in <{}>", name));
        }
        let value_start = skip_whitespace(body, eq + 1);
        let quote = body[value_start..]
            .chars()
            .next()
            .filter(|c| *c == '"' || *c == '\'')
            .ok_or_else(|| format!("unquoted attribute value in <{}>", name))?;
        let value_end = body[value_start + 1..]
            .find(quote)
            .map(|i| value_start + 1 + i)
            .ok_or_else(|| format!("unterminated attribute value in <{}>", name))?;

        attributes.push(Attribute {
            prefix: ws.to_string(),
            key: key.to_string(),
            before_eq: body[key_end..eq].to_string(),
            after_eq: body[eq + 1..value_start].to_string(),
            quote,
            value: body[value_start + 1..value_end].to_string(),
            offset: Some(offset + 1 + attr_start),
        });
        pos = value_end + 1;
    };

    Ok(Tag {
        prefix: String::new(),
        name: name.to_string(),
        attributes,
        before_close,
        self_closing,
        children: Vec::new(),
        closing: None,
        offset: Some(offset),
    })
}

fn parse_end_tag(raw: &str, prefix: String) -> ClosingTag {
    let inner = raw
        .strip_prefix("</")
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(raw);
    let name_len = inner
        .find(|c: char| c.is_whitespace())
        .unwrap_or(inner.len());
    ClosingTag {
        prefix,
        name: inner[..name_len].to_string(),
        trailing: inner[name_len..].to_string(),
    }
}

fn skip_whitespace(s: &str, from: usize) -> usize {
    s[from..]
        .find(|c: char| !c.is_whitespace())
        .map(|i| from + i)
        .unwrap_or(s.len())
}
