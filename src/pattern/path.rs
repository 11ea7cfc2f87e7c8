//! Ancestor-chain patterns for markup
//!
//! `loadBalance/custom` matches a `custom` element whose parent is a
//! `loadBalance` element; `route//to` allows any depth between the two;
//! a leading `/` anchors the first segment to the document root and a
//! leading `//` (or none) lets the path start anywhere. `*` matches any
//! element name.
//!
//! A segment may carry predicates in brackets:
//!
//! - `dependency[artifactId='camel-jibx']`: a direct child element with that text
//! - `artifactId[.='camel-aws']`: the element's own text
//! - `custom[@ref='lb']`: an attribute value

use super::PatternError;
use crate::tree::{Cursor, Node, Tag};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Attribute { name: String, value: String },
    Text(String),
    Child { name: String, value: String },
}

impl Predicate {
    fn holds(&self, tag: &Tag) -> bool {
        match self {
            Predicate::Attribute { name, value } => {
                tag.attribute(name).is_some_and(|a| &a.value == value)
            }
            Predicate::Text(value) => tag.text_content() == *value,
            Predicate::Child { name, value } => tag
                .child_tags()
                .any(|child| name_matches(name, child) && child.text_content() == *value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    name: String,
    /// Separated from the previous segment by `//`
    descendant: bool,
    predicates: Vec<Predicate>,
}

impl Segment {
    fn matches(&self, tag: &Tag) -> bool {
        name_matches(&self.name, tag) && self.predicates.iter().all(|p| p.holds(tag))
    }
}

fn name_matches(name: &str, tag: &Tag) -> bool {
    name == "*" || name == tag.name || name == tag.local_name()
}

fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':' | '*'))
        && (!name.contains('*') || name == "*")
}

/// Split on `/` outside of brackets and quotes
fn split_segments(body: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote = None;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') if depth > 0 => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.checked_sub(1)?,
            (None, '/') if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 || quote.is_some() {
        return None;
    }
    parts.push(&body[start..]);
    Some(parts)
}

/// `name[pred][pred]`
fn parse_segment(part: &str) -> Option<(String, Vec<Predicate>)> {
    let name_end = part.find('[').unwrap_or(part.len());
    let name = &part[..name_end];
    if !valid_name(name) {
        return None;
    }
    let mut predicates = Vec::new();
    let mut rest = &part[name_end..];
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let (predicate, tail) = parse_predicate(inner)?;
        predicates.push(predicate);
        rest = tail;
    }
    Some((name.to_string(), predicates))
}

/// `lhs='value']` followed by whatever comes after the bracket
fn parse_predicate(inner: &str) -> Option<(Predicate, &str)> {
    let (lhs, after_eq) = inner.split_once('=')?;
    let after_eq = after_eq.trim_start();
    let quote = after_eq.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let value_start = quote.len_utf8();
    let value_len = after_eq[value_start..].find(quote)?;
    let value = after_eq[value_start..value_start + value_len].to_string();
    let tail = after_eq[value_start + value_len + quote.len_utf8()..].trim_start();
    let tail = tail.strip_prefix(']')?;

    let lhs = lhs.trim();
    let predicate = if lhs == "." {
        Predicate::Text(value)
    } else if let Some(name) = lhs.strip_prefix('@') {
        if !valid_name(name) || name == "*" {
            return None;
        }
        Predicate::Attribute {
            name: name.to_string(),
            value,
        }
    } else {
        if !valid_name(lhs) {
            return None;
        }
        Predicate::Child {
            name: lhs.to_string(),
            value,
        }
    };
    Some((predicate, tail))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    absolute: bool,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Name of the element the path ends in
    pub fn target(&self) -> &str {
        self.segments.last().map(|s| s.name.as_str()).unwrap_or("*")
    }

    /// Whether `tag`, visited below `cursor`, is at the end of this path
    pub fn matches(&self, tag: &Tag, cursor: &Cursor) -> bool {
        let mut chain: Vec<&Tag> = cursor
            .ancestors()
            .iter()
            .filter_map(|n| match n.as_ref() {
                Node::Tag(t) => Some(t),
                _ => None,
            })
            .collect();
        chain.push(tag);
        let last = self.segments.len() - 1;
        self.match_at(last, &chain, chain.len() - 1)
    }

    fn match_at(&self, seg: usize, chain: &[&Tag], pos: usize) -> bool {
        if !self.segments[seg].matches(chain[pos]) {
            return false;
        }
        if seg == 0 {
            return !self.absolute || pos == 0;
        }
        if self.segments[seg].descendant {
            (0..pos).rev().any(|p| self.match_at(seg - 1, chain, p))
        } else {
            pos > 0 && self.match_at(seg - 1, chain, pos - 1)
        }
    }
}

impl FromStr for PathPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PatternError::InvalidPath(s.to_string());
        let trimmed = s.trim();
        let (absolute, body) = if let Some(rest) = trimmed.strip_prefix("//") {
            (false, rest)
        } else if let Some(rest) = trimmed.strip_prefix('/') {
            (true, rest)
        } else {
            (false, trimmed)
        };

        let mut segments = Vec::new();
        let mut descendant = false;
        for part in split_segments(body).ok_or_else(invalid)? {
            if part.is_empty() {
                if descendant || segments.is_empty() {
                    return Err(invalid());
                }
                descendant = true;
                continue;
            }
            let (name, predicates) = parse_segment(part).ok_or_else(invalid)?;
            segments.push(Segment {
                name,
                descendant,
                predicates,
            });
            descendant = false;
        }
        if segments.is_empty() || descendant {
            return Err(invalid());
        }
        Ok(Self {
            source: trimmed.to_string(),
            absolute,
            segments,
        })
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::{Language, XmlLanguage};
    use crate::tree::transform;

    /// Names of the tags matched by `pattern` in `source`
    fn matched(pattern: &str, source: &str) -> Vec<String> {
        let pattern: PathPattern = pattern.parse().unwrap();
        let tree = XmlLanguage::new().parse(source).unwrap();
        let mut out = Vec::new();
        transform(tree.root(), &mut |node, cursor| {
            if let Node::Tag(tag) = node.as_ref() {
                if pattern.matches(tag, cursor) {
                    let id = tag.attribute("id").map(|a| a.value.clone());
                    out.push(id.unwrap_or_else(|| tag.name.clone()));
                }
            }
            None
        });
        out
    }

    const ROUTES: &str = r#"<routes>
  <route>
    <loadBalance><custom id="lb"/></loadBalance>
    <custom id="plain"/>
    <split><loadBalance><filter><custom id="deep"/></filter></loadBalance></split>
  </route>
</routes>"#;

    #[test]
    fn test_parent_child() {
        assert_eq!(matched("loadBalance/custom", ROUTES), vec!["lb"]);
    }

    #[test]
    fn test_descendant_and_wildcards() {
        assert_eq!(matched("loadBalance//custom", ROUTES), vec!["lb", "deep"]);
        assert_eq!(matched("//custom", ROUTES), vec!["lb", "plain", "deep"]);
        assert_eq!(matched("route/*/custom", ROUTES), vec!["lb"]);
    }

    #[test]
    fn test_absolute() {
        assert_eq!(matched("/routes/route", ROUTES), vec!["route"]);
        assert!(matched("/route", ROUTES).is_empty());
    }

    #[test]
    fn test_namespace_prefix() {
        let source = r#"<c:routes xmlns:c="x"><c:route/></c:routes>"#;
        assert_eq!(matched("routes/route", source), vec!["c:route"]);
    }

    const POM: &str = r#"<project>
  <dependencies>
    <dependency id="aws">
      <groupId>org.apache.camel</groupId>
      <artifactId>camel-aws</artifactId>
    </dependency>
    <dependency id="other">
      <groupId>com.acme</groupId>
      <artifactId>camel-aws</artifactId>
    </dependency>
  </dependencies>
</project>"#;

    #[test]
    fn test_child_text_predicates() {
        assert_eq!(
            matched("dependency[groupId='org.apache.camel'][artifactId='camel-aws']", POM),
            vec!["aws"]
        );
        assert_eq!(matched("dependency[artifactId=\"camel-aws\"]", POM), vec!["aws", "other"]);
        assert!(matched("dependency[artifactId='camel-jibx']", POM).is_empty());
    }

    #[test]
    fn test_own_text_and_attribute_predicates() {
        assert_eq!(
            matched("dependency[groupId='org.apache.camel']/artifactId[.='camel-aws']", POM),
            vec!["artifactId"]
        );
        assert_eq!(matched("/project//dependency[@id='other']", POM), vec!["other"]);
        assert_eq!(matched("custom[@id='lb']", ROUTES), vec!["lb"]);
    }

    #[test]
    fn test_predicate_values_may_hold_slashes() {
        let source = "<to><uri>http://a/b</uri></to>";
        assert_eq!(matched("to[uri='http://a/b']", source), vec!["to"]);
    }

    #[test]
    fn test_invalid_paths() {
        for bad in [
            "",
            "/",
            "a///b",
            "a/",
            "a b",
            "lo*ad",
            "a[b]",
            "a[b='c'",
            "a[@='c']",
            "a[b=c]",
            "a[b='c']x",
        ] {
            assert!(bad.parse::<PathPattern>().is_err(), "{:?} should be rejected", bad);
        }
        assert_eq!("a//b".parse::<PathPattern>().unwrap().target(), "b");
    }
}
