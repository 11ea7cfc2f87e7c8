//! Patterns: pure predicates over tree nodes
//!
//! Evaluating a pattern never mutates anything. The outcome distinguishes a
//! clean miss from a candidate the matcher could not decide on (for example
//! a call whose receiver type is unknown); undecidable candidates are never
//! rewritten.

pub mod path;
pub mod signature;

use crate::tree::{Cursor, Node};
use globset::{Glob, GlobMatcher};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub use path::PathPattern;
pub use signature::{MethodPattern, ParamPattern};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("invalid signature pattern: {0}")]
    InvalidSignature(String),

    #[error("invalid path pattern: {0}")]
    InvalidPath(String),

    #[error("invalid key pattern {pattern}: {message}")]
    InvalidGlob { pattern: String, message: String },
}

/// Sub-nodes captured by a match, handed to the action
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    /// Receiver of a matched invocation
    pub receiver: Option<Arc<Node>>,
    /// Arguments of a matched invocation, in source order
    pub args: Vec<Arc<Node>>,
    /// Resolved type that made the match
    pub matched_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Matched(Bindings),
    NoMatch,
    /// The node might match but the needed type information is missing
    Ambiguous(String),
}

impl MatchOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::Matched(_))
    }

    fn matched_if(condition: bool) -> Self {
        if condition {
            MatchOutcome::Matched(Bindings::default())
        } else {
            MatchOutcome::NoMatch
        }
    }
}

/// Known type and package relocations, consulted when comparing types
#[derive(Debug, Clone, Default)]
pub struct TypeAliases {
    types: HashMap<String, BTreeSet<String>>,
    packages: Vec<(String, String)>,
}

impl TypeAliases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat `old` and `new` as the same type
    pub fn add_type(&mut self, old: &str, new: &str) {
        self.types
            .entry(old.to_string())
            .or_default()
            .insert(new.to_string());
        self.types
            .entry(new.to_string())
            .or_default()
            .insert(old.to_string());
    }

    /// Treat every type in package `old` as the same-named type in `new`
    pub fn add_package(&mut self, old: &str, new: &str) {
        let pair = (old.to_string(), new.to_string());
        if !self.packages.contains(&pair) {
            self.packages.push(pair);
        }
    }

    /// Add everything known to `other`
    pub fn merge(&mut self, other: &TypeAliases) {
        for (from, targets) in &other.types {
            for to in targets {
                self.add_type(from, to);
            }
        }
        for (old, new) in &other.packages {
            self.add_package(old, new);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.packages.is_empty()
    }

    /// Whether two fully-qualified type names denote the same type
    pub fn equivalent(&self, a: &str, b: &str) -> bool {
        if a == b {
            return true;
        }
        if self.types.get(a).is_some_and(|set| set.contains(b)) {
            return true;
        }
        self.packages
            .iter()
            .any(|(old, new)| moved(a, b, old, new) || moved(b, a, old, new))
    }

    /// Like [`TypeAliases::equivalent`], for `Type.MEMBER` names
    pub fn equivalent_member(&self, a: &str, b: &str) -> bool {
        match (a.rsplit_once('.'), b.rsplit_once('.')) {
            (Some((owner_a, member_a)), Some((owner_b, member_b))) => {
                member_a == member_b && self.equivalent(owner_a, owner_b)
            }
            _ => a == b,
        }
    }
}

/// `to` is `from` moved from package `old` to package `new`
fn moved(from: &str, to: &str, old: &str, new: &str) -> bool {
    match (from.rsplit_once('.'), to.rsplit_once('.')) {
        (Some((from_pkg, from_name)), Some((to_pkg, to_name))) => {
            from_pkg == old && to_pkg == new && from_name == to_name
        }
        _ => false,
    }
}

/// What a pattern may look at besides the node itself
pub struct MatchContext<'a> {
    pub cursor: &'a Cursor,
    pub aliases: &'a TypeAliases,
}

#[derive(Debug, Clone)]
pub enum Pattern {
    /// Invocations of a method on a declared type
    Signature(MethodPattern),
    /// Markup elements by ancestor chain
    Path(PathPattern),
    /// References to a type: imports, simple and qualified usages
    Type(String),
    /// Annotations of a type, optionally only when an attribute is present
    Annotation {
        annotation_type: String,
        attribute: Option<String>,
    },
    /// Declarations initialized with a matching invocation
    Initializer(MethodPattern),
    /// Property entries by key glob and optional exact value
    Property {
        key: String,
        matcher: GlobMatcher,
        value: Option<String>,
    },
    /// The first alternative that matches
    Any(Vec<Pattern>),
}

impl Pattern {
    pub fn signature(text: &str) -> Result<Self, PatternError> {
        Ok(Pattern::Signature(text.parse()?))
    }

    pub fn path(text: &str) -> Result<Self, PatternError> {
        Ok(Pattern::Path(text.parse()?))
    }

    pub fn type_ref(fqn: &str) -> Self {
        Pattern::Type(fqn.to_string())
    }

    pub fn annotation(fqn: &str, attribute: Option<&str>) -> Self {
        Pattern::Annotation {
            annotation_type: fqn.to_string(),
            attribute: attribute.map(String::from),
        }
    }

    pub fn initializer(text: &str) -> Result<Self, PatternError> {
        Ok(Pattern::Initializer(text.parse()?))
    }

    pub fn property(key: &str, value: Option<&str>) -> Result<Self, PatternError> {
        let glob = Glob::new(key).map_err(|e| PatternError::InvalidGlob {
            pattern: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(Pattern::Property {
            key: key.to_string(),
            matcher: glob.compile_matcher(),
            value: value.map(String::from),
        })
    }

    /// Evaluate against one node
    pub fn evaluate(&self, node: &Arc<Node>, ctx: &MatchContext) -> MatchOutcome {
        match (self, node.as_ref()) {
            (Pattern::Signature(method), Node::Invocation(call)) => {
                method.matches(call, ctx.aliases)
            }
            (Pattern::Path(path), Node::Tag(tag)) => {
                MatchOutcome::matched_if(path.matches(tag, ctx.cursor))
            }
            (Pattern::Type(fqn), _) => match_type_reference(fqn, node, ctx.aliases),
            (
                Pattern::Annotation {
                    annotation_type,
                    attribute,
                },
                Node::Annotation(annotation),
            ) => {
                let simple = annotation_type.rsplit('.').next().unwrap_or(annotation_type);
                let type_matches = match annotation.declared_type.as_deref() {
                    Some(declared) => ctx.aliases.equivalent(declared, annotation_type),
                    None if annotation.name.text() == simple => {
                        return MatchOutcome::Ambiguous(format!(
                            "annotation @{} is not imported",
                            simple
                        ))
                    }
                    None => false,
                };
                let has_attribute = attribute
                    .as_deref()
                    .map_or(true, |a| annotation.attribute_names().contains(&a));
                MatchOutcome::matched_if(type_matches && has_attribute)
            }
            (Pattern::Initializer(method), Node::Declaration(decl)) => {
                match decl.initializer.as_ref().map(|i| i.value.as_ref()) {
                    Some(Node::Invocation(call)) => method.matches(call, ctx.aliases),
                    _ => MatchOutcome::NoMatch,
                }
            }
            (Pattern::Property { matcher, value, .. }, Node::Entry(entry)) => {
                let value_matches = value
                    .as_deref()
                    .map_or(true, |v| entry.value.text.trim() == v);
                MatchOutcome::matched_if(matcher.is_match(&entry.key.text) && value_matches)
            }
            (Pattern::Any(alternatives), _) => {
                let mut ambiguous = None;
                for alternative in alternatives {
                    match alternative.evaluate(node, ctx) {
                        MatchOutcome::Matched(bindings) => return MatchOutcome::Matched(bindings),
                        MatchOutcome::Ambiguous(reason) => {
                            ambiguous.get_or_insert(reason);
                        }
                        MatchOutcome::NoMatch => {}
                    }
                }
                ambiguous.map_or(MatchOutcome::NoMatch, MatchOutcome::Ambiguous)
            }
            _ => MatchOutcome::NoMatch,
        }
    }
}

/// Imports, static imports of members, and resolved type usages of `fqn`
/// or of a type the aliases relocate it to
///
/// `matched_type` is the name as written, the owner type for a static import.
fn match_type_reference(fqn: &str, node: &Node, aliases: &TypeAliases) -> MatchOutcome {
    let found = match node {
        Node::Import(import) if !import.is_wildcard() => {
            let name = import.qualified_name();
            if aliases.equivalent(&name, fqn) {
                Some(name.to_string())
            } else if import.is_static() {
                name.rsplit_once('.')
                    .filter(|(owner, _)| aliases.equivalent(owner, fqn))
                    .map(|(owner, _)| owner.to_string())
            } else {
                None
            }
        }
        Node::Ident(_) | Node::FieldAccess(_) => node
            .symbol()
            .filter(|symbol| aliases.equivalent(symbol, fqn))
            .map(String::from),
        _ => None,
    };
    match found {
        Some(written) => MatchOutcome::Matched(Bindings {
            matched_type: Some(written),
            ..Bindings::default()
        }),
        None => MatchOutcome::NoMatch,
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Signature(m) => write!(f, "{}", m),
            Pattern::Path(p) => write!(f, "path {}", p),
            Pattern::Type(t) => write!(f, "type {}", t),
            Pattern::Annotation {
                annotation_type,
                attribute,
            } => match attribute {
                Some(a) => write!(f, "@{}({})", annotation_type, a),
                None => write!(f, "@{}", annotation_type),
            },
            Pattern::Initializer(m) => write!(f, "initializer {}", m),
            Pattern::Property { key, value, .. } => match value {
                Some(v) => write!(f, "property {}={}", key, v),
                None => write!(f, "property {}", key),
            },
            Pattern::Any(alternatives) => {
                let parts: Vec<String> = alternatives.iter().map(|p| p.to_string()).collect();
                write!(f, "any of [{}]", parts.join(", "))
            }
        }
    }
}
