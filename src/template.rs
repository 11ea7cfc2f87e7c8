//! Rewrite templates
//!
//! A template is code text with `#{...}` placeholders, e.g.
//! `#{any()}.getRouteController().startRoute(#{any()})`. Applying it binds
//! the placeholders positionally to matched sub-nodes (receiver first, then
//! the arguments in source order), parses the result and splices the bound
//! nodes in unchanged, so literals, comments and spacing inside them survive.

use crate::lang::java::parse_expression;
use crate::lang::ParseError;
use crate::tree::{transform, Node};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use thiserror::Error;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#\{[^}]*\}").expect("valid placeholder regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template expects {expected} values, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("template does not parse: {0}")]
    Unparsable(#[from] ParseError),

    #[error("placeholder {0} is not in an expression position")]
    UnboundPlaceholder(usize),
}

/// A parsed template string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    text: String,
    placeholders: usize,
}

impl Template {
    pub fn parse(text: &str) -> Self {
        Self {
            text: text.to_string(),
            placeholders: PLACEHOLDER.find_iter(text).count(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn placeholder_count(&self) -> usize {
        self.placeholders
    }

    /// Instantiate with one value per placeholder; values keep their own prefixes
    pub fn apply(&self, values: &[Arc<Node>]) -> Result<Node, TemplateError> {
        self.instantiate(values, false)
    }

    /// Like [`Template::apply`], but values whose prefix is plain whitespace
    /// take the spacing written in the template instead
    pub fn apply_reflowed(&self, values: &[Arc<Node>]) -> Result<Node, TemplateError> {
        self.instantiate(values, true)
    }

    fn instantiate(&self, values: &[Arc<Node>], reflow: bool) -> Result<Node, TemplateError> {
        if values.len() != self.placeholders {
            return Err(TemplateError::ArityMismatch {
                expected: self.placeholders,
                actual: values.len(),
            });
        }

        let mut index = 0;
        let skeleton = PLACEHOLDER.replace_all(&self.text, |_: &regex::Captures| {
            let hole = hole_name(index);
            index += 1;
            hole
        });
        let parsed = Arc::new(parse_expression(&skeleton)?);

        let mut bound = vec![false; values.len()];
        let filled = transform(&parsed, &mut |node, _| {
            let Node::Ident(ident) = node.as_ref() else {
                return None;
            };
            let slot = hole_index(ident.text())?;
            let value = values.get(slot)?;
            bound[slot] = true;
            if reflow && value.prefix().trim().is_empty() {
                Some(value.with_prefix(&ident.token.prefix))
            } else {
                Some(value.as_ref().clone())
            }
        });
        if let Some(missing) = bound.iter().position(|b| !b) {
            return Err(TemplateError::UnboundPlaceholder(missing));
        }
        Ok(Arc::unwrap_or_clone(filled))
    }
}

fn hole_name(index: usize) -> String {
    format!("__hole{}__", index)
}

fn hole_index(text: &str) -> Option<usize> {
    text.strip_prefix("__hole")?.strip_suffix("__")?.parse().ok()
}

/// Parse `template` and instantiate it in one go
pub fn build_template(template: &str, values: &[Arc<Node>]) -> Result<Node, TemplateError> {
    Template::parse(template).apply(values)
}

/// `receiver.accessor().method(a1, .., an)` for a call of the given arity
pub fn accessor_template(accessor: &str, method: &str, arity: usize) -> String {
    let args = vec!["#{any()}"; arity].join(", ");
    format!("#{{any()}}.{}().{}({})", accessor, method, args)
}
