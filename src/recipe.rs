//! Rules and recipes
//!
//! A [`Recipe`] is a named group of [`RewriteRule`]s for one artifact kind
//! and one version step. Running it walks the tree once, post-order, so a
//! parent is matched against children that were already rewritten.
//!
//! When several rules match the same node, the first rule (in declaration
//! order) whose action rewrites, annotates or fails handles the node; later
//! rules are not consulted for it. A rule that matched but whose action left
//! the node unchanged lets the next rule try. A removed node leaves an
//! empty token behind, so it takes its leading trivia with it.

use crate::action::{Action, Effect};
use crate::catalogue::Version;
use crate::diagnostic::DiagnosticKind;
use crate::pattern::{MatchContext, MatchOutcome, Pattern, TypeAliases};
use crate::tree::{transform, ArtifactKind, Node, Token, Tree};
use log::debug;
use std::fmt;

/// A pattern paired with the action to take on matching nodes
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pub id: String,
    pub description: Option<String>,
    pub pattern: Pattern,
    pub action: Action,
}

impl RewriteRule {
    pub fn new(id: &str, pattern: Pattern, action: Action) -> Self {
        Self {
            id: id.to_string(),
            description: None,
            pattern,
            action,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Human-readable summary of what the rule does
    pub fn summary(&self) -> String {
        match &self.description {
            Some(d) => d.clone(),
            None => format!("{}: {}", self.pattern, self.action),
        }
    }

    /// Old and new type names when this rule relocates a type
    pub fn relocation(&self) -> Option<(&str, &str)> {
        match (&self.pattern, &self.action) {
            (Pattern::Type(old), Action::RenameConstruct(new)) if new.contains('.') => {
                Some((old.as_str(), new.as_str()))
            }
            _ => None,
        }
    }
}

/// A rewrite applied to one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub rule_id: String,
    pub recipe_id: String,
    /// Offset of the node in the text the recipe ran on
    pub offset: Option<usize>,
    pub description: String,
}

/// Something a recipe wants reported without (or besides) a rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: DiagnosticKind,
    pub rule_id: String,
    pub recipe_id: String,
    pub offset: Option<usize>,
    pub message: String,
}

/// Result of running one recipe over one tree
#[derive(Debug, Clone)]
pub struct RecipeRun {
    pub tree: Tree,
    pub changes: Vec<Change>,
    pub notices: Vec<Notice>,
}

impl RecipeRun {
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty() && self.notices.is_empty()
    }
}

/// A versioned group of rewrite rules for one artifact kind
#[derive(Debug, Clone)]
pub struct Recipe {
    pub id: String,
    pub display_name: String,
    pub description: Option<String>,
    pub from: Version,
    pub to: Version,
    pub kind: ArtifactKind,
    pub rules: Vec<RewriteRule>,
}

impl Recipe {
    pub fn new(id: &str, from: Version, to: Version, kind: ArtifactKind) -> Self {
        Self {
            id: id.to_string(),
            display_name: id.to_string(),
            description: None,
            from,
            to,
            kind,
            rules: Vec::new(),
        }
    }

    pub fn with_display_name(mut self, name: &str) -> Self {
        self.display_name = name.to_string();
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_rule(mut self, rule: RewriteRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Type aliases implied by the recipe's type relocations
    pub fn aliases(&self) -> TypeAliases {
        let mut aliases = TypeAliases::new();
        for (old, new) in self.rules.iter().filter_map(RewriteRule::relocation) {
            aliases.add_type(old, new);
        }
        aliases
    }

    /// Apply the recipe to a tree. Trees of other kinds come back untouched.
    pub fn run(&self, tree: &Tree, aliases: &TypeAliases) -> RecipeRun {
        let mut changes = Vec::new();
        let mut notices = Vec::new();
        if tree.kind() != self.kind {
            return RecipeRun {
                tree: tree.clone(),
                changes,
                notices,
            };
        }

        let notice = |kind, rule: &RewriteRule, offset, message: String| Notice {
            kind,
            rule_id: rule.id.clone(),
            recipe_id: self.id.clone(),
            offset,
            message,
        };

        let root = transform(tree.root(), &mut |node, cursor| {
            let ctx = MatchContext { cursor, aliases };
            for rule in &self.rules {
                let bindings = match rule.pattern.evaluate(node, &ctx) {
                    MatchOutcome::Matched(bindings) => bindings,
                    MatchOutcome::NoMatch => continue,
                    MatchOutcome::Ambiguous(reason) => {
                        notices.push(notice(
                            DiagnosticKind::AmbiguousMatch,
                            rule,
                            node.offset(),
                            format!("{} not applied: {}", rule.id, reason),
                        ));
                        continue;
                    }
                };

                match rule.action.apply(node, &bindings, self.kind) {
                    Effect::Unchanged => continue,
                    Effect::Rewritten(replacement) => {
                        debug!("{}: {} at {:?}", self.id, rule.id, node.offset());
                        changes.push(Change {
                            rule_id: rule.id.clone(),
                            recipe_id: self.id.clone(),
                            offset: node.offset(),
                            description: rule.summary(),
                        });
                        return Some(replacement.with_prefix(node.prefix()));
                    }
                    Effect::Removed => {
                        debug!("{}: {} removed node at {:?}", self.id, rule.id, node.offset());
                        changes.push(Change {
                            rule_id: rule.id.clone(),
                            recipe_id: self.id.clone(),
                            offset: node.offset(),
                            description: rule.summary(),
                        });
                        return Some(Node::Token(Token::synthetic("")));
                    }
                    Effect::Annotated {
                        node: annotated,
                        message,
                    } => {
                        notices.push(notice(
                            DiagnosticKind::ManualMigration,
                            rule,
                            node.offset(),
                            message,
                        ));
                        return annotated;
                    }
                    Effect::Failed(err) => {
                        notices.push(notice(
                            DiagnosticKind::TemplateError,
                            rule,
                            node.offset(),
                            format!("{} not applied: {}", rule.id, err),
                        ));
                        return None;
                    }
                }
            }
            None
        });

        RecipeRun {
            tree: Tree::from_root(tree.kind(), root),
            changes,
            notices,
        }
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} -> {}, {})",
            self.id, self.from, self.to, self.kind
        )
    }
}
