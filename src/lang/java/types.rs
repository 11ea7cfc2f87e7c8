//! Declared-type resolution
//!
//! A single-file resolver: types are resolved through the unit's imports,
//! primitives and `java.lang`; variables take the type of their declaration.
//! A name declared twice with different types resolves to nothing, so rules
//! gated on types stay conservative.

use crate::tree::{transform, Node};
use std::collections::HashMap;
use std::sync::Arc;

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double",
];

const JAVA_LANG: &[&str] = &[
    "AutoCloseable", "Boolean", "Byte", "CharSequence", "Character", "Class", "Comparable",
    "Deprecated", "Double", "Enum", "Error", "Exception", "Float", "FunctionalInterface",
    "IllegalArgumentException", "IllegalStateException", "Integer", "InterruptedException",
    "Iterable", "Long", "Math", "NullPointerException", "Number", "Object", "Override",
    "Runnable", "RuntimeException", "Short", "String", "StringBuilder", "SuppressWarnings",
    "System", "Thread", "Throwable", "UnsupportedOperationException", "Void",
];

/// Names visible in one compilation unit
#[derive(Debug, Default)]
pub struct SymbolTable {
    /// Simple name to fully-qualified type
    imports: HashMap<String, String>,
    /// Statically imported member to its qualified name
    static_imports: HashMap<String, String>,
    /// Variable name to its type; `None` when declarations disagree
    variables: HashMap<String, Option<String>>,
}

impl SymbolTable {
    /// Collect imports and declarations of a unit
    pub fn collect(root: &Arc<Node>) -> Self {
        let mut nodes = Vec::new();
        walk(root, &mut nodes);

        let mut table = Self::default();
        for node in &nodes {
            if let Node::Import(import) = node.as_ref() {
                if import.is_wildcard() {
                    continue;
                }
                let name = import.qualified_name();
                let simple = name.rsplit('.').next().unwrap_or(&name).to_string();
                if import.is_static() {
                    table.static_imports.insert(simple, name);
                } else {
                    table.imports.insert(simple, name);
                }
            }
        }
        for node in &nodes {
            if let Node::Declaration(decl) = node.as_ref() {
                let resolved = table.resolve_type(&type_text(&decl.type_ref));
                let name = decl.name.text().to_string();
                match table.variables.get(&name) {
                    Some(existing) if *existing != resolved => {
                        table.variables.insert(name, None);
                    }
                    Some(_) => {}
                    None => {
                        table.variables.insert(name, resolved);
                    }
                }
            }
        }
        table
    }

    /// Fully-qualified form of a type as written in the source
    pub fn resolve_type(&self, written: &str) -> Option<String> {
        let written = strip_type_arguments(written).replace("...", "[]");
        let base_len = written.find('[').unwrap_or(written.len());
        let (base, dims) = written.split_at(base_len);

        let resolved = if PRIMITIVES.contains(&base) {
            base.to_string()
        } else if let Some((head, rest)) = base.split_once('.') {
            match self.imports.get(head) {
                Some(fqn) => format!("{}.{}", fqn, rest),
                None if head.starts_with(char::is_lowercase) => base.to_string(),
                None => return None,
            }
        } else if let Some(fqn) = self.imports.get(base) {
            fqn.clone()
        } else if JAVA_LANG.contains(&base) {
            format!("java.lang.{}", base)
        } else {
            return None;
        };
        Some(format!("{}{}", resolved, dims))
    }

    /// Declared type of a variable, when unambiguous
    pub fn variable_type(&self, name: &str) -> Option<&str> {
        self.variables.get(name)?.as_deref()
    }

    fn is_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    fn attribute_node(&self, node: &Node) -> Option<Node> {
        match node {
            Node::Ident(ident) => {
                let name = ident.text();
                let mut ident = ident.clone();
                if self.is_variable(name) {
                    ident.declared_type = self.variable_type(name).map(str::to_string);
                } else if name.starts_with(char::is_uppercase) {
                    ident.symbol = self
                        .resolve_type(name)
                        .or_else(|| self.static_imports.get(name).cloned());
                } else {
                    ident.symbol = self.static_imports.get(name).cloned();
                }
                if ident.declared_type.is_none() && ident.symbol.is_none() {
                    return None;
                }
                Some(Node::Ident(ident))
            }
            Node::FieldAccess(access) => {
                if access.name.text() == "class" {
                    return None;
                }
                let mut access = access.clone();
                let member = access.name.text();
                access.symbol = match access.target.symbol() {
                    Some(owner) => Some(format!("{}.{}", owner, member)),
                    None => self.qualified_type(node),
                };
                access.symbol.as_ref()?;
                Some(Node::FieldAccess(access))
            }
            Node::Declaration(decl) => {
                let resolved = self.resolve_type(&type_text(&decl.type_ref))?;
                let mut decl = decl.clone();
                decl.name.declared_type = Some(resolved.clone());
                decl.declared_type = Some(resolved);
                Some(Node::Declaration(decl))
            }
            Node::NewObject(created) => {
                let resolved = self.resolve_type(&type_text(&created.class))?;
                let mut created = created.clone();
                created.declared_type = Some(resolved);
                Some(Node::NewObject(created))
            }
            Node::Annotation(annotation) => {
                let resolved = self.resolve_type(&type_text(&annotation.name))?;
                let mut annotation = annotation.clone();
                annotation.declared_type = Some(resolved);
                Some(Node::Annotation(annotation))
            }
            _ => None,
        }
    }

    /// `a.b.C` written out in full: lowercase package, capitalized type
    fn qualified_type(&self, node: &Node) -> Option<String> {
        let dotted = self.dotted(node)?;
        let first = dotted.split('.').next()?;
        let last = dotted.rsplit('.').next()?;
        if first.starts_with(char::is_lowercase) && last.starts_with(char::is_uppercase) {
            Some(dotted)
        } else {
            None
        }
    }

    fn dotted(&self, node: &Node) -> Option<String> {
        match node {
            Node::Ident(ident) if !self.is_variable(ident.text()) => Some(ident.text().to_string()),
            Node::FieldAccess(access) => {
                Some(format!("{}.{}", self.dotted(&access.target)?, access.name.text()))
            }
            _ => None,
        }
    }
}

/// Attach declared types and symbols to every node of a unit
pub fn attribute(root: &Arc<Node>) -> Arc<Node> {
    let table = SymbolTable::collect(root);
    transform(root, &mut |node, _| table.attribute_node(node))
}

fn walk<'a>(node: &'a Arc<Node>, out: &mut Vec<&'a Arc<Node>>) {
    out.push(node);
    for child in node.children() {
        walk(child, out);
    }
}

/// Type text without whitespace or comments
fn type_text(node: &Node) -> String {
    let mut out = String::new();
    collect_token_text(node, &mut out);
    out
}

fn collect_token_text(node: &Node, out: &mut String) {
    match node {
        Node::Token(t) => out.push_str(&t.text),
        Node::Ident(i) => out.push_str(i.text()),
        Node::FieldAccess(f) => {
            collect_token_text(&f.target, out);
            out.push('.');
            out.push_str(f.name.text());
        }
        Node::Group(g) => {
            for child in &g.children {
                collect_token_text(child, out);
            }
        }
        other => out.push_str(other.text().trim()),
    }
}

fn strip_type_arguments(written: &str) -> String {
    let mut depth = 0usize;
    let mut out = String::with_capacity(written.len());
    for c in written.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}
