//! Rewrite actions
//!
//! An action turns a matched node into its replacement. Actions are pure:
//! they get the node and its bindings and report an [`Effect`]; when an
//! action does not apply to the node it reports `Unchanged` instead of
//! guessing.

use crate::pattern::Bindings;
use crate::template::{accessor_template, Template, TemplateError};
use crate::tree::{ArtifactKind, Ident, Node, Token};
use std::fmt;
use std::sync::Arc;

/// A value handed to a retargeting template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgRef {
    Receiver,
    Arg(usize),
}

impl std::str::FromStr for ArgRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "receiver" | "$receiver" => Ok(ArgRef::Receiver),
            other => other
                .trim_start_matches('$')
                .parse()
                .map(ArgRef::Arg)
                .map_err(|_| format!("Unknown argument reference: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    /// Rename a method, element, type, import, annotation or property key
    RenameConstruct(String),
    /// `r.m(a..)` becomes `r.accessor().m(a..)`
    WrapWithAccessor(String),
    /// Rebuild the node from a template fed with the mapped bindings
    RetargetArguments { template: Template, args: Vec<ArgRef> },
    /// Rename an element attribute or annotation argument
    RenameAttribute { from: String, to: String },
    /// Replace a property value, literal or element text
    ChangeValue(String),
    /// Drop the node together with its leading trivia
    RemoveConstruct,
    /// Leave the node as is and report a manual migration step,
    /// optionally recording it as a comment in front of the node
    AnnotateOnly { message: String, insert_comment: bool },
}

/// What applying an action did
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Unchanged,
    Rewritten(Node),
    /// The node is gone from the tree
    Removed,
    /// A manual-migration notice; `node` carries the inserted comment, if any
    Annotated { node: Option<Node>, message: String },
    /// The replacement could not be built; the node stays as it was
    Failed(TemplateError),
}

impl Action {
    pub fn rename(name: &str) -> Self {
        Action::RenameConstruct(name.to_string())
    }

    pub fn wrap_with_accessor(accessor: &str) -> Self {
        Action::WrapWithAccessor(accessor.to_string())
    }

    /// Template action; the number of mapped values must match the placeholders
    pub fn retarget(template: &str, args: Vec<ArgRef>) -> Result<Self, TemplateError> {
        let template = Template::parse(template);
        if template.placeholder_count() != args.len() {
            return Err(TemplateError::ArityMismatch {
                expected: template.placeholder_count(),
                actual: args.len(),
            });
        }
        Ok(Action::RetargetArguments { template, args })
    }

    pub fn rename_attribute(from: &str, to: &str) -> Self {
        Action::RenameAttribute {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn change_value(value: &str) -> Self {
        Action::ChangeValue(value.to_string())
    }

    pub fn remove() -> Self {
        Action::RemoveConstruct
    }

    /// Manual-migration notice with a comment inserted at the node
    pub fn annotate(message: &str) -> Self {
        Action::AnnotateOnly {
            message: message.to_string(),
            insert_comment: true,
        }
    }

    /// Manual-migration notice that leaves the source untouched
    pub fn notice(message: &str) -> Self {
        Action::AnnotateOnly {
            message: message.to_string(),
            insert_comment: false,
        }
    }

    pub fn apply(&self, node: &Node, bindings: &Bindings, kind: ArtifactKind) -> Effect {
        let rewritten = match self {
            Action::RenameConstruct(name) => rename(node, name, bindings),
            Action::WrapWithAccessor(accessor) => return wrap(node, accessor, bindings),
            Action::RetargetArguments { template, args } => {
                return retarget(template, args, bindings)
            }
            Action::RenameAttribute { from, to } => rename_attribute(node, from, to),
            Action::ChangeValue(value) => change_value(node, value),
            Action::RemoveConstruct => return remove(node),
            Action::AnnotateOnly {
                message,
                insert_comment,
            } => return annotate(node, message, *insert_comment, kind),
        };
        match rewritten {
            Some(node) => Effect::Rewritten(node),
            None => Effect::Unchanged,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::RenameConstruct(name) => write!(f, "rename to {}", name),
            Action::WrapWithAccessor(accessor) => write!(f, "call through {}()", accessor),
            Action::RetargetArguments { template, .. } => {
                write!(f, "rewrite as {}", template.text())
            }
            Action::RenameAttribute { from, to } => write!(f, "rename {} to {}", from, to),
            Action::ChangeValue(value) => write!(f, "set value to {}", value),
            Action::RemoveConstruct => write!(f, "remove"),
            Action::AnnotateOnly { message, .. } => write!(f, "{}", message),
        }
    }
}

fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

fn qualifier(name: &str) -> Option<&str> {
    name.rsplit_once('.').map(|(q, _)| q)
}

fn rename(node: &Node, new_name: &str, bindings: &Bindings) -> Option<Node> {
    match node {
        Node::Invocation(call) => {
            let simple = simple_name(new_name);
            if call.name.text() == simple {
                return None;
            }
            let mut call = call.clone();
            call.name.token = call.name.token.with_text(simple);
            Some(Node::Invocation(call))
        }
        Node::Tag(tag) => {
            let local = tag.local_name();
            if local == new_name || tag.name == new_name {
                return None;
            }
            let full = match tag.name.split_once(':') {
                Some((ns, _)) if !new_name.contains(':') => format!("{}:{}", ns, new_name),
                _ => new_name.to_string(),
            };
            let mut tag = tag.clone();
            tag.name = full.clone();
            if let Some(closing) = &mut tag.closing {
                closing.name = full;
            }
            Some(Node::Tag(tag))
        }
        Node::Ident(ident) => {
            let simple = simple_name(new_name);
            if ident.text() == simple {
                return None;
            }
            let mut ident = ident.clone();
            ident.token = ident.token.with_text(simple);
            if qualifier(new_name).is_some() {
                ident.symbol = Some(new_name.to_string());
            }
            Some(Node::Ident(ident))
        }
        Node::FieldAccess(access) => {
            let old = access.symbol.as_deref()?;
            if old == new_name {
                return None;
            }
            // Type.MEMBER where only the member changes keeps its qualifier as written
            if qualifier(old).is_some() && qualifier(old) == qualifier(new_name)
                && access.target.symbol() == qualifier(old)
            {
                let mut access = access.clone();
                access.name.token = access.name.token.with_text(simple_name(new_name));
                access.symbol = Some(new_name.to_string());
                return Some(Node::FieldAccess(access));
            }
            let mut ident = Ident::new(Token {
                prefix: node.prefix().to_string(),
                text: new_name.to_string(),
                offset: node.offset(),
            });
            ident.symbol = Some(new_name.to_string());
            Some(Node::Ident(ident))
        }
        Node::Import(import) => {
            let current = import.qualified_name();
            let target = match bindings.matched_type.as_deref() {
                // static import of a member of the renamed type
                Some(owner) if import.is_static() && current != owner => {
                    let member = current.strip_prefix(owner)?.trim_start_matches('.');
                    format!("{}.{}", new_name, member)
                }
                _ => new_name.to_string(),
            };
            if current == target {
                return None;
            }
            Some(Node::Import(import.with_name(&target)))
        }
        Node::Annotation(annotation) => {
            let written = annotation.name.text();
            let replacement = if written.contains('.') {
                new_name
            } else {
                simple_name(new_name)
            };
            if written == replacement {
                return None;
            }
            let mut annotation = annotation.clone();
            let mut ident = Ident::new(Token {
                prefix: annotation.name.prefix().to_string(),
                text: replacement.to_string(),
                offset: annotation.name.offset(),
            });
            ident.symbol = Some(new_name.to_string());
            annotation.name = Arc::new(Node::Ident(ident));
            annotation.declared_type = Some(new_name.to_string());
            Some(Node::Annotation(annotation))
        }
        Node::Entry(entry) => {
            if entry.key.text == new_name {
                return None;
            }
            let mut entry = entry.clone();
            entry.key = entry.key.with_text(new_name);
            Some(Node::Entry(entry))
        }
        _ => None,
    }
}

fn wrap(node: &Node, accessor: &str, bindings: &Bindings) -> Effect {
    let Node::Invocation(call) = node else {
        return Effect::Unchanged;
    };
    let Some(receiver) = &bindings.receiver else {
        return Effect::Unchanged;
    };
    if let Node::Invocation(inner) = receiver.as_ref() {
        if inner.name.text() == accessor && inner.args.items.is_empty() {
            return Effect::Unchanged;
        }
    }

    let template = Template::parse(&accessor_template(
        accessor,
        call.name.text(),
        bindings.args.len(),
    ));
    let mut values = Vec::with_capacity(bindings.args.len() + 1);
    values.push(Arc::clone(receiver));
    values.extend(bindings.args.iter().cloned());
    match template.apply(&values) {
        Ok(node) => Effect::Rewritten(node),
        Err(err) => Effect::Failed(err),
    }
}

fn retarget(template: &Template, args: &[ArgRef], bindings: &Bindings) -> Effect {
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        let value = match arg {
            ArgRef::Receiver => bindings.receiver.as_ref(),
            ArgRef::Arg(i) => bindings.args.get(*i),
        };
        match value {
            Some(v) => values.push(Arc::clone(v)),
            None => return Effect::Unchanged,
        }
    }
    match template.apply_reflowed(&values) {
        Ok(node) => Effect::Rewritten(node),
        Err(err) => Effect::Failed(err),
    }
}

fn rename_attribute(node: &Node, from: &str, to: &str) -> Option<Node> {
    match node {
        Node::Tag(tag) => {
            let index = tag.attributes.iter().position(|a| a.key == from)?;
            if tag.attribute(to).is_some() {
                return None;
            }
            let mut tag = tag.clone();
            tag.attributes[index].key = to.to_string();
            Some(Node::Tag(tag))
        }
        Node::Annotation(annotation) => {
            let names = annotation.attribute_names();
            if !names.contains(&from) || names.contains(&to) {
                return None;
            }
            let mut annotation = annotation.clone();
            let args = annotation.args.as_mut()?;
            for item in args.items.iter_mut() {
                let Node::Assignment(assign) = item.as_ref() else {
                    continue;
                };
                let Node::Ident(target) = assign.target.as_ref() else {
                    continue;
                };
                if target.text() != from {
                    continue;
                }
                let mut assign = assign.clone();
                let mut renamed = target.clone();
                renamed.token = renamed.token.with_text(to);
                assign.target = Arc::new(Node::Ident(renamed));
                *item = Arc::new(Node::Assignment(assign));
            }
            Some(Node::Annotation(annotation))
        }
        _ => None,
    }
}

fn change_value(node: &Node, value: &str) -> Option<Node> {
    match node {
        Node::Entry(entry) => {
            if entry.value.text.trim() == value {
                return None;
            }
            let mut entry = entry.clone();
            entry.value = entry.value.with_text(value);
            Some(Node::Entry(entry))
        }
        Node::Literal(literal) => {
            if literal.token.text == value {
                return None;
            }
            let mut literal = literal.clone();
            literal.token = literal.token.with_text(value);
            Some(Node::Literal(literal))
        }
        Node::Tag(tag) => {
            if tag.self_closing || tag.text_content() == value {
                return None;
            }
            let text = match tag.children.as_slice() {
                [] => Token::synthetic(value),
                // surrounding whitespace of the text is kept
                [only] => {
                    let Node::Token(token) = only.as_ref() else {
                        return None;
                    };
                    let raw = &token.text;
                    let lead = &raw[..raw.len() - raw.trim_start().len()];
                    let trail = &raw[raw.trim_end().len()..];
                    token.with_text(format!("{}{}{}", lead, value, trail))
                }
                // mixed content is left to a manual step
                _ => return None,
            };
            let mut tag = tag.clone();
            tag.children = vec![Arc::new(Node::Token(text))];
            Some(Node::Tag(tag))
        }
        _ => None,
    }
}

fn remove(node: &Node) -> Effect {
    match node {
        Node::Tag(_) | Node::Import(_) | Node::Annotation(_) | Node::Entry(_) => Effect::Removed,
        _ => Effect::Unchanged,
    }
}

fn annotate(node: &Node, message: &str, insert_comment: bool, kind: ArtifactKind) -> Effect {
    let already_there = node.prefix().contains(&kind.render_comment(message));
    let node = (insert_comment && !already_there)
        .then(|| node.with_prefix(&kind.prefix_with_comment(node.prefix(), message)));
    Effect::Annotated {
        node,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::{JavaLanguage, Language, PropertiesLanguage, XmlLanguage};
    use crate::pattern::{MatchContext, MatchOutcome, Pattern, TypeAliases};
    use crate::tree::{Cursor, Tree};
    use pretty_assertions::assert_eq;

    /// Apply `action` to the first node matching `pattern` and return the replacement's source
    fn apply_first(tree: &Tree, pattern: &Pattern, action: &Action) -> Effect {
        let aliases = TypeAliases::new();
        let cursor = Cursor::new();
        let ctx = MatchContext {
            cursor: &cursor,
            aliases: &aliases,
        };
        for node in tree.nodes() {
            if let MatchOutcome::Matched(bindings) = pattern.evaluate(node, &ctx) {
                return action.apply(node, &bindings, tree.kind());
            }
        }
        panic!("pattern {} matched nothing", pattern);
    }

    fn rewritten(effect: Effect) -> String {
        match effect {
            Effect::Rewritten(node) => node.to_source(),
            other => panic!("expected a rewrite, got {:?}", other),
        }
    }

    fn java(source: &str) -> Tree {
        JavaLanguage::new().parse(source).unwrap()
    }

    const CTX: &str = "import org.apache.camel.CamelContext;\nclass A { void f(CamelContext context) {\n";

    #[test]
    fn test_wrap_with_accessor_any_arity() {
        let pattern_for = |sig: &str| Pattern::signature(sig).unwrap();
        let action = Action::wrap_with_accessor("getRouteController");

        let tree = java(&format!("{}  context.startAllRoutes(); }} }}", CTX));
        let effect = apply_first(&tree, &pattern_for("org.apache.camel.CamelContext startAllRoutes()"), &action);
        assert_eq!(rewritten(effect), "\n  context.getRouteController().startAllRoutes()");

        let tree = java(&format!("{}  context.startRoute(\"r1\"); }} }}", CTX));
        let effect = apply_first(&tree, &pattern_for("org.apache.camel.CamelContext startRoute(*)"), &action);
        assert_eq!(rewritten(effect), "\n  context.getRouteController().startRoute(\"r1\")");

        let tree = java(&format!("{}  context.stopRoute(\"r1\", 10L,TimeUnit.SECONDS); }} }}", CTX));
        let effect = apply_first(&tree, &pattern_for("org.apache.camel.CamelContext stopRoute(..)"), &action);
        assert_eq!(
            rewritten(effect),
            "\n  context.getRouteController().stopRoute(\"r1\", 10L,TimeUnit.SECONDS)"
        );
    }

    #[test]
    fn test_wrap_is_idempotent() {
        let tree = java(&format!("{}  context.getRouteController().startRoute(\"a\"); }} }}", CTX));
        let node = tree
            .find_all(|n| n.name() == Some("startRoute"))
            .into_iter()
            .next()
            .unwrap();
        let Node::Invocation(call) = node.as_ref() else {
            unreachable!()
        };
        let bindings = Bindings {
            receiver: call.receiver().cloned(),
            args: call.args.items.clone(),
            matched_type: None,
        };
        let effect = Action::wrap_with_accessor("getRouteController").apply(node, &bindings, ArtifactKind::Code);
        assert_eq!(effect, Effect::Unchanged);
    }

    #[test]
    fn test_retarget_arguments() {
        let tree = java("import org.apache.camel.Exchange;\nclass A { void f(Exchange exchange) { exchange.setProperty(Exchange.ROUTE_STOP, Boolean.TRUE); } }");
        let pattern = Pattern::Signature(
            "org.apache.camel.Exchange setProperty(*, *)"
                .parse::<crate::pattern::MethodPattern>()
                .unwrap()
                .with_constant(0, "org.apache.camel.Exchange.ROUTE_STOP"),
        );
        let action = Action::retarget(
            "#{any(org.apache.camel.Exchange)}.setRouteStop(#{any(boolean)})",
            vec![ArgRef::Receiver, ArgRef::Arg(1)],
        )
        .unwrap();
        assert_eq!(
            rewritten(apply_first(&tree, &pattern, &action)),
            "exchange.setRouteStop(Boolean.TRUE)"
        );
        assert!(Action::retarget("#{any()}.x()", vec![]).is_err());
    }

    #[test]
    fn test_rename_method_and_types() {
        let tree = java("import org.apache.camel.spi.Registry;\nclass A { void f(Registry r) { r.put(\"a\", b); } }");
        let pattern = Pattern::signature("org.apache.camel.spi.Registry put(*, *)").unwrap();
        assert_eq!(
            rewritten(apply_first(&tree, &pattern, &Action::rename("bind"))),
            " r.bind(\"a\", b)"
        );

        let tree = java("import org.apache.camel.impl.JndiRegistry;\nclass A { JndiRegistry r; }");
        let pattern = Pattern::type_ref("org.apache.camel.impl.JndiRegistry");
        let action = Action::rename("org.apache.camel.support.jndi.JndiBeanRepository");
        assert_eq!(
            rewritten(apply_first(&tree, &pattern, &action)),
            "import org.apache.camel.support.jndi.JndiBeanRepository;"
        );
    }

    #[test]
    fn test_rename_static_import_keeps_member() {
        let tree = java("import static org.apache.camel.impl.Consts.NAME;\n");
        let pattern = Pattern::type_ref("org.apache.camel.impl.Consts");
        let action = Action::rename("org.apache.camel.support.Consts");
        assert_eq!(
            rewritten(apply_first(&tree, &pattern, &action)),
            "import static org.apache.camel.support.Consts.NAME;"
        );
    }

    #[test]
    fn test_rename_tag_keeps_namespace() {
        let tree = XmlLanguage::new()
            .parse("<c:loadBalance><c:custom ref=\"x\"></c:custom></c:loadBalance>")
            .unwrap();
        let node = tree.find_all(|n| n.name() == Some("c:custom"))[0];
        let effect = Action::rename("customLoadBalancer").apply(node, &Bindings::default(), ArtifactKind::Markup);
        assert_eq!(
            rewritten(effect),
            "<c:customLoadBalancer ref=\"x\"></c:customLoadBalancer>"
        );
    }

    #[test]
    fn test_rename_attribute() {
        let tree = XmlLanguage::new()
            .parse("<setHeader headerName=\"foo\"><constant>bar</constant></setHeader>")
            .unwrap();
        let pattern = Pattern::path("setHeader").unwrap();
        let action = Action::rename_attribute("headerName", "name");
        assert_eq!(
            rewritten(apply_first(&tree, &pattern, &action)),
            "<setHeader name=\"foo\"><constant>bar</constant></setHeader>"
        );

        let absent = XmlLanguage::new().parse("<setHeader name=\"foo\"/>").unwrap();
        assert_eq!(apply_first(&absent, &pattern, &action), Effect::Unchanged);
    }

    #[test]
    fn test_change_value_and_rename_key() {
        let tree = PropertiesLanguage::new()
            .parse("camel.threadpool.rejectedPolicy = DiscardOldest\n")
            .unwrap();
        let pattern = Pattern::property("camel.threadpool.rejectedPolicy", Some("DiscardOldest")).unwrap();
        assert_eq!(
            rewritten(apply_first(&tree, &pattern, &Action::change_value("Abort"))),
            "camel.threadpool.rejectedPolicy = Abort"
        );
        assert_eq!(
            rewritten(apply_first(&tree, &pattern, &Action::rename("camel.threadpool.rejected-policy"))),
            "camel.threadpool.rejected-policy = DiscardOldest"
        );
    }

    #[test]
    fn test_change_element_text() {
        let tree = XmlLanguage::new()
            .parse("<dependency><artifactId> camel-aws </artifactId></dependency>")
            .unwrap();
        let pattern = Pattern::path("dependency/artifactId[.='camel-aws']").unwrap();
        assert_eq!(
            rewritten(apply_first(&tree, &pattern, &Action::change_value("camel-aws-s3"))),
            "<artifactId> camel-aws-s3 </artifactId>"
        );

        let done = XmlLanguage::new()
            .parse("<artifactId>camel-aws-s3</artifactId>")
            .unwrap();
        let any = Pattern::path("artifactId").unwrap();
        assert_eq!(
            apply_first(&done, &any, &Action::change_value("camel-aws-s3")),
            Effect::Unchanged
        );

        let mixed = XmlLanguage::new().parse("<a>x<!-- c -->y</a>").unwrap();
        let a = Pattern::path("a").unwrap();
        assert_eq!(apply_first(&mixed, &a, &Action::change_value("z")), Effect::Unchanged);

        let empty = XmlLanguage::new().parse("<a></a>").unwrap();
        assert_eq!(
            rewritten(apply_first(&empty, &a, &Action::change_value("z"))),
            "<a>z</a>"
        );
    }

    #[test]
    fn test_remove_construct() {
        let tree = XmlLanguage::new()
            .parse("<dependencies>\n  <dependency/>\n</dependencies>")
            .unwrap();
        let pattern = Pattern::path("dependency").unwrap();
        assert_eq!(apply_first(&tree, &pattern, &Action::remove()), Effect::Removed);

        let tree = java("class A { void f(Registry r) { r.put(\"a\", b); } }");
        let node = tree.find_all(|n| n.name() == Some("put"))[0];
        assert_eq!(
            Action::remove().apply(node, &Bindings::default(), ArtifactKind::Code),
            Effect::Unchanged
        );
    }

    #[test]
    fn test_annotate_inserts_comment_once() {
        let source = "import org.apache.camel.Consume;\nclass A {\n    @Consume(ref = \"x\")\n    void a() {}\n}\n";
        let tree = java(source);
        let pattern = Pattern::annotation("org.apache.camel.Consume", Some("ref"));
        let action = Action::annotate("FIXME: use uri instead of ref");

        let Effect::Annotated { node: Some(node), .. } = apply_first(&tree, &pattern, &action) else {
            panic!("expected an inserted comment");
        };
        assert_eq!(
            node.to_source(),
            "\n    /* FIXME: use uri instead of ref */ @Consume(ref = \"x\")"
        );

        let again = java(&source.replace("@Consume", "/* FIXME: use uri instead of ref */ @Consume"));
        assert_eq!(
            apply_first(&again, &pattern, &action),
            Effect::Annotated {
                node: None,
                message: "FIXME: use uri instead of ref".to_string()
            }
        );

        let notice = Action::notice("check this");
        assert!(matches!(
            apply_first(&tree, &pattern, &notice),
            Effect::Annotated { node: None, .. }
        ));
    }
}
