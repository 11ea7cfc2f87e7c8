//! Structural parser for Java-like sources
//!
//! Only the constructs rewrite rules care about get their own node kinds:
//! imports, annotations, declarations, invocation chains, field access,
//! object creation and assignments. Everything else stays a flat run of
//! tokens and delimited groups, which keeps the parser tolerant of syntax it
//! does not model while still rejecting unbalanced input.

use super::lexer::{tokenize, LexKind, Lexeme};
use crate::lang::ParseError;
use crate::tree::{
    Annotation, Args, Assignment, Declaration, FieldAccess, Group, GroupKind, Ident, Import,
    Initializer, Invocation, Literal, NewObject, Node, Select, Token,
};
use std::sync::Arc;

const KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally", "float",
    "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long",
    "native", "new", "package", "private", "protected", "public", "return", "short", "static",
    "strictfp", "super", "switch", "synchronized", "this", "throw", "throws", "transient", "try",
    "void", "volatile", "while", "var", "yield", "record", "sealed", "permits",
];

/// Keywords that can start a declaration's type
const TYPE_KEYWORDS: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "var",
];

fn is_keyword(text: &str) -> bool {
    KEYWORDS.contains(&text)
}

fn is_type_keyword(text: &str) -> bool {
    TYPE_KEYWORDS.contains(&text)
}

fn is_closer(text: &str) -> bool {
    matches!(text, ")" | "}" | "]")
}

const MODIFIERS: &[&str] = &[
    "public", "protected", "private", "static", "final", "abstract", "synchronized", "native",
    "default", "strictfp",
];

/// Whether `node` can be the return type in front of a method declaration
fn is_type_like(node: &Node) -> bool {
    match node {
        Node::Ident(_) | Node::FieldAccess(_) => true,
        Node::Token(t) => t.text == "void" || is_type_keyword(&t.text),
        Node::Group(g) => g.kind == GroupKind::Brackets,
        _ => false,
    }
}

/// Whether the items parsed so far end in a type a method name could follow
fn ends_in_type(items: &[Arc<Node>]) -> bool {
    match items.last().map(|n| n.as_ref()) {
        Some(Node::Token(t)) if t.text == ">" => closes_type_arguments(items),
        Some(node) => is_type_like(node),
        None => false,
    }
}

/// A trailing `>` that closes `Type<..>` or a `<T>` type parameter list,
/// rather than a comparison or a shift
fn closes_type_arguments(items: &[Arc<Node>]) -> bool {
    let mut depth = 0usize;
    for (i, item) in items.iter().enumerate().rev() {
        match item.as_ref() {
            Node::Token(t) if t.text == ">" => depth += 1,
            Node::Token(t) if t.text == "<" => {
                depth = depth.saturating_sub(1);
                if depth > 0 {
                    continue;
                }
                return match i.checked_sub(1).map(|before| items[before].as_ref()) {
                    None => true,
                    Some(Node::Ident(_) | Node::FieldAccess(_)) => true,
                    Some(Node::Token(t)) => MODIFIERS.contains(&t.text.as_str()),
                    Some(_) => false,
                };
            }
            Node::Token(t)
                if matches!(t.text.as_str(), "," | "?" | "&" | "extends")
                    || is_type_keyword(&t.text) => {}
            Node::Ident(_) | Node::FieldAccess(_) | Node::Annotation(_) => {}
            Node::Group(g) if g.kind == GroupKind::Brackets => {}
            _ => return false,
        }
    }
    false
}

/// Parse a compilation unit
pub fn parse_unit(source: &str) -> Result<Node, ParseError> {
    let mut parser = Parser::new(source)?;
    let mut children = parser.parse_items(None)?;
    let eof = parser.peek(0);
    if !eof.prefix.is_empty() {
        children.push(Arc::new(Node::Token(Token::new(
            eof.prefix.clone(),
            "",
            eof.offset,
        ))));
    }
    Ok(Node::Group(Group {
        kind: GroupKind::Unit,
        children,
    }))
}

/// Parse text that must form exactly one expression
pub fn parse_expression(source: &str) -> Result<Node, ParseError> {
    let mut parser = Parser::new(source)?;
    let mut items = parser.parse_items(None)?;
    let eof = parser.peek(0);
    if !eof.prefix.trim().is_empty() {
        return Err(parser.error_here("unexpected trailing comment"));
    }
    match items.len() {
        0 => Err(parser.error_here("expected an expression")),
        1 => Ok(Arc::unwrap_or_clone(items.remove(0))),
        _ => Err(ParseError::at(
            source,
            items[1].offset().unwrap_or(0),
            "expected a single expression",
        )),
    }
}

struct Parser<'a> {
    source: &'a str,
    lexemes: Vec<Lexeme>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Result<Self, ParseError> {
        Ok(Self {
            source,
            lexemes: tokenize(source)?,
            pos: 0,
        })
    }

    /// Lexeme `n` ahead; past the end this is the `Eof` lexeme
    fn peek(&self, n: usize) -> &Lexeme {
        self.lex(self.pos + n)
    }

    fn lex(&self, index: usize) -> &Lexeme {
        let last = self.lexemes.len() - 1;
        &self.lexemes[index.min(last)]
    }

    fn bump(&mut self) -> Token {
        let token = self.peek(0).to_token();
        if self.pos < self.lexemes.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn error_here(&self, message: &str) -> ParseError {
        ParseError::at(self.source, self.peek(0).offset, message)
    }

    fn expect_punct(&mut self, text: &str) -> Result<Token, ParseError> {
        if self.peek(0).is_punct(text) {
            Ok(self.bump())
        } else {
            Err(self.error_here(&format!("expected `{}`", text)))
        }
    }

    /// Items up to (not including) `close`, or to the end of input
    fn parse_items(&mut self, close: Option<&str>) -> Result<Vec<Arc<Node>>, ParseError> {
        let mut items: Vec<Arc<Node>> = Vec::new();
        loop {
            let la = self.peek(0);
            if la.kind == LexKind::Eof {
                return match close {
                    Some(c) => Err(self.error_here(&format!("expected `{}` before end of input", c))),
                    None => Ok(items),
                };
            }
            if la.kind == LexKind::Punct && is_closer(&la.text) {
                if close == Some(la.text.as_str()) {
                    return Ok(items);
                }
                return Err(self.error_here(&format!("unexpected `{}`", la.text)));
            }
            let prev_is_type = ends_in_type(&items);
            let item = self.parse_item(prev_is_type)?;
            items.push(Arc::new(item));
        }
    }

    /// Items up to one of `terms` at this nesting level, as a single node
    fn parse_expression_until(&mut self, terms: &[&str]) -> Result<Arc<Node>, ParseError> {
        let mut items: Vec<Arc<Node>> = Vec::new();
        loop {
            let la = self.peek(0);
            if la.kind == LexKind::Eof {
                return Err(self.error_here("unexpected end of input"));
            }
            if la.kind == LexKind::Punct {
                if terms.contains(&la.text.as_str()) {
                    break;
                }
                if is_closer(&la.text) {
                    return Err(self.error_here(&format!("unexpected `{}`", la.text)));
                }
            }
            let prev_is_type = ends_in_type(&items);
            let item = self.parse_item(prev_is_type)?;
            items.push(Arc::new(item));
        }
        match items.len() {
            0 => Err(self.error_here("expected an expression")),
            1 => Ok(items.remove(0)),
            _ => Ok(Arc::new(Node::Group(Group {
                kind: GroupKind::Expression,
                children: items,
            }))),
        }
    }

    fn parse_item(&mut self, prev_is_type: bool) -> Result<Node, ParseError> {
        let la = self.peek(0).clone();
        match la.kind {
            LexKind::Punct => match la.text.as_str() {
                "{" => self.parse_group("}", GroupKind::Block),
                "[" => self.parse_group("]", GroupKind::Brackets),
                "(" => {
                    let group = self.parse_group(")", GroupKind::Parens)?;
                    self.parse_postfix(group)
                }
                "@" if self.peek(1).is_word() && self.peek(1).text != "interface" => {
                    self.parse_annotation()
                }
                closer if is_closer(closer) => {
                    Err(self.error_here(&format!("unexpected `{}`", closer)))
                }
                _ => Ok(Node::Token(self.bump())),
            },
            LexKind::Literal(kind) => {
                let literal = Node::Literal(Literal {
                    token: self.bump(),
                    kind,
                });
                self.parse_postfix(literal)
            }
            LexKind::Word => self.parse_word(&la.text, prev_is_type),
            LexKind::Eof => Err(self.error_here("unexpected end of input")),
        }
    }

    fn parse_word(&mut self, text: &str, prev_is_type: bool) -> Result<Node, ParseError> {
        match text {
            "import" => return self.parse_import(),
            "new" => {
                let created = self.parse_new()?;
                return self.parse_postfix(created);
            }
            _ => {}
        }
        if is_keyword(text) && !is_type_keyword(text) && text != "this" && text != "super" {
            return Ok(Node::Token(self.bump()));
        }
        if self.declaration_ahead() {
            return self.parse_declaration();
        }

        let ident = Ident::new(self.bump());
        if is_type_keyword(text) {
            return Ok(Node::Token(ident.token));
        }
        let next_is_paren = self.peek(0).is_punct("(");
        if prev_is_type && next_is_paren {
            // method declaration name; the parameter list follows as a group
            return Ok(Node::Ident(ident));
        }
        let node = if next_is_paren {
            Node::Invocation(Invocation {
                select: None,
                name: ident,
                args: self.parse_args()?,
                declared_type: None,
            })
        } else {
            Node::Ident(ident)
        };
        let node = self.parse_postfix(node)?;
        self.parse_assignment(node)
    }

    /// `Type[<...>][[]...] name` followed by `=`, `;`, `,`, `)` or `:`
    fn declaration_ahead(&self) -> bool {
        let mut i = self.pos;
        let first = self.lex(i);
        if !first.is_word() || (is_keyword(&first.text) && !is_type_keyword(&first.text)) {
            return false;
        }
        i += 1;
        while self.lex(i).is_punct(".") && self.lex(i + 1).is_word() {
            i += 2;
        }
        if self.lex(i).is_punct("<") {
            let mut depth = 0usize;
            loop {
                let l = self.lex(i);
                match l.kind {
                    LexKind::Punct if l.text == "<" => depth += 1,
                    LexKind::Punct if l.text == ">" => {
                        depth -= 1;
                        if depth == 0 {
                            i += 1;
                            break;
                        }
                    }
                    LexKind::Punct if matches!(l.text.as_str(), "," | "." | "?" | "[" | "]" | "&") => {}
                    LexKind::Word => {}
                    _ => return false,
                }
                i += 1;
            }
        }
        while self.lex(i).is_punct("[") && self.lex(i + 1).is_punct("]") {
            i += 2;
        }
        if self.lex(i).is_punct("...") {
            i += 1;
        }
        let name = self.lex(i);
        if !name.is_word() || is_keyword(&name.text) {
            return false;
        }
        let next = self.lex(i + 1);
        next.kind == LexKind::Punct && matches!(next.text.as_str(), "=" | ";" | "," | ")" | ":")
    }

    fn parse_declaration(&mut self) -> Result<Node, ParseError> {
        let type_ref = self.parse_type_ref()?;
        let name = Ident::new(self.bump());
        let initializer = if self.peek(0).is_punct("=") {
            let operator = self.bump();
            let value = self.parse_expression_until(&[";", ",", ")"])?;
            Some(Initializer { operator, value })
        } else {
            None
        };
        Ok(Node::Declaration(Declaration {
            type_ref: Arc::new(type_ref),
            name,
            initializer,
            declared_type: None,
        }))
    }

    /// A type as validated by `declaration_ahead`
    fn parse_type_ref(&mut self) -> Result<Node, ParseError> {
        let first = self.peek(0).text.clone();
        let base = if is_type_keyword(&first) {
            Node::Ident(Ident::new(self.bump()))
        } else {
            self.parse_qualified_name()
        };
        let mut parts = vec![Arc::new(base)];
        if self.peek(0).is_punct("<") {
            self.parse_type_arguments(&mut parts)?;
        }
        loop {
            let la = self.peek(0);
            let array = la.is_punct("[") && self.peek(1).is_punct("]");
            if array || la.is_punct("]") || la.is_punct("...") {
                let token = self.bump();
                parts.push(Arc::new(Node::Token(token)));
            } else {
                break;
            }
        }
        if parts.len() == 1 {
            Ok(Arc::unwrap_or_clone(parts.remove(0)))
        } else {
            Ok(Node::Group(Group {
                kind: GroupKind::Expression,
                children: parts,
            }))
        }
    }

    /// Balanced `<...>`, appended to `parts`
    fn parse_type_arguments(&mut self, parts: &mut Vec<Arc<Node>>) -> Result<(), ParseError> {
        let mut depth = 0usize;
        loop {
            let la = self.peek(0).clone();
            match la.kind {
                LexKind::Eof => return Err(self.error_here("unterminated type arguments")),
                LexKind::Punct if la.text == "<" => {
                    depth += 1;
                    parts.push(Arc::new(Node::Token(self.bump())));
                }
                LexKind::Punct if la.text == ">" => {
                    parts.push(Arc::new(Node::Token(self.bump())));
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok(());
                    }
                }
                LexKind::Word if !is_keyword(&la.text) => {
                    let name = self.parse_qualified_name();
                    parts.push(Arc::new(name));
                }
                _ => parts.push(Arc::new(Node::Token(self.bump()))),
            }
        }
    }

    /// `a.b.C` as an identifier or a chain of field accesses
    fn parse_qualified_name(&mut self) -> Node {
        let mut node = Node::Ident(Ident::new(self.bump()));
        while self.peek(0).is_punct(".") && self.peek(1).is_word() {
            let dot = self.bump();
            let name = Ident::new(self.bump());
            node = Node::FieldAccess(FieldAccess {
                target: Arc::new(node),
                dot,
                name,
                symbol: None,
            });
        }
        node
    }

    /// `.name` and `.name(args)` suffixes
    fn parse_postfix(&mut self, mut node: Node) -> Result<Node, ParseError> {
        while self.peek(0).is_punct(".") && self.peek(1).is_word() {
            let dot = self.bump();
            let name = Ident::new(self.bump());
            node = if self.peek(0).is_punct("(") {
                Node::Invocation(Invocation {
                    select: Some(Select {
                        target: Arc::new(node),
                        dot,
                    }),
                    name,
                    args: self.parse_args()?,
                    declared_type: None,
                })
            } else {
                Node::FieldAccess(FieldAccess {
                    target: Arc::new(node),
                    dot,
                    name,
                    symbol: None,
                })
            };
        }
        Ok(node)
    }

    fn parse_assignment(&mut self, target: Node) -> Result<Node, ParseError> {
        if !self.peek(0).is_punct("=") {
            return Ok(target);
        }
        let operator = self.bump();
        let value = self.parse_item(false)?;
        Ok(Node::Assignment(Assignment {
            target: Arc::new(target),
            operator,
            value: Arc::new(value),
        }))
    }

    fn parse_args(&mut self) -> Result<Args, ParseError> {
        let open = self.expect_punct("(")?;
        let mut items = Vec::new();
        let mut separators = Vec::new();
        if self.peek(0).is_punct(")") {
            let close = self.bump();
            return Ok(Args {
                open,
                items,
                separators,
                close,
            });
        }
        loop {
            items.push(self.parse_expression_until(&[",", ")"])?);
            if self.peek(0).is_punct(",") {
                separators.push(self.bump());
                continue;
            }
            let close = self.expect_punct(")")?;
            return Ok(Args {
                open,
                items,
                separators,
                close,
            });
        }
    }

    fn parse_group(&mut self, close: &str, kind: GroupKind) -> Result<Node, ParseError> {
        let open = self.bump();
        let mut children = vec![Arc::new(Node::Token(open))];
        children.extend(self.parse_items(Some(close))?);
        let close = self.expect_punct(close)?;
        children.push(Arc::new(Node::Token(close)));
        Ok(Node::Group(Group { kind, children }))
    }

    fn parse_import(&mut self) -> Result<Node, ParseError> {
        let keyword = self.bump();
        let modifier = if self.peek(0).is_word() && self.peek(0).text == "static" {
            Some(self.bump())
        } else {
            None
        };
        let mut path = Vec::new();
        while !self.peek(0).is_punct(";") {
            let la = self.peek(0);
            if la.is_word() || la.is_punct(".") || la.is_punct("*") {
                path.push(self.bump());
            } else {
                return Err(self.error_here("malformed import"));
            }
        }
        if path.is_empty() {
            return Err(self.error_here("import without a name"));
        }
        let terminator = self.bump();
        Ok(Node::Import(Import {
            keyword,
            modifier,
            path,
            terminator,
        }))
    }

    fn parse_annotation(&mut self) -> Result<Node, ParseError> {
        let at = self.bump();
        let name = self.parse_qualified_name();
        let args = if self.peek(0).is_punct("(") {
            Some(self.parse_args()?)
        } else {
            None
        };
        Ok(Node::Annotation(Annotation {
            at,
            name: Arc::new(name),
            args,
            declared_type: None,
        }))
    }

    fn parse_new(&mut self) -> Result<Node, ParseError> {
        let keyword = self.bump();
        if !self.peek(0).is_word() {
            return Ok(Node::Token(keyword));
        }
        let mut parts = vec![Arc::new(self.parse_qualified_name())];
        if self.peek(0).is_punct("<") {
            self.parse_type_arguments(&mut parts)?;
        }
        let class = if parts.len() == 1 {
            parts.remove(0)
        } else {
            Arc::new(Node::Group(Group {
                kind: GroupKind::Expression,
                children: parts,
            }))
        };

        if !self.peek(0).is_punct("(") {
            // array creation; dimensions and initializer follow as plain items
            return Ok(Node::Group(Group {
                kind: GroupKind::Expression,
                children: vec![Arc::new(Node::Token(keyword)), class],
            }));
        }
        let args = self.parse_args()?;
        let body = if self.peek(0).is_punct("{") {
            Some(Arc::new(self.parse_group("}", GroupKind::Block)?))
        } else {
            None
        };
        Ok(Node::NewObject(NewObject {
            keyword,
            class,
            args,
            body,
            declared_type: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ROUTE: &str = r#"package com.example;

import org.apache.camel.CamelContext;
import static org.apache.camel.Exchange.ROUTE_STOP;

/**
 * Docs survive.
 */
public class Route extends RouteBuilder {
    private final Map<String, List<Object>> cache = new HashMap<>();

    @Consume(ref = "orders") // trailing
    public void configure(CamelContext context, String... ids) throws Exception {
        context.getRouteController().startRoute("a");
        int[] sizes = new int[] { 1, 2 };
        for (String id : ids) { context.stopRoute(id); }
        list.forEach(x -> x.run());
        String s = a >= b ? "x" : """
            text "block"
            """;
    }
}
"#;

    fn find<'a>(node: &'a Arc<Node>, pred: &dyn Fn(&Node) -> bool, out: &mut Vec<&'a Arc<Node>>) {
        if pred(node.as_ref()) {
            out.push(node);
        }
        for child in node.children() {
            find(child, pred, out);
        }
    }

    fn all(source: &str, pred: &dyn Fn(&Node) -> bool) -> Vec<Arc<Node>> {
        let root = Arc::new(parse_unit(source).unwrap());
        let mut out = Vec::new();
        find(&root, pred, &mut out);
        out.into_iter().cloned().collect()
    }

    #[test]
    fn test_roundtrip() {
        let unit = parse_unit(ROUTE).unwrap();
        assert_eq!(unit.to_source(), ROUTE);
    }

    #[test]
    fn test_roundtrip_odd_inputs() {
        for source in ["", "   \n// only a comment\n", "a;", "x = y = z;", "foo(a)(b);", "@interface A {}"] {
            assert_eq!(parse_unit(source).unwrap().to_source(), source);
        }
    }

    #[test]
    fn test_invocation_chain() {
        let calls = all(ROUTE, &|n| matches!(n, Node::Invocation(_)));
        let names: Vec<String> = calls.iter().map(|c| c.name().unwrap().to_string()).collect();
        assert!(names.contains(&"startRoute".to_string()));
        assert!(names.contains(&"stopRoute".to_string()));

        let start = calls.iter().find(|c| c.name() == Some("startRoute")).unwrap();
        let Node::Invocation(inv) = start.as_ref() else {
            unreachable!()
        };
        assert_eq!(inv.receiver().unwrap().text(), "context.getRouteController()");
        assert_eq!(inv.args.items.len(), 1);
        assert_eq!(start.prefix(), "\n        ");
    }

    #[test]
    fn test_method_declaration_is_not_an_invocation() {
        let calls = all(ROUTE, &|n| n.name() == Some("configure"));
        assert_eq!(calls.len(), 1);
        assert!(matches!(calls[0].as_ref(), Node::Ident(_)));
    }

    #[test]
    fn test_comparison_before_call_is_not_a_return_type() {
        for source in [
            "class A { void f() { boolean b = n > size(); } }",
            "class A { void f() { int b = n >> shift(x); } }",
            "class A { void f() { if (a < b && c > limit(d)) {} } }",
        ] {
            let calls = all(source, &|n| matches!(n, Node::Invocation(_)));
            assert_eq!(calls.len(), 1, "{}", source);
        }
    }

    #[test]
    fn test_generic_return_types_still_declare() {
        for (source, name) in [
            ("class A { List<String> names() { return null; } }", "names"),
            ("class A { Map<String, List<Object>> cache() { return null; } }", "cache"),
            ("class A { public <T> T first(List<T> xs) { return null; } }", "first"),
            ("class A { public <T> A(T seed) {} }", "A"),
        ] {
            let found = all(source, &|n| n.name() == Some(name));
            assert!(
                found.iter().all(|n| matches!(n.as_ref(), Node::Ident(_))),
                "{}",
                source
            );
            assert!(all(source, &|n| matches!(n, Node::Invocation(_))).is_empty(), "{}", source);
        }
    }

    #[test]
    fn test_declarations() {
        let decls = all(ROUTE, &|n| matches!(n, Node::Declaration(_)));
        let names: Vec<&str> = decls.iter().map(|d| d.name().unwrap()).collect();
        assert_eq!(names, vec!["cache", "context", "ids", "sizes", "id", "s"]);

        let Node::Declaration(cache) = decls[0].as_ref() else {
            unreachable!()
        };
        assert_eq!(cache.type_ref.text(), "Map<String, List<Object>>");
        assert!(matches!(cache.initializer.as_ref().unwrap().value.as_ref(), Node::NewObject(_)));
    }

    #[test]
    fn test_imports_and_annotations() {
        let imports = all(ROUTE, &|n| matches!(n, Node::Import(_)));
        let Node::Import(stat) = imports[1].as_ref() else {
            unreachable!()
        };
        assert!(stat.is_static());
        assert_eq!(stat.qualified_name(), "org.apache.camel.Exchange.ROUTE_STOP");

        let annotations = all(ROUTE, &|n| matches!(n, Node::Annotation(_)));
        let Node::Annotation(consume) = annotations[0].as_ref() else {
            unreachable!()
        };
        assert_eq!(consume.attribute_names(), vec!["ref"]);
    }

    #[test]
    fn test_parse_expression() {
        let node = parse_expression("ctx.getRouteController().startRoute(a, \"b\")").unwrap();
        assert!(matches!(node, Node::Invocation(_)));
        assert!(parse_expression("a; b").is_err());
        assert!(parse_expression("").is_err());
    }

    #[test]
    fn test_unbalanced_input_fails() {
        let err = parse_unit("class A {\n  void f() {\n}\n").unwrap_err();
        assert!(err.to_string().contains("expected `}`"));

        let err = parse_unit("a(b));").unwrap_err();
        assert_eq!(err.line(), Some(1));

        assert!(parse_unit("foo(a,").is_err());
    }
}
