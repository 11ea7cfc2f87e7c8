//! Lossless tree model shared by every artifact kind
//!
//! Every leaf token keeps the exact whitespace and comments that preceded it
//! (its `prefix`), so writing the tree back out reproduces the original text
//! byte for byte. Subtrees are reference counted: a rewrite rebuilds only the
//! spine above the changed node and shares everything else with the old tree.

pub mod visit;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use visit::{transform, Cursor};

/// The kind of source artifact a tree was parsed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Program code (Java-like syntax)
    Code,
    /// XML configuration
    Markup,
    /// Key/value properties
    Properties,
}

impl ArtifactKind {
    /// Guess the artifact kind from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "java" => Some(ArtifactKind::Code),
            "xml" => Some(ArtifactKind::Markup),
            "properties" => Some(ArtifactKind::Properties),
            _ => None,
        }
    }

    /// Render a migration note as a comment in this kind's syntax
    pub fn render_comment(&self, message: &str) -> String {
        match self {
            ArtifactKind::Code => format!("/* {} */", message),
            ArtifactKind::Markup => format!("<!-- {} -->", message),
            ArtifactKind::Properties => format!("# {}", message),
        }
    }

    /// Append a comment to a node prefix so that it sits directly before the node.
    ///
    /// Code comments share the node's line; markup and properties comments get
    /// a line of their own, indented like the node.
    pub fn prefix_with_comment(&self, prefix: &str, message: &str) -> String {
        let comment = self.render_comment(message);
        match self {
            ArtifactKind::Code => format!("{}{} ", prefix, comment),
            ArtifactKind::Markup | ArtifactKind::Properties => {
                let indent = match prefix.rfind('\n') {
                    Some(pos) => &prefix[pos + 1..],
                    None => "",
                };
                format!("{}{}\n{}", prefix, comment, indent)
            }
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::Code => write!(f, "code"),
            ArtifactKind::Markup => write!(f, "markup"),
            ArtifactKind::Properties => write!(f, "properties"),
        }
    }
}

impl std::str::FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "code" | "java" => Ok(ArtifactKind::Code),
            "markup" | "xml" => Ok(ArtifactKind::Markup),
            "properties" => Ok(ArtifactKind::Properties),
            _ => Err(format!("Unknown artifact kind: {}", s)),
        }
    }
}

/// A leaf token with its leading trivia
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Whitespace and comments preceding the token, verbatim
    pub prefix: String,
    /// The token text
    pub text: String,
    /// Byte offset of `text` in the original source; `None` for synthesized tokens
    pub offset: Option<usize>,
}

impl Token {
    pub fn new(prefix: impl Into<String>, text: impl Into<String>, offset: usize) -> Self {
        Self {
            prefix: prefix.into(),
            text: text.into(),
            offset: Some(offset),
        }
    }

    /// A token that did not come from the source
    pub fn synthetic(text: impl Into<String>) -> Self {
        Self {
            prefix: String::new(),
            text: text.into(),
            offset: None,
        }
    }

    /// Same prefix and position, different text
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            prefix: self.prefix.clone(),
            text: text.into(),
            offset: self.offset,
        }
    }

    fn write_to(&self, out: &mut String) {
        out.push_str(&self.prefix);
        out.push_str(&self.text);
    }
}

/// Literal categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    String,
    Char,
    Number,
    Boolean,
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub token: Token,
    pub kind: LiteralKind,
}

impl Literal {
    /// Static type of the literal (`null` has none)
    pub fn declared_type(&self) -> Option<&'static str> {
        match self.kind {
            LiteralKind::String => Some("java.lang.String"),
            LiteralKind::Char => Some("char"),
            LiteralKind::Boolean => Some("boolean"),
            LiteralKind::Null => None,
            LiteralKind::Number => {
                let text = self.token.text.to_ascii_lowercase();
                let hex = text.starts_with("0x");
                if text.ends_with('l') {
                    Some("long")
                } else if !hex && text.ends_with('f') {
                    Some("float")
                } else if !hex && (text.ends_with('d') || text.contains('.') || text.contains('e'))
                {
                    Some("double")
                } else {
                    Some("int")
                }
            }
        }
    }
}

/// An identifier, optionally attributed with type information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub token: Token,
    /// Static type of the expression when the identifier names a variable
    pub declared_type: Option<String>,
    /// Fully-qualified name of the type or constant the identifier refers to
    pub symbol: Option<String>,
}

impl Ident {
    pub fn new(token: Token) -> Self {
        Self {
            token,
            declared_type: None,
            symbol: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.token.text
    }
}

/// Group flavours; delimited groups hold their delimiters as first and last token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// A whole compilation unit
    Unit,
    /// `{ ... }`
    Block,
    /// `( ... )`
    Parens,
    /// `[ ... ]`
    Brackets,
    /// An undelimited run of items forming one expression or type
    Expression,
    /// A whole markup document
    Document,
    /// A whole properties file
    Properties,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub kind: GroupKind,
    pub children: Vec<Arc<Node>>,
}

/// A parenthesized, comma separated argument list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub open: Token,
    pub items: Vec<Arc<Node>>,
    /// Separators following `items[i]`
    pub separators: Vec<Token>,
    pub close: Token,
}

impl Args {
    /// `(a, b, ...)` built from scratch
    pub fn synthetic(items: Vec<Arc<Node>>) -> Self {
        let separators = (1..items.len()).map(|_| Token::synthetic(",")).collect();
        Self {
            open: Token::synthetic("("),
            items,
            separators,
            close: Token::synthetic(")"),
        }
    }

    fn write_to(&self, out: &mut String) {
        self.open.write_to(out);
        for (i, item) in self.items.iter().enumerate() {
            item.write_to(out);
            if let Some(sep) = self.separators.get(i) {
                sep.write_to(out);
            }
        }
        self.close.write_to(out);
    }
}

/// `import [static] a.b.C;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub keyword: Token,
    pub modifier: Option<Token>,
    pub path: Vec<Token>,
    pub terminator: Token,
}

impl Import {
    /// Dotted name without whitespace or comments
    pub fn qualified_name(&self) -> String {
        self.path.iter().map(|t| t.text.as_str()).collect()
    }

    pub fn is_static(&self) -> bool {
        self.modifier.is_some()
    }

    pub fn is_wildcard(&self) -> bool {
        self.path.last().is_some_and(|t| t.text == "*")
    }

    /// Same import with a different dotted name
    pub fn with_name(&self, name: &str) -> Self {
        let first = self
            .path
            .first()
            .map(|t| t.with_text(name))
            .unwrap_or_else(|| Token::new(" ", name, 0));
        Self {
            keyword: self.keyword.clone(),
            modifier: self.modifier.clone(),
            path: vec![first],
            terminator: self.terminator.clone(),
        }
    }
}

/// `@Name` or `@Name(args)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub at: Token,
    pub name: Arc<Node>,
    pub args: Option<Args>,
    pub declared_type: Option<String>,
}

impl Annotation {
    /// Names of `key = value` arguments
    pub fn attribute_names(&self) -> Vec<&str> {
        let Some(args) = &self.args else {
            return Vec::new();
        };
        args.items
            .iter()
            .filter_map(|item| match item.as_ref() {
                Node::Assignment(assign) => assign.target.name(),
                _ => None,
            })
            .collect()
    }
}

/// `target = value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub target: Arc<Node>,
    pub operator: Token,
    pub value: Arc<Node>,
}

/// `target.name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAccess {
    pub target: Arc<Node>,
    pub dot: Token,
    pub name: Ident,
    /// Fully-qualified name when this is a qualified type or a constant
    pub symbol: Option<String>,
}

/// The `receiver.` part of an invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    pub target: Arc<Node>,
    pub dot: Token,
}

/// `[receiver.]name(args)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub select: Option<Select>,
    pub name: Ident,
    pub args: Args,
    pub declared_type: Option<String>,
}

impl Invocation {
    pub fn receiver(&self) -> Option<&Arc<Node>> {
        self.select.as_ref().map(|s| &s.target)
    }
}

/// `new Type(args) [body]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewObject {
    pub keyword: Token,
    pub class: Arc<Node>,
    pub args: Args,
    pub body: Option<Arc<Node>>,
    pub declared_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Initializer {
    pub operator: Token,
    pub value: Arc<Node>,
}

/// `Type name [= value]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub type_ref: Arc<Node>,
    pub name: Ident,
    pub initializer: Option<Initializer>,
    pub declared_type: Option<String>,
}

/// A markup attribute, kept with its exact spacing and quoting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub prefix: String,
    pub key: String,
    pub before_eq: String,
    pub after_eq: String,
    pub quote: char,
    /// Raw value, entities left unexpanded
    pub value: String,
    pub offset: Option<usize>,
}

impl Attribute {
    fn write_to(&self, out: &mut String) {
        out.push_str(&self.prefix);
        out.push_str(&self.key);
        out.push_str(&self.before_eq);
        out.push('=');
        out.push_str(&self.after_eq);
        out.push(self.quote);
        out.push_str(&self.value);
        out.push(self.quote);
    }
}

/// `</name trailing>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosingTag {
    pub prefix: String,
    pub name: String,
    pub trailing: String,
}

/// A markup element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub prefix: String,
    pub name: String,
    pub attributes: Vec<Attribute>,
    /// Whitespace between the last attribute and `>` or `/>`
    pub before_close: String,
    pub self_closing: bool,
    pub children: Vec<Arc<Node>>,
    pub closing: Option<ClosingTag>,
    pub offset: Option<usize>,
}

impl Tag {
    pub fn attribute(&self, key: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.key == key)
    }

    /// Local name without namespace prefix
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    /// Character data directly inside the element, trimmed
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        for child in &self.children {
            if let Node::Token(token) = child.as_ref() {
                text.push_str(&token.text);
            }
        }
        text.trim().to_string()
    }

    /// Direct child elements
    pub fn child_tags(&self) -> impl Iterator<Item = &Tag> {
        self.children.iter().filter_map(|c| match c.as_ref() {
            Node::Tag(tag) => Some(tag),
            _ => None,
        })
    }
}

/// `key = value` in a properties file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: Token,
    /// Separator with its surrounding spaces (`=`, ` : `, or plain whitespace)
    pub separator: Token,
    /// Raw value including continuation lines
    pub value: Token,
}

/// A node of the uniform tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Token(Token),
    Ident(Ident),
    Literal(Literal),
    Group(Group),
    Import(Import),
    Annotation(Annotation),
    Assignment(Assignment),
    FieldAccess(FieldAccess),
    Invocation(Invocation),
    NewObject(NewObject),
    Declaration(Declaration),
    Tag(Tag),
    Entry(Entry),
}

impl Node {
    /// Short name of the node kind
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Token(_) => "token",
            Node::Ident(_) => "identifier",
            Node::Literal(_) => "literal",
            Node::Group(_) => "group",
            Node::Import(_) => "import",
            Node::Annotation(_) => "annotation",
            Node::Assignment(_) => "assignment",
            Node::FieldAccess(_) => "field-access",
            Node::Invocation(_) => "invocation",
            Node::NewObject(_) => "new",
            Node::Declaration(_) => "declaration",
            Node::Tag(_) => "tag",
            Node::Entry(_) => "entry",
        }
    }

    /// Append the exact source text of this node
    pub fn write_to(&self, out: &mut String) {
        match self {
            Node::Token(t) => t.write_to(out),
            Node::Ident(i) => i.token.write_to(out),
            Node::Literal(l) => l.token.write_to(out),
            Node::Group(g) => {
                for child in &g.children {
                    child.write_to(out);
                }
            }
            Node::Import(i) => {
                i.keyword.write_to(out);
                if let Some(m) = &i.modifier {
                    m.write_to(out);
                }
                for t in &i.path {
                    t.write_to(out);
                }
                i.terminator.write_to(out);
            }
            Node::Annotation(a) => {
                a.at.write_to(out);
                a.name.write_to(out);
                if let Some(args) = &a.args {
                    args.write_to(out);
                }
            }
            Node::Assignment(a) => {
                a.target.write_to(out);
                a.operator.write_to(out);
                a.value.write_to(out);
            }
            Node::FieldAccess(f) => {
                f.target.write_to(out);
                f.dot.write_to(out);
                f.name.token.write_to(out);
            }
            Node::Invocation(i) => {
                if let Some(select) = &i.select {
                    select.target.write_to(out);
                    select.dot.write_to(out);
                }
                i.name.token.write_to(out);
                i.args.write_to(out);
            }
            Node::NewObject(n) => {
                n.keyword.write_to(out);
                n.class.write_to(out);
                n.args.write_to(out);
                if let Some(body) = &n.body {
                    body.write_to(out);
                }
            }
            Node::Declaration(d) => {
                d.type_ref.write_to(out);
                d.name.token.write_to(out);
                if let Some(init) = &d.initializer {
                    init.operator.write_to(out);
                    init.value.write_to(out);
                }
            }
            Node::Tag(t) => {
                out.push_str(&t.prefix);
                out.push('<');
                out.push_str(&t.name);
                for attr in &t.attributes {
                    attr.write_to(out);
                }
                out.push_str(&t.before_close);
                out.push_str(if t.self_closing { "/>" } else { ">" });
                for child in &t.children {
                    child.write_to(out);
                }
                if let Some(closing) = &t.closing {
                    out.push_str(&closing.prefix);
                    out.push_str("</");
                    out.push_str(&closing.name);
                    out.push_str(&closing.trailing);
                    out.push('>');
                }
            }
            Node::Entry(e) => {
                e.key.write_to(out);
                e.separator.write_to(out);
                e.value.write_to(out);
            }
        }
    }

    /// The exact source text of this node, prefix included
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    /// Source text without the leading prefix
    pub fn text(&self) -> String {
        let source = self.to_source();
        source[self.prefix().len()..].to_string()
    }

    /// Leading whitespace and comments of the node
    pub fn prefix(&self) -> &str {
        match self {
            Node::Token(t) => &t.prefix,
            Node::Ident(i) => &i.token.prefix,
            Node::Literal(l) => &l.token.prefix,
            Node::Group(g) => g.children.first().map(|c| c.prefix()).unwrap_or(""),
            Node::Import(i) => &i.keyword.prefix,
            Node::Annotation(a) => &a.at.prefix,
            Node::Assignment(a) => a.target.prefix(),
            Node::FieldAccess(f) => f.target.prefix(),
            Node::Invocation(i) => match &i.select {
                Some(select) => select.target.prefix(),
                None => &i.name.token.prefix,
            },
            Node::NewObject(n) => &n.keyword.prefix,
            Node::Declaration(d) => d.type_ref.prefix(),
            Node::Tag(t) => &t.prefix,
            Node::Entry(e) => &e.key.prefix,
        }
    }

    /// Copy of this node with a different leading prefix
    pub fn with_prefix(&self, prefix: &str) -> Node {
        let mut node = self.clone();
        node.set_prefix(prefix.to_string());
        node
    }

    fn set_prefix(&mut self, prefix: String) {
        match self {
            Node::Token(t) => t.prefix = prefix,
            Node::Ident(i) => i.token.prefix = prefix,
            Node::Literal(l) => l.token.prefix = prefix,
            Node::Group(g) => match g.children.first_mut() {
                Some(first) => Arc::make_mut(first).set_prefix(prefix),
                None if !prefix.is_empty() => g.children.push(Arc::new(Node::Token(Token {
                    prefix,
                    text: String::new(),
                    offset: None,
                }))),
                None => {}
            },
            Node::Import(i) => i.keyword.prefix = prefix,
            Node::Annotation(a) => a.at.prefix = prefix,
            Node::Assignment(a) => Arc::make_mut(&mut a.target).set_prefix(prefix),
            Node::FieldAccess(f) => Arc::make_mut(&mut f.target).set_prefix(prefix),
            Node::Invocation(i) => match &mut i.select {
                Some(select) => Arc::make_mut(&mut select.target).set_prefix(prefix),
                None => i.name.token.prefix = prefix,
            },
            Node::NewObject(n) => n.keyword.prefix = prefix,
            Node::Declaration(d) => Arc::make_mut(&mut d.type_ref).set_prefix(prefix),
            Node::Tag(t) => t.prefix = prefix,
            Node::Entry(e) => e.key.prefix = prefix,
        }
    }

    /// Byte offset of the node's first token in the original source
    pub fn offset(&self) -> Option<usize> {
        match self {
            Node::Token(t) => t.offset,
            Node::Ident(i) => i.token.offset,
            Node::Literal(l) => l.token.offset,
            Node::Group(g) => g.children.iter().find_map(|c| c.offset()),
            Node::Import(i) => i.keyword.offset,
            Node::Annotation(a) => a.at.offset,
            Node::Assignment(a) => a.target.offset(),
            Node::FieldAccess(f) => f.target.offset().or(f.name.token.offset),
            Node::Invocation(i) => i
                .select
                .as_ref()
                .and_then(|s| s.target.offset())
                .or(i.name.token.offset),
            Node::NewObject(n) => n.keyword.offset,
            Node::Declaration(d) => d.type_ref.offset().or(d.name.token.offset),
            Node::Tag(t) => t.offset,
            Node::Entry(e) => e.key.offset,
        }
    }

    /// Structural children, in source order
    pub fn children(&self) -> Vec<&Arc<Node>> {
        let mut out = Vec::new();
        match self {
            Node::Group(g) => out.extend(g.children.iter()),
            Node::Tag(t) => out.extend(t.children.iter()),
            Node::Annotation(a) => {
                out.push(&a.name);
                if let Some(args) = &a.args {
                    out.extend(args.items.iter());
                }
            }
            Node::Assignment(a) => {
                out.push(&a.target);
                out.push(&a.value);
            }
            Node::FieldAccess(f) => out.push(&f.target),
            Node::Invocation(i) => {
                if let Some(select) = &i.select {
                    out.push(&select.target);
                }
                out.extend(i.args.items.iter());
            }
            Node::NewObject(n) => {
                out.push(&n.class);
                out.extend(n.args.items.iter());
                if let Some(body) = &n.body {
                    out.push(body);
                }
            }
            Node::Declaration(d) => {
                out.push(&d.type_ref);
                if let Some(init) = &d.initializer {
                    out.push(&init.value);
                }
            }
            Node::Token(_)
            | Node::Ident(_)
            | Node::Literal(_)
            | Node::Import(_)
            | Node::Entry(_) => {}
        }
        out
    }

    /// Copy of this node with every structural child passed through `f`,
    /// in the same order as [`Node::children`]
    pub fn map_children(&self, f: &mut dyn FnMut(&Arc<Node>) -> Arc<Node>) -> Node {
        fn map_all(items: &mut [Arc<Node>], f: &mut dyn FnMut(&Arc<Node>) -> Arc<Node>) {
            for item in items.iter_mut() {
                let mapped = f(&*item);
                *item = mapped;
            }
        }

        let mut node = self.clone();
        match &mut node {
            Node::Group(g) => map_all(&mut g.children, f),
            Node::Tag(t) => map_all(&mut t.children, f),
            Node::Annotation(a) => {
                a.name = f(&a.name);
                if let Some(args) = &mut a.args {
                    map_all(&mut args.items, f);
                }
            }
            Node::Assignment(a) => {
                a.target = f(&a.target);
                a.value = f(&a.value);
            }
            Node::FieldAccess(fa) => fa.target = f(&fa.target),
            Node::Invocation(i) => {
                if let Some(select) = &mut i.select {
                    select.target = f(&select.target);
                }
                map_all(&mut i.args.items, f);
            }
            Node::NewObject(n) => {
                n.class = f(&n.class);
                map_all(&mut n.args.items, f);
                if let Some(body) = &mut n.body {
                    *body = f(&*body);
                }
            }
            Node::Declaration(d) => {
                d.type_ref = f(&d.type_ref);
                if let Some(init) = &mut d.initializer {
                    init.value = f(&init.value);
                }
            }
            Node::Token(_)
            | Node::Ident(_)
            | Node::Literal(_)
            | Node::Import(_)
            | Node::Entry(_) => {}
        }
        node
    }

    /// The name a pattern would match this node by, if it has one
    pub fn name(&self) -> Option<&str> {
        match self {
            Node::Ident(i) => Some(i.text()),
            Node::Invocation(i) => Some(i.name.text()),
            Node::FieldAccess(f) => Some(f.name.text()),
            Node::Declaration(d) => Some(d.name.text()),
            Node::Annotation(a) => a.name.name(),
            Node::Tag(t) => Some(&t.name),
            Node::Entry(e) => Some(&e.key.text),
            _ => None,
        }
    }

    /// Static type of the expression, when the resolver could determine it
    pub fn declared_type(&self) -> Option<&str> {
        match self {
            Node::Ident(i) => i.declared_type.as_deref(),
            Node::Literal(l) => l.declared_type(),
            Node::Invocation(i) => i.declared_type.as_deref(),
            Node::NewObject(n) => n.declared_type.as_deref(),
            Node::Declaration(d) => d.declared_type.as_deref(),
            Node::Annotation(a) => a.declared_type.as_deref(),
            Node::Group(g) if g.kind == GroupKind::Parens && g.children.len() == 3 => {
                g.children[1].declared_type()
            }
            _ => None,
        }
    }

    /// Fully-qualified type or constant this node refers to
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Node::Ident(i) => i.symbol.as_deref(),
            Node::FieldAccess(f) => f.symbol.as_deref(),
            _ => None,
        }
    }
}

/// A parsed artifact
#[derive(Debug, Clone)]
pub struct Tree {
    kind: ArtifactKind,
    root: Arc<Node>,
}

impl Tree {
    pub fn new(kind: ArtifactKind, root: Node) -> Self {
        Self {
            kind,
            root: Arc::new(root),
        }
    }

    pub fn from_root(kind: ArtifactKind, root: Arc<Node>) -> Self {
        Self { kind, root }
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn root(&self) -> &Arc<Node> {
        &self.root
    }

    /// Write the tree back to text
    pub fn unparse(&self) -> String {
        self.root.to_source()
    }

    /// Replace `target` (found by identity) with `replacement`.
    ///
    /// The replacement takes over the target's prefix. Subtrees off the path
    /// to `target` are shared with `self`. If `target` is not part of this
    /// tree, an identical tree is returned.
    pub fn replace(&self, target: &Arc<Node>, replacement: Node) -> Tree {
        let replacement = Arc::new(replacement.with_prefix(target.prefix()));
        match replace_in(&self.root, target, &replacement) {
            Some(root) => Tree::from_root(self.kind, root),
            None => self.clone(),
        }
    }

    /// All nodes in pre-order
    pub fn nodes(&self) -> Vec<&Arc<Node>> {
        fn collect<'a>(node: &'a Arc<Node>, out: &mut Vec<&'a Arc<Node>>) {
            out.push(node);
            for child in node.children() {
                collect(child, out);
            }
        }
        let mut out = Vec::new();
        collect(&self.root, &mut out);
        out
    }

    /// Nodes satisfying `pred`, in pre-order
    pub fn find_all(&self, pred: impl Fn(&Node) -> bool) -> Vec<&Arc<Node>> {
        self.nodes().into_iter().filter(|n| pred(n)).collect()
    }
}

fn replace_in(node: &Arc<Node>, target: &Arc<Node>, replacement: &Arc<Node>) -> Option<Arc<Node>> {
    if Arc::ptr_eq(node, target) {
        return Some(Arc::clone(replacement));
    }
    let mut found = false;
    let rebuilt = node.map_children(&mut |child| {
        if found {
            return Arc::clone(child);
        }
        match replace_in(child, target, replacement) {
            Some(new_child) => {
                found = true;
                new_child
            }
            None => Arc::clone(child),
        }
    });
    found.then(|| Arc::new(rebuilt))
}

/// Maps byte offsets to 1-based line and column numbers
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self { line_starts }
    }

    /// (line, column) of a byte offset, both 1-based
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = self.line_starts[line.saturating_sub(1)];
        (line.max(1), offset - line_start + 1)
    }

    /// The text of a 1-based line, without its terminator
    pub fn line_text<'a>(&self, source: &'a str, line: usize) -> Option<&'a str> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        let end = self
            .line_starts
            .get(line)
            .map(|&next| next - 1)
            .unwrap_or(source.len());
        source.get(start..end).map(|l| l.trim_end_matches('\r'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(prefix: &str, text: &str, offset: usize) -> Arc<Node> {
        Arc::new(Node::Ident(Ident::new(Token::new(prefix, text, offset))))
    }

    fn call(receiver: Arc<Node>, name: &str, args: Vec<Arc<Node>>) -> Node {
        Node::Invocation(Invocation {
            select: Some(Select {
                target: receiver,
                dot: Token::synthetic("."),
            }),
            name: Ident::new(Token::synthetic(name)),
            args: Args::synthetic(args),
            declared_type: None,
        })
    }

    #[test]
    fn test_write_invocation() {
        let node = call(ident("  ", "context", 0), "startRoute", vec![ident("", "id", 0)]);
        assert_eq!(node.to_source(), "  context.startRoute(id)");
        assert_eq!(node.text(), "context.startRoute(id)");
        assert_eq!(node.prefix(), "  ");
    }

    #[test]
    fn test_with_prefix_sets_leftmost_token() {
        let node = call(ident("  ", "context", 0), "stop", vec![]);
        let moved = node.with_prefix("\n\t");
        assert_eq!(moved.to_source(), "\n\tcontext.stop()");
        assert_eq!(node.to_source(), "  context.stop()");
    }

    #[test]
    fn test_replace_shares_untouched_subtrees() {
        let first = Arc::new(call(ident("", "a", 0), "x", vec![]));
        let second = Arc::new(call(ident(" ", "b", 6), "y", vec![]));
        let root = Node::Group(Group {
            kind: GroupKind::Unit,
            children: vec![Arc::clone(&first), Arc::clone(&second)],
        });
        let tree = Tree::new(ArtifactKind::Code, root);
        assert_eq!(tree.unparse(), "a.x() b.y()");

        let replacement = call(ident("", "c", 0), "z", vec![]);
        let updated = tree.replace(&second, replacement);

        assert_eq!(updated.unparse(), "a.x() c.z()");
        assert_eq!(tree.unparse(), "a.x() b.y()");
        let Node::Group(group) = updated.root().as_ref() else {
            panic!("expected group");
        };
        assert!(Arc::ptr_eq(&group.children[0], &first));
    }

    #[test]
    fn test_replace_unknown_target_is_identity() {
        let tree = Tree::new(ArtifactKind::Code, call(ident("", "a", 0), "x", vec![]));
        let stranger = ident("", "z", 0);
        let same = tree.replace(&stranger, Node::Token(Token::synthetic("q")));
        assert!(Arc::ptr_eq(same.root(), tree.root()));
    }

    #[test]
    fn test_literal_types() {
        let lit = |text: &str, kind| Literal {
            token: Token::synthetic(text),
            kind,
        };
        assert_eq!(lit("\"a\"", LiteralKind::String).declared_type(), Some("java.lang.String"));
        assert_eq!(lit("10", LiteralKind::Number).declared_type(), Some("int"));
        assert_eq!(lit("10L", LiteralKind::Number).declared_type(), Some("long"));
        assert_eq!(lit("1.5", LiteralKind::Number).declared_type(), Some("double"));
        assert_eq!(lit("0xFF", LiteralKind::Number).declared_type(), Some("int"));
        assert_eq!(lit("true", LiteralKind::Boolean).declared_type(), Some("boolean"));
        assert_eq!(lit("null", LiteralKind::Null).declared_type(), None);
    }

    #[test]
    fn test_comment_prefixes() {
        assert_eq!(
            ArtifactKind::Code.prefix_with_comment("\n    ", "FIXME"),
            "\n    /* FIXME */ "
        );
        assert_eq!(
            ArtifactKind::Markup.prefix_with_comment("\n    ", "check"),
            "\n    <!-- check -->\n    "
        );
        assert_eq!(
            ArtifactKind::Properties.prefix_with_comment("", "removed"),
            "# removed\n"
        );
    }

    #[test]
    fn test_line_index() {
        let source = "one\ntwo\r\nthree";
        let index = LineIndex::new(source);
        assert_eq!(index.line_col(0), (1, 1));
        assert_eq!(index.line_col(4), (2, 1));
        assert_eq!(index.line_col(10), (3, 2));
        assert_eq!(index.line_text(source, 2), Some("two"));
        assert_eq!(index.line_text(source, 3), Some("three"));
        assert_eq!(index.line_text(source, 4), None);
    }
}
