//! Java-like program code
//!
//! Parsing runs in two passes: a structural parse into the lossless tree,
//! then attribution of declared types from imports and declarations.

pub mod lexer;
pub mod parser;
pub mod types;

use super::{Language, ParseError};
use crate::tree::{ArtifactKind, Node, Tree};
use std::sync::Arc;

pub use parser::parse_expression;
pub use types::{attribute, SymbolTable};

/// Java source files
pub struct JavaLanguage;

impl Default for JavaLanguage {
    fn default() -> Self {
        Self::new()
    }
}

impl JavaLanguage {
    pub fn new() -> Self {
        Self
    }
}

impl Language for JavaLanguage {
    fn id(&self) -> &str {
        "java"
    }

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Code
    }

    fn extensions(&self) -> &[&str] {
        &["java"]
    }

    fn parse(&self, source: &str) -> Result<Tree, ParseError> {
        let unit: Node = parser::parse_unit(source)?;
        let root = attribute(&Arc::new(unit));
        Ok(Tree::from_root(ArtifactKind::Code, root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_lossless_and_attributed() {
        let source = "import org.apache.camel.CamelContext;\n\nclass A {\n  void f(CamelContext ctx) { ctx.start(); }\n}\n";
        let tree = JavaLanguage::new().parse(source).unwrap();
        assert_eq!(tree.unparse(), source);
        assert_eq!(tree.kind(), ArtifactKind::Code);

        let receivers = tree.find_all(|n| matches!(n, Node::Ident(i) if i.text() == "ctx"));
        assert_eq!(
            receivers[0].declared_type(),
            Some("org.apache.camel.CamelContext")
        );
    }

    #[test]
    fn test_syntax_errors_carry_a_line() {
        let err = JavaLanguage::new()
            .parse("class A {\n  void f() {\n    x = );\n  }\n}\n")
            .unwrap_err();
        assert_eq!(err.line(), Some(3));
    }
}
