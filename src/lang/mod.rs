//! Parsers for each artifact kind
//!
//! A [`Language`] turns source text into a lossless [`Tree`]; writing the
//! tree back with [`Tree::unparse`] yields the input unchanged.

pub mod java;
pub mod properties;
pub mod xml;

use crate::tree::{ArtifactKind, LineIndex, Tree};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

pub use java::JavaLanguage;
pub use properties::PropertiesLanguage;
pub use xml::XmlLanguage;

/// Error during parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("XML parse error at line {line}: {message}")]
    Xml { line: usize, message: String },

    #[error("Invalid document: {0}")]
    Invalid(String),
}

impl ParseError {
    /// Syntax error at a byte offset of `source`
    pub fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = LineIndex::new(source).line_col(offset);
        ParseError::Syntax {
            line,
            column,
            message: message.into(),
        }
    }

    /// 1-based line of the error, when known
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Syntax { line, .. } | ParseError::Xml { line, .. } => Some(*line),
            ParseError::Invalid(_) => None,
        }
    }
}

/// A parser/unparser for one artifact kind
pub trait Language: Send + Sync {
    /// Language identifier (e.g., "java", "xml")
    fn id(&self) -> &str;

    /// Artifact kind produced by this language
    fn kind(&self) -> ArtifactKind;

    /// File extensions this language handles (without dot)
    fn extensions(&self) -> &[&str];

    /// Parse source text into a lossless tree
    fn parse(&self, source: &str) -> Result<Tree, ParseError>;
}

/// Registered languages, looked up by extension or artifact kind
#[derive(Clone, Default)]
pub struct Languages {
    by_extension: HashMap<String, Arc<dyn Language>>,
    by_kind: HashMap<ArtifactKind, Arc<dyn Language>>,
}

impl Languages {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the Java, XML and properties parsers
    pub fn builtin() -> Self {
        let mut languages = Self::new();
        languages.register(Arc::new(JavaLanguage::new()));
        languages.register(Arc::new(XmlLanguage::new()));
        languages.register(Arc::new(PropertiesLanguage::new()));
        languages
    }

    /// Register a language for its extensions and kind
    pub fn register(&mut self, language: Arc<dyn Language>) {
        for ext in language.extensions() {
            self.by_extension
                .insert(ext.to_string(), Arc::clone(&language));
        }
        self.by_kind.insert(language.kind(), language);
    }

    /// Language for a file path, by extension
    pub fn for_path(&self, path: &Path) -> Option<Arc<dyn Language>> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        self.by_extension.get(&ext).cloned()
    }

    /// Language for an artifact kind
    pub fn for_kind(&self, kind: ArtifactKind) -> Option<Arc<dyn Language>> {
        self.by_kind.get(&kind).cloned()
    }

    /// Handled extensions, sorted
    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.by_extension.keys().map(|s| s.as_str()).collect();
        exts.sort_unstable();
        exts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_path_and_kind() {
        let languages = Languages::builtin();
        let java = languages.for_path(Path::new("src/Route.JAVA")).unwrap();
        assert_eq!(java.id(), "java");
        assert_eq!(
            languages.for_kind(ArtifactKind::Markup).unwrap().id(),
            "xml"
        );
        assert!(languages.for_path(Path::new("README.md")).is_none());
        assert!(languages.for_path(Path::new("Makefile")).is_none());
        assert_eq!(languages.extensions(), vec!["java", "properties", "xml"]);
    }

    #[test]
    fn test_error_position() {
        let err = ParseError::at("ab\ncd", 4, "bad token");
        assert_eq!(
            err,
            ParseError::Syntax {
                line: 2,
                column: 2,
                message: "bad token".to_string()
            }
        );
        assert_eq!(err.line(), Some(2));
    }
}
