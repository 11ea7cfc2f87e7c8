//! Diagnostic types for migration results

use crate::tree::LineIndex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Severity level for diagnostics
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational notice
    Info,
    /// Warning - manual follow-up needed
    #[default]
    Warning,
    /// Error - the artifact or rewrite could not be processed
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" | "hint" | "note" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" | "err" => Ok(Severity::Error),
            _ => Err(()),
        }
    }
}

/// What produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// The artifact could not be read or parsed as its declared kind
    ParseError,
    /// A synthesized replacement could not be built; the node was left as authored
    TemplateError,
    /// A pattern could not confirm the declared types it needs
    AmbiguousMatch,
    /// The construct needs a manual migration step
    ManualMigration,
}

impl DiagnosticKind {
    /// Default severity for this kind
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::ParseError | DiagnosticKind::TemplateError => Severity::Error,
            DiagnosticKind::ManualMigration => Severity::Warning,
            DiagnosticKind::AmbiguousMatch => Severity::Info,
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DiagnosticKind::ParseError => "parse-error",
            DiagnosticKind::TemplateError => "template-error",
            DiagnosticKind::AmbiguousMatch => "ambiguous-match",
            DiagnosticKind::ManualMigration => "manual-migration",
        };
        f.write_str(name)
    }
}

/// Source code location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// File path
    pub file: PathBuf,
    /// Line number (1-based, 0 when unknown)
    pub line: usize,
    /// Column number (1-based, 0 when unknown)
    pub column: usize,
    /// Length of the highlighted region
    pub length: usize,
}

impl Location {
    pub fn new(file: PathBuf, line: usize, column: usize) -> Self {
        Self {
            file,
            line,
            column,
            length: 0,
        }
    }

    /// Location of a byte offset, or the start of the file when the offset is unknown
    pub fn at_offset(file: &Path, index: &LineIndex, offset: Option<usize>) -> Self {
        match offset {
            Some(offset) => {
                let (line, column) = index.line_col(offset);
                Self::new(file.to_path_buf(), line, column)
            }
            None => Self::new(file.to_path_buf(), 0, 0),
        }
    }

    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }
}

/// A migration diagnostic (parse failure, template failure, manual step, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// What produced this diagnostic
    pub kind: DiagnosticKind,
    /// Rule ID that triggered this diagnostic (empty for artifact-level failures)
    pub rule_id: String,
    /// Severity level
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// Source location
    pub location: Location,
    /// The source line (for display)
    pub source_line: Option<String>,
    /// Help text (usually the recipe description)
    pub help: Option<String>,
    /// Additional notes
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with the kind's default severity
    pub fn new(kind: DiagnosticKind, rule_id: &str, message: &str, location: Location) -> Self {
        Self {
            kind,
            rule_id: rule_id.to_string(),
            severity: kind.severity(),
            message: message.to_string(),
            location,
            source_line: None,
            help: None,
            notes: Vec::new(),
        }
    }

    /// Override the severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Add source line for display
    pub fn with_source_line(mut self, line: &str) -> Self {
        self.source_line = Some(line.to_string());
        self
    }

    /// Add help text
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Add a note
    pub fn with_note(mut self, note: &str) -> Self {
        self.notes.push(note.to_string());
        self
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Check if this is a warning
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}
