//! Output formatters for migration results

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use crate::diagnostic::Diagnostic;
use crate::pipeline::BatchResult;

/// Output formatter trait
pub trait OutputFormatter: Send + Sync {
    /// Format the entire batch result
    fn format(&self, result: &BatchResult) -> String;

    /// Format a single diagnostic
    fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String;
}
