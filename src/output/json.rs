//! JSON output formatter

use super::OutputFormatter;
use crate::diagnostic::Diagnostic;
use crate::pipeline::{AppliedChange, ArtifactState, BatchResult};
use serde::Serialize;

/// JSON formatter for machine-readable output
#[derive(Default)]
pub struct JsonFormatter {
    /// Pretty print with indentation
    pub pretty: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable pretty printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    fn render<T: Serialize>(&self, value: &T) -> String {
        if self.pretty {
            serde_json::to_string_pretty(value).unwrap_or_default()
        } else {
            serde_json::to_string(value).unwrap_or_default()
        }
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    artifacts: Vec<JsonArtifact<'a>>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonArtifact<'a> {
    file: String,
    kind: String,
    state: ArtifactState,
    changed: bool,
    changes: &'a [AppliedChange],
    diagnostics: Vec<JsonDiagnostic<'a>>,
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    kind: String,
    rule_id: &'a str,
    severity: String,
    message: &'a str,
    file: String,
    line: usize,
    column: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_line: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<&'a str>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    notes: &'a [String],
}

impl<'a> From<&'a Diagnostic> for JsonDiagnostic<'a> {
    fn from(d: &'a Diagnostic) -> Self {
        Self {
            kind: d.kind.to_string(),
            rule_id: &d.rule_id,
            severity: d.severity.to_string(),
            message: &d.message,
            file: d.location.file.display().to_string(),
            line: d.location.line,
            column: d.location.column,
            source_line: d.source_line.as_deref(),
            help: d.help.as_deref(),
            notes: &d.notes,
        }
    }
}

#[derive(Serialize)]
struct JsonSummary {
    files_processed: usize,
    files_changed: usize,
    files_failed: usize,
    change_count: usize,
    error_count: usize,
    warning_count: usize,
    info_count: usize,
    duration_ms: u128,
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, result: &BatchResult) -> String {
        let artifacts = result
            .artifacts
            .iter()
            .map(|a| JsonArtifact {
                file: a.path.display().to_string(),
                kind: a.kind.to_string(),
                state: a.state,
                changed: a.is_changed(),
                changes: &a.changes,
                diagnostics: a.diagnostics.iter().map(JsonDiagnostic::from).collect(),
            })
            .collect();

        let output = JsonOutput {
            artifacts,
            summary: JsonSummary {
                files_processed: result.files_processed,
                files_changed: result.files_changed,
                files_failed: result.files_failed,
                change_count: result.change_count,
                error_count: result.error_count,
                warning_count: result.warning_count,
                info_count: result.info_count,
                duration_ms: result.duration.as_millis(),
            },
        };

        self.render(&output)
    }

    fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        self.render(&JsonDiagnostic::from(diagnostic))
    }
}
