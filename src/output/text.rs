//! Human-readable text output formatter

use super::OutputFormatter;
use crate::diagnostic::{Diagnostic, Severity};
use crate::pipeline::{Artifact, BatchResult};
use colored::*;

/// Text formatter with optional color support
pub struct TextFormatter {
    /// Enable colored output
    pub colored: bool,

    /// Show source context
    pub show_source: bool,

    /// Show help text
    pub show_help: bool,

    /// List every applied rewrite
    pub show_changes: bool,

    /// Show informational diagnostics
    pub show_info: bool,

    /// Show statistics
    pub show_stats: bool,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self {
            colored: true,
            show_source: true,
            show_help: true,
            show_changes: false,
            show_info: false,
            show_stats: true,
        }
    }
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable colors
    pub fn without_color(mut self) -> Self {
        self.colored = false;
        self
    }

    /// Also list applied rewrites and informational notices
    pub fn verbose(mut self) -> Self {
        self.show_changes = true;
        self.show_info = true;
        self
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.colored {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn severity_str(&self, severity: Severity) -> ColoredString {
        let s = format!("{}", severity);
        if !self.colored {
            return s.normal();
        }
        match severity {
            Severity::Error => s.red().bold(),
            Severity::Warning => s.yellow().bold(),
            Severity::Info => s.blue(),
        }
    }

    fn format_location(&self, diag: &Diagnostic) -> String {
        format!(
            "{}:{}:{}",
            diag.location.file.display(),
            diag.location.line,
            diag.location.column
        )
    }

    fn visible<'a>(&self, artifact: &'a Artifact) -> Vec<&'a Diagnostic> {
        artifact
            .diagnostics
            .iter()
            .filter(|d| self.show_info || d.severity != Severity::Info)
            .collect()
    }

    fn format_artifact(&self, artifact: &Artifact) -> Option<String> {
        let diagnostics = self.visible(artifact);
        let show_changes = self.show_changes && !artifact.changes.is_empty();
        if diagnostics.is_empty() && !show_changes {
            return None;
        }

        let mut output = String::new();
        let header = artifact.path.display().to_string();
        output.push_str(&self.paint(&header, |s| s.underline()));
        output.push('\n');

        if show_changes {
            for change in &artifact.changes {
                output.push_str(&format!(
                    "{}:{}: {}[{}]: {}\n",
                    change.location.line,
                    change.location.column,
                    self.paint("changed", |s| s.green()),
                    self.paint(&change.rule_id, |s| s.cyan()),
                    change.description
                ));
            }
        }

        for diag in diagnostics {
            output.push_str(&self.format_diagnostic(diag));
        }
        Some(output)
    }

    fn plural(count: usize, one: &str, many: &str) -> String {
        format!("{} {}", count, if count == 1 { one } else { many })
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, result: &BatchResult) -> String {
        let mut output = String::new();

        for artifact in &result.artifacts {
            if let Some(block) = self.format_artifact(artifact) {
                output.push_str(&block);
                output.push('\n');
            }
        }

        if self.show_stats {
            output.push_str(&format!(
                "{} processed, {} changed ({})",
                Self::plural(result.files_processed, "file", "files"),
                result.files_changed,
                Self::plural(result.change_count, "rewrite", "rewrites"),
            ));

            let mut counts = Vec::new();
            if result.error_count > 0 {
                let s = Self::plural(result.error_count, "error", "errors");
                counts.push(self.paint(&s, |s| s.red()));
            }
            if result.warning_count > 0 {
                let s = Self::plural(result.warning_count, "warning", "warnings");
                counts.push(self.paint(&s, |s| s.yellow()));
            }
            if result.info_count > 0 && self.show_info {
                let s = Self::plural(result.info_count, "info", "infos");
                counts.push(self.paint(&s, |s| s.blue()));
            }

            if !counts.is_empty() {
                output.push_str(&format!(": {}", counts.join(", ")));
            }
            output.push('\n');

            output.push_str(&format!(
                "Finished in {:.2}s\n",
                result.duration.as_secs_f64()
            ));
        }

        output
    }

    fn format_diagnostic(&self, diag: &Diagnostic) -> String {
        let mut output = String::new();
        let code = if diag.rule_id.is_empty() {
            diag.kind.to_string()
        } else {
            diag.rule_id.clone()
        };

        output.push_str(&format!(
            "{}: {}[{}]: {}\n",
            self.format_location(diag),
            self.severity_str(diag.severity),
            self.paint(&code, |s| s.cyan()),
            diag.message
        ));

        if self.show_source {
            if let Some(source) = &diag.source_line {
                let bar = self.paint("|", |s| s.blue());
                let line_num = format!("{:>4}", diag.location.line);
                output.push_str(&format!(
                    "{} {} {}\n",
                    self.paint(&line_num, |s| s.blue()),
                    bar,
                    source
                ));

                if diag.location.column > 0 {
                    let padding = " ".repeat(diag.location.column - 1);
                    let underline = "^".repeat(diag.location.length.max(1));
                    output.push_str(&format!(
                        "     {} {}{}\n",
                        bar,
                        padding,
                        self.paint(&underline, |s| s.red())
                    ));
                }
            }
        }

        if self.show_help {
            if let Some(help) = &diag.help {
                output.push_str(&format!("   {} help: {}\n", self.paint("=", |s| s.blue()), help));
            }
        }

        for note in &diag.notes {
            output.push_str(&format!("   {} note: {}\n", self.paint("=", |s| s.blue()), note));
        }

        output
    }
}
