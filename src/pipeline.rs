//! Pipeline runner
//!
//! Each artifact moves through `Unparsed -> Parsed -> {Transformed | ParseFailed}`.
//! A failed artifact gets a `parse-error` diagnostic and drops out of the
//! plan's output; the rest of the batch carries on. Artifacts never share
//! state, so a batch is processed in parallel across files.

use crate::catalogue::MigrationPlan;
use crate::config::{Config, FilesConfig};
use crate::diagnostic::{Diagnostic, DiagnosticKind, Location, Severity};
use crate::lang::Languages;
use crate::recipe::{Change, Notice};
use crate::tree::{ArtifactKind, LineIndex, Tree};
use globset::{Glob, GlobSet, GlobSetBuilder};
use log::{debug, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

/// File discovery error
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Invalid pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("Invalid exclude pattern: {0}")]
    Exclude(#[from] globset::Error),
}

/// Where an artifact is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactState {
    Unparsed,
    Parsed,
    Transformed,
    ParseFailed,
}

/// A rewrite applied to an artifact, positioned in its original text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedChange {
    pub rule_id: String,
    pub recipe_id: String,
    pub location: Location,
    pub description: String,
}

/// One source file being migrated
#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
    /// Text as read, before any recipe ran
    pub source: String,
    pub state: ArtifactState,
    pub tree: Option<Tree>,
    pub diagnostics: Vec<Diagnostic>,
    pub changes: Vec<AppliedChange>,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, kind: ArtifactKind, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            source: source.into(),
            state: ArtifactState::Unparsed,
            tree: None,
            diagnostics: Vec::new(),
            changes: Vec::new(),
        }
    }

    /// Artifact that could not even be read
    fn unreadable(path: &Path, kind: ArtifactKind, message: &str) -> Self {
        let mut artifact = Self::new(path, kind, String::new());
        artifact.fail(message, Location::new(path.to_path_buf(), 0, 0));
        artifact
    }

    fn fail(&mut self, message: &str, location: Location) {
        self.state = ArtifactState::ParseFailed;
        self.tree = None;
        self.diagnostics.push(Diagnostic::new(
            DiagnosticKind::ParseError,
            "",
            message,
            location,
        ));
    }

    /// Parse the source with the language registered for this artifact's kind
    pub fn parse(&mut self, languages: &Languages) {
        if self.state != ArtifactState::Unparsed {
            return;
        }

        let Some(language) = languages.for_kind(self.kind) else {
            let message = format!("No parser registered for {} artifacts", self.kind);
            self.fail(&message, Location::new(self.path.clone(), 0, 0));
            return;
        };

        match language.parse(&self.source) {
            Ok(tree) => {
                self.tree = Some(tree);
                self.state = ArtifactState::Parsed;
            }
            Err(e) => {
                let line = e.line().unwrap_or(0);
                let mut location = Location::new(self.path.clone(), line, 0);
                if let crate::lang::ParseError::Syntax { column, .. } = &e {
                    location.column = *column;
                }
                let source_line = LineIndex::new(&self.source)
                    .line_text(&self.source, line)
                    .map(str::to_string);
                self.fail(&format!("Parse error: {}", e), location);
                if let (Some(text), Some(diag)) = (source_line, self.diagnostics.last_mut()) {
                    diag.source_line = Some(text);
                }
            }
        }
    }

    pub fn is_failed(&self) -> bool {
        self.state == ArtifactState::ParseFailed
    }

    /// Migrated text, or `None` when the artifact failed or has not run
    pub fn output(&self) -> Option<String> {
        match (self.state, &self.tree) {
            (ArtifactState::Transformed, Some(tree)) => Some(tree.unparse()),
            _ => None,
        }
    }

    /// Whether the migrated text differs from the source
    pub fn is_changed(&self) -> bool {
        self.output().is_some_and(|out| out != self.source)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_warning()).count()
    }

    fn record(&mut self, index: &LineIndex, changes: Vec<Change>, notices: Vec<Notice>, plan: &MigrationPlan) {
        for change in changes {
            let location = Location::at_offset(&self.path, index, change.offset);
            self.changes.push(AppliedChange {
                rule_id: change.rule_id,
                recipe_id: change.recipe_id,
                location,
                description: change.description,
            });
        }

        for notice in notices {
            let location = Location::at_offset(&self.path, index, notice.offset);
            let mut diag = Diagnostic::new(notice.kind, &notice.rule_id, &notice.message, location);
            if let Some(line) = index.line_text(&self.source, diag.location.line) {
                diag = diag.with_source_line(line);
            }
            if let Some(recipe) = plan.recipes.iter().find(|r| r.id == notice.recipe_id) {
                diag = diag.with_note(&format!("recipe: {}", recipe.display_name));
                if let Some(description) = &recipe.description {
                    diag = diag.with_help(description);
                }
            }
            self.diagnostics.push(diag);
        }
    }
}

/// Result of running a plan over a batch of artifacts
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Artifacts in input order
    pub artifacts: Vec<Artifact>,

    /// Files processed
    pub files_processed: usize,

    /// Files whose text changed
    pub files_changed: usize,

    /// Files that could not be read or parsed
    pub files_failed: usize,

    /// Total rewrites applied
    pub change_count: usize,

    /// Total errors
    pub error_count: usize,

    /// Total warnings
    pub warning_count: usize,

    /// Total info messages
    pub info_count: usize,

    /// Processing duration
    pub duration: Duration,
}

impl BatchResult {
    /// Add one finished artifact
    pub fn push(&mut self, artifact: Artifact) {
        self.files_processed += 1;
        if artifact.is_failed() {
            self.files_failed += 1;
        }
        if artifact.is_changed() {
            self.files_changed += 1;
        }
        self.change_count += artifact.changes.len();
        for diag in &artifact.diagnostics {
            match diag.severity {
                Severity::Error => self.error_count += 1,
                Severity::Warning => self.warning_count += 1,
                Severity::Info => self.info_count += 1,
            }
        }
        self.artifacts.push(artifact);
    }

    /// Merge another result into this one
    pub fn merge(&mut self, other: BatchResult) {
        self.artifacts.extend(other.artifacts);
        self.files_processed += other.files_processed;
        self.files_changed += other.files_changed;
        self.files_failed += other.files_failed;
        self.change_count += other.change_count;
        self.error_count += other.error_count;
        self.warning_count += other.warning_count;
        self.info_count += other.info_count;
        self.duration += other.duration;
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Check if result is clean (no errors or warnings)
    pub fn is_clean(&self) -> bool {
        self.error_count == 0 && self.warning_count == 0
    }

    /// All diagnostics, artifact by artifact
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.artifacts.iter().flat_map(|a| a.diagnostics.iter())
    }

    /// Get exit code (0 = success, 1 = warnings under `strict`, 2 = errors)
    pub fn exit_code(&self, strict: bool) -> i32 {
        if self.error_count > 0 {
            2
        } else if strict && self.warning_count > 0 {
            1
        } else {
            0
        }
    }
}

/// Runs migration plans over artifacts
pub struct Pipeline {
    languages: Languages,
    config: Config,
}

impl Pipeline {
    /// Pipeline with the built-in parsers
    pub fn new(config: Config) -> Self {
        Self {
            languages: Languages::builtin(),
            config,
        }
    }

    pub fn with_languages(mut self, languages: Languages) -> Self {
        self.languages = languages;
        self
    }

    pub fn languages(&self) -> &Languages {
        &self.languages
    }

    /// Parse an artifact if needed, then run every recipe of `plan` that
    /// targets its kind, in plan order
    pub fn run_plan(&self, plan: &MigrationPlan, mut artifact: Artifact) -> Artifact {
        artifact.parse(&self.languages);
        let Some(mut tree) = artifact.tree.take() else {
            return artifact;
        };

        let index = LineIndex::new(&artifact.source);
        for recipe in plan.recipes_for(artifact.kind) {
            let run = recipe.run(&tree, &plan.aliases);
            if !run.is_noop() {
                debug!(
                    "{}: {} changed {} node(s), {} notice(s)",
                    artifact.path.display(),
                    recipe.id,
                    run.changes.len(),
                    run.notices.len()
                );
            }
            artifact.record(&index, run.changes, run.notices, plan);
            tree = run.tree;
        }

        artifact.tree = Some(tree);
        artifact.state = ArtifactState::Transformed;
        artifact
    }

    /// Read one file and run the plan on it
    pub fn run_file(&self, plan: &MigrationPlan, path: &Path) -> Artifact {
        let Some(language) = self.languages.for_path(path) else {
            warn!("Skipping {}: no parser for this file type", path.display());
            return Artifact::unreadable(
                path,
                ArtifactKind::Code,
                "Unsupported file type",
            );
        };

        match std::fs::read_to_string(path) {
            Ok(source) => self.run_plan(plan, Artifact::new(path, language.kind(), source)),
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                Artifact::unreadable(
                    path,
                    language.kind(),
                    &format!("Failed to read file: {}", e),
                )
            }
        }
    }

    /// Worker threads a parallel run uses
    pub fn thread_count(&self) -> usize {
        if self.config.engine.jobs > 0 {
            self.config.engine.jobs
        } else {
            num_cpus::get()
        }
    }

    /// Pool sized by `engine.jobs`; `None` means run sequentially
    fn pool(&self) -> Option<rayon::ThreadPool> {
        if !self.config.engine.parallel {
            return None;
        }
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.thread_count())
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!("Falling back to sequential run: {}", e);
                None
            }
        }
    }

    /// Run the plan over many files
    pub fn run_batch(&self, plan: &MigrationPlan, files: &[PathBuf]) -> BatchResult {
        let start = Instant::now();

        let artifacts: Vec<Artifact> = match self.pool() {
            Some(pool) => {
                pool.install(|| files.par_iter().map(|f| self.run_file(plan, f)).collect())
            }
            None => files.iter().map(|f| self.run_file(plan, f)).collect(),
        };

        let mut result = BatchResult::default();
        for artifact in artifacts {
            result.push(artifact);
        }
        result.duration = start.elapsed();
        result
    }

    /// Run the plan over in-memory artifacts
    pub fn run_artifacts(&self, plan: &MigrationPlan, artifacts: Vec<Artifact>) -> BatchResult {
        let start = Instant::now();
        let done: Vec<Artifact> = match self.pool() {
            Some(pool) => pool.install(|| {
                artifacts
                    .into_par_iter()
                    .map(|a| self.run_plan(plan, a))
                    .collect()
            }),
            None => artifacts
                .into_iter()
                .map(|a| self.run_plan(plan, a))
                .collect(),
        };

        let mut result = BatchResult::default();
        for artifact in done {
            result.push(artifact);
        }
        result.duration = start.elapsed();
        result
    }

    /// Expand input paths into the files to migrate
    pub fn discover(&self, inputs: &[PathBuf]) -> Result<Vec<PathBuf>, DiscoveryError> {
        discover_files(inputs, &self.config.files, &self.languages)
    }
}

/// Expand input paths into files
///
/// Directories are searched with the `include` patterns, plain files are
/// taken as given and anything else is treated as a glob. Files matching an
/// `exclude` pattern or without a registered parser are dropped.
pub fn discover_files(
    inputs: &[PathBuf],
    files: &FilesConfig,
    languages: &Languages,
) -> Result<Vec<PathBuf>, DiscoveryError> {
    let exclude = build_globset(&files.exclude)?;
    let mut found = Vec::new();

    for input in inputs {
        if input.is_file() {
            found.push(input.clone());
        } else if input.is_dir() {
            for pattern in &files.include {
                let full = input.join(pattern);
                expand_glob(&full.to_string_lossy(), &mut found)?;
            }
        } else {
            expand_glob(&input.to_string_lossy(), &mut found)?;
        }
    }

    found.retain(|f| !exclude.is_match(f) && languages.for_path(f).is_some());
    found.sort();
    found.dedup();
    Ok(found)
}

fn expand_glob(pattern: &str, found: &mut Vec<PathBuf>) -> Result<(), DiscoveryError> {
    let paths = glob::glob(pattern).map_err(|e| DiscoveryError::Pattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;
    for entry in paths.flatten() {
        if entry.is_file() {
            found.push(entry);
        }
    }
    Ok(())
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    builder.build()
}
