//! Writing migrated artifacts back to disk
//!
//! Only artifacts whose text actually changed are touched. In diff mode a
//! unified diff is produced instead; in check mode nothing is written and
//! the caller just learns which files would change.

use crate::pipeline::Artifact;
use similar::TextDiff;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error while writing an artifact
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What to do with migrated artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Overwrite changed files
    Write,
    /// Produce unified diffs, write nothing
    Diff,
    /// Report changed files only
    #[default]
    Check,
}

/// Outcome for one changed artifact
#[derive(Debug, Clone)]
pub struct Written {
    pub path: PathBuf,
    /// Unified diff, in diff mode
    pub diff: Option<String>,
}

/// Result of writing a batch
#[derive(Debug, Default)]
pub struct WriteResult {
    /// Changed artifacts, in input order
    pub files: Vec<Written>,
    /// Files actually written to disk
    pub files_written: usize,
    pub errors: Vec<WriteError>,
}

impl WriteResult {
    /// Concatenated diffs
    pub fn format_diffs(&self) -> String {
        self.files
            .iter()
            .filter_map(|w| w.diff.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Writes or diffs migrated artifacts
pub struct Writer {
    mode: WriteMode,
    context_lines: usize,
}

impl Writer {
    pub fn new(mode: WriteMode) -> Self {
        Self {
            mode,
            context_lines: 3,
        }
    }

    pub fn with_context_lines(mut self, lines: usize) -> Self {
        self.context_lines = lines;
        self
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    /// Handle one artifact; `None` when it has nothing to write
    pub fn write(&self, artifact: &Artifact) -> Result<Option<Written>, WriteError> {
        let Some(output) = artifact.output() else {
            return Ok(None);
        };
        if output == artifact.source {
            return Ok(None);
        }

        let diff = match self.mode {
            WriteMode::Write => {
                std::fs::write(&artifact.path, &output).map_err(|source| WriteError::Io {
                    path: artifact.path.clone(),
                    source,
                })?;
                None
            }
            WriteMode::Diff => Some(unified_diff(
                &artifact.path,
                &artifact.source,
                &output,
                self.context_lines,
            )),
            WriteMode::Check => None,
        };

        Ok(Some(Written {
            path: artifact.path.clone(),
            diff,
        }))
    }

    /// Handle every artifact, collecting failures instead of stopping
    pub fn write_all<'a>(&self, artifacts: impl IntoIterator<Item = &'a Artifact>) -> WriteResult {
        let mut result = WriteResult::default();
        for artifact in artifacts {
            match self.write(artifact) {
                Ok(Some(written)) => {
                    if self.mode == WriteMode::Write {
                        result.files_written += 1;
                    }
                    result.files.push(written);
                }
                Ok(None) => {}
                Err(e) => result.errors.push(e),
            }
        }
        result
    }
}

/// Unified diff between the original and migrated text of `path`
pub fn unified_diff(path: &Path, original: &str, modified: &str, context_lines: usize) -> String {
    let name = path.display().to_string();
    TextDiff::from_lines(original, modified)
        .unified_diff()
        .context_radius(context_lines)
        .header(&format!("a/{}", name), &format!("b/{}", name))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ArtifactState;
    use crate::tree::ArtifactKind;
    use crate::lang::{Language, PropertiesLanguage};
    use std::fs;
    use tempfile::TempDir;

    fn transformed(path: &Path, source: &str, output: &str) -> Artifact {
        let mut artifact = Artifact::new(path, ArtifactKind::Properties, source);
        artifact.tree = Some(PropertiesLanguage::new().parse(output).unwrap());
        artifact.state = ArtifactState::Transformed;
        artifact
    }

    #[test]
    fn test_unified_diff() {
        let diff = unified_diff(Path::new("app.properties"), "a=1\nb=2\nc=3\n", "a=1\nb=20\nc=3\n", 3);
        assert!(diff.contains("--- a/app.properties"));
        assert!(diff.contains("+++ b/app.properties"));
        assert!(diff.contains("-b=2\n"));
        assert!(diff.contains("+b=20\n"));
        assert!(diff.contains("@@"));
    }

    #[test]
    fn test_write_mode_writes_changed_files() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.properties");
        fs::write(&path, "a=1\n").unwrap();

        let writer = Writer::new(WriteMode::Write);
        let result = writer.write_all([&transformed(&path, "a=1\n", "a=2\n")]);

        assert_eq!(result.files_written, 1);
        assert!(result.errors.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "a=2\n");
    }

    #[test]
    fn test_unchanged_files_are_never_written() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.properties");
        // the file on disk differs from the artifact source, so a write would show
        fs::write(&path, "on disk\n").unwrap();

        let writer = Writer::new(WriteMode::Write);
        let result = writer.write_all([&transformed(&path, "a=1\n", "a=1\n")]);

        assert_eq!(result.files_written, 0);
        assert!(result.files.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "on disk\n");
    }

    #[test]
    fn test_diff_and_check_modes_leave_disk_alone() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.properties");
        fs::write(&path, "a=1\n").unwrap();
        let artifact = transformed(&path, "a=1\n", "a=2\n");

        let diffs = Writer::new(WriteMode::Diff).write_all([&artifact]);
        assert_eq!(diffs.files_written, 0);
        assert!(diffs.format_diffs().contains("+a=2"));

        let check = Writer::new(WriteMode::Check).write_all([&artifact]);
        assert_eq!(check.files.len(), 1);
        assert!(check.files[0].diff.is_none());

        assert_eq!(fs::read_to_string(&path).unwrap(), "a=1\n");
    }

    #[test]
    fn test_failed_artifacts_are_skipped() {
        let artifact = Artifact::new("x.properties", ArtifactKind::Properties, "a=1\n");
        assert!(Writer::new(WriteMode::Write).write(&artifact).unwrap().is_none());
    }

    #[test]
    fn test_write_error_is_collected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing").join("app.properties");
        let result = Writer::new(WriteMode::Write).write_all([&transformed(&path, "a=1\n", "a=2\n")]);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.files_written, 0);
    }
}
