//! Result types for a vault conversion.

use crate::error::{FileError, Obs2HtmlError};
use crate::pipeline::input::{FileKind, SourceFile};
use serde::Serialize;
use std::path::PathBuf;

/// What happened to one source file.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub source: PathBuf,
    /// Path relative to the input root.
    pub relative: PathBuf,
    pub destination: PathBuf,
    pub kind: FileKind,
    /// Bytes written to `destination`; 0 on failure.
    pub bytes_written: u64,
    pub error: Option<FileError>,
}

impl FileOutcome {
    pub fn success(file: &SourceFile, destination: PathBuf, bytes_written: u64) -> Self {
        Self {
            source: file.path.clone(),
            relative: file.relative.clone(),
            destination,
            kind: file.kind,
            bytes_written,
            error: None,
        }
    }

    pub fn failure(file: &SourceFile, destination: PathBuf, error: FileError) -> Self {
        Self {
            source: file.path.clone(),
            relative: file.relative.clone(),
            destination,
            kind: file.kind,
            bytes_written: 0,
            error: Some(error),
        }
    }

    /// An entry the directory walk could not read.
    pub fn scan_failure(error: FileError) -> Self {
        let source = error.path().to_path_buf();
        Self {
            relative: source.clone(),
            destination: PathBuf::new(),
            source,
            kind: FileKind::Asset,
            bytes_written: 0,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate counters for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    /// Files discovered, plus entries the walk failed on.
    pub total_files: usize,
    /// Notes rendered to HTML.
    pub converted: usize,
    /// Assets copied.
    pub copied: usize,
    pub failed: usize,
    pub total_duration_ms: u64,
}

impl BatchStats {
    pub fn from_outcomes(outcomes: &[FileOutcome], total_duration_ms: u64) -> Self {
        let mut stats = BatchStats {
            total_files: outcomes.len(),
            total_duration_ms,
            ..Default::default()
        };
        for o in outcomes {
            match (&o.error, o.kind) {
                (Some(_), _) => stats.failed += 1,
                (None, FileKind::Markdown) => stats.converted += 1,
                (None, FileKind::Asset) => stats.copied += 1,
            }
        }
        stats
    }

    pub fn succeeded(&self) -> usize {
        self.converted + self.copied
    }
}

/// Everything a vault conversion produced.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub input: PathBuf,
    pub output: PathBuf,
    /// One entry per file, sorted by relative path.
    pub files: Vec<FileOutcome>,
    pub stats: BatchStats,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| !f.is_ok())
    }

    /// Turn any per-file failure into [`Obs2HtmlError::PartialFailure`].
    pub fn into_result(self) -> Result<Self, Obs2HtmlError> {
        if self.stats.failed > 0 {
            Err(Obs2HtmlError::PartialFailure {
                success: self.stats.succeeded(),
                failed: self.stats.failed,
                total: self.stats.total_files,
            })
        } else {
            Ok(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn source(rel: &str) -> SourceFile {
        SourceFile::new(Path::new("/v"), Path::new("/v").join(rel))
    }

    fn outcomes() -> Vec<FileOutcome> {
        vec![
            FileOutcome::success(&source("a.md"), "/o/a.html".into(), 10),
            FileOutcome::success(&source("b.png"), "/o/b.png".into(), 3),
            FileOutcome::failure(
                &source("c.md"),
                "/o/c.html".into(),
                FileError::NotUtf8 { path: "/v/c.md".into() },
            ),
        ]
    }

    #[test]
    fn stats_count_by_kind() {
        let stats = BatchStats::from_outcomes(&outcomes(), 5);
        assert_eq!(stats.total_files, 3);
        assert_eq!(stats.converted, 1);
        assert_eq!(stats.copied, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.succeeded(), 2);
    }

    #[test]
    fn into_result_reports_partial_failure() {
        let files = outcomes();
        let report = BatchReport {
            input: "/v".into(),
            output: "/o".into(),
            stats: BatchStats::from_outcomes(&files, 0),
            files,
        };
        assert_eq!(report.failures().count(), 1);
        match report.into_result() {
            Err(Obs2HtmlError::PartialFailure { success, failed, total }) => {
                assert_eq!((success, failed, total), (2, 1, 3));
            }
            other => panic!("expected PartialFailure, got {other:?}"),
        }
    }

    #[test]
    fn scan_failure_keeps_path() {
        let o = FileOutcome::scan_failure(FileError::ScanFailed {
            path: "/v/locked".into(),
            detail: "permission denied".into(),
        });
        assert_eq!(o.source, PathBuf::from("/v/locked"));
        assert!(!o.is_ok());
    }

    #[test]
    fn report_serialises() {
        let files = outcomes();
        let report = BatchReport {
            input: "/v".into(),
            output: "/o".into(),
            stats: BatchStats::from_outcomes(&files, 0),
            files,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"kind\":\"markdown\""), "got: {json}");
        assert!(json.contains("NotUtf8"));
    }
}
