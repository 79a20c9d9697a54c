//! Error types for the obsidian2html library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Obs2HtmlError`]: **Fatal**: the run cannot proceed at all (config
//!   file missing or malformed, input directory absent, output root not
//!   creatable). Returned as `Err(Obs2HtmlError)` from the top-level
//!   `convert*` functions before any file is touched.
//!
//! * [`FileError`]: **Non-fatal**: a single file could not be read, written
//!   or copied. Stored inside [`crate::output::FileOutcome`] so one bad note
//!   never costs the rest of the vault.
//!
//! Malformed Obsidian syntax is neither: the dialect passes never fail, they
//! leave unmatched text alone.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the obsidian2html library.
///
/// Per-file failures use [`FileError`] and are stored in
/// [`crate::output::FileOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Obs2HtmlError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// The configuration file does not exist.
    #[error("Configuration file '{path}' not found\nCreate it or pass --input and --output.")]
    ConfigNotFound { path: PathBuf },

    /// The configuration file exists but is not valid YAML for this tool.
    #[error("Error parsing configuration '{path}': {detail}")]
    ConfigParse { path: PathBuf, detail: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// The configured input directory does not exist.
    #[error("Input directory '{path}' does not exist")]
    InputNotFound { path: PathBuf },

    /// The configured input path exists but is a file.
    #[error("Input path '{path}' is not a directory")]
    InputNotADirectory { path: PathBuf },

    /// A single note passed on the command line could not be read.
    #[error("Failed to read note '{path}': {source}")]
    NoteReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The output root could not be created.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write a single-note output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Some files converted but at least one failed.
    ///
    /// Returned by [`crate::output::BatchReport::into_result`] when the
    /// caller wants to treat any per-file failure as an error.
    #[error("{failed}/{total} files failed during conversion")]
    PartialFailure {
        success: usize,
        failed: usize,
        total: usize,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single file of the batch.
///
/// The overall run continues; the error is reported through
/// [`crate::output::FileOutcome::error`] and the progress callback.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum FileError {
    /// The source file could not be read.
    #[error("{path}: read failed: {detail}")]
    ReadFailed { path: PathBuf, detail: String },

    /// A `.md` file is not valid UTF-8.
    #[error("{path}: note is not valid UTF-8")]
    NotUtf8 { path: PathBuf },

    /// The converted HTML could not be written.
    #[error("{path}: write failed: {detail}")]
    WriteFailed { path: PathBuf, detail: String },

    /// An asset could not be copied.
    #[error("{path}: copy failed: {detail}")]
    CopyFailed { path: PathBuf, detail: String },

    /// The directory walk could not descend into an entry.
    #[error("{path}: scan failed: {detail}")]
    ScanFailed { path: PathBuf, detail: String },

    /// The conversion task panicked or was cancelled.
    #[error("{path}: conversion aborted: {detail}")]
    ConversionAborted { path: PathBuf, detail: String },
}

impl FileError {
    /// The file this error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            FileError::ReadFailed { path, .. }
            | FileError::NotUtf8 { path }
            | FileError::WriteFailed { path, .. }
            | FileError::CopyFailed { path, .. }
            | FileError::ScanFailed { path, .. }
            | FileError::ConversionAborted { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_failure_display() {
        let e = Obs2HtmlError::PartialFailure {
            success: 9,
            failed: 1,
            total: 10,
        };
        let msg = e.to_string();
        assert!(msg.contains("1/10"), "got: {msg}");
    }

    #[test]
    fn config_not_found_mentions_path() {
        let e = Obs2HtmlError::ConfigNotFound {
            path: PathBuf::from("obs-blog.yaml"),
        };
        assert!(e.to_string().contains("obs-blog.yaml"));
    }

    #[test]
    fn file_error_reports_its_path() {
        let e = FileError::NotUtf8 {
            path: PathBuf::from("notes/bad.md"),
        };
        assert_eq!(e.path(), std::path::Path::new("notes/bad.md"));
        assert!(e.to_string().contains("UTF-8"));
    }

    #[test]
    fn file_error_serialises() {
        let e = FileError::CopyFailed {
            path: PathBuf::from("img.png"),
            detail: "disk full".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("CopyFailed"), "got: {json}");
        assert!(json.contains("disk full"));
    }
}
