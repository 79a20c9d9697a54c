//! Input resolution: turn the configured vault directory into a file list.
//!
//! The walk is done eagerly, before anything is written, so an output
//! directory created inside the vault never feeds back into the same run.
//! When the output root does live under the input root it is pruned from the
//! walk entirely so a second run doesn't convert the first run's output.

use crate::error::{FileError, Obs2HtmlError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// How a source file is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// A note: rendered to `.html`.
    Markdown,
    /// Anything else: copied byte for byte.
    Asset,
}

impl FileKind {
    /// Classify by extension; `.md` in any letter case is Markdown.
    pub fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("md") => FileKind::Markdown,
            _ => FileKind::Asset,
        }
    }
}

/// A file discovered under the input root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the input root.
    pub relative: PathBuf,
    pub kind: FileKind,
}

impl SourceFile {
    pub fn new(root: &Path, path: PathBuf) -> Self {
        let relative = path
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.clone());
        let kind = FileKind::of(&path);
        Self {
            path,
            relative,
            kind,
        }
    }

    /// Where this file lands under `output_root`.
    ///
    /// Notes swap their extension for `.html`; assets keep their name.
    pub fn destination(&self, output_root: &Path) -> PathBuf {
        match self.kind {
            FileKind::Markdown => output_root.join(self.relative.with_extension("html")),
            FileKind::Asset => output_root.join(&self.relative),
        }
    }

    /// Document title: the file name without its extension.
    pub fn title(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Result of walking the input tree.
#[derive(Debug, Default)]
pub struct Scan {
    /// Files sorted by relative path.
    pub files: Vec<SourceFile>,
    /// Entries the walk could not read; reported, never fatal.
    pub errors: Vec<FileError>,
}

/// Check the input root exists and is a directory.
pub fn validate_input_root(root: &Path) -> Result<(), Obs2HtmlError> {
    if !root.exists() {
        return Err(Obs2HtmlError::InputNotFound {
            path: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(Obs2HtmlError::InputNotADirectory {
            path: root.to_path_buf(),
        });
    }
    Ok(())
}

/// Walk `input_root` and list every regular file.
///
/// Entries under `output_root` are skipped. Symlinks are followed the way a
/// plain directory listing would see them.
pub fn scan_tree(input_root: &Path, output_root: &Path) -> Result<Scan, Obs2HtmlError> {
    validate_input_root(input_root)?;

    // Compare canonical forms so `./vault/site` and `vault/site` agree.
    let input_canon = input_root
        .canonicalize()
        .unwrap_or_else(|_| input_root.to_path_buf());
    let output_canon = output_root.canonicalize().ok();
    let prune = output_canon
        .as_ref()
        .filter(|out| out.starts_with(&input_canon) && *out != &input_canon);

    let mut scan = Scan::default();
    let walker = WalkDir::new(input_root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| {
            let Some(out) = prune else { return true };
            entry
                .path()
                .canonicalize()
                .map(|p| p != *out)
                .unwrap_or(true)
        });

    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                scan.files
                    .push(SourceFile::new(input_root, entry.into_path()));
            }
            Ok(_) => {}
            Err(e) => {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| input_root.to_path_buf());
                warn!("Skipping unreadable entry {}: {}", path.display(), e);
                scan.errors.push(FileError::ScanFailed {
                    path,
                    detail: e.to_string(),
                });
            }
        }
    }

    scan.files.sort_by(|a, b| a.relative.cmp(&b.relative));
    debug!(
        "Scanned {}: {} files ({} notes), {} unreadable entries",
        input_root.display(),
        scan.files.len(),
        scan.files
            .iter()
            .filter(|f| f.kind == FileKind::Markdown)
            .count(),
        scan.errors.len()
    );
    Ok(scan)
}
