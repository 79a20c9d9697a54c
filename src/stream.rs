//! Streaming conversion API: emit file outcomes as they complete.
//!
//! ## Why stream?
//!
//! A large vault holds thousands of notes and attachments. A stream-based
//! API lets callers wire up progress bars or react to failures as they
//! happen instead of waiting for the whole tree.
//!
//! Unlike the eager [`crate::convert::convert_tree`], which returns only
//! after every file is done, [`convert_stream`] yields [`FileOutcome`] items
//! as each file finishes. Files are processed concurrently, so outcomes
//! arrive out of order (sort by `relative` if order matters).

use crate::config::SiteConfig;
use crate::convert::Converter;
use crate::error::{FileError, Obs2HtmlError};
use crate::output::FileOutcome;
use crate::pipeline::input::{self, FileKind, SourceFile};
use crate::pipeline::render::{Highlighter, RenderOptions};
use crate::progress::ProgressCallback;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::{debug, info, warn};

/// A boxed stream of file outcomes.
pub type FileStream = Pin<Box<dyn Stream<Item = FileOutcome> + Send>>;

/// Everything a file task needs, shared between all of them.
struct BatchContext {
    output: PathBuf,
    render: RenderOptions,
    highlighter: Option<Highlighter>,
    progress: Option<ProgressCallback>,
    total: usize,
}

/// Convert a vault, streaming outcomes as they are ready.
///
/// Entries the directory walk could not read come first, then files in
/// completion order. `on_batch_start` fires before this returns;
/// `on_batch_complete` is left to the caller, which alone knows when the
/// stream has been drained.
///
/// # Returns
/// - `Ok(FileStream)`: one [`FileOutcome`] per file
/// - `Err(Obs2HtmlError)`: fatal error (input missing, output not creatable)
pub async fn convert_stream(config: &SiteConfig) -> Result<FileStream, Obs2HtmlError> {
    info!("Starting streaming conversion: {}", config.input.display());

    // ── Validate input ───────────────────────────────────────────────────
    input::validate_input_root(&config.input)?;

    // ── Create output root ───────────────────────────────────────────────
    // Before the scan, so the walk can recognise (and skip) an output
    // directory that lives inside the vault.
    tokio::fs::create_dir_all(&config.output)
        .await
        .map_err(|e| Obs2HtmlError::OutputCreateFailed {
            path: config.output.clone(),
            source: e,
        })?;

    // ── Scan the tree ────────────────────────────────────────────────────
    let (input_root, output_root) = (config.input.clone(), config.output.clone());
    let scan = tokio::task::spawn_blocking(move || input::scan_tree(&input_root, &output_root))
        .await
        .map_err(|e| Obs2HtmlError::Internal(format!("Scan task failed: {}", e)))??;

    let total = scan.files.len() + scan.errors.len();
    info!(
        "Found {} files ({} unreadable entries)",
        scan.files.len(),
        scan.errors.len()
    );

    // ── Load the highlighter once for the whole batch ────────────────────
    let render = config.render.clone();
    let highlighter = if render.syntax_highlighting {
        let theme = render.highlight_theme.clone();
        tokio::task::spawn_blocking(move || crate::pipeline::render::load_highlighter(&theme))
            .await
            .map(Some)
            .map_err(|e| Obs2HtmlError::Internal(format!("Highlighter load failed: {}", e)))?
    } else {
        None
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let ctx = Arc::new(BatchContext {
        output: config.output.clone(),
        render,
        highlighter,
        progress: config.progress_callback.clone(),
        total,
    });

    // ── Build the stream ─────────────────────────────────────────────────
    let scan_ctx = Arc::clone(&ctx);
    let scan_failures = stream::iter(scan.errors).map(move |err| {
        if let Some(ref cb) = scan_ctx.progress {
            cb.on_file_error(err.path(), err.to_string());
        }
        FileOutcome::scan_failure(err)
    });

    let files = stream::iter(scan.files.into_iter().enumerate().map(move |(i, file)| {
        let ctx = Arc::clone(&ctx);
        async move { process_file(ctx, file, i + 1).await }
    }))
    .buffer_unordered(config.concurrency);

    Ok(Box::pin(scan_failures.chain(files)))
}

/// Convert or copy one file, reporting progress either way.
async fn process_file(ctx: Arc<BatchContext>, file: SourceFile, index: usize) -> FileOutcome {
    if let Some(ref cb) = ctx.progress {
        cb.on_file_start(&file.relative, index, ctx.total);
    }

    let destination = file.destination(&ctx.output);
    let result = match file.kind {
        FileKind::Markdown => convert_file(&ctx, &file, &destination).await,
        FileKind::Asset => copy_file(&file, &destination).await,
    };

    match result {
        Ok(bytes) => {
            debug!(
                "{} → {} ({} bytes)",
                file.relative.display(),
                destination.display(),
                bytes
            );
            if let Some(ref cb) = ctx.progress {
                cb.on_file_complete(&file.relative, file.kind, bytes);
            }
            FileOutcome::success(&file, destination, bytes)
        }
        Err(e) => {
            warn!("Skipping {}: {}", file.relative.display(), e);
            if let Some(ref cb) = ctx.progress {
                cb.on_file_error(&file.relative, e.to_string());
            }
            FileOutcome::failure(&file, destination, e)
        }
    }
}

/// Render a note to `destination`; returns the bytes written.
async fn convert_file(
    ctx: &BatchContext,
    file: &SourceFile,
    destination: &Path,
) -> Result<u64, FileError> {
    let bytes = tokio::fs::read(&file.path)
        .await
        .map_err(|e| FileError::ReadFailed {
            path: file.path.clone(),
            detail: e.to_string(),
        })?;
    let raw = String::from_utf8(bytes).map_err(|_| FileError::NotUtf8 {
        path: file.path.clone(),
    })?;

    // Conversion is CPU-bound; keep it off the async workers. Each task gets
    // its own Converter, only the highlighter tables are shared.
    let options = ctx.render.clone();
    let highlighter = ctx.highlighter.clone();
    let title = file.title();
    let html = tokio::task::spawn_blocking(move || {
        Converter::with_highlighter(options, highlighter).convert_document(&raw, &title)
    })
    .await
    .map_err(|e| FileError::ConversionAborted {
        path: file.path.clone(),
        detail: e.to_string(),
    })?;

    let write_failed = |e: std::io::Error| FileError::WriteFailed {
        path: destination.to_path_buf(),
        detail: e.to_string(),
    };
    ensure_parent(destination).await.map_err(write_failed)?;

    // Atomic write: an interrupted run never leaves a truncated page.
    let tmp_path = destination.with_extension("html.tmp");
    tokio::fs::write(&tmp_path, html.as_bytes())
        .await
        .map_err(write_failed)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, destination).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_failed(e));
    }

    Ok(html.len() as u64)
}

/// Copy an asset byte for byte; returns the bytes copied.
async fn copy_file(file: &SourceFile, destination: &Path) -> Result<u64, FileError> {
    let copy_failed = |e: std::io::Error| FileError::CopyFailed {
        path: file.path.clone(),
        detail: e.to_string(),
    };
    ensure_parent(destination).await.map_err(copy_failed)?;
    tokio::fs::copy(&file.path, destination)
        .await
        .map_err(copy_failed)
}

async fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) => tokio::fs::create_dir_all(parent).await,
        None => Ok(()),
    }
}
