//! Progress-callback trait for per-file conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::SiteConfigBuilder::progress_callback`] to receive events
//! as the batch processes each file.
//!
//! # Example
//!
//! ```rust
//! use obsidian2html::{ConversionProgressCallback, FileKind, SiteConfig};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     notes: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, path: &Path, kind: FileKind, bytes: u64) {
//!         if kind == FileKind::Markdown {
//!             self.notes.fetch_add(1, Ordering::SeqCst);
//!         }
//!         eprintln!("{} ({} bytes)", path.display(), bytes);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { notes: AtomicUsize::new(0) });
//!
//! let config = SiteConfig::builder()
//!     .input("vault")
//!     .output("site")
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::pipeline::input::FileKind;
use std::path::Path;
use std::sync::Arc;

/// Called by the batch as it processes each file.
///
/// Files are processed concurrently, so `on_file_start`, `on_file_complete`
/// and `on_file_error` may be called from different threads at once.
/// Implementations must protect shared mutable state (e.g. `Mutex`,
/// `AtomicUsize`). All methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after the scan, before any file is processed.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called before a file is read.
    ///
    /// `path` is relative to the input root; `index` is the 1-based position
    /// of the file in scan order.
    fn on_file_start(&self, path: &Path, index: usize, total_files: usize) {
        let _ = (path, index, total_files);
    }

    /// Called when a note was written or an asset copied.
    fn on_file_complete(&self, path: &Path, kind: FileKind, bytes_written: u64) {
        let _ = (path, kind, bytes_written);
    }

    /// Called when a file was skipped because of an error.
    ///
    /// For entries the directory walk could not read, `path` is the full
    /// path reported by the walk.
    ///
    /// `error` is owned so implementations can move it into a spawned task.
    fn on_file_error(&self, path: &Path, error: String) {
        let _ = (path, error);
    }

    /// Called once after every file has been attempted.
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::SiteConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
