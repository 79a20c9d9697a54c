//! # obsidian2html
//!
//! Convert an Obsidian vault into a static tree of HTML pages.
//!
//! ## Why this crate?
//!
//! Obsidian notes are almost CommonMark, but not quite: front-matter blocks,
//! `[[wiki-links]]`, `#tags` and `> [!note]` callouts render as noise (or not
//! at all) in a stock Markdown renderer. This crate rewrites that dialect
//! into plain Markdown first, renders it with comrak, and mirrors the vault
//! layout on disk with every note turned into a standalone HTML page and
//! every attachment copied alongside.
//!
//! ## Pipeline Overview
//!
//! ```text
//! vault/
//!  │
//!  ├─ 1. Scan     walk the tree; .md files are notes, the rest are assets
//!  ├─ 2. Dialect  front-matter, links, tags, callouts → plain Markdown
//!  ├─ 3. Render   comrak (tables, hard breaks) + syntect code highlighting
//!  ├─ 4. Anchors  unique heading ids, optional [TOC]
//!  └─ 5. Output   HTML5 document per note, assets copied byte for byte
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use obsidian2html::{convert_tree, SiteConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SiteConfig::from_yaml_file("obs-blog.yaml")?.build()?;
//!     let report = convert_tree(&config).await?;
//!     eprintln!(
//!         "{} notes, {} assets, {} failed",
//!         report.stats.converted, report.stats.copied, report.stats.failed
//!     );
//!     Ok(())
//! }
//! ```
//!
//! Single notes don't need a runtime:
//!
//! ```rust
//! use obsidian2html::{convert_obsidian_to_html, wrap_document};
//!
//! let fragment = convert_obsidian_to_html("> [!tip] Remember\n> Drink water");
//! let page = wrap_document(&fragment, "Health");
//! assert!(page.contains(r#"<div class="callout callout-tip">"#));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `obs2html` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! obsidian2html = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{SiteConfig, SiteConfigBuilder, DEFAULT_CONFIG_FILE};
pub use convert::{
    convert_note, convert_note_to_file, convert_obsidian_to_html, convert_tree,
    convert_tree_sync, Converter,
};
pub use error::{FileError, Obs2HtmlError};
pub use output::{BatchReport, BatchStats, FileOutcome};
pub use pipeline::document::wrap_document;
pub use pipeline::input::{scan_tree, FileKind, Scan, SourceFile};
pub use pipeline::render::{MarkdownRenderer, RenderOptions};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{convert_stream, FileStream};
