//! Eager conversion entry points.
//!
//! ## Why eager vs. streaming?
//!
//! This module provides the simpler API: wait for every file, then return.
//! [`convert_tree`] collects every [`FileOutcome`] into a sorted
//! [`BatchReport`] before returning. Use [`crate::stream::convert_stream`]
//! instead when you want outcomes as they happen.
//!
//! The single-note functions ([`Converter`], [`convert_obsidian_to_html`],
//! [`convert_note`]) never touch the batch machinery.

use crate::config::SiteConfig;
use crate::error::Obs2HtmlError;
use crate::output::{BatchReport, BatchStats, FileOutcome};
use crate::pipeline::document::wrap_document;
use crate::pipeline::render::{Highlighter, MarkdownRenderer, RenderOptions};
use crate::pipeline::dialect;
use crate::stream::convert_stream;
use futures::StreamExt;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Converts one note at a time with a fixed set of options.
///
/// A `Converter` owns its renderer and is meant to be used from one thread;
/// create one per worker. Anchor state is cleared at the end of every
/// [`convert`](Self::convert), so converting the same note twice gives the
/// same output.
#[derive(Debug)]
pub struct Converter {
    renderer: MarkdownRenderer,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

impl Converter {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            renderer: MarkdownRenderer::new(options),
        }
    }

    /// Create a converter that reuses an already loaded highlighter.
    pub fn with_highlighter(options: RenderOptions, highlighter: Option<Highlighter>) -> Self {
        Self {
            renderer: MarkdownRenderer::with_highlighter(options, highlighter),
        }
    }

    pub fn options(&self) -> &RenderOptions {
        self.renderer.options()
    }

    /// Convert a raw Obsidian note to an HTML fragment.
    pub fn convert(&mut self, raw: &str) -> String {
        // ── Step 1: Obsidian syntax → Markdown (+ rendered callouts) ────────
        let pre = dialect::preprocess(raw, &mut self.renderer);

        // ── Step 2: Markdown → HTML ─────────────────────────────────────────
        let html = self.renderer.render(&pre.markdown);

        // ── Step 3: Callouts back in, then the TOC ──────────────────────────
        let html = pre.restore(&html);
        let html = self.renderer.insert_toc(&html);

        debug!(
            "Converted note: {} bytes → {} bytes, {} headings",
            raw.len(),
            html.len(),
            self.renderer.anchors().len()
        );

        self.renderer.reset();
        html
    }

    /// Convert a raw note and wrap it in a standalone HTML5 document.
    pub fn convert_document(&mut self, raw: &str, title: &str) -> String {
        let fragment = self.convert(raw);
        wrap_document(&fragment, title)
    }
}

/// Convert a raw Obsidian note to an HTML fragment with default options.
///
/// # Example
/// ```rust
/// use obsidian2html::convert_obsidian_to_html;
///
/// let html = convert_obsidian_to_html("---\ntags: [x]\n---\nSee [[Other Note|this]] #idea");
/// assert_eq!(html, "<p>See this idea</p>\n");
/// ```
pub fn convert_obsidian_to_html(raw: &str) -> String {
    Converter::default().convert(raw)
}

/// Read one note from disk and return the full HTML document.
///
/// The document title is the file name without its extension.
pub async fn convert_note(
    input: impl AsRef<Path>,
    options: &RenderOptions,
) -> Result<String, Obs2HtmlError> {
    let input = input.as_ref();
    let raw = tokio::fs::read_to_string(input)
        .await
        .map_err(|e| Obs2HtmlError::NoteReadFailed {
            path: input.to_path_buf(),
            source: e,
        })?;

    let title = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let options = options.clone();

    tokio::task::spawn_blocking(move || Converter::new(options).convert_document(&raw, &title))
        .await
        .map_err(|e| Obs2HtmlError::Internal(format!("Conversion task failed: {}", e)))
}

/// Convert one note and write the document to `output`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
/// Returns the number of bytes written.
pub async fn convert_note_to_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &RenderOptions,
) -> Result<u64, Obs2HtmlError> {
    let html = convert_note(input, options).await?;
    let path = output.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Obs2HtmlError::OutputCreateFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("html.tmp");
    tokio::fs::write(&tmp_path, &html)
        .await
        .map_err(|e| Obs2HtmlError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(Obs2HtmlError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        });
    }

    Ok(html.len() as u64)
}

/// Convert a whole vault.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(BatchReport)` once every file has been attempted, even if some
/// failed (check `report.stats.failed`, or call
/// [`BatchReport::into_result`]).
///
/// # Errors
/// Returns `Err(Obs2HtmlError)` only for fatal errors:
/// - Input directory missing or not a directory
/// - Output directory cannot be created
pub async fn convert_tree(config: &SiteConfig) -> Result<BatchReport, Obs2HtmlError> {
    let total_start = Instant::now();
    info!(
        "Starting conversion: {} → {}",
        config.input.display(),
        config.output.display()
    );

    let stream = convert_stream(config).await?;
    let mut files: Vec<FileOutcome> = stream.collect().await;

    // Outcomes arrive in completion order.
    files.sort_by(|a, b| a.relative.cmp(&b.relative));

    let stats = BatchStats::from_outcomes(&files, total_start.elapsed().as_millis() as u64);
    info!(
        "Conversion complete: {} notes, {} assets, {} failed, {}ms total",
        stats.converted, stats.copied, stats.failed, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(stats.total_files, stats.succeeded());
    }

    Ok(BatchReport {
        input: config.input.clone(),
        output: config.output.clone(),
        files,
        stats,
    })
}

/// Synchronous wrapper around [`convert_tree`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_tree_sync(config: &SiteConfig) -> Result<BatchReport, Obs2HtmlError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Obs2HtmlError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_tree(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> Converter {
        Converter::new(RenderOptions {
            syntax_highlighting: false,
            ..RenderOptions::default()
        })
    }

    #[test]
    fn frontmatter_removed() {
        assert_eq!(plain().convert("---\nkey: value\n---\nBody"), "<p>Body</p>\n");
    }

    #[test]
    fn links_and_tags_flattened() {
        let html = plain().convert("[[Note A]], [[Note B|shown]], [text](http://x) #project");
        assert_eq!(html, "<p>Note A, shown, text project</p>\n");
    }

    #[test]
    fn warning_callout_with_title() {
        let html = plain().convert("> [!warning] Careful\n> Body text");
        assert!(html.contains(r#"<div class="callout callout-warning">"#), "got: {html}");
        assert!(html.contains(r#"<div class="callout-title">Careful</div>"#));
        assert!(html.contains(r#"<div class="callout-content"><p>Body text</p>"#));
        assert!(!html.contains("<blockquote>"));
    }

    #[test]
    fn note_callout_without_title() {
        let html = plain().convert("> [!note]\n> text");
        assert!(html.contains(r#"<div class="callout callout-note">"#), "got: {html}");
        assert!(!html.contains("callout-title"));
        assert!(html.contains("<p>text</p>"));
    }

    #[test]
    fn callout_between_paragraphs() {
        let html = plain().convert("Before\n\n> [!tip] Hint\n> one\n>\n> two\n\nAfter");
        let before = html.find("<p>Before</p>").expect("before");
        let callout = html.find("callout-tip").expect("callout");
        let after = html.find("<p>After</p>").expect("after");
        assert!(before < callout && callout < after, "got: {html}");
        assert!(html.contains("<p>one</p>") && html.contains("<p>two</p>"));
        assert!(!html.contains("obsidian-callout"), "placeholder leaked: {html}");
    }

    #[test]
    fn callout_syntax_in_fence_stays_code() {
        let html = plain().convert("```markdown\n> [!note] Example\n> body\n```\n");
        assert!(html.contains("&gt; [!note] Example\n&gt; body\n"), "got: {html}");
        assert!(!html.contains("obsidian-callout"), "placeholder leaked: {html}");
        assert!(!html.contains("callout-note"));
    }

    #[test]
    fn code_indented_callout_stays_code() {
        let html = plain().convert("    > [!note] x\n    > y\n");
        assert!(html.contains("<pre><code>&gt; [!note] x\n&gt; y\n</code></pre>"), "got: {html}");
        assert!(!html.contains("obsidian-callout"), "placeholder leaked: {html}");
    }

    #[test]
    fn authored_placeholder_comment_not_replaced() {
        for comment in ["<!--obsidian-callout-0-->", "<!--obsidian-callout-0-0-->"] {
            let html = plain().convert(&format!("{comment}\n\n> [!tip] T\n> b\n"));
            assert_eq!(html.matches("callout-tip").count(), 1, "got: {html}");
            assert!(html.contains(comment), "got: {html}");
        }
    }

    #[test]
    fn callout_title_escaped() {
        let html = plain().convert("> [!info] <b>bold</b>\n> x");
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt;"), "got: {html}");
    }

    #[test]
    fn plain_markdown_unchanged_by_dialect() {
        let md = "# Title\n\nSome *emphasis* and `code`.\n\n- one\n- two\n";
        let html = plain().convert(md);
        assert!(html.contains(r#"<h1 id="title">Title</h1>"#), "got: {html}");
        assert!(html.contains("<em>emphasis</em>"));
        assert!(html.contains("<code>code</code>"));
        assert!(html.contains("<li>two</li>"));
    }

    #[test]
    fn same_note_twice_is_identical() {
        let note = "# Intro\n\n> [!note] Intro\n> ## Intro\n\n## Intro";
        let mut c = plain();
        let first = c.convert(note);
        let second = c.convert(note);
        assert_eq!(first, second);
        assert!(first.contains(r#"id="intro_1""#), "got: {first}");
    }

    #[test]
    fn toc_lists_headings() {
        let html = plain().convert("[TOC]\n\n# Alpha\n\n## Beta\n\n# Gamma");
        assert!(html.starts_with(r#"<div class="toc">"#), "got: {html}");
        assert!(html.contains(r##"<a href="#beta">Beta</a>"##));
        assert!(html.contains(r#"<h1 id="gamma">Gamma</h1>"#));
    }

    #[test]
    fn custom_toc_marker() {
        let mut c = Converter::new(RenderOptions {
            syntax_highlighting: false,
            toc_marker: "{{toc}}".into(),
            ..RenderOptions::default()
        });
        let html = c.convert("{{toc}}\n\n# Alpha");
        assert!(html.contains(r##"<a href="#alpha">Alpha</a>"##), "got: {html}");
    }

    #[test]
    fn unicode_survives() {
        let html = plain().convert_document("Emoji 🎉 and café", "Ünïcödé");
        assert!(html.contains("<title>Ünïcödé</title>"));
        assert!(html.contains("Emoji 🎉 and café"));
    }

    #[test]
    fn document_wraps_fragment() {
        let html = plain().convert_document("Body", "");
        assert!(html.starts_with("<!DOCTYPE html>"), "got: {html}");
        assert!(html.contains("<title>Document</title>"));
        assert!(html.contains("<p>Body</p>"));
    }

    #[test]
    fn free_function_uses_defaults() {
        assert_eq!(convert_obsidian_to_html("Hello #world"), "<p>Hello world</p>\n");
    }
}
