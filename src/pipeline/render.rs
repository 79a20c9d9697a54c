//! Markdown rendering: preprocessed Markdown → HTML fragment.
//!
//! ## Why a stateful renderer?
//!
//! Heading ids must be unique across one note, and one note is rendered in
//! several calls (every callout body, then the document). The
//! [`AnchorRegistry`] that remembers which ids are taken therefore lives in
//! the renderer and survives between those calls. It must not survive into
//! the next note, so the top-level conversion calls [`MarkdownRenderer::reset`]
//! at exactly one point, after the note is finished.
//!
//! The syntect tables behind code highlighting are large and read-only.
//! They are loaded once and shared via [`Highlighter`]; only the anchor
//! registry is per renderer.

use crate::pipeline::anchors::{self, AnchorRegistry};
use comrak::plugins::syntect::SyntectAdapter;
use comrak::{markdown_to_html_with_plugins, Options, Plugins};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use syntect::highlighting::ThemeSet;
use tracing::debug;

/// Theme used when none is configured.
pub const DEFAULT_THEME: &str = "base16-ocean.dark";

/// Default table-of-contents marker.
pub const DEFAULT_TOC_MARKER: &str = "[TOC]";

/// Names of the themes bundled with syntect's default theme set, sorted.
pub static BUNDLED_THEMES: Lazy<Vec<String>> =
    Lazy::new(|| ThemeSet::load_defaults().themes.into_keys().collect());

/// True when `theme` is one of [`BUNDLED_THEMES`].
pub fn is_bundled_theme(theme: &str) -> bool {
    BUNDLED_THEMES.iter().any(|t| t == theme)
}

/// Shared, read-only code highlighter.
pub type Highlighter = Arc<SyntectAdapter>;

static DEFAULT_HIGHLIGHTER: Lazy<Highlighter> =
    Lazy::new(|| Arc::new(SyntectAdapter::new(Some(DEFAULT_THEME))));

/// Load the syntax and theme sets for `theme`.
///
/// The default theme is loaded once per process and shared.
pub fn load_highlighter(theme: &str) -> Highlighter {
    if theme == DEFAULT_THEME {
        Arc::clone(&DEFAULT_HIGHLIGHTER)
    } else {
        debug!("Loading syntax highlighter with theme '{}'", theme);
        Arc::new(SyntectAdapter::new(Some(theme)))
    }
}

/// Anything that can turn a Markdown fragment into HTML.
///
/// The callout pass takes this instead of a concrete renderer so callout
/// bodies go through the same rendering as the rest of the note.
pub trait RenderFragment {
    fn render_fragment(&mut self, markdown: &str) -> String;
}

/// Rendering knobs shared by every note of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Highlight fenced code blocks with syntect. Default: true.
    pub syntax_highlighting: bool,

    /// syntect theme name, one of [`BUNDLED_THEMES`]. Default: `base16-ocean.dark`.
    pub highlight_theme: String,

    /// Render a single newline inside a paragraph as `<br />`. Default: true.
    ///
    /// Obsidian displays notes this way, and authors write them accordingly.
    pub hard_breaks: bool,

    /// Paragraph text replaced by the table of contents. Default: `[TOC]`.
    pub toc_marker: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            syntax_highlighting: true,
            highlight_theme: DEFAULT_THEME.to_string(),
            hard_breaks: true,
            toc_marker: DEFAULT_TOC_MARKER.to_string(),
        }
    }
}

impl RenderOptions {
    /// Load the highlighter these options ask for, if any.
    pub fn highlighter(&self) -> Option<Highlighter> {
        self.syntax_highlighting
            .then(|| load_highlighter(&self.highlight_theme))
    }
}

/// comrak-backed renderer with per-note anchor state.
pub struct MarkdownRenderer {
    options: RenderOptions,
    highlighter: Option<Highlighter>,
    anchors: AnchorRegistry,
}

impl fmt::Debug for MarkdownRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkdownRenderer")
            .field("options", &self.options)
            .field("highlighter", &self.highlighter.as_ref().map(|_| "<syntect>"))
            .field("anchors", &self.anchors.len())
            .finish()
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

impl MarkdownRenderer {
    /// Create a renderer, loading its highlighter from `options`.
    pub fn new(options: RenderOptions) -> Self {
        let highlighter = options.highlighter();
        Self::with_highlighter(options, highlighter)
    }

    /// Create a renderer that reuses an already loaded highlighter.
    pub fn with_highlighter(options: RenderOptions, highlighter: Option<Highlighter>) -> Self {
        Self {
            options,
            highlighter,
            anchors: AnchorRegistry::new(),
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Heading ids handed out since the last [`reset`](Self::reset).
    pub fn anchors(&self) -> &AnchorRegistry {
        &self.anchors
    }

    /// Render Markdown to an HTML fragment and give its headings ids.
    pub fn render(&mut self, markdown: &str) -> String {
        let options = self.comrak_options();
        let mut plugins = Plugins::default();
        if let Some(adapter) = self.highlighter.as_deref() {
            plugins.render.codefence_syntax_highlighter = Some(adapter);
        }

        let html = markdown_to_html_with_plugins(markdown, &options, &plugins);
        anchors::assign_heading_ids(&html, &mut self.anchors)
    }

    /// Replace the TOC marker paragraph, if present, with the heading list.
    pub fn insert_toc(&self, html: &str) -> String {
        anchors::insert_toc(html, &self.options.toc_marker)
    }

    /// Forget every heading id handed out so far.
    pub fn reset(&mut self) {
        self.anchors.clear();
    }

    fn comrak_options(&self) -> Options<'static> {
        let mut options = Options::default();
        options.extension.table = true;
        options.render.hardbreaks = self.options.hard_breaks;
        // Callout placeholders and authored HTML must reach the output.
        options.render.unsafe_ = true;
        options
    }
}

impl RenderFragment for MarkdownRenderer {
    fn render_fragment(&mut self, markdown: &str) -> String {
        self.render(markdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> MarkdownRenderer {
        MarkdownRenderer::new(RenderOptions {
            syntax_highlighting: false,
            ..RenderOptions::default()
        })
    }

    #[test]
    fn paragraph() {
        assert_eq!(plain().render("Body text"), "<p>Body text</p>\n");
    }

    #[test]
    fn soft_breaks_become_br() {
        let html = plain().render("line one\nline two");
        assert!(html.contains("line one<br />"), "got: {html}");
    }

    #[test]
    fn soft_breaks_kept_when_disabled() {
        let mut r = MarkdownRenderer::new(RenderOptions {
            syntax_highlighting: false,
            hard_breaks: false,
            ..RenderOptions::default()
        });
        assert!(!r.render("a\nb").contains("<br"));
    }

    #[test]
    fn tables() {
        let html = plain().render("| A | B |\n| --- | --- |\n| 1 | 2 |");
        assert!(html.contains("<table>"), "got: {html}");
        assert!(html.contains("<th>A</th>"));
        assert!(html.contains("<td>2</td>"));
    }

    #[test]
    fn headings_get_ids() {
        let mut r = plain();
        let html = r.render("# Getting Started\n\n## Getting Started");
        assert!(html.contains(r#"<h1 id="getting-started">Getting Started</h1>"#), "got: {html}");
        assert!(html.contains(r#"<h2 id="getting-started_1">Getting Started</h2>"#));
    }

    #[test]
    fn anchors_persist_across_fragments_until_reset() {
        let mut r = plain();
        r.render("# Intro");
        assert!(r.render("# Intro").contains(r#"id="intro_1""#));
        assert_eq!(r.anchors().len(), 2);

        r.reset();
        assert!(r.anchors().is_empty());
        assert!(r.render("# Intro").contains(r#"id="intro""#));
    }

    #[test]
    fn raw_html_passes_through() {
        let html = plain().render("<!--obsidian-callout-0-->\n");
        assert!(html.contains("<!--obsidian-callout-0-->"), "got: {html}");
    }

    #[test]
    fn escapes_text() {
        let html = plain().render("a < b && c");
        assert!(html.contains("a &lt; b &amp;&amp; c"), "got: {html}");
    }

    #[test]
    fn code_fence_without_highlighting() {
        let html = plain().render("```rust\nfn main() {}\n```");
        assert!(html.contains("<pre>"), "got: {html}");
        assert!(html.contains("language-rust"));
        assert!(html.contains("fn main() {}"));
    }

    #[test]
    fn code_fence_highlighted() {
        let mut r = MarkdownRenderer::default();
        let html = r.render("```rust\nfn main() {}\n```");
        assert!(html.contains("<pre"), "got: {html}");
        assert!(html.contains("<span style="), "expected inline highlight spans: {html}");
    }

    #[test]
    fn unicode_round_trip() {
        let html = plain().render("Emoji 🎉 and accents: café, naïve, Ærøskøbing");
        assert!(html.contains("Emoji 🎉 and accents: café, naïve, Ærøskøbing"));
    }

    #[test]
    fn toc_marker_replaced() {
        let mut r = plain();
        let html = r.render("[TOC]\n\n# One\n\n## Two");
        let html = r.insert_toc(&html);
        assert!(html.contains(r#"<div class="toc">"#), "got: {html}");
        assert!(html.contains(r##"<a href="#one">One</a>"##));
        assert!(html.contains(r##"<a href="#two">Two</a>"##));
    }

    #[test]
    fn no_toc_without_marker() {
        let mut r = plain();
        let html = r.render("# One");
        assert!(!r.insert_toc(&html).contains("toc"));
    }

    #[test]
    fn bundled_themes_include_default() {
        assert!(is_bundled_theme(DEFAULT_THEME));
        assert!(is_bundled_theme("InspiredGitHub"));
        assert!(!is_bundled_theme("neon"));
    }

    #[test]
    fn bundled_themes_come_from_syntect() {
        let names = ThemeSet::load_defaults().themes.into_keys().collect::<Vec<_>>();
        assert_eq!(*BUNDLED_THEMES, names);
    }

    #[test]
    fn highlighter_follows_options() {
        assert!(RenderOptions::default().highlighter().is_some());
        let off = RenderOptions {
            syntax_highlighting: false,
            ..RenderOptions::default()
        };
        assert!(off.highlighter().is_none());
    }
}
