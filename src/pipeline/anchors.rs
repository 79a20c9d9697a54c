//! Heading anchors and the `[TOC]` marker.
//!
//! comrak's own `header_ids` extension emits an empty `<a class="anchor">`
//! inside every heading and keeps its de-duplication state private to one
//! call. Notes are rendered in several calls (each callout body, then the
//! document itself), so ids are assigned here instead, on the rendered HTML,
//! against an [`AnchorRegistry`] owned by the renderer and cleared by its
//! `reset()`.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Generate a slug from heading text.
///
/// Lowercases, keeps Unicode letters and digits, collapses every other run
/// of characters into a single `-`.
///
/// ```
/// use obsidian2html::pipeline::anchors::slugify;
///
/// assert_eq!(slugify("Getting Started"), "getting-started");
/// assert_eq!(slugify("  Café & Crème! "), "café-crème");
/// ```
pub fn slugify(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                '-'
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Ids already handed out during the current conversion.
#[derive(Debug, Default, Clone)]
pub struct AnchorRegistry {
    used: HashMap<String, usize>,
}

impl AnchorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a unique id for `text`: `slug`, then `slug_1`, `slug_2`, …
    pub fn unique(&mut self, text: &str) -> String {
        let mut base = slugify(text);
        if base.is_empty() {
            base = "section".to_string();
        }

        let Some(count) = self.used.get(&base).copied() else {
            self.used.insert(base.clone(), 0);
            return base;
        };

        let mut n = count + 1;
        let mut candidate = format!("{base}_{n}");
        while self.used.contains_key(&candidate) {
            n += 1;
            candidate = format!("{base}_{n}");
        }
        self.used.insert(base, n);
        self.used.insert(candidate.clone(), 0);
        candidate
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    pub fn clear(&mut self) {
        self.used.clear();
    }
}

// ── Heading ids ──────────────────────────────────────────────────────────────

static RE_BARE_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<h([1-6])>(.*?)</h[1-6]>").unwrap());

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Visible text of an HTML snippet: tags dropped, common entities decoded.
pub fn plain_text(html: &str) -> String {
    RE_TAGS
        .replace_all(html, "")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Give every `<hN>` without attributes an `id`.
///
/// Headings that already carry attributes (for instance those inside an
/// already rendered callout) are skipped, so the pass is safe to repeat.
pub fn assign_heading_ids(html: &str, registry: &mut AnchorRegistry) -> String {
    RE_BARE_HEADING
        .replace_all(html, |caps: &Captures<'_>| {
            let level = &caps[1];
            let inner = &caps[2];
            let id = registry.unique(&plain_text(inner));
            format!(r#"<h{level} id="{id}">{inner}</h{level}>"#)
        })
        .into_owned()
}

// ── Table of contents ────────────────────────────────────────────────────────

static RE_ID_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)<h([1-6]) id="([^"]*)">(.*?)</h[1-6]>"#).unwrap());

/// One heading listed in the table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub level: u8,
    pub id: String,
    pub text: String,
}

/// Collect headings with ids, in document order.
pub fn collect_toc(html: &str) -> Vec<TocEntry> {
    RE_ID_HEADING
        .captures_iter(html)
        .map(|caps| TocEntry {
            level: caps[1].parse().unwrap_or(1),
            id: caps[2].to_string(),
            text: plain_text(&caps[3]),
        })
        .collect()
}

/// Render entries as a nested list inside `<div class="toc">`.
pub fn render_toc(entries: &[TocEntry]) -> String {
    let mut out = String::from("<div class=\"toc\">\n");
    if entries.is_empty() {
        out.push_str("</div>\n");
        return out;
    }

    // Depth is relative to the shallowest heading so a note without an h1
    // doesn't start with an empty outer list.
    let base = entries.iter().map(|e| e.level).min().unwrap_or(1);
    let mut depth = 0usize;

    for (i, entry) in entries.iter().enumerate() {
        let target = usize::from(entry.level - base) + 1;
        if i > 0 && target <= depth {
            out.push_str("</li>\n");
        }
        while depth < target {
            out.push_str("<ul>\n");
            depth += 1;
            if depth < target {
                out.push_str("<li>\n");
            }
        }
        while depth > target {
            out.push_str("</ul>\n</li>\n");
            depth -= 1;
        }
        let _ = write!(
            out,
            "<li><a href=\"#{}\">{}</a>",
            entry.id,
            crate::pipeline::document::escape_html(&entry.text)
        );
    }

    out.push_str("</li>\n");
    while depth > 1 {
        out.push_str("</ul>\n</li>\n");
        depth -= 1;
    }
    out.push_str("</ul>\n</div>\n");
    out
}

/// Replace every paragraph consisting solely of `marker` with the TOC.
///
/// Without a marker the HTML is returned unchanged.
pub fn insert_toc(html: &str, marker: &str) -> String {
    let paragraph = format!("<p>{}</p>\n", crate::pipeline::document::escape_html(marker));
    if !html.contains(&paragraph) {
        return html.to_string();
    }
    let toc = render_toc(&collect_toc(html));
    html.replace(&paragraph, &toc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Chapter One"), "chapter-one");
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Multiple   Spaces  "), "multiple-spaces");
        assert_eq!(slugify("snake_case id"), "snake_case-id");
    }

    #[test]
    fn slugify_unicode() {
        assert_eq!(slugify("Ünïcödé Title"), "ünïcödé-title");
        assert_eq!(slugify("🚀 Launch"), "launch");
    }

    #[test]
    fn registry_dedups() {
        let mut reg = AnchorRegistry::new();
        assert_eq!(reg.unique("Intro"), "intro");
        assert_eq!(reg.unique("Intro"), "intro_1");
        assert_eq!(reg.unique("Intro"), "intro_2");
        assert_eq!(reg.unique("intro_1"), "intro_1_1");
        assert_eq!(reg.unique("!!!"), "section");
    }

    #[test]
    fn registry_clear() {
        let mut reg = AnchorRegistry::new();
        reg.unique("Intro");
        assert!(!reg.is_empty());
        reg.clear();
        assert!(reg.is_empty());
        assert_eq!(reg.unique("Intro"), "intro");
    }

    #[test]
    fn ids_assigned_once() {
        let mut reg = AnchorRegistry::new();
        let html = "<h1>Title</h1>\n<h2>A <em>b</em></h2>\n";
        let out = assign_heading_ids(html, &mut reg);
        assert_eq!(
            out,
            "<h1 id=\"title\">Title</h1>\n<h2 id=\"a-b\">A <em>b</em></h2>\n"
        );
        assert_eq!(assign_heading_ids(&out, &mut reg), out);
    }

    #[test]
    fn entity_text_slug() {
        let mut reg = AnchorRegistry::new();
        let out = assign_heading_ids("<h2>Q &amp; A</h2>", &mut reg);
        assert_eq!(out, "<h2 id=\"q-a\">Q &amp; A</h2>");
    }

    #[test]
    fn toc_nested() {
        let entries = vec![
            TocEntry { level: 1, id: "a".into(), text: "A".into() },
            TocEntry { level: 2, id: "b".into(), text: "B".into() },
            TocEntry { level: 1, id: "c".into(), text: "C".into() },
        ];
        assert_eq!(
            render_toc(&entries),
            "<div class=\"toc\">\n<ul>\n<li><a href=\"#a\">A</a><ul>\n<li><a href=\"#b\">B</a></li>\n</ul>\n</li>\n<li><a href=\"#c\">C</a></li>\n</ul>\n</div>\n"
        );
    }

    #[test]
    fn toc_starts_at_shallowest_level() {
        let entries = vec![
            TocEntry { level: 2, id: "x".into(), text: "X".into() },
            TocEntry { level: 3, id: "y".into(), text: "Y".into() },
        ];
        let toc = render_toc(&entries);
        assert!(toc.starts_with("<div class=\"toc\">\n<ul>\n<li><a href=\"#x\">X</a><ul>"));
        assert_eq!(toc.matches("<ul>").count(), toc.matches("</ul>").count());
    }

    #[test]
    fn toc_deep_jump_is_balanced() {
        let entries = vec![
            TocEntry { level: 1, id: "a".into(), text: "A".into() },
            TocEntry { level: 4, id: "d".into(), text: "D".into() },
            TocEntry { level: 1, id: "e".into(), text: "E".into() },
        ];
        let toc = render_toc(&entries);
        assert_eq!(toc.matches("<ul>").count(), toc.matches("</ul>").count());
        assert_eq!(toc.matches("<li>").count(), toc.matches("</li>").count());
    }

    #[test]
    fn insert_toc_replaces_marker() {
        let html = "<p>[TOC]</p>\n<h1 id=\"a\">A</h1>\n";
        let out = insert_toc(html, "[TOC]");
        assert!(out.starts_with("<div class=\"toc\">"));
        assert!(out.contains("<a href=\"#a\">A</a>"));
        assert!(!out.contains("[TOC]"));
    }

    #[test]
    fn insert_toc_without_marker() {
        let html = "<h1 id=\"a\">A</h1>\n";
        assert_eq!(insert_toc(html, "[TOC]"), html);
    }
}
