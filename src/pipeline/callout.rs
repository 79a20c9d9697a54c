//! Obsidian callouts: `> [!type] title` blockquotes rendered as styled divs.
//!
//! ```text
//! > [!warning] Careful
//! > Body with **markdown**.
//! ```
//! becomes
//! ```text
//! <div class="callout callout-warning"><div class="callout-title">Careful</div><div class="callout-content"><p>Body with <strong>markdown</strong>.</p>
//! </div></div>
//! ```
//!
//! Rendered callouts are not spliced into the intermediate Markdown directly.
//! A highlighted code block inside a callout can contain blank lines, and a
//! blank line ends a raw HTML block in CommonMark, which would spill the
//! rest of the callout back into the Markdown parser. Instead each callout
//! is replaced by a one-line HTML comment and [`Placeholders::restore`]
//! swaps the HTML back in once the document has been rendered.

use crate::pipeline::document::escape_html;
use crate::pipeline::render::RenderFragment;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// A callout found in a note, with the blockquote markers already removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callout {
    /// Lowercased type word, used as the `callout-{kind}` CSS class.
    pub kind: String,
    /// Trimmed title; empty when the header carries none.
    pub title: String,
    pub body: Vec<String>,
}

/// The first line of a callout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header<'a> {
    /// Up to three spaces in front of the `>` marker, kept on the placeholder
    /// line. Four or more would turn the placeholder into an indented code
    /// block, so such lines are not headers.
    pub indent: &'a str,
    pub kind: String,
    pub title: String,
}

static RE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^( {0,3})>[ \t]*\[!(\w+)\][ \t]*(.*?)[ \t]*\r?\n?$").unwrap());

/// Recognise `> [!TYPE] optional title`.
pub fn parse_header(line: &str) -> Option<Header<'_>> {
    let caps = RE_HEADER.captures(line)?;
    let indent = caps.get(1).map_or("", |m| m.as_str());
    Some(Header {
        indent,
        kind: caps[2].to_lowercase(),
        title: caps[3].trim().to_string(),
    })
}

/// Strip the leading `"> "` (or bare `">"`) from a body line.
///
/// Returns `None` when the line is not blockquote-prefixed, which ends the
/// callout body.
pub fn strip_quote_marker(line: &str) -> Option<&str> {
    let line = line.trim_end_matches(['\n', '\r']);
    let rest = line.trim_start().strip_prefix('>')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

impl Callout {
    /// Body lines joined back into a Markdown fragment.
    pub fn body_markdown(&self) -> String {
        self.body.join("\n")
    }

    /// Render the callout, sending its body through `renderer`.
    pub fn render(&self, renderer: &mut dyn RenderFragment) -> String {
        let content = renderer.render_fragment(&self.body_markdown());

        let mut html = format!(r#"<div class="callout callout-{}">"#, self.kind);
        if !self.title.is_empty() {
            html.push_str(&format!(
                r#"<div class="callout-title">{}</div>"#,
                escape_html(&self.title)
            ));
        }
        html.push_str(&format!(r#"<div class="callout-content">{content}</div>"#));
        html.push_str("</div>");
        html
    }
}

// ── Placeholders ─────────────────────────────────────────────────────────────

const PLACEHOLDER_PREFIX: &str = "<!--obsidian-callout-";

static RE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<!--obsidian-callout-(\d+)-(\d+)-->\n?").unwrap());

/// Placeholder tokens for one note.
///
/// Every token carries a key chosen so that no token of this note occurs in
/// the note's own text. A comment the author wrote that happens to look like
/// a placeholder is therefore never replaced by a callout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Placeholders {
    key: usize,
}

impl Placeholders {
    /// Pick the smallest key whose tokens do not appear in `source`.
    pub fn for_source(source: &str) -> Self {
        let key = (0..)
            .find(|k| !source.contains(&format!("{PLACEHOLDER_PREFIX}{k}-")))
            .unwrap_or_default();
        Self { key }
    }

    /// The single-line stand-in for callout number `index`.
    pub fn token(&self, index: usize) -> String {
        format!("{PLACEHOLDER_PREFIX}{}-{index}-->", self.key)
    }

    /// Replace every token of this note in rendered `html` with its callout.
    ///
    /// Tokens with another key, or an index out of range, are left as they
    /// are.
    pub fn restore(&self, html: &str, callouts: &[String]) -> String {
        if callouts.is_empty() {
            return html.to_string();
        }
        RE_PLACEHOLDER
            .replace_all(html, |caps: &Captures<'_>| {
                let ours = caps[1].parse::<usize>().ok() == Some(self.key);
                caps[2]
                    .parse::<usize>()
                    .ok()
                    .filter(|_| ours)
                    .and_then(|i| callouts.get(i))
                    .map_or_else(|| caps[0].to_string(), |c| format!("{c}\n"))
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl RenderFragment for Echo {
        fn render_fragment(&mut self, markdown: &str) -> String {
            format!("<p>{markdown}</p>")
        }
    }

    #[test]
    fn header_with_title() {
        let h = parse_header("> [!Warning] Careful now \n").unwrap();
        assert_eq!(h.kind, "warning");
        assert_eq!(h.title, "Careful now");
        assert_eq!(h.indent, "");
    }

    #[test]
    fn header_without_title() {
        let h = parse_header(">[!note]").unwrap();
        assert_eq!(h.kind, "note");
        assert!(h.title.is_empty());
    }

    #[test]
    fn header_keeps_indent() {
        let h = parse_header("   > [!tip] Indented\n").unwrap();
        assert_eq!(h.indent, "   ");
    }

    #[test]
    fn code_indented_quote_is_not_a_header() {
        assert!(parse_header("    > [!note] x\n").is_none());
        assert!(parse_header("\t> [!note] x\n").is_none());
    }

    #[test]
    fn plain_quote_is_not_a_header() {
        assert!(parse_header("> just a quote\n").is_none());
        assert!(parse_header("> [!] empty type\n").is_none());
        assert!(parse_header("text > [!note]\n").is_none());
    }

    #[test]
    fn quote_markers() {
        assert_eq!(strip_quote_marker("> text\n"), Some("text"));
        assert_eq!(strip_quote_marker(">\n"), Some(""));
        assert_eq!(strip_quote_marker(">text"), Some("text"));
        assert_eq!(strip_quote_marker(">  two spaces"), Some(" two spaces"));
        assert_eq!(strip_quote_marker("no marker"), None);
        assert_eq!(strip_quote_marker("\n"), None);
    }

    #[test]
    fn render_with_title() {
        let c = Callout {
            kind: "warning".into(),
            title: "Careful".into(),
            body: vec!["Body text".into()],
        };
        assert_eq!(
            c.render(&mut Echo),
            r#"<div class="callout callout-warning"><div class="callout-title">Careful</div><div class="callout-content"><p>Body text</p></div></div>"#
        );
    }

    #[test]
    fn render_without_title_omits_title_div() {
        let c = Callout {
            kind: "note".into(),
            title: String::new(),
            body: vec!["text".into()],
        };
        let html = c.render(&mut Echo);
        assert!(!html.contains("callout-title"));
        assert!(html.contains(r#"<div class="callout-content"><p>text</p></div>"#));
    }

    #[test]
    fn title_is_escaped() {
        let c = Callout {
            kind: "note".into(),
            title: "<script>alert(1)</script>".into(),
            body: vec![],
        };
        let html = c.render(&mut Echo);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn body_lines_rejoined() {
        let c = Callout {
            kind: "info".into(),
            title: String::new(),
            body: vec!["a".into(), String::new(), "b".into()],
        };
        assert_eq!(c.body_markdown(), "a\n\nb");
    }

    #[test]
    fn restore_placeholders() {
        let p = Placeholders::default();
        let html = format!("<p>x</p>\n{}\n<p>y</p>\n", p.token(0));
        let out = p.restore(&html, &["<div>C</div>".to_string()]);
        assert_eq!(out, "<p>x</p>\n<div>C</div>\n<p>y</p>\n");
    }

    #[test]
    fn restore_leaves_unknown_index() {
        let p = Placeholders::default();
        let html = p.token(3);
        assert_eq!(p.restore(&html, &["<div/>".to_string()]), html);
    }

    #[test]
    fn key_avoids_tokens_in_source() {
        let source = "<!--obsidian-callout-0-0-->\n<!--obsidian-callout-1-5-->\n";
        let p = Placeholders::for_source(source);
        assert_eq!(p, Placeholders { key: 2 });
        assert!(!source.contains(&p.token(0)));
        assert_eq!(Placeholders::for_source("plain"), Placeholders::default());
    }

    #[test]
    fn restore_ignores_tokens_with_another_key() {
        let authored = Placeholders::default().token(0);
        let p = Placeholders::for_source(&authored);
        let html = format!("{authored}\n{}\n", p.token(0));
        let out = p.restore(&html, &["<div>C</div>".to_string()]);
        assert_eq!(out, format!("{authored}\n<div>C</div>\n"));
    }
}
