//! Dialect preprocessing: rewrite Obsidian syntax into plain Markdown.
//!
//! Obsidian notes carry syntax that a CommonMark renderer either ignores or
//! renders wrongly: a YAML front-matter block, `[[wiki-links]]`, `#tags` and
//! `> [!type]` callouts. This module removes or rewrites each of them with a
//! cheap, deterministic pass so the renderer only ever sees ordinary
//! Markdown. Every pass is a pure function (`&str → String`) that leaves
//! unmatched text untouched, so malformed notes degrade gracefully.
//!
//! ## Pass Order
//!
//! Passes must run in this specific order: the front-matter block is removed
//! before anything else so its `key: value` lines never look like tags, links
//! are flattened before tags so a `#heading` fragment inside `[[Note#heading]]`
//! is not rewritten twice, and callouts run last because their bodies are
//! rendered straight to HTML.

use crate::pipeline::callout::{self, Callout, Placeholders};
use crate::pipeline::render::RenderFragment;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

/// Markdown ready for the renderer, plus the callouts held aside.
///
/// Each callout is represented in [`markdown`](Self::markdown) by a
/// single-line placeholder; [`restore`](Self::restore) swaps the rendered
/// HTML back in after the whole document has been rendered.
#[derive(Debug, Default, Clone)]
pub struct Preprocessed {
    pub markdown: String,
    pub callouts: Vec<String>,
    pub placeholders: Placeholders,
}

impl Preprocessed {
    /// Put the rendered callouts back into the rendered document.
    pub fn restore(&self, html: &str) -> String {
        self.placeholders.restore(html, &self.callouts)
    }
}

/// Apply all dialect passes to a raw note.
///
/// Passes (applied in order):
/// 1. Remove the leading YAML front-matter block
/// 2. Flatten wiki-links and Markdown links to their visible text
/// 3. Strip the `#` from tags
/// 4. Render callouts to HTML (bodies go through `renderer`)
pub fn preprocess(input: &str, renderer: &mut dyn RenderFragment) -> Preprocessed {
    let s = remove_frontmatter(input);
    let s = convert_internal_links(&s);
    let s = convert_tags(&s);
    let placeholders = Placeholders::for_source(&s);
    let mut callouts = Vec::new();
    let markdown = process_callouts(&s, renderer, placeholders, &mut callouts);
    debug!(
        "Preprocessed note: {} bytes in, {} bytes out, {} callouts",
        input.len(),
        markdown.len(),
        callouts.len()
    );
    Preprocessed {
        markdown,
        callouts,
        placeholders,
    }
}

// ── Pass 1: Front-matter ─────────────────────────────────────────────────────

static RE_FRONTMATTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A---[ \t]*\r?\n(?:.*?\r?\n)??---[ \t]*(?:\r?\n|\z)").unwrap()
});

/// Remove the YAML block delimited by `---` lines at the very start.
///
/// Only the first block is removed and only when it opens on the first line.
pub fn remove_frontmatter(input: &str) -> String {
    match RE_FRONTMATTER.find(input) {
        Some(m) => input[m.end()..].to_string(),
        None => input.to_string(),
    }
}

// ── Pass 2: Links ────────────────────────────────────────────────────────────

// One pattern for both wiki-link forms: the optional `|Display` group makes the
// piped form win on any span where both could match.
static RE_WIKI_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\]|]+)(?:\|([^\]]+))?\]\]").unwrap());

static RE_MD_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").unwrap());

/// Flatten links to plain text.
///
/// * `[[Target|Display]]` → `Display`
/// * `[[Target]]` → `Target`
/// * `[Text](url)` → `Text`
///
/// Image syntax (`![alt](src)`) is left alone.
pub fn convert_internal_links(input: &str) -> String {
    let s = RE_WIKI_LINK
        .replace_all(input, |caps: &Captures<'_>| {
            caps.get(2)
                .or_else(|| caps.get(1))
                .map_or_else(String::new, |m| m.as_str().to_string())
        })
        .into_owned();

    RE_MD_LINK
        .replace_all(&s, |caps: &Captures<'_>| {
            let start = caps.get(0).map_or(0, |m| m.start());
            if s[..start].ends_with('!') {
                caps[0].to_string()
            } else {
                caps[1].to_string()
            }
        })
        .into_owned()
}

// ── Pass 3: Tags ─────────────────────────────────────────────────────────────

static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"#(\w+)").unwrap());

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Strip the `#` from `#tag` unless it directly follows a word character.
///
/// `a#b` (a URL fragment, an issue reference glued to a word) is kept as is.
pub fn convert_tags(input: &str) -> String {
    RE_TAG
        .replace_all(input, |caps: &Captures<'_>| {
            let start = caps.get(0).map_or(0, |m| m.start());
            let glued = input[..start].chars().next_back().is_some_and(is_word_char);
            if glued {
                caps[0].to_string()
            } else {
                caps[1].to_string()
            }
        })
        .into_owned()
}

// ── Pass 4: Callouts ─────────────────────────────────────────────────────────

/// An open fenced code block: its marker character and run length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fence {
    marker: char,
    len: usize,
}

/// Split a line into a run of three or more `` ` `` or `~` and the text after it.
fn fence_run(line: &str) -> Option<(Fence, &str)> {
    let t = line.trim_start_matches([' ', '\t']);
    let marker = t.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = t.chars().take_while(|c| *c == marker).count();
    (len >= 3).then(|| (Fence { marker, len }, &t[len..]))
}

/// The fence this line opens, if any.
fn opening_fence(line: &str) -> Option<Fence> {
    let (fence, info) = fence_run(line)?;
    // A backtick fence's info string may not contain backticks.
    (fence.marker != '`' || !info.contains('`')).then_some(fence)
}

/// True when `line` closes `open`.
fn closes(line: &str, open: Fence) -> bool {
    fence_run(line).is_some_and(|(f, rest)| {
        f.marker == open.marker && f.len >= open.len && rest.trim().is_empty()
    })
}

/// Render every callout and replace it with a placeholder line.
///
/// Lines that are not part of a callout are copied through verbatim,
/// including their original line endings. Fenced code blocks are copied
/// as they are, so callout syntax shown in code stays code.
fn process_callouts(
    input: &str,
    renderer: &mut dyn RenderFragment,
    placeholders: Placeholders,
    stash: &mut Vec<String>,
) -> String {
    let lines: Vec<&str> = input.split_inclusive('\n').collect();
    let mut result = String::with_capacity(input.len());
    let mut fence: Option<Fence> = None;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if let Some(open) = fence {
            if closes(line, open) {
                fence = None;
            }
            result.push_str(line);
            i += 1;
            continue;
        }

        let Some(header) = callout::parse_header(line) else {
            fence = opening_fence(line);
            result.push_str(line);
            i += 1;
            continue;
        };

        let mut body = Vec::new();
        let mut j = i + 1;
        while let Some(line) = lines.get(j).and_then(|l| callout::strip_quote_marker(l)) {
            body.push(line);
            j += 1;
        }

        let co = Callout {
            kind: header.kind,
            title: header.title,
            body: body.into_iter().map(str::to_string).collect(),
        };
        let html = co.render(renderer);
        result.push_str(header.indent);
        result.push_str(&placeholders.token(stash.len()));
        result.push('\n');
        stash.push(html);
        i = j;
    }

    result
}

// ── Tests ────────────────────────────────────────────────────────────────────
