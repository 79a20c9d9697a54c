//! The HTML document shell around a rendered note.

/// Title used when a note has no usable file stem.
pub const DEFAULT_TITLE: &str = "Document";

/// Escape text for use in HTML element content or a quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap an HTML fragment in a minimal HTML5 document.
///
/// The fragment is placed verbatim as the only content of `<body>`; no CSS
/// or scripts are injected. An empty `title` falls back to
/// [`DEFAULT_TITLE`].
pub fn wrap_document(fragment: &str, title: &str) -> String {
    let title = title.trim();
    let title = if title.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        escape_html(title)
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
</head>
<body>
{fragment}
</body>
</html>"#
    )
}
