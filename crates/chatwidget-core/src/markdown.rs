//! Display helpers for message text.

use chatwidget_protocol::Message;
use regex::Regex;
use std::sync::LazyLock;

/// Inline markup rules, applied in order so `**` wins over `*`.
static INLINE_RULES: LazyLock<[(Regex, &'static str); 3]> = LazyLock::new(|| {
    [
        (r"\*\*(.*?)\*\*", "<strong>$1</strong>"),
        (r"\*(.*?)\*", "<em>$1</em>"),
        (r"`(.*?)`", "<code>$1</code>"),
    ]
    .map(|(pattern, replacement)| {
        (
            Regex::new(pattern).expect("inline markdown pattern is valid"),
            replacement,
        )
    })
});

/// Render the inline markdown subset used in chat bubbles as HTML.
///
/// Input is HTML-escaped first, so only `**bold**`, `*emphasis*` and
/// `` `code` `` produce markup. Empty spans such as `****` still render
/// as empty elements.
pub fn render_markdown(content: &str) -> String {
    let mut rendered = escape_html(content);
    for (regex, replacement) in INLINE_RULES.iter() {
        rendered = regex.replace_all(&rendered, *replacement).into_owned();
    }
    rendered
}

/// Local wall-clock time of a message as `HH:MM`.
pub fn format_timestamp(message: &Message) -> String {
    message
        .timestamp
        .with_timezone(&chrono::Local)
        .format("%H:%M")
        .to_string()
}

fn escape_html(content: &str) -> String {
    let mut escaped = String::with_capacity(content.len());
    for ch in content.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
