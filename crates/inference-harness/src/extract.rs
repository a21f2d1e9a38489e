use once_cell::sync::Lazy;
use regex::Regex;

static HTML_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```html(.*?)```").expect("html fence pattern is valid"));

/// Returns the trimmed body of the first ```` ```html ```` fenced block.
///
/// The `html` label is matched case-sensitively. Later blocks are ignored.
pub fn extract_html(text: &str) -> Option<String> {
    HTML_FENCE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|inner| inner.as_str().trim().to_string())
}
