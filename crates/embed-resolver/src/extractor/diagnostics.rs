//! Debug dumps for pages the parser cascade could not handle.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{Level, debug, enabled};

const KEYWORDS: &[&str] = &["mp4", "m3u8", "video", "source", "file", "stream", "player"];
const CONTEXT_CHARS: usize = 100;
const MAX_URLS: usize = 10;

static SCRIPT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>(.*?)</script>").unwrap());
static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s"'<>]+"#).unwrap());

/// Logs scripts, keyword hits and URLs found in `content` at debug level.
pub fn log_search_hints(content: &str) {
    if !enabled!(Level::DEBUG) {
        return;
    }

    for (index, captures) in SCRIPT_REGEX.captures_iter(content).enumerate() {
        let script = captures.get(1).map_or("", |m| m.as_str());
        let lowered = script.to_lowercase();
        if ["mp4", "video", "source"].iter().any(|k| lowered.contains(k)) {
            debug!(index, script = %truncate(script, 500), "Script mentioning media");
        }
    }

    let lowered = content.to_lowercase();
    for keyword in KEYWORDS {
        let count = lowered.matches(keyword).count();
        if count == 0 {
            continue;
        }
        let context = lowered
            .find(keyword)
            .map(|at| window(&lowered, at, keyword.len()))
            .unwrap_or_default();
        debug!(keyword, count, context = %context, "Keyword occurrences");
    }

    let urls: Vec<&str> = URL_REGEX
        .find_iter(content)
        .map(|m| m.as_str())
        .take(MAX_URLS)
        .collect();
    debug!(count = urls.len(), urls = ?urls, "URLs found in page");
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Text around a byte offset, widened to char boundaries.
fn window(content: &str, at: usize, len: usize) -> &str {
    let mut start = at.saturating_sub(CONTEXT_CHARS);
    while !content.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (at + len + CONTEXT_CHARS).min(content.len());
    while !content.is_char_boundary(end) {
        end += 1;
    }
    &content[start..end]
}
