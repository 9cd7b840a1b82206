//! Cascade of heuristic strategies that pull a media URL out of page text.
//!
//! Strategies run in [`STRATEGIES`] order and the first hit wins; there is no
//! scoring or merging between tiers.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::hosts::HostProfile;
use super::utils::{capture_group_1, capture_group_1_or_whole, strip_quotes};
use crate::media::{CandidateStream, FormatHint};

/// Phrases confirming the video is gone. Matched case-sensitively.
pub const CONTENT_ABSENT_MARKERS: &[&str] = &["File was deleted", "File not found"];

const DELETED_MARKER: &str = "file was deleted";

pub type Strategy = fn(&str, &HostProfile) -> Option<CandidateStream>;

pub static STRATEGIES: &[(&str, Strategy)] = &[
    ("structured", structured),
    ("host_legacy", host_legacy),
    ("js_variable", js_variable),
    ("brute_force", brute_force),
];

fn compile(patterns: &[(&str, FormatHint)]) -> Vec<(Regex, FormatHint)> {
    patterns
        .iter()
        .map(|(pattern, hint)| (Regex::new(pattern).unwrap(), *hint))
        .collect()
}

static STRUCTURED_PATTERNS: LazyLock<Vec<(Regex, FormatHint)>> = LazyLock::new(|| {
    compile(&[
        (
            r#"sources\s*:\s*\[\s*\{[^}]*file\s*:\s*["']([^"']+)["']"#,
            FormatHint::Auto,
        ),
        (
            r#"file\s*:\s*["']([^"']+\.(?:mp4|m3u8|mpd))["']"#,
            FormatHint::Auto,
        ),
        (
            r#"src\s*:\s*["']([^"']+\.(?:mp4|m3u8|mpd))["']"#,
            FormatHint::Auto,
        ),
        (
            r#"url\s*:\s*["']([^"']+\.(?:mp4|m3u8|mpd))["']"#,
            FormatHint::Auto,
        ),
        (
            r#"https?://[^"'\s]+\.m3u8(?:\?[^"'\s]*)?"#,
            FormatHint::Hls,
        ),
        (
            r#"https?://[^"'\s]+\.mpd(?:\?[^"'\s]*)?"#,
            FormatHint::Dash,
        ),
        (
            r#"https?://[^"'\s]+\.mp4(?:\?[^"'\s]*)?"#,
            FormatHint::Mp4,
        ),
        (
            r#""(https?://[^"]+\.(?:mp4|m3u8|mpd))""#,
            FormatHint::Auto,
        ),
        (
            r#"src\s*=\s*["'](https?://[^"']+\.(?:mp4|m3u8|mpd))["']"#,
            FormatHint::Auto,
        ),
    ])
});

static JS_VARIABLE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"var\s+\w+\s*=\s*["'](https?://[^"']+\.(?:mp4|m3u8|mpd))["']"#,
        r#"\w+\s*=\s*["'](https?://[^"']+\.(?:mp4|m3u8|mpd))["']"#,
        r#"url\s*:\s*["'](https?://[^"']+)["']"#,
        r#"source\s*:\s*["'](https?://[^"']+)["']"#,
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

static SNIFF_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(https?://[^\s"'<>]+\.(?:mp4|m3u8|mpd|avi|mkv|webm)(?:\?[^\s"'<>]*)?)"#,
        r#"(https?://[^\s"'<>]*(?:video|stream|media|file)[^\s"'<>]*)"#,
        r#"(https?://[^\s"'<>]*(?:cdn|storage|media)[^\s"'<>]*\.(?:mp4|m3u8|mpd))"#,
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// Runs the cascade over `text`.
pub fn parse(text: &str, profile: &HostProfile) -> Option<CandidateStream> {
    debug!(length = text.len(), host = profile.name, "Parsing page content");
    STRATEGIES.iter().find_map(|(name, strategy)| {
        let candidate = strategy(text, profile)?;
        debug!(
            strategy = name,
            url = candidate.url(),
            format = %candidate.format(),
            "Candidate found"
        );
        Some(candidate)
    })
}

/// Player-config idioms restricted to media extensions, then raw media URLs.
pub fn structured(text: &str, _profile: &HostProfile) -> Option<CandidateStream> {
    STRUCTURED_PATTERNS.iter().find_map(|(re, hint)| {
        let raw = capture_group_1_or_whole(re, text)?;
        CandidateStream::new(strip_quotes(raw), *hint)
    })
}

/// The host's own fixed media path, unless the page says the file is gone.
pub fn host_legacy(text: &str, profile: &HostProfile) -> Option<CandidateStream> {
    let pattern = profile.legacy_pattern?;
    if text.to_lowercase().contains(DELETED_MARKER) {
        debug!(host = profile.name, "Page reports deleted file");
        return None;
    }
    let found = pattern.find(text)?;
    CandidateStream::new(found.as_str(), FormatHint::Mp4)
}

/// JavaScript assignments and loose `url:`/`source:` keys.
pub fn js_variable(text: &str, _profile: &HostProfile) -> Option<CandidateStream> {
    JS_VARIABLE_PATTERNS.iter().find_map(|re| {
        let url = capture_group_1(re, text)?;
        CandidateStream::new(url, FormatHint::Auto)
    })
}

/// Any video-looking URL that passes [`is_plausible_stream_url`].
pub fn brute_force(text: &str, profile: &HostProfile) -> Option<CandidateStream> {
    let allowlist = profile.sniff_allowlist();
    SNIFF_PATTERNS.iter().find_map(|re| {
        re.captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .inspect(|url| debug!(url, "Potential video URL"))
            .find(|url| is_plausible_stream_url(url, &allowlist))
            .and_then(|url| CandidateStream::new(url, FormatHint::Auto))
    })
}

/// Length strictly between 20 and 500 and contains an allowlisted substring.
pub fn is_plausible_stream_url(url: &str, allowlist: &[&str]) -> bool {
    url.len() > 20 && url.len() < 500 && allowlist.iter().any(|needle| url.contains(needle))
}
