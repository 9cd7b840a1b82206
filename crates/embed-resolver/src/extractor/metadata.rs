//! Best-effort scraping of display metadata from embed pages.
//!
//! Nothing here can fail an extraction: every field is optional and
//! independent of which parser tier found the stream.

use std::sync::LazyLock;

use regex::Regex;

use super::utils::capture_group_1;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub quality: Option<String>,
    pub duration: Option<String>,
}

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
}

static TITLE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r#"(?s)<title[^>]*>(.*?)</title>"#,
        r#"(?s)<h1[^>]*>(.*?)</h1>"#,
        r#"title\s*:\s*["'](.*?)["']"#,
        r#"name\s*:\s*["'](.*?)["']"#,
    ])
});

static THUMBNAIL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r#"poster\s*:\s*["'](https?://[^"']+\.(?:jpg|jpeg|png|webp))["']"#,
        r#"thumbnail\s*:\s*["'](https?://[^"']+\.(?:jpg|jpeg|png|webp))["']"#,
        r#"image\s*:\s*["'](https?://[^"']+\.(?:jpg|jpeg|png|webp))["']"#,
        r#"(https?://[^"'\s]+\.(?:jpg|jpeg|png|webp))"#,
    ])
});

static QUALITY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r#"\[(\d+x\d+)"#,
        r#"(\d+p)"#,
        r#"quality\s*:\s*["']([^"']+)["']"#,
    ])
});

static DURATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r#"duration\s*:\s*["']([^"']+)["']"#,
        r#"\[\d+x\d+,\s*((?:\d+:)*\d+)\]"#,
        r#"(\d+:\d+:\d+)"#,
        r#"(\d+:\d+)"#,
    ])
});

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// `brand` is the lower-case host name that page chrome carries, see
/// [`HostProfile::brand_for`](super::hosts::HostProfile::brand_for).
pub fn extract_metadata(text: &str, brand: Option<&str>) -> PageMetadata {
    PageMetadata {
        title: parse_title(text, brand),
        thumbnail: parse_thumbnail(text),
        quality: first_capture(&QUALITY_PATTERNS, text),
        duration: first_capture(&DURATION_PATTERNS, text),
    }
}

fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| capture_group_1(re, text))
        .map(ToOwned::to_owned)
}

/// Title candidates with tags stripped; page chrome naming the host is skipped.
pub fn parse_title(text: &str, brand: Option<&str>) -> Option<String> {
    TITLE_PATTERNS.iter().find_map(|re| {
        let raw = capture_group_1(re, text)?;
        let without_tags = TAG_REGEX.replace_all(raw.trim(), "");
        let clean = WHITESPACE_REGEX.replace_all(&without_tags, " ").trim().to_owned();
        (!clean.is_empty() && !mentions_brand(&clean, brand)).then_some(clean)
    })
}

fn mentions_brand(text: &str, brand: Option<&str>) -> bool {
    brand.is_some_and(|brand| text.to_lowercase().contains(brand))
}

pub fn parse_thumbnail(text: &str) -> Option<String> {
    THUMBNAIL_PATTERNS.iter().find_map(|re| {
        capture_group_1(re, text)
            .filter(|url| url.starts_with("http"))
            .map(ToOwned::to_owned)
    })
}
