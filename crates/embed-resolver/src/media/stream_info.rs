use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::media_format::MediaFormat;

/// A validated, directly playable stream resolved from an embed page.
///
/// The playback layer must attach [`headers`](Self::headers) verbatim to every
/// request made against [`url`](Self::url), manifest sub-requests included:
/// reachability was confirmed with exactly those headers.
///
/// # Examples
///
/// ```rust
/// use embed_resolver::media::{ExtractedStreamInfo, MediaFormat};
///
/// let info = ExtractedStreamInfo::builder("https://cdn.example/v.mp4", MediaFormat::Mp4)
///     .title("Sample")
///     .quality_opt(Some("720p".to_string()))
///     .header("Referer", "https://uqload.to")
///     .build();
///
/// assert_eq!(info.header("Referer"), Some("https://uqload.to"));
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExtractedStreamInfo {
    pub url: String,
    pub title: Option<String>,
    pub quality: Option<String>,
    pub format: MediaFormat,
    pub duration: Option<String>,
    pub thumbnail: Option<String>,
    pub headers: FxHashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct ExtractedStreamInfoBuilder {
    url: String,
    format: MediaFormat,
    title: Option<String>,
    quality: Option<String>,
    duration: Option<String>,
    thumbnail: Option<String>,
    headers: FxHashMap<String, String>,
}

impl ExtractedStreamInfo {
    pub fn builder(url: impl Into<String>, format: MediaFormat) -> ExtractedStreamInfoBuilder {
        ExtractedStreamInfoBuilder::new(url, format)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Boxed, human-readable rendering used by the CLI.
    pub fn pretty_print(&self) -> String {
        use std::fmt::Write;

        let width: usize = 60;
        let mut output = String::new();

        let format_line = |label: &str, value: &str| -> String {
            let content = format!("  {label} {value}");
            let padding = width.saturating_sub(content.chars().count());
            format!("║{}{}║", content, " ".repeat(padding))
        };
        let format_title = |title: &str| -> String {
            let padding_total = width.saturating_sub(title.chars().count());
            let left_pad = padding_total / 2;
            let right_pad = padding_total - left_pad;
            format!("║{}{}{}║", " ".repeat(left_pad), title, " ".repeat(right_pad))
        };

        let _ = writeln!(output, "╔{}╗", "═".repeat(width));
        let _ = writeln!(output, "{}", format_title("STREAM"));
        let _ = writeln!(output, "╠{}╣", "═".repeat(width));
        let _ = writeln!(output, "{}", format_line("URL:", &truncate(&self.url, 48)));
        let _ = writeln!(output, "{}", format_line("Format:", self.format.as_str()));

        let optional = [
            ("Title:", &self.title),
            ("Quality:", &self.quality),
            ("Duration:", &self.duration),
            ("Thumbnail:", &self.thumbnail),
        ];
        for (label, value) in optional {
            if let Some(value) = value {
                let _ = writeln!(output, "{}", format_line(label, &truncate(value, 44)));
            }
        }

        if !self.headers.is_empty() {
            let _ = writeln!(output, "╟{}╢", "─".repeat(width));
            let _ = writeln!(output, "{}", format_title("HEADERS"));
            let mut keys: Vec<_> = self.headers.keys().collect();
            keys.sort();
            for key in keys {
                let line = format!("  {}: {}", key, truncate(&self.headers[key], 35));
                let padding = width.saturating_sub(line.chars().count());
                let _ = writeln!(output, "║{}{}║", line, " ".repeat(padding));
            }
        }

        let _ = write!(output, "╚{}╝", "═".repeat(width));
        output
    }
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() > max {
        let cut: String = value.chars().take(max).collect();
        format!("{cut}...")
    } else {
        value.to_owned()
    }
}

impl fmt::Display for ExtractedStreamInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.quality {
            Some(quality) => write!(f, "{} - {} ({})", self.format, quality, self.url),
            None => write!(f, "{} ({})", self.format, self.url),
        }
    }
}

impl ExtractedStreamInfoBuilder {
    pub fn new(url: impl Into<String>, format: MediaFormat) -> Self {
        Self {
            url: url.into(),
            format,
            title: None,
            quality: None,
            duration: None,
            thumbnail: None,
            headers: FxHashMap::default(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn title_opt(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn quality_opt(mut self, quality: Option<String>) -> Self {
        self.quality = quality;
        self
    }

    pub fn duration_opt(mut self, duration: Option<String>) -> Self {
        self.duration = duration;
        self
    }

    pub fn thumbnail_opt(mut self, thumbnail: Option<String>) -> Self {
        self.thumbnail = thumbnail;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn headers(mut self, headers: FxHashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn build(self) -> ExtractedStreamInfo {
        ExtractedStreamInfo {
            url: self.url,
            title: self.title,
            quality: self.quality,
            format: self.format,
            duration: self.duration,
            thumbnail: self.thumbnail,
            headers: self.headers,
        }
    }
}
