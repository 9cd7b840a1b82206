use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Concrete container/protocol of a resolved stream.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    Hls,
    Dash,
    Mp4,
}

impl MediaFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaFormat::Hls => "hls",
            MediaFormat::Dash => "dash",
            MediaFormat::Mp4 => "mp4",
        }
    }

    /// Infers the format from a media URL.
    ///
    /// `.m3u8` maps to HLS, `.mpd` to DASH, anything else to MP4.
    pub fn from_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        if path.ends_with(".m3u8") {
            MediaFormat::Hls
        } else if path.ends_with(".mpd") {
            MediaFormat::Dash
        } else if path.ends_with(".mp4") {
            MediaFormat::Mp4
        } else if url.contains(".m3u8") {
            MediaFormat::Hls
        } else if url.contains(".mpd") {
            MediaFormat::Dash
        } else {
            MediaFormat::Mp4
        }
    }

    /// Adaptive formats are fetched by players through CORS sub-requests.
    pub fn is_adaptive(&self) -> bool {
        matches!(self, MediaFormat::Hls | MediaFormat::Dash)
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaFormat {
    type Err = String;

    fn from_str(format: &str) -> Result<Self, Self::Err> {
        match format.to_ascii_lowercase().as_str() {
            "hls" | "m3u8" => Ok(MediaFormat::Hls),
            "dash" | "mpd" => Ok(MediaFormat::Dash),
            "mp4" => Ok(MediaFormat::Mp4),
            other => Err(format!("unknown media format: {other}")),
        }
    }
}

/// Format as declared by a parser strategy, before resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatHint {
    Hls,
    Dash,
    Mp4,
    /// Decided later from the URL suffix.
    Auto,
}

impl FormatHint {
    pub fn resolve(self, url: &str) -> MediaFormat {
        match self {
            FormatHint::Hls => MediaFormat::Hls,
            FormatHint::Dash => MediaFormat::Dash,
            FormatHint::Mp4 => MediaFormat::Mp4,
            FormatHint::Auto => MediaFormat::from_url(url),
        }
    }
}

impl From<MediaFormat> for FormatHint {
    fn from(format: MediaFormat) -> Self {
        match format {
            MediaFormat::Hls => FormatHint::Hls,
            MediaFormat::Dash => FormatHint::Dash,
            MediaFormat::Mp4 => FormatHint::Mp4,
        }
    }
}
