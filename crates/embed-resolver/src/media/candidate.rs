use super::media_format::{FormatHint, MediaFormat};

/// A media URL found in page content, not yet confirmed reachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateStream {
    url: String,
    format: FormatHint,
}

impl CandidateStream {
    /// Returns `None` for a blank URL.
    pub fn new(url: impl Into<String>, format: FormatHint) -> Option<Self> {
        let url = url.into();
        let url = url.trim();
        if url.is_empty() {
            return None;
        }
        Some(Self {
            url: url.to_owned(),
            format,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn hint(&self) -> FormatHint {
        self.format
    }

    pub fn format(&self) -> MediaFormat {
        self.format.resolve(&self.url)
    }

    pub fn into_url(self) -> String {
        self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_url() {
        assert!(CandidateStream::new("", FormatHint::Mp4).is_none());
        assert!(CandidateStream::new("   ", FormatHint::Auto).is_none());
    }

    #[test]
    fn resolves_auto_format() {
        let candidate = CandidateStream::new("https://cdn.example/a.m3u8", FormatHint::Auto).unwrap();
        assert_eq!(candidate.format(), MediaFormat::Hls);
        assert_eq!(candidate.hint(), FormatHint::Auto);
    }
}
