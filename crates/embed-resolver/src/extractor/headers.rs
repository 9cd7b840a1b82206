//! Header sets sent to embed pages and replayed against media URLs.

use rustc_hash::FxHashMap;

use super::config::ExtractorConfig;
use super::utils::origin_of;
use crate::media::MediaFormat;

/// Referer/Origin value for a URL: its `scheme://host`, or `fallback`.
pub fn referer_from_url(url: &str, fallback: &str) -> String {
    origin_of(url).unwrap_or_else(|| fallback.to_owned())
}

/// Browser-like navigation headers for fetching an embed page.
pub fn page_headers(config: &ExtractorConfig, referer: &str) -> Vec<(&'static str, String)> {
    vec![
        ("User-Agent", config.user_agent.clone()),
        ("Referer", referer.to_owned()),
        ("Origin", referer.to_owned()),
        (
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8"
                .to_owned(),
        ),
        ("Accept-Language", config.accept_language.clone()),
        ("Accept-Encoding", "identity".to_owned()),
        ("Connection", "keep-alive".to_owned()),
        ("Upgrade-Insecure-Requests", "1".to_owned()),
        ("Sec-Fetch-Dest", "document".to_owned()),
        ("Sec-Fetch-Mode", "navigate".to_owned()),
        ("Sec-Fetch-Site", "same-origin".to_owned()),
        ("Cache-Control", "no-cache".to_owned()),
        ("Pragma", "no-cache".to_owned()),
    ]
}

fn accept_for(format: MediaFormat) -> &'static str {
    match format {
        MediaFormat::Hls => {
            "application/vnd.apple.mpegurl,application/x-mpegURL,application/octet-stream,*/*"
        }
        MediaFormat::Dash => "application/dash+xml,application/octet-stream,*/*",
        MediaFormat::Mp4 => "video/mp4,video/*,*/*",
    }
}

/// Headers the media URL is validated with and the player must replay.
pub fn playback_headers(
    config: &ExtractorConfig,
    cookies: &str,
    referer: &str,
    format: MediaFormat,
) -> FxHashMap<String, String> {
    let (dest, mode) = if format.is_adaptive() {
        ("video", "cors")
    } else {
        ("document", "navigate")
    };

    let entries = [
        ("Cookie", cookies),
        ("Referer", referer),
        ("Origin", referer),
        ("User-Agent", config.user_agent.as_str()),
        ("Accept", accept_for(format)),
        ("Accept-Language", config.accept_language.as_str()),
        ("Accept-Encoding", "identity"),
        ("Range", "bytes=0-"),
        ("Sec-Fetch-Dest", dest),
        ("Sec-Fetch-Mode", mode),
        ("Sec-Fetch-Site", "same-site"),
        ("Connection", "keep-alive"),
    ];

    let mut headers = FxHashMap::with_capacity_and_hasher(entries.len(), Default::default());
    for (name, value) in entries {
        headers.insert(name.to_owned(), value.to_owned());
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referer_falls_back_for_unparsable_url() {
        assert_eq!(
            referer_from_url("https://uqload.to/embed-xyz", "https://uqload.cx"),
            "https://uqload.to"
        );
        assert_eq!(referer_from_url("::garbage::", "https://uqload.cx"), "https://uqload.cx");
    }

    #[test]
    fn adaptive_formats_use_cors_fetch_mode() {
        let config = ExtractorConfig::default();
        let hls = playback_headers(&config, "a=1", "https://uqload.cx", MediaFormat::Hls);
        assert_eq!(hls["Sec-Fetch-Dest"], "video");
        assert_eq!(hls["Sec-Fetch-Mode"], "cors");
        assert!(hls["Accept"].starts_with("application/vnd.apple.mpegurl"));

        let mp4 = playback_headers(&config, "a=1", "https://uqload.cx", MediaFormat::Mp4);
        assert_eq!(mp4["Sec-Fetch-Dest"], "document");
        assert_eq!(mp4["Sec-Fetch-Mode"], "navigate");
        assert_eq!(mp4["Range"], "bytes=0-");
        assert_eq!(mp4["Cookie"], "a=1");
        assert_eq!(mp4["Origin"], "https://uqload.cx");
    }

    #[test]
    fn page_headers_ask_for_identity_encoding() {
        let headers = page_headers(&ExtractorConfig::default(), "https://uqload.cx");
        assert!(headers.contains(&("Accept-Encoding", "identity".to_owned())));
        assert!(headers.contains(&("Referer", "https://uqload.cx".to_owned())));
    }
}
