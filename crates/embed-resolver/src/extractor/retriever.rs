use tracing::debug;

use super::fetcher::PageFetcher;

/// Bodies of the embed page and its non-embed counterpart from one attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PagePair {
    pub embed_body: Option<String>,
    pub non_embed_body: Option<String>,
    pub cookies: String,
}

impl PagePair {
    pub fn is_empty(&self) -> bool {
        self.embed_body.is_none() && self.non_embed_body.is_none()
    }

    /// Body the parser cascade runs on first: the embed page when available.
    pub fn primary(&self) -> Option<&str> {
        self.embed_body
            .as_deref()
            .or(self.non_embed_body.as_deref())
    }

    /// The other body, when both were fetched.
    pub fn secondary(&self) -> Option<&str> {
        match (&self.embed_body, &self.non_embed_body) {
            (Some(_), Some(other)) => Some(other),
            _ => None,
        }
    }

    /// Body metadata is scraped from: the full watch page when available.
    pub fn metadata_source(&self) -> Option<&str> {
        self.non_embed_body
            .as_deref()
            .or(self.embed_body.as_deref())
    }

    /// Whether either body contains any of `markers` (case-sensitive).
    pub fn contains_any(&self, markers: &[&str]) -> bool {
        [&self.embed_body, &self.non_embed_body]
            .into_iter()
            .flatten()
            .any(|body| markers.iter().any(|marker| body.contains(marker)))
    }
}

/// Derives the watch-page URL from an embed URL.
pub fn non_embed_url(embed_url: &str) -> String {
    embed_url.replace("embed-", "").replace("/embed/", "/")
}

/// Fetches the embed page and its non-embed variant concurrently.
///
/// Both requests are awaited together; cookies from the embed page win when
/// it set any.
pub async fn fetch_both(fetcher: &dyn PageFetcher, embed_url: &str, bypass_ssl: bool) -> PagePair {
    let non_embed = non_embed_url(embed_url);
    let (embed, other) = tokio::join!(
        fetcher.fetch(embed_url, bypass_ssl),
        fetcher.fetch(&non_embed, bypass_ssl)
    );

    debug!(
        embed_ok = embed.is_success(),
        non_embed_ok = other.is_success(),
        non_embed_url = %non_embed,
        "Parallel fetch joined"
    );

    let cookies = if embed.cookies.is_empty() {
        other.cookies
    } else {
        embed.cookies
    };

    PagePair {
        embed_body: embed.body,
        non_embed_body: other.body,
        cookies,
    }
}
