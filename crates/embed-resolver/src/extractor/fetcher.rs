use std::io::Read;

use async_trait::async_trait;
use flate2::read::{GzDecoder, ZlibDecoder};
use reqwest::StatusCode;
use reqwest::header::{CONTENT_ENCODING, HeaderMap, SET_COOKIE};
use thiserror::Error;
use tracing::{debug, warn};

use super::config::ExtractorConfig;
use super::headers::{page_headers, referer_from_url};
use super::hosts::FALLBACK_ORIGIN;
use super::http::HttpClients;

/// Outcome of a single page fetch. Failures are folded into an empty result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResult {
    pub body: Option<String>,
    /// `name=value` pairs joined with `"; "`.
    pub cookies: String,
}

impl FetchResult {
    pub fn new(body: impl Into<String>, cookies: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            cookies: cookies.into(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.body.is_some()
    }
}

/// Retrieves embed pages.
///
/// Implementations never fail: any error yields [`FetchResult::empty`], so one
/// failed branch of a parallel fetch cannot abort the attempt.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, bypass_ssl: bool) -> FetchResult;
}

#[derive(Debug, Error)]
enum FetchError {
    #[error("HTTP {0}")]
    Status(StatusCode),
    #[error("body exceeds {0} bytes")]
    TooLarge(usize),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("failed to decode {encoding} body: {source}")]
    Decode {
        encoding: String,
        source: std::io::Error,
    },
}

/// Largest page body read before the fetch is abandoned.
pub const DEFAULT_MAX_PAGE_BYTES: usize = 8 * 1024 * 1024;

/// [`PageFetcher`] backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    clients: HttpClients,
    config: ExtractorConfig,
    max_page_bytes: usize,
}

impl HttpPageFetcher {
    pub fn new(clients: HttpClients, config: ExtractorConfig) -> Self {
        Self {
            clients,
            config,
            max_page_bytes: DEFAULT_MAX_PAGE_BYTES,
        }
    }

    pub fn with_max_page_bytes(mut self, limit: usize) -> Self {
        self.max_page_bytes = limit;
        self
    }

    async fn try_fetch(&self, url: &str, bypass_ssl: bool) -> Result<FetchResult, FetchError> {
        let referer = referer_from_url(url, FALLBACK_ORIGIN);
        let mut request = self.clients.select(bypass_ssl).get(url);
        for (name, value) in page_headers(&self.config, &referer) {
            request = request.header(name, value);
        }

        let mut response = request.send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status));
        }

        let cookies = collect_cookies(response.headers());
        let encoding = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_ascii_lowercase());
        let mut raw = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            raw.extend_from_slice(&chunk);
            if raw.len() > self.max_page_bytes {
                return Err(FetchError::TooLarge(self.max_page_bytes));
            }
        }
        let body = decode_body(&raw, encoding.as_deref()).map_err(|source| FetchError::Decode {
            encoding: encoding.clone().unwrap_or_default(),
            source,
        })?;

        debug!(
            url,
            encoding = encoding.as_deref().unwrap_or("identity"),
            length = body.len(),
            "Fetched page"
        );
        Ok(FetchResult::new(body, cookies))
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str, bypass_ssl: bool) -> FetchResult {
        match self.try_fetch(url, bypass_ssl).await {
            Ok(result) => result,
            Err(e) => {
                warn!(url, bypass_ssl, error = %e, "Fetch failed");
                FetchResult::empty()
            }
        }
    }
}

/// Decodes a body by its declared content encoding, then as UTF-8.
pub fn decode_body(raw: &[u8], encoding: Option<&str>) -> std::io::Result<String> {
    let bytes = match encoding {
        Some("gzip") => {
            let mut out = Vec::with_capacity(raw.len() * 4);
            GzDecoder::new(raw).read_to_end(&mut out)?;
            out
        }
        Some("deflate") => {
            let mut out = Vec::with_capacity(raw.len() * 4);
            ZlibDecoder::new(raw).read_to_end(&mut out)?;
            out
        }
        _ => raw.to_vec(),
    };
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Joins the `name=value` part of every `Set-Cookie` header with `"; "`.
pub fn collect_cookies(headers: &HeaderMap) -> String {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}
