use std::str::FromStr;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RANGE};
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{debug, warn};

use super::http::HttpClients;

const WRONG_IP_MARKERS: &[&str] = &["error_wrong_ip", "wrong ip"];
const ERROR_BODY_LIMIT: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    /// Host rejected the requesting address; worth another attempt.
    #[error("error_wrong_ip")]
    WrongIp,
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("{0}")]
    Transport(String),
}

impl ValidationFailure {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::WrongIp => Some(StatusCode::FORBIDDEN.as_u16()),
            Self::Http { status, .. } => Some(*status),
            Self::Transport(_) => None,
        }
    }
}

/// Confirms a candidate media URL is reachable with the given headers.
#[async_trait]
pub trait StreamValidator: Send + Sync {
    async fn validate(
        &self,
        url: &str,
        headers: &FxHashMap<String, String>,
        bypass_ssl: bool,
    ) -> Result<(), ValidationFailure>;
}

/// Classifies a failed validation response.
pub fn classify(status: StatusCode, body: &str) -> ValidationFailure {
    let lowered = body.to_lowercase();
    if status == StatusCode::FORBIDDEN && WRONG_IP_MARKERS.iter().any(|m| lowered.contains(m)) {
        return ValidationFailure::WrongIp;
    }
    ValidationFailure::Http {
        status: status.as_u16(),
        body: body.trim().to_owned(),
    }
}

fn to_header_map(headers: &FxHashMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (key, value) in headers {
        match (HeaderName::from_str(key), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => debug!(header = %key, "Invalid header; skipping"),
        }
    }
    map
}

/// [`StreamValidator`] issuing a `HEAD` request, so the payload is never downloaded.
#[derive(Debug, Clone)]
pub struct HeadValidator {
    clients: HttpClients,
}

impl HeadValidator {
    pub fn new(clients: HttpClients) -> Self {
        Self { clients }
    }

    /// `HEAD` responses carry no body, so a bare 403 is re-requested with a
    /// small ranged `GET` to read the host's error page.
    async fn read_error_body(&self, url: &str, headers: &HeaderMap, bypass_ssl: bool) -> String {
        let mut probe_headers = headers.clone();
        probe_headers.insert(RANGE, HeaderValue::from_static("bytes=0-1023"));

        let mut response = match self
            .clients
            .select(bypass_ssl)
            .get(url)
            .headers(probe_headers)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!(url, error = %e, "Error body probe failed");
                return String::new();
            }
        };

        let mut body = Vec::new();
        while body.len() < ERROR_BODY_LIMIT {
            match response.chunk().await {
                Ok(Some(chunk)) => body.extend_from_slice(&chunk),
                _ => break,
            }
        }
        body.truncate(ERROR_BODY_LIMIT);
        String::from_utf8_lossy(&body).into_owned()
    }
}

#[async_trait]
impl StreamValidator for HeadValidator {
    async fn validate(
        &self,
        url: &str,
        headers: &FxHashMap<String, String>,
        bypass_ssl: bool,
    ) -> Result<(), ValidationFailure> {
        let header_map = to_header_map(headers);
        let response = self
            .clients
            .select(bypass_ssl)
            .head(url)
            .headers(header_map.clone())
            .send()
            .await
            .map_err(|e| ValidationFailure::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::PARTIAL_CONTENT {
            debug!(url, status = status.as_u16(), "Direct URL accessible");
            return Ok(());
        }

        let mut body = response.text().await.unwrap_or_default();
        if status == StatusCode::FORBIDDEN && body.trim().is_empty() {
            body = self.read_error_body(url, &header_map, bypass_ssl).await;
        }

        let failure = classify(status, &body);
        warn!(url, status = status.as_u16(), error = %failure, "Direct URL inaccessible");
        Err(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::config::ExtractorConfig;
    use crate::extractor::headers::playback_headers;
    use crate::media::MediaFormat;
    use axum::{
        Router,
        http::{HeaderMap as AxumHeaders, StatusCode as AxumStatus, header},
        response::IntoResponse,
        routing::get,
    };
    use tokio::net::TcpListener;

    async fn spawn_server(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn media(headers: AxumHeaders) -> impl IntoResponse {
        let referer_ok = headers
            .get(header::REFERER)
            .is_some_and(|v| v == "https://uqload.cx");
        match (referer_ok, headers.contains_key(header::RANGE)) {
            (false, _) => (AxumStatus::FORBIDDEN, "Forbidden"),
            (true, true) => (AxumStatus::PARTIAL_CONTENT, "ab"),
            (true, false) => (AxumStatus::OK, "abc"),
        }
    }

    async fn wrong_ip() -> impl IntoResponse {
        (AxumStatus::FORBIDDEN, "<html>error_wrong_ip</html>")
    }

    async fn stalled() -> impl IntoResponse {
        tokio::time::sleep(std::time::Duration::from_secs(3)).await;
        (AxumStatus::OK, "late")
    }

    async fn gone() -> impl IntoResponse {
        (AxumStatus::NOT_FOUND, "gone")
    }

    fn validator() -> HeadValidator {
        HeadValidator::new(HttpClients::new(&ExtractorConfig::default()).unwrap())
    }

    fn headers(referer: &str) -> FxHashMap<String, String> {
        playback_headers(&ExtractorConfig::default(), "sid=1", referer, MediaFormat::Mp4)
    }

    async fn server() -> String {
        spawn_server(
            Router::new()
                .route("/v.mp4", get(media))
                .route("/blocked.mp4", get(wrong_ip))
                .route("/gone.mp4", get(gone))
                .route("/stalled.mp4", get(stalled)),
        )
        .await
    }

    #[tokio::test]
    async fn partial_content_is_success() {
        let base = server().await;
        let result = validator()
            .validate(&format!("{base}/v.mp4"), &headers("https://uqload.cx"), false)
            .await;
        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn wrong_ip_marker_is_detected_through_probe() {
        let base = server().await;
        let result = validator()
            .validate(&format!("{base}/blocked.mp4"), &headers("https://uqload.cx"), true)
            .await;
        assert_eq!(result, Err(ValidationFailure::WrongIp));
    }

    #[tokio::test]
    async fn plain_forbidden_is_generic() {
        let base = server().await;
        let result = validator()
            .validate(&format!("{base}/v.mp4"), &headers("https://elsewhere.example"), false)
            .await;
        assert_eq!(
            result,
            Err(ValidationFailure::Http {
                status: 403,
                body: "Forbidden".to_string()
            })
        );
    }

    #[tokio::test]
    async fn not_found_is_generic() {
        let base = server().await;
        let failure = validator()
            .validate(&format!("{base}/gone.mp4"), &headers("https://uqload.cx"), false)
            .await
            .unwrap_err();
        assert_eq!(failure.status(), Some(404));
        assert_ne!(failure, ValidationFailure::WrongIp);
    }

    #[tokio::test]
    async fn timeout_is_a_transport_failure() {
        let base = server().await;
        let config = ExtractorConfig::default()
            .with_timeout(std::time::Duration::from_millis(300));
        let validator = HeadValidator::new(HttpClients::new(&config).unwrap());

        let started = std::time::Instant::now();
        let result = validator
            .validate(&format!("{base}/stalled.mp4"), &headers("https://uqload.cx"), false)
            .await;

        assert!(matches!(result, Err(ValidationFailure::Transport(_))));
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
    }

    #[test]
    fn classification_requires_forbidden_status() {
        assert_eq!(
            classify(StatusCode::FORBIDDEN, "Error: Wrong IP"),
            ValidationFailure::WrongIp
        );
        assert!(matches!(
            classify(StatusCode::NOT_FOUND, "error_wrong_ip"),
            ValidationFailure::Http { status: 404, .. }
        ));
    }
}
