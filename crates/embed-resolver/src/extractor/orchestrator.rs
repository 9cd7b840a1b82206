use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::ExtractorConfig;
use super::diagnostics;
use super::error::ExtractorError;
use super::fetcher::PageFetcher;
use super::headers::{playback_headers, referer_from_url};
use super::hosts::HostProfile;
use super::metadata::extract_metadata;
use super::parser::{CONTENT_ABSENT_MARKERS, parse};
use super::retriever::{PagePair, fetch_both};
use super::validator::{StreamValidator, ValidationFailure};
use crate::media::{CandidateStream, ExtractedStreamInfo};

/// What the retry loop does after one attempt.
#[derive(Debug)]
enum AttemptOutcome {
    Success(Box<ExtractedStreamInfo>),
    Retry(ExtractorError),
    Fail(ExtractorError),
}

/// Resolves one embed URL into a validated stream.
///
/// Each attempt fetches the embed page and its non-embed variant in parallel,
/// runs the parser cascade and validates the candidate against the media host.
/// Only transport failures and wrong-IP rejections are retried; TLS
/// verification is relaxed from [`ExtractorConfig::ssl_bypass_from_attempt`]
/// onward.
pub struct EmbedExtractor {
    url: String,
    profile: &'static HostProfile,
    fetcher: Arc<dyn PageFetcher>,
    validator: Arc<dyn StreamValidator>,
    config: ExtractorConfig,
}

impl EmbedExtractor {
    pub fn new(
        url: impl Into<String>,
        profile: &'static HostProfile,
        fetcher: Arc<dyn PageFetcher>,
        validator: Arc<dyn StreamValidator>,
        config: ExtractorConfig,
    ) -> Self {
        Self {
            url: url.into(),
            profile,
            fetcher,
            validator,
            config,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn profile(&self) -> &'static HostProfile {
        self.profile
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub async fn extract(&self) -> Result<ExtractedStreamInfo, ExtractorError> {
        let started = Instant::now();
        let normalized = self.profile.normalize_url(&self.url);
        let max = self.config.attempts();
        let mut last_error = None;

        for attempt in 0..max {
            if attempt > 0 && !self.config.retry_delay.is_zero() {
                tokio::time::sleep(self.config.retry_delay).await;
            }

            let bypass_ssl = self.config.bypass_ssl_for(attempt);
            info!(
                attempt = attempt + 1,
                max,
                bypass_ssl,
                url = %normalized,
                host = self.profile.name,
                "Extraction attempt"
            );

            match self.attempt(&normalized, bypass_ssl).await {
                AttemptOutcome::Success(stream) => {
                    info!(
                        url = %stream.url,
                        format = %stream.format,
                        attempt = attempt + 1,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Stream resolved"
                    );
                    return Ok(*stream);
                }
                AttemptOutcome::Retry(error) => {
                    warn!(attempt = attempt + 1, max, error = %error, "Attempt failed");
                    last_error = Some(error);
                }
                AttemptOutcome::Fail(error) => {
                    warn!(attempt = attempt + 1, error = %error, "Extraction failed");
                    return Err(error);
                }
            }
        }

        Err(ExtractorError::retries_exhausted(max, last_error))
    }

    /// Like [`extract`](Self::extract), abandoning in-flight requests once
    /// `token` is cancelled.
    pub async fn extract_with_cancel(
        &self,
        token: &CancellationToken,
    ) -> Result<ExtractedStreamInfo, ExtractorError> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(url = %self.url, "Extraction cancelled");
                Err(ExtractorError::Cancelled)
            }
            result = self.extract() => result,
        }
    }

    async fn attempt(&self, url: &str, bypass_ssl: bool) -> AttemptOutcome {
        let pages = fetch_both(self.fetcher.as_ref(), url, bypass_ssl).await;
        if pages.is_empty() {
            return AttemptOutcome::Retry(ExtractorError::NetworkUnreachable);
        }
        if pages.contains_any(CONTENT_ABSENT_MARKERS) {
            return AttemptOutcome::Fail(ExtractorError::ContentAbsent);
        }

        let Some(candidate) = self.find_candidate(&pages) else {
            if let Some(body) = pages.primary() {
                diagnostics::log_search_hints(body);
            }
            return AttemptOutcome::Fail(ExtractorError::NoCandidateFound);
        };
        let format = candidate.format();

        let brand = self.profile.brand_for(&self.url);
        let metadata = pages
            .metadata_source()
            .map(|body| extract_metadata(body, brand.as_deref()))
            .unwrap_or_default();
        debug!(?metadata, "Metadata extracted");

        let validation_referer = referer_from_url(url, self.profile.fallback_origin);
        let validation_headers =
            playback_headers(&self.config, &pages.cookies, &validation_referer, format);

        match self
            .validator
            .validate(candidate.url(), &validation_headers, bypass_ssl)
            .await
        {
            Ok(()) => {}
            Err(ValidationFailure::WrongIp) => {
                return AttemptOutcome::Retry(ExtractorError::WrongIpOrAccessDenied);
            }
            Err(failure) => {
                return AttemptOutcome::Fail(ExtractorError::validation_failed(
                    failure.status(),
                    failure.to_string(),
                ));
            }
        }

        // The player replays headers against the host the caller asked for.
        let referer = referer_from_url(&self.url, self.profile.fallback_origin);
        let headers = playback_headers(&self.config, &pages.cookies, &referer, format);

        let stream = ExtractedStreamInfo::builder(candidate.into_url(), format)
            .title_opt(metadata.title)
            .quality_opt(metadata.quality)
            .duration_opt(metadata.duration)
            .thumbnail_opt(metadata.thumbnail)
            .headers(headers)
            .build();
        AttemptOutcome::Success(Box::new(stream))
    }

    fn find_candidate(&self, pages: &PagePair) -> Option<CandidateStream> {
        pages
            .primary()
            .and_then(|body| parse(body, self.profile))
            .or_else(|| pages.secondary().and_then(|body| parse(body, self.profile)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::fetcher::FetchResult;
    use crate::extractor::hosts::{GENERIC, UQLOAD};
    use crate::media::MediaFormat;
    use async_trait::async_trait;
    use rustc_hash::FxHashMap;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    const EMBED: &str = "https://uqload.to/embed-abc123";
    const FETCHED_EMBED: &str = "https://uqload.cx/embed-abc123";
    const FETCHED_PAGE: &str = "https://uqload.cx/abc123";
    const STREAM: &str = "https://cdn.example/abc123/v.mp4";

    fn player_page() -> String {
        format!(r#"<script>player.setup({{ sources: [{{file: "{STREAM}"}}] }});</script>"#)
    }

    #[derive(Default)]
    struct FakeFetcher {
        pages: FxHashMap<String, FetchResult>,
        delay: Duration,
        calls: Mutex<Vec<(String, bool)>>,
    }

    impl FakeFetcher {
        fn with(pages: &[(&str, FetchResult)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, result)| (url.to_string(), result.clone()))
                    .collect(),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<(String, bool)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str, bypass_ssl: bool) -> FetchResult {
            self.calls.lock().unwrap().push((url.to_string(), bypass_ssl));
            tokio::time::sleep(self.delay).await;
            self.pages.get(url).cloned().unwrap_or_default()
        }
    }

    struct ValidationCall {
        url: String,
        headers: FxHashMap<String, String>,
        bypass_ssl: bool,
    }

    /// Replays scripted results in order, then accepts everything.
    #[derive(Default)]
    struct FakeValidator {
        script: Mutex<VecDeque<Result<(), ValidationFailure>>>,
        calls: Mutex<Vec<ValidationCall>>,
    }

    impl FakeValidator {
        fn scripted(results: Vec<Result<(), ValidationFailure>>) -> Self {
            Self {
                script: Mutex::new(results.into()),
                ..Self::default()
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl StreamValidator for FakeValidator {
        async fn validate(
            &self,
            url: &str,
            headers: &FxHashMap<String, String>,
            bypass_ssl: bool,
        ) -> Result<(), ValidationFailure> {
            self.calls.lock().unwrap().push(ValidationCall {
                url: url.to_string(),
                headers: headers.clone(),
                bypass_ssl,
            });
            self.script.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }
    }

    fn extractor(
        url: &str,
        fetcher: &Arc<FakeFetcher>,
        validator: &Arc<FakeValidator>,
        config: ExtractorConfig,
    ) -> EmbedExtractor {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let fetcher: Arc<dyn PageFetcher> = fetcher.clone();
        let validator: Arc<dyn StreamValidator> = validator.clone();
        EmbedExtractor::new(url, &UQLOAD, fetcher, validator, config)
    }

    #[tokio::test]
    async fn resolves_structured_source_from_embed_page() {
        let fetcher = Arc::new(FakeFetcher::with(&[(
            FETCHED_EMBED,
            FetchResult::new(player_page(), "sid=1"),
        )]));
        let validator = Arc::new(FakeValidator::default());

        let stream = extractor(EMBED, &fetcher, &validator, ExtractorConfig::default())
            .extract()
            .await
            .unwrap();

        assert_eq!(stream.url, STREAM);
        assert_eq!(stream.format, MediaFormat::Mp4);
        assert_eq!(stream.format.as_str(), "mp4");

        let fetched: Vec<String> = fetcher.calls().into_iter().map(|(url, _)| url).collect();
        assert!(fetched.contains(&FETCHED_EMBED.to_string()));
        assert!(fetched.contains(&FETCHED_PAGE.to_string()));
        assert_eq!(validator.calls.lock().unwrap()[0].url, STREAM);
    }

    #[tokio::test]
    async fn returned_headers_use_original_host() {
        let fetcher = Arc::new(FakeFetcher::with(&[(
            "https://uqload.cx/embed-xyz",
            FetchResult::new(player_page(), ""),
        )]));
        let validator = Arc::new(FakeValidator::default());

        let stream = extractor(
            "https://uqload.to/embed-xyz",
            &fetcher,
            &validator,
            ExtractorConfig::default(),
        )
        .extract()
        .await
        .unwrap();

        assert_eq!(stream.header("Referer"), Some("https://uqload.to"));
        assert_eq!(stream.header("Origin"), Some("https://uqload.to"));

        let calls = validator.calls.lock().unwrap();
        assert_eq!(
            calls[0].headers.get("Referer").map(String::as_str),
            Some("https://uqload.cx")
        );
    }

    #[tokio::test]
    async fn deleted_marker_skips_validation() {
        let body = format!("<p>File was deleted</p>{}", player_page());
        let fetcher = Arc::new(FakeFetcher::with(&[(FETCHED_EMBED, FetchResult::new(body, ""))]));
        let validator = Arc::new(FakeValidator::default());

        let result = extractor(EMBED, &fetcher, &validator, ExtractorConfig::default())
            .extract()
            .await;

        assert!(matches!(result, Err(ExtractorError::ContentAbsent)));
        assert_eq!(validator.call_count(), 0);
    }

    #[tokio::test]
    async fn not_found_marker_fails_after_one_attempt() {
        let fetcher = Arc::new(FakeFetcher::with(&[(
            FETCHED_PAGE,
            FetchResult::new("<h1>File not found</h1>", ""),
        )]));
        let validator = Arc::new(FakeValidator::default());

        let result = extractor(EMBED, &fetcher, &validator, ExtractorConfig::default())
            .extract()
            .await;

        assert!(matches!(result, Err(ExtractorError::ContentAbsent)));
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn empty_pages_exhaust_every_attempt() {
        let fetcher = Arc::new(FakeFetcher::default());
        let validator = Arc::new(FakeValidator::default());

        let result = extractor(EMBED, &fetcher, &validator, ExtractorConfig::default())
            .extract()
            .await;

        match result {
            Err(ExtractorError::RetriesExhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(last.as_deref(), Some(ExtractorError::NetworkUnreachable)));
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let bypass: Vec<bool> = fetcher.calls().into_iter().map(|(_, b)| b).collect();
        assert_eq!(bypass, vec![false, false, true, true, true, true]);
        assert_eq!(validator.call_count(), 0);
    }

    #[tokio::test]
    async fn falls_back_to_non_embed_page() {
        let fetcher = Arc::new(FakeFetcher::with(&[(
            FETCHED_PAGE,
            FetchResult::new(player_page(), "b=2"),
        )]));
        let validator = Arc::new(FakeValidator::default());

        let stream = extractor(EMBED, &fetcher, &validator, ExtractorConfig::default())
            .extract()
            .await
            .unwrap();

        assert_eq!(stream.url, STREAM);
        assert_eq!(stream.header("Cookie"), Some("b=2"));
    }

    #[tokio::test]
    async fn embed_cookies_take_priority() {
        let fetcher = Arc::new(FakeFetcher::with(&[
            (FETCHED_EMBED, FetchResult::new(player_page(), "a=1")),
            (FETCHED_PAGE, FetchResult::new("<html></html>", "b=2")),
        ]));
        let validator = Arc::new(FakeValidator::default());

        let stream = extractor(EMBED, &fetcher, &validator, ExtractorConfig::default())
            .extract()
            .await
            .unwrap();

        assert_eq!(stream.header("Cookie"), Some("a=1"));
        let calls = validator.calls.lock().unwrap();
        assert_eq!(calls[0].headers.get("Cookie").map(String::as_str), Some("a=1"));
    }

    #[tokio::test]
    async fn wrong_ip_retries_with_ssl_bypass() {
        let fetcher = Arc::new(FakeFetcher::with(&[(
            FETCHED_EMBED,
            FetchResult::new(player_page(), ""),
        )]));
        let validator = Arc::new(FakeValidator::scripted(vec![Err(ValidationFailure::WrongIp)]));

        let stream = extractor(EMBED, &fetcher, &validator, ExtractorConfig::default())
            .extract()
            .await
            .unwrap();
        assert_eq!(stream.url, STREAM);

        let bypass: Vec<bool> = validator
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| call.bypass_ssl)
            .collect();
        assert_eq!(bypass, vec![false, true]);
        assert_eq!(fetcher.calls().len(), 4);
        assert!(fetcher.calls()[2..].iter().all(|(_, bypass)| *bypass));
    }

    #[tokio::test]
    async fn generic_validation_failure_is_not_retried() {
        let fetcher = Arc::new(FakeFetcher::with(&[(
            FETCHED_EMBED,
            FetchResult::new(player_page(), ""),
        )]));
        let validator = Arc::new(FakeValidator::scripted(vec![Err(ValidationFailure::Http {
            status: 404,
            body: "gone".to_string(),
        })]));

        let result = extractor(EMBED, &fetcher, &validator, ExtractorConfig::default())
            .extract()
            .await;

        assert!(matches!(
            result,
            Err(ExtractorError::ValidationFailed { status: Some(404), .. })
        ));
        assert_eq!(validator.call_count(), 1);
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn persistent_wrong_ip_reports_last_error() {
        let fetcher = Arc::new(FakeFetcher::with(&[(
            FETCHED_EMBED,
            FetchResult::new(player_page(), ""),
        )]));
        let validator = Arc::new(FakeValidator::scripted(vec![
            Err(ValidationFailure::WrongIp),
            Err(ValidationFailure::WrongIp),
        ]));
        let config = ExtractorConfig::default().with_max_retries(2);

        let result = extractor(EMBED, &fetcher, &validator, config).extract().await;

        match result {
            Err(ExtractorError::RetriesExhausted { attempts, last }) => {
                assert_eq!(attempts, 2);
                assert!(matches!(
                    last.as_deref(),
                    Some(ExtractorError::WrongIpOrAccessDenied)
                ));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn page_without_candidate_fails() {
        let fetcher = Arc::new(FakeFetcher::with(&[(
            FETCHED_EMBED,
            FetchResult::new("<html><body>nothing to see</body></html>", ""),
        )]));
        let validator = Arc::new(FakeValidator::default());

        let result = extractor(EMBED, &fetcher, &validator, ExtractorConfig::default())
            .extract()
            .await;

        assert!(matches!(result, Err(ExtractorError::NoCandidateFound)));
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn metadata_prefers_watch_page() {
        let fetcher = Arc::new(FakeFetcher::with(&[
            (FETCHED_EMBED, FetchResult::new(player_page(), "")),
            (
                FETCHED_PAGE,
                FetchResult::new("<h1>Night of the Hunter</h1><p>[1920x1080, 01:32:00]</p>", ""),
            ),
        ]));
        let validator = Arc::new(FakeValidator::default());

        let stream = extractor(EMBED, &fetcher, &validator, ExtractorConfig::default())
            .extract()
            .await
            .unwrap();

        assert_eq!(stream.title.as_deref(), Some("Night of the Hunter"));
        assert_eq!(stream.quality.as_deref(), Some("1920x1080"));
        assert_eq!(stream.duration.as_deref(), Some("01:32:00"));
    }

    #[tokio::test]
    async fn zero_retries_still_attempts_once() {
        let fetcher = Arc::new(FakeFetcher::default());
        let validator = Arc::new(FakeValidator::default());
        let config = ExtractorConfig::default().with_max_retries(0);

        let result = extractor(EMBED, &fetcher, &validator, config).extract().await;

        assert!(matches!(
            result,
            Err(ExtractorError::RetriesExhausted { attempts: 1, .. })
        ));
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn unknown_host_falls_back_to_default_origin() {
        let fetcher = Arc::new(FakeFetcher::with(&[(
            "not a url/embed-1",
            FetchResult::new(player_page(), ""),
        )]));
        let validator = Arc::new(FakeValidator::default());
        let fetcher_dyn: Arc<dyn PageFetcher> = fetcher.clone();
        let validator_dyn: Arc<dyn StreamValidator> = validator.clone();

        let stream = EmbedExtractor::new(
            "not a url/embed-1",
            &GENERIC,
            fetcher_dyn,
            validator_dyn,
            ExtractorConfig::default(),
        )
        .extract()
        .await
        .unwrap();

        assert_eq!(stream.header("Referer"), Some("https://uqload.cx"));
    }

    #[tokio::test]
    async fn cancellation_abandons_slow_fetches() {
        let fetcher = Arc::new(FakeFetcher {
            delay: Duration::from_secs(30),
            ..FakeFetcher::default()
        });
        let validator = Arc::new(FakeValidator::default());
        let extractor = extractor(EMBED, &fetcher, &validator, ExtractorConfig::default());

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let started = Instant::now();
        let result = extractor.extract_with_cancel(&token).await;

        assert!(matches!(result, Err(ExtractorError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
