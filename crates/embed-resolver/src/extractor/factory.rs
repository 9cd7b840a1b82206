use std::sync::Arc;

use tracing::debug;
use url::Url;

use super::config::ExtractorConfig;
use super::error::ExtractorError;
use super::fetcher::{HttpPageFetcher, PageFetcher};
use super::hosts::{self, HostProfile};
use super::http::HttpClients;
use super::orchestrator::EmbedExtractor;
use super::validator::{HeadValidator, StreamValidator};

/// Builds [`EmbedExtractor`]s sharing one pair of HTTP clients.
pub struct ExtractorFactory {
    fetcher: Arc<dyn PageFetcher>,
    validator: Arc<dyn StreamValidator>,
    config: ExtractorConfig,
}

impl ExtractorFactory {
    pub fn new(config: ExtractorConfig) -> Result<Self, ExtractorError> {
        let clients = HttpClients::new(&config)?;
        Ok(Self::with_components(
            Arc::new(HttpPageFetcher::new(clients.clone(), config.clone())),
            Arc::new(HeadValidator::new(clients)),
            config,
        ))
    }

    /// Factory over caller-supplied fetch and validation backends.
    pub fn with_components(
        fetcher: Arc<dyn PageFetcher>,
        validator: Arc<dyn StreamValidator>,
        config: ExtractorConfig,
    ) -> Self {
        Self {
            fetcher,
            validator,
            config,
        }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Host profiles with dedicated rules, in matching order.
    pub fn hosts(&self) -> &'static [&'static HostProfile] {
        hosts::PROFILES
    }

    pub fn create_extractor(&self, url: &str) -> Result<EmbedExtractor, ExtractorError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ExtractorError::InvalidUrl("empty url".to_string()));
        }
        if let Ok(parsed) = Url::parse(url) {
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ExtractorError::InvalidUrl(format!(
                    "unsupported scheme {}: {url}",
                    parsed.scheme()
                )));
            }
        }

        let profile = hosts::profile_for(url);
        debug!(url, host = profile.name, "Selected host profile");
        Ok(EmbedExtractor::new(
            url,
            profile,
            self.fetcher.clone(),
            self.validator.clone(),
            self.config.clone(),
        ))
    }
}

/// Factory with [`ExtractorConfig::default`].
pub fn default_factory() -> Result<ExtractorFactory, ExtractorError> {
    ExtractorFactory::new(ExtractorConfig::default())
}
