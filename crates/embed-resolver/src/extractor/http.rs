use reqwest::Client;

use super::config::ExtractorConfig;

/// Builds the client used for regular, verified requests.
///
/// Transport-level decompression is disabled: page bodies are decoded by
/// their declared `Content-Encoding` in the fetcher.
pub fn default_client(config: &ExtractorConfig) -> Result<Client, reqwest::Error> {
    base_builder(config).build()
}

/// Builds a client that accepts any certificate and hostname.
///
/// This is a deliberate, scoped relaxation for hosts serving self-signed or
/// misconfigured certificates. It is only ever selected for escalated
/// attempts (see [`ExtractorConfig::bypass_ssl_for`]), never as a default.
pub fn insecure_client(config: &ExtractorConfig) -> Result<Client, reqwest::Error> {
    // With rustls, skipping certificate verification also skips the hostname check.
    base_builder(config)
        .danger_accept_invalid_certs(true)
        .build()
}

fn base_builder(config: &ExtractorConfig) -> reqwest::ClientBuilder {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(config.timeout)
        .read_timeout(config.timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .no_gzip()
        .no_deflate()
}

/// The pair of clients an extraction chooses from per request.
#[derive(Debug, Clone)]
pub struct HttpClients {
    verified: Client,
    insecure: Client,
}

impl HttpClients {
    pub fn new(config: &ExtractorConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            verified: default_client(config)?,
            insecure: insecure_client(config)?,
        })
    }

    pub fn select(&self, bypass_ssl: bool) -> &Client {
        if bypass_ssl {
            &self.insecure
        } else {
            &self.verified
        }
    }
}
