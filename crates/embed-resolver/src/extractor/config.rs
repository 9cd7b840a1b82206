use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:130.0) Gecko/20100101 Firefox/130.0";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Tunables for fetching, validation and the retry loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Applied as both connect and read timeout to every request.
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,

    /// Total number of attempts, including the first one.
    pub max_retries: u32,

    pub user_agent: String,

    pub accept_language: String,

    /// 0-indexed attempt from which certificate checks are skipped.
    /// `None` never relaxes TLS verification.
    pub ssl_bypass_from_attempt: Option<u32>,

    /// Pause between two attempts.
    #[serde(rename = "retry_delay_ms", with = "duration_ms")]
    pub retry_delay: Duration,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_owned(),
            ssl_bypass_from_attempt: Some(1),
            retry_delay: Duration::ZERO,
        }
    }
}

impl ExtractorConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_ssl_bypass_from_attempt(mut self, attempt: Option<u32>) -> Self {
        self.ssl_bypass_from_attempt = attempt;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Attempt budget, never below one.
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Whether the given 0-indexed attempt runs with TLS verification disabled.
    pub fn bypass_ssl_for(&self, attempt: u32) -> bool {
        self.ssl_bypass_from_attempt
            .is_some_and(|from| attempt >= from)
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
