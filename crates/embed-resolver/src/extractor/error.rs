use thiserror::Error;

/// Failure modes of an extraction call.
///
/// Only [`NetworkUnreachable`](Self::NetworkUnreachable) and
/// [`WrongIpOrAccessDenied`](Self::WrongIpOrAccessDenied) lead to another
/// attempt; every other variant ends the call.
#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("the video has been deleted or does not exist")]
    ContentAbsent,
    #[error("no video stream found")]
    NoCandidateFound,
    #[error("no content fetched from either page")]
    NetworkUnreachable,
    #[error("stream host rejected the requesting address (error_wrong_ip)")]
    WrongIpOrAccessDenied,
    #[error("direct url inaccessible: {reason}")]
    ValidationFailed { status: Option<u16>, reason: String },
    #[error("failed after {attempts} attempts{}", .last.as_ref().map(|e| format!(": {e}")).unwrap_or_default())]
    RetriesExhausted {
        attempts: u32,
        last: Option<Box<ExtractorError>>,
    },
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("extraction cancelled")]
    Cancelled,
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl ExtractorError {
    pub fn validation_failed(status: Option<u16>, reason: impl Into<String>) -> Self {
        Self::ValidationFailed {
            status,
            reason: reason.into(),
        }
    }

    pub fn retries_exhausted(attempts: u32, last: Option<ExtractorError>) -> Self {
        Self::RetriesExhausted {
            attempts,
            last: last.map(Box::new),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NetworkUnreachable | Self::WrongIpOrAccessDenied => true,
            Self::ContentAbsent
            | Self::NoCandidateFound
            | Self::ValidationFailed { .. }
            | Self::RetriesExhausted { .. }
            | Self::InvalidUrl(_)
            | Self::Cancelled
            | Self::HttpError(_) => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_and_wrong_ip_are_retryable() {
        assert!(ExtractorError::NetworkUnreachable.is_retryable());
        assert!(ExtractorError::WrongIpOrAccessDenied.is_retryable());
        assert!(ExtractorError::ContentAbsent.is_terminal());
        assert!(ExtractorError::NoCandidateFound.is_terminal());
        assert!(ExtractorError::validation_failed(Some(404), "HTTP 404").is_terminal());
    }

    #[test]
    fn exhausted_message_includes_last_cause() {
        let err = ExtractorError::retries_exhausted(3, Some(ExtractorError::NetworkUnreachable));
        assert_eq!(
            err.to_string(),
            "failed after 3 attempts: no content fetched from either page"
        );
        assert_eq!(
            ExtractorError::retries_exhausted(2, None).to_string(),
            "failed after 2 attempts"
        );
    }
}
