use thiserror::Error;

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("summarizer API key is not configured")]
    MissingApiKey,

    /// The request could not be built; retrying will not help.
    #[error("invalid summarizer request: {0}")]
    Request(String),

    #[error("summarizer request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected summarizer response: {0}")]
    Decode(String),
}

impl SummarizeError {
    #[must_use]
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request(message.into())
    }

    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }
}

pub type Result<T, E = SummarizeError> = std::result::Result<T, E>;
