use {async_trait::async_trait, serde::Serialize};

use crate::error::Result;

/// What one summarization call produced.
///
/// A non-2xx reply from the API is still a response: `status` carries the
/// HTTP code and `message` the body, so callers can decide whether to retry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryResponse {
    pub status: u16,
    pub message: String,
    pub content: String,
    /// Human-readable token usage, appended to summary replies.
    pub usage: String,
}

impl SummaryResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Generates a summary for a prompt.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, prompt: &str) -> Result<SummaryResponse>;
}
