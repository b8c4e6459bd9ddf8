//! Bounded retries around a [`Summarizer`].

#[cfg(feature = "metrics")]
use std::time::Instant;

use tracing::{debug, warn};

#[cfg(feature = "metrics")]
use pagekeep_metrics::{counter, histogram, labels, summarizer as sum_metrics};

use crate::{
    error::{Result, SummarizeError},
    types::{Summarizer, SummaryResponse},
};

/// How one attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success(SummaryResponse),
    /// Worth another try; carries the error text.
    Retryable(String),
    /// Another try would fail the same way.
    Fatal(String),
}

/// Why [`summarize_with_retry`] gave up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryFailure {
    /// Every attempt failed; holds the last error text.
    Exhausted { attempts: u32, last_error: String },
    Fatal(String),
}

impl RetryFailure {
    /// Error text suitable for a reply.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Exhausted { last_error, .. } => last_error,
            Self::Fatal(message) => message,
        }
    }
}

impl std::fmt::Display for RetryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exhausted {
                attempts,
                last_error,
            } => write!(f, "gave up after {attempts} attempts: {last_error}"),
            Self::Fatal(message) => write!(f, "{message}"),
        }
    }
}

/// Sort a summarizer result into success, retryable or fatal.
#[must_use]
pub fn classify(result: Result<SummaryResponse>) -> AttemptOutcome {
    match result {
        Ok(response) if response.is_success() => AttemptOutcome::Success(response),
        Ok(response) => {
            let detail = if response.message.is_empty() {
                "empty response body".to_string()
            } else {
                response.message
            };
            AttemptOutcome::Retryable(format!("HTTP {}: {detail}", response.status))
        },
        Err(e @ (SummarizeError::MissingApiKey | SummarizeError::Request(_))) => {
            AttemptOutcome::Fatal(e.to_string())
        },
        Err(e @ (SummarizeError::Transport { .. } | SummarizeError::Decode(_))) => {
            AttemptOutcome::Retryable(e.to_string())
        },
    }
}

/// Call `summarizer` up to `attempts` times (at least once).
///
/// Stops at the first success or fatal outcome. Attempts follow each other
/// immediately.
pub async fn summarize_with_retry(
    summarizer: &dyn Summarizer,
    prompt: &str,
    attempts: u32,
) -> std::result::Result<SummaryResponse, RetryFailure> {
    let attempts = attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        #[cfg(feature = "metrics")]
        let started = Instant::now();

        let outcome = classify(summarizer.summarize(prompt).await);

        #[cfg(feature = "metrics")]
        {
            let status = match &outcome {
                AttemptOutcome::Success(_) => "success",
                AttemptOutcome::Retryable(_) => "retryable",
                AttemptOutcome::Fatal(_) => "fatal",
            };
            counter!(sum_metrics::ATTEMPTS_TOTAL, labels::STATUS => status).increment(1);
            histogram!(sum_metrics::REQUEST_DURATION_SECONDS)
                .record(started.elapsed().as_secs_f64());
        }

        match outcome {
            AttemptOutcome::Success(response) => {
                debug!(attempt, "summary generated");
                return Ok(response);
            },
            AttemptOutcome::Fatal(message) => {
                warn!(attempt, error = %message, "summary failed permanently");
                #[cfg(feature = "metrics")]
                counter!(sum_metrics::FAILURES_TOTAL).increment(1);
                return Err(RetryFailure::Fatal(message));
            },
            AttemptOutcome::Retryable(message) => {
                warn!(attempt, attempts, error = %message, "summary attempt failed");
                last_error = message;
            },
        }
    }

    #[cfg(feature = "metrics")]
    counter!(sum_metrics::FAILURES_TOTAL).increment(1);
    Err(RetryFailure::Exhausted {
        attempts,
        last_error,
    })
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        async_trait::async_trait,
        rstest::rstest,
        std::sync::{
            Mutex,
            atomic::{AtomicU32, Ordering},
        },
    };

    /// Plays back canned results in order.
    struct Scripted {
        results: Mutex<Vec<Result<SummaryResponse>>>,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(mut results: Vec<Result<SummaryResponse>>) -> Self {
            results.reverse();
            Self {
                results: Mutex::new(results),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Summarizer for Scripted {
        async fn summarize(&self, _prompt: &str) -> Result<SummaryResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.results
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(SummarizeError::decode("script exhausted")))
        }
    }

    fn ok(content: &str) -> Result<SummaryResponse> {
        Ok(SummaryResponse {
            status: 200,
            message: String::new(),
            content: content.into(),
            usage: "12 tokens".into(),
        })
    }

    fn http(status: u16, body: &str) -> Result<SummaryResponse> {
        Ok(SummaryResponse {
            status,
            message: body.into(),
            ..Default::default()
        })
    }

    #[rstest]
    #[case(http(500, "boom"), "HTTP 500: boom")]
    #[case(http(429, ""), "HTTP 429: empty response body")]
    #[case(Err(SummarizeError::decode("bad json")), "unexpected summarizer response: bad json")]
    fn retryable_outcomes(#[case] result: Result<SummaryResponse>, #[case] expected: &str) {
        assert_eq!(classify(result), AttemptOutcome::Retryable(expected.into()));
    }

    #[rstest]
    #[case(Err(SummarizeError::MissingApiKey))]
    #[case(Err(SummarizeError::request("bad url")))]
    fn fatal_outcomes(#[case] result: Result<SummaryResponse>) {
        assert!(matches!(classify(result), AttemptOutcome::Fatal(_)));
    }

    #[tokio::test]
    async fn first_success_wins() {
        let s = Scripted::new(vec![ok("hello"), ok("never")]);
        let response = summarize_with_retry(&s, "p", 3).await.unwrap();
        assert_eq!(response.content, "hello");
        assert_eq!(s.calls(), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let s = Scripted::new(vec![http(500, "a"), http(502, "b"), ok("third")]);
        let response = summarize_with_retry(&s, "p", 3).await.unwrap();
        assert_eq!(response.content, "third");
        assert_eq!(s.calls(), 3);
    }

    #[tokio::test]
    async fn exhaustion_keeps_last_error() {
        let s = Scripted::new(vec![http(500, "a"), http(502, "b"), http(503, "c")]);
        let err = summarize_with_retry(&s, "p", 3).await.unwrap_err();
        assert_eq!(err, RetryFailure::Exhausted {
            attempts: 3,
            last_error: "HTTP 503: c".into(),
        });
        assert_eq!(err.message(), "HTTP 503: c");
        assert_eq!(s.calls(), 3);
    }

    #[tokio::test]
    async fn fatal_stops_immediately() {
        let s = Scripted::new(vec![Err(SummarizeError::MissingApiKey), ok("never")]);
        let err = summarize_with_retry(&s, "p", 3).await.unwrap_err();
        assert!(matches!(err, RetryFailure::Fatal(_)));
        assert_eq!(s.calls(), 1);
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let s = Scripted::new(vec![ok("x")]);
        assert!(summarize_with_retry(&s, "p", 0).await.is_ok());
        assert_eq!(s.calls(), 1);
    }
}
