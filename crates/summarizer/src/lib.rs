//! Summaries of archived pages.
//!
//! [`Summarizer`] is the seam the orchestrator calls; [`OpenAiCompatSummarizer`]
//! talks to any `/chat/completions` endpoint. [`summarize_with_retry`] wraps a
//! summarizer in a bounded retry loop driven by [`AttemptOutcome`].

pub mod error;
pub mod openai_compat;
pub mod retry;
pub mod types;

pub use {
    error::{Result, SummarizeError},
    openai_compat::OpenAiCompatSummarizer,
    retry::{AttemptOutcome, RetryFailure, classify, summarize_with_retry},
    types::{Summarizer, SummaryResponse},
};
