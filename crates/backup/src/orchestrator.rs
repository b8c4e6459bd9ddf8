//! Processing one matched command/link pair.

use std::sync::Arc;

#[cfg(feature = "metrics")]
use std::time::Instant;

use {
    pagekeep_browser::{ContentFetcher, html_to_text},
    pagekeep_channels::ChannelOutbound,
    pagekeep_config::PagekeepConfig,
    pagekeep_correlation::MatchedRequest,
    pagekeep_repository::RepositoryStore,
    pagekeep_summarizer::{Summarizer, summarize_with_retry},
    tracing::{info, warn},
};

#[cfg(feature = "metrics")]
use pagekeep_metrics::{backup as backup_metrics, counter, histogram};

use crate::{paths::ArchivePath, replies};

/// Static inputs of the pipeline.
#[derive(Debug, Clone)]
pub struct BackupSettings {
    pub prompt: String,
    pub summary_attempts: u32,
    pub path_prefix: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl BackupSettings {
    #[must_use]
    pub fn from_config(config: &PagekeepConfig) -> Self {
        Self {
            prompt: config.summarizer.prompt.clone(),
            summary_attempts: config.summarizer.max_attempts,
            path_prefix: config.backup.path_prefix.clone(),
            owner: config.repository.owner.clone(),
            repo: config.repository.name.clone(),
            branch: config.repository.branch.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded,
    Failed,
}

/// What happened to one matched request. Steps that were not requested, or
/// never ran because the fetch failed, are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub fetched: bool,
    pub summary: Option<StepOutcome>,
    pub backup: Option<StepOutcome>,
}

/// Fetches the page once and runs the requested steps against it.
pub struct BackupOrchestrator {
    fetcher: Arc<dyn ContentFetcher>,
    summarizer: Arc<dyn Summarizer>,
    store: Arc<dyn RepositoryStore>,
    outbound: Arc<dyn ChannelOutbound>,
    settings: BackupSettings,
}

impl BackupOrchestrator {
    pub fn new(
        fetcher: Arc<dyn ContentFetcher>,
        summarizer: Arc<dyn Summarizer>,
        store: Arc<dyn RepositoryStore>,
        outbound: Arc<dyn ChannelOutbound>,
        settings: BackupSettings,
    ) -> Self {
        Self {
            fetcher,
            summarizer,
            store,
            outbound,
            settings,
        }
    }

    async fn reply(&self, to: &str, text: &str) {
        if let Err(e) = self.outbound.send_text(to, text).await {
            warn!(sender_id = to, error = %e, "failed to deliver reply");
        }
    }

    /// Run the pipeline for `request`. Every run sends at least one reply.
    pub async fn process(&self, request: MatchedRequest) -> RunReport {
        let MatchedRequest {
            sender_id,
            commands,
            link,
        } = request;
        let url = link.url.as_str();
        info!(sender_id = %sender_id, url, commands = %commands, "processing matched request");

        #[cfg(feature = "metrics")]
        counter!(backup_metrics::RUNS_TOTAL).increment(1);
        #[cfg(feature = "metrics")]
        let started = Instant::now();

        let fetched = self.fetcher.fetch(url).await;

        #[cfg(feature = "metrics")]
        histogram!(backup_metrics::FETCH_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        let html = match fetched {
            Ok(html) => html,
            Err(e) => {
                warn!(sender_id = %sender_id, url, error = %e, "page fetch failed");
                #[cfg(feature = "metrics")]
                counter!(backup_metrics::FETCH_ERRORS_TOTAL).increment(1);
                self.reply(&sender_id, &replies::fetch_failed(url, &e)).await;
                return RunReport {
                    fetched: false,
                    summary: None,
                    backup: None,
                };
            },
        };

        let mut report = RunReport {
            fetched: true,
            summary: None,
            backup: None,
        };

        if commands.wants_summary() {
            let (text, outcome) = self.summarize(url, &html).await;
            self.reply(&sender_id, &text).await;
            report.summary = Some(outcome);
        }

        if commands.wants_backup() {
            let (text, outcome) = self.archive(url, &link.source, &link.title, &html).await;
            self.reply(&sender_id, &text).await;
            report.backup = Some(outcome);
        }

        report
    }

    async fn summarize(&self, url: &str, html: &str) -> (String, StepOutcome) {
        let prompt = format!("{}{}", self.settings.prompt, html_to_text(html));
        match summarize_with_retry(
            self.summarizer.as_ref(),
            &prompt,
            self.settings.summary_attempts,
        )
        .await
        {
            Ok(response) => {
                info!(url, usage = %response.usage, "summary generated");
                (
                    replies::summary(&response.content, &response.usage),
                    StepOutcome::Succeeded,
                )
            },
            Err(failure) => {
                warn!(url, error = %failure, "summary failed");
                (replies::summary_failed(failure.message()), StepOutcome::Failed)
            },
        }
    }

    async fn archive(
        &self,
        url: &str,
        source: &str,
        title: &str,
        html: &str,
    ) -> (String, StepOutcome) {
        let path = ArchivePath::new(&self.settings.path_prefix, source, title);
        let message = format!("Add {}", path.raw);

        match self
            .store
            .create_or_update(&path.raw, html.as_bytes(), &message)
            .await
        {
            Ok(confirmation) => {
                info!(url, path = %path.raw, write = %confirmation, "page archived");
                #[cfg(feature = "metrics")]
                counter!(backup_metrics::ARCHIVED_TOTAL).increment(1);
                let settings = &self.settings;
                let text = replies::backup_done(
                    url,
                    &settings.owner,
                    &settings.repo,
                    &settings.branch,
                    &path.encoded,
                );
                (text, StepOutcome::Succeeded)
            },
            Err(e) => {
                warn!(url, path = %path.raw, error = %e, "archive write failed");
                #[cfg(feature = "metrics")]
                counter!(backup_metrics::ARCHIVE_ERRORS_TOTAL).increment(1);
                (replies::backup_failed(&e), StepOutcome::Failed)
            },
        }
    }
}
