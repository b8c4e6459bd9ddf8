//! Event entry point: correlation inline, pipeline runs in the background.

use std::sync::Arc;

use {
    pagekeep_channels::{ChannelOutbound, InboundEvent},
    pagekeep_correlation::{CorrelationEngine, Decision, HELP_TEXT},
    tokio::{sync::Mutex, task::JoinSet},
    tracing::{debug, warn},
};

use crate::orchestrator::{BackupOrchestrator, RunReport};

/// Routes inbound events to the correlation engine and runs matched
/// requests without blocking the caller.
pub struct BackupService {
    engine: Arc<CorrelationEngine>,
    orchestrator: Arc<BackupOrchestrator>,
    outbound: Arc<dyn ChannelOutbound>,
    runs: Mutex<JoinSet<RunReport>>,
}

impl BackupService {
    pub fn new(
        engine: Arc<CorrelationEngine>,
        orchestrator: Arc<BackupOrchestrator>,
        outbound: Arc<dyn ChannelOutbound>,
    ) -> Self {
        Self {
            engine,
            orchestrator,
            outbound,
            runs: Mutex::new(JoinSet::new()),
        }
    }

    #[must_use]
    pub fn engine(&self) -> &Arc<CorrelationEngine> {
        &self.engine
    }

    /// Handle one event. Returns once the event is correlated; a matched
    /// request continues on its own task.
    pub async fn handle_event(&self, event: InboundEvent) -> Decision {
        let decision = self.engine.handle(&event).await;
        match &decision {
            Decision::Help => {
                if let Err(e) = self.outbound.send_text(event.sender_id(), HELP_TEXT).await {
                    warn!(sender_id = event.sender_id(), error = %e, "failed to send help text");
                }
            },
            Decision::Dispatch(matched) => {
                let orchestrator = Arc::clone(&self.orchestrator);
                let matched = matched.clone();
                let mut runs = self.runs.lock().await;
                while let Some(finished) = runs.try_join_next() {
                    log_finished(finished);
                }
                runs.spawn(async move { orchestrator.process(matched).await });
            },
            Decision::Stored { .. } | Decision::Ignored(_) => {},
        }
        decision
    }

    /// Forget pending entries that can no longer match. See
    /// [`CorrelationEngine::prune_idle`].
    pub fn prune_idle(&self) -> usize {
        self.engine.prune_idle()
    }

    /// Wait for every in-flight run to finish.
    pub async fn drain(&self) -> Vec<RunReport> {
        let mut runs = self.runs.lock().await;
        let mut reports = Vec::new();
        while let Some(finished) = runs.join_next().await {
            if let Some(report) = log_finished(finished) {
                reports.push(report);
            }
        }
        reports
    }
}

fn log_finished(finished: Result<RunReport, tokio::task::JoinError>) -> Option<RunReport> {
    match finished {
        Ok(report) => {
            debug!(?report, "backup run finished");
            Some(report)
        },
        Err(e) => {
            warn!(error = %e, "backup run panicked or was cancelled");
            None
        },
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::orchestrator::{
            StepOutcome,
            tests::{FakeFetcher, FakeStore, FakeSummarizer, RecordingOutbound, settings},
        },
        pagekeep_summarizer::SummaryResponse,
    };

    fn text(sender: &str, text: &str, at: i64) -> InboundEvent {
        InboundEvent::Text {
            sender_id: sender.into(),
            text: text.into(),
            received_at: at,
        }
    }

    fn share(sender: &str, title: &str, source: &str, url: &str, at: i64) -> InboundEvent {
        InboundEvent::Share {
            sender_id: sender.into(),
            app_msg_type: 5,
            received_at: at,
            content: format!(
                "<msg><appmsg><title>{title}</title><url>{url}</url><des>D</des>\
                 <sourcedisplayname>{source}</sourcedisplayname></appmsg></msg>"
            ),
        }
    }

    struct Setup {
        service: BackupService,
        summarizer: Arc<FakeSummarizer>,
        store: Arc<FakeStore>,
        outbound: Arc<RecordingOutbound>,
    }

    fn setup(summaries: Vec<SummaryResponse>) -> Setup {
        let summarizer = Arc::new(FakeSummarizer::replying(summaries));
        let store = Arc::new(FakeStore::default());
        let outbound = Arc::new(RecordingOutbound::default());
        let orchestrator = Arc::new(BackupOrchestrator::new(
            Arc::new(FakeFetcher::ok("<p>article</p>")),
            summarizer.clone(),
            store.clone(),
            outbound.clone(),
            settings(),
        ));
        let service = BackupService::new(
            Arc::new(CorrelationEngine::default()),
            orchestrator,
            outbound.clone(),
        );
        Setup {
            service,
            summarizer,
            store,
            outbound,
        }
    }

    #[tokio::test]
    async fn summary_scenario() {
        let s = setup(vec![SummaryResponse {
            status: 200,
            message: String::new(),
            content: "hello".into(),
            usage: "12 tokens".into(),
        }]);

        s.service.handle_event(text("U1", "s", 0)).await;
        let decision = s
            .service
            .handle_event(share("U1", "T", "S", "http://x", 10))
            .await;
        assert!(matches!(decision, Decision::Dispatch(_)));

        let reports = s.service.drain().await;
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].summary, Some(StepOutcome::Succeeded));
        assert_eq!(s.summarizer.prompts.lock().unwrap().len(), 1);
        assert_eq!(s.outbound.texts(), vec!["hello\n\n12 tokens".to_string()]);
    }

    #[tokio::test]
    async fn backup_scenario() {
        let s = setup(vec![]);

        s.service
            .handle_event(share("U1", "Post One", "MyBlog", "http://x", 0))
            .await;
        s.service.handle_event(text("U1", "b", 5)).await;
        s.service.drain().await;

        let writes = s.store.writes.lock().unwrap().clone();
        assert_eq!(writes[0].0, "docs/wechat/MyBlog/Post One.html");
        let texts = s.outbound.texts();
        assert!(texts[0].contains("/blob/master/docs/wechat/MyBlog/Post%20One.html"));
    }

    #[tokio::test]
    async fn help_is_answered_without_state() {
        let s = setup(vec![]);
        let decision = s.service.handle_event(text("U1", "help", 0)).await;
        assert_eq!(decision, Decision::Help);
        assert_eq!(s.outbound.sent.lock().unwrap().as_slice(), [(
            "U1".to_string(),
            HELP_TEXT.to_string()
        )]);
        assert_eq!(s.service.engine().sender_count(), 0);
    }

    #[tokio::test]
    async fn unmatched_events_send_nothing() {
        let s = setup(vec![]);
        s.service.handle_event(text("U1", "s", 0)).await;
        s.service
            .handle_event(share("U2", "A", "S", "http://y", 1))
            .await;
        s.service.handle_event(text("U1", "hello there", 2)).await;

        assert!(s.service.drain().await.is_empty());
        assert!(s.outbound.texts().is_empty());
    }

    #[tokio::test]
    async fn expired_pairs_do_not_dispatch() {
        let s = setup(vec![]);
        s.service.handle_event(text("U1", "b", 0)).await;
        let decision = s
            .service
            .handle_event(share("U1", "A", "S", "http://x", 31))
            .await;
        assert_eq!(decision, Decision::Stored { expired: true });
        assert!(s.service.drain().await.is_empty());
        assert!(s.store.writes.lock().unwrap().is_empty());
    }
}
