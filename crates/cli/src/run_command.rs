//! `pagekeep run`: the backup service on the console channel.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use {
    anyhow::{Context, Result},
    pagekeep_backup::{BackupOrchestrator, BackupService, BackupSettings},
    pagekeep_browser::ChromeFetcher,
    pagekeep_channels::ChannelOutbound,
    pagekeep_common::time::unix_now_secs,
    pagekeep_config::PagekeepConfig,
    pagekeep_correlation::CorrelationEngine,
    pagekeep_metrics::{MetricsRecorderConfig, init_metrics},
    pagekeep_repository::GitHubRepository,
    pagekeep_summarizer::OpenAiCompatSummarizer,
    tokio::io::{AsyncBufReadExt, BufReader},
    tracing::{info, warn},
};

use crate::console::{ConsoleOutbound, parse_line};

fn init_recorder(config: &PagekeepConfig) -> Result<pagekeep_metrics::MetricsHandle> {
    let listen = config
        .metrics
        .listen
        .as_deref()
        .map(str::parse::<SocketAddr>)
        .transpose()
        .context("invalid metrics.listen address")?;
    init_metrics(MetricsRecorderConfig {
        enabled: config.metrics.enabled,
        listen,
        global_labels: Vec::new(),
    })
}

pub async fn run(config: PagekeepConfig) -> Result<()> {
    pagekeep_config::validate_for_service(&config)?;
    let _metrics = init_recorder(&config)?;

    let outbound: Arc<dyn ChannelOutbound> = Arc::new(ConsoleOutbound::stdout());
    let orchestrator = Arc::new(BackupOrchestrator::new(
        Arc::new(ChromeFetcher::from_config(&config.browser)),
        Arc::new(OpenAiCompatSummarizer::from_config(&config.summarizer)?),
        Arc::new(GitHubRepository::new(&config.repository)?),
        Arc::clone(&outbound),
        BackupSettings::from_config(&config),
    ));
    let engine = Arc::new(CorrelationEngine::from_config(&config.correlation));
    let service = BackupService::new(engine, orchestrator, outbound);

    let prune_every = Duration::from_secs(config.correlation.window_secs.unsigned_abs().max(1));
    let mut prune = tokio::time::interval(prune_every);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        window_secs = config.correlation.window_secs,
        repo = %format!("{}/{}", config.repository.owner, config.repository.name),
        "console channel ready; one JSON event per line"
    );

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                match parse_line(&line, unix_now_secs()) {
                    Ok(Some(event)) => {
                        service.handle_event(event).await;
                    },
                    Ok(None) => {},
                    Err(e) => warn!(error = %e, "skipping unreadable event line"),
                }
            },
            _ = prune.tick() => {
                service.prune_idle();
            },
            _ = &mut shutdown => {
                info!("interrupted");
                break;
            },
        }
    }

    let reports = service.drain().await;
    info!(runs = reports.len(), "console channel closed");
    Ok(())
}
