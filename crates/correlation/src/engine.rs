use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicI64, Ordering},
    },
};

use {
    pagekeep_channels::InboundEvent,
    pagekeep_config::CorrelationConfig,
    tracing::{debug, info},
};

#[cfg(feature = "metrics")]
use pagekeep_metrics::{correlation as corr_metrics, counter, gauge, labels};

use crate::{
    pending::SenderSlots,
    transition::{self, DEFAULT_WINDOW_SECS, Decision, Incoming},
};

type SenderCell = Arc<tokio::sync::Mutex<SenderSlots>>;

/// How many windows an entry must trail the newest event before pruning may
/// drop it.
const PRUNE_MARGIN_WINDOWS: i64 = 2;

/// Per-sender command/link pairing.
///
/// Events for one sender are applied one at a time; different senders never
/// wait on each other beyond a brief map lookup.
pub struct CorrelationEngine {
    window_secs: i64,
    senders: Mutex<HashMap<String, SenderCell>>,
    /// Newest `received_at` among paired events, in the chat server's clock.
    newest_seen: AtomicI64,
}

impl Default for CorrelationEngine {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SECS)
    }
}

impl CorrelationEngine {
    #[must_use]
    pub fn new(window_secs: i64) -> Self {
        Self {
            window_secs,
            senders: Mutex::new(HashMap::new()),
            newest_seen: AtomicI64::new(i64::MIN),
        }
    }

    #[must_use]
    pub fn from_config(config: &CorrelationConfig) -> Self {
        Self::new(config.window_secs)
    }

    #[must_use]
    pub fn window_secs(&self) -> i64 {
        self.window_secs
    }

    fn cell(&self, sender_id: &str) -> SenderCell {
        let mut senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        let cell = senders
            .entry(sender_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(SenderSlots::default())))
            .clone();
        #[cfg(feature = "metrics")]
        gauge!(corr_metrics::SENDERS_ACTIVE).set(senders.len() as f64);
        cell
    }

    fn existing_cell(&self, sender_id: &str) -> Option<SenderCell> {
        let senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        senders.get(sender_id).cloned()
    }

    /// Feed one inbound event through the pairing rules.
    pub async fn handle(&self, event: &InboundEvent) -> Decision {
        let sender_id = event.sender_id();

        #[cfg(feature = "metrics")]
        {
            let kind = match event {
                InboundEvent::Text { .. } => "text",
                InboundEvent::Share { .. } => "share",
            };
            counter!(corr_metrics::EVENTS_TOTAL, labels::KIND => kind).increment(1);
        }

        // Recognition needs no state, so unrecognized events never create a
        // sender entry.
        let incoming = match transition::classify(event) {
            Ok(incoming) => incoming,
            Err(reason) => {
                debug!(sender_id, ?reason, "ignoring inbound event");
                #[cfg(feature = "metrics")]
                counter!(corr_metrics::IGNORED_TOTAL).increment(1);
                return Decision::Ignored(reason);
            },
        };

        if matches!(incoming, Incoming::Help) {
            debug!(sender_id, "help requested");
            #[cfg(feature = "metrics")]
            counter!(corr_metrics::HELP_TOTAL).increment(1);
            return Decision::Help;
        }

        self.newest_seen
            .fetch_max(event.received_at(), Ordering::Relaxed);
        let cell = self.cell(sender_id);
        let mut slots = cell.lock().await;
        let current = std::mem::take(&mut *slots);
        let window = self.window_secs;
        let (next, decision) = match incoming {
            Incoming::Command(command) => transition::on_command(current, command, window),
            Incoming::Link(link) => transition::on_link(current, link, window),
            Incoming::Help => (current, Decision::Help),
        };
        *slots = next;
        drop(slots);

        match &decision {
            Decision::Dispatch(matched) => {
                info!(
                    sender_id,
                    commands = %matched.commands,
                    url = %matched.link.url,
                    "command matched link"
                );
                #[cfg(feature = "metrics")]
                counter!(corr_metrics::MATCHES_TOTAL).increment(1);
            },
            Decision::Stored { expired } => {
                debug!(sender_id, expired, "event pending");
                if *expired {
                    #[cfg(feature = "metrics")]
                    counter!(corr_metrics::EXPIRED_TOTAL).increment(1);
                }
            },
            Decision::Help | Decision::Ignored(_) => {},
        }

        decision
    }

    /// Snapshot of a sender's pending slots.
    pub async fn pending(&self, sender_id: &str) -> SenderSlots {
        match self.existing_cell(sender_id) {
            Some(cell) => cell.lock().await.clone(),
            None => SenderSlots::default(),
        }
    }

    /// Number of senders with an entry in the map.
    #[must_use]
    pub fn sender_count(&self) -> usize {
        self.senders.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Drop pending entries that trail the newest event seen by at least two
    /// windows, and forget senders left with nothing pending.
    ///
    /// Age is measured against event timestamps only, never the host clock.
    /// Senders with an event in flight are skipped. Returns the number of
    /// senders removed.
    pub fn prune_idle(&self) -> usize {
        let newest = self.newest_seen.load(Ordering::Relaxed);
        let horizon = self.window_secs.saturating_abs().saturating_mul(PRUNE_MARGIN_WINDOWS);
        let is_dead = |received_at: i64| newest.saturating_sub(received_at) >= horizon;

        let mut senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        let before = senders.len();

        senders.retain(|_, cell| {
            // Another holder means `handle` cloned the cell and may be about
            // to write to it.
            if Arc::strong_count(cell) > 1 {
                return true;
            }
            let Ok(mut slots) = cell.try_lock() else {
                return true;
            };
            if slots.command.as_ref().is_some_and(|c| is_dead(c.received_at)) {
                slots.command = None;
            }
            if slots.link.as_ref().is_some_and(|l| is_dead(l.received_at)) {
                slots.link = None;
            }
            !slots.is_empty()
        });

        let removed = before - senders.len();
        if removed > 0 {
            debug!(removed, remaining = senders.len(), "pruned idle senders");
        }
        #[cfg(feature = "metrics")]
        gauge!(corr_metrics::SENDERS_ACTIVE).set(senders.len() as f64);
        removed
    }
}
