//! Command/link correlation.
//!
//! A sender types a command (`s`, `b`, `summary backup`, …) and shares a link
//! as two separate chat events, in either order. The engine keeps one pending
//! command and one pending link per sender and emits a [`MatchedRequest`]
//! when both arrive within the configured window.

pub mod command;
pub mod engine;
pub mod pending;
pub mod transition;

pub use {
    command::{Command, CommandSet, HELP_TEXT},
    engine::CorrelationEngine,
    pending::{MatchedRequest, PendingCommand, PendingLink, SenderSlots},
    transition::{DEFAULT_WINDOW_SECS, Decision, IgnoreReason},
};
