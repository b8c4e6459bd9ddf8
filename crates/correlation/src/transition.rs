//! Pure pairing rules.
//!
//! Both functions take the sender's current slots by value and return the
//! next slots plus what the caller should do. They never look at wall-clock
//! time; only the events' own timestamps matter.

use {
    pagekeep_channels::{Error as ChannelError, InboundEvent, LinkShare},
    serde::Serialize,
};

use crate::{
    command::CommandSet,
    pending::{MatchedRequest, PendingCommand, PendingLink, SenderSlots},
};

/// Default pairing window in seconds.
pub const DEFAULT_WINDOW_SECS: i64 = 30;

/// Why an event left the state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// Empty text or a token outside the command vocabulary.
    NotACommand,
    /// A share whose sub-type is not a link.
    UnsupportedShare,
    /// A link share whose payload could not be parsed.
    MalformedShare,
}

/// Outcome of feeding one event to the pairing rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Ignored(IgnoreReason),
    /// Reply with the help text; state is untouched.
    Help,
    /// The event now waits in its slot. `expired` is set when a counterpart
    /// outside the window was discarded to make room.
    Stored { expired: bool },
    /// A pair was formed and should be processed.
    Dispatch(MatchedRequest),
}

/// A recognized event, before it meets the sender's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Help,
    Command(PendingCommand),
    Link(PendingLink),
}

/// Recognize an inbound event without touching any state.
pub fn classify(event: &InboundEvent) -> Result<Incoming, IgnoreReason> {
    match event {
        InboundEvent::Text {
            sender_id,
            text,
            received_at,
        } => {
            let commands = CommandSet::parse(text).ok_or(IgnoreReason::NotACommand)?;
            if commands.is_help_only() {
                return Ok(Incoming::Help);
            }
            Ok(Incoming::Command(PendingCommand {
                sender_id: sender_id.clone(),
                commands,
                received_at: *received_at,
            }))
        },
        InboundEvent::Share {
            sender_id,
            app_msg_type,
            received_at,
            content,
        } => {
            let link = LinkShare::parse(*app_msg_type, content).map_err(|e| match e {
                ChannelError::UnsupportedShare { .. } => IgnoreReason::UnsupportedShare,
                _ => IgnoreReason::MalformedShare,
            })?;
            Ok(Incoming::Link(PendingLink {
                sender_id: sender_id.clone(),
                link,
                received_at: *received_at,
            }))
        },
    }
}

/// `true` when two timestamps are strictly less than `window_secs` apart.
#[must_use]
pub fn within_window(a: i64, b: i64, window_secs: i64) -> bool {
    a.abs_diff(b) < window_secs.unsigned_abs()
}

/// A command arrives.
///
/// On a match the link slot is cleared and the command slot keeps whatever
/// it held before; the triggering command is not stored.
#[must_use]
pub fn on_command(
    mut slots: SenderSlots,
    command: PendingCommand,
    window_secs: i64,
) -> (SenderSlots, Decision) {
    match slots.link.take() {
        None => {
            slots.command = Some(command);
            (slots, Decision::Stored { expired: false })
        },
        Some(link) if within_window(link.received_at, command.received_at, window_secs) => {
            let matched = MatchedRequest {
                sender_id: command.sender_id,
                commands: command.commands,
                link: link.link,
            };
            (slots, Decision::Dispatch(matched))
        },
        Some(_) => {
            slots.command = Some(command);
            (slots, Decision::Stored { expired: true })
        },
    }
}

/// A link arrives. Mirror image of [`on_command`].
#[must_use]
pub fn on_link(
    mut slots: SenderSlots,
    link: PendingLink,
    window_secs: i64,
) -> (SenderSlots, Decision) {
    match slots.command.take() {
        None => {
            slots.link = Some(link);
            (slots, Decision::Stored { expired: false })
        },
        Some(command) if within_window(command.received_at, link.received_at, window_secs) => {
            let matched = MatchedRequest {
                sender_id: command.sender_id,
                commands: command.commands,
                link: link.link,
            };
            (slots, Decision::Dispatch(matched))
        },
        Some(_) => {
            slots.link = Some(link);
            (slots, Decision::Stored { expired: true })
        },
    }
}

/// Classify `event` and apply it to `slots`.
#[must_use]
pub fn apply(
    slots: SenderSlots,
    event: &InboundEvent,
    window_secs: i64,
) -> (SenderSlots, Decision) {
    match classify(event) {
        Err(reason) => (slots, Decision::Ignored(reason)),
        Ok(Incoming::Help) => (slots, Decision::Help),
        Ok(Incoming::Command(command)) => on_command(slots, command, window_secs),
        Ok(Incoming::Link(link)) => on_link(slots, link, window_secs),
    }
}
