use {
    pagekeep_channels::LinkShare,
    serde::{Deserialize, Serialize},
};

use crate::command::CommandSet;

/// A recognized command waiting for its link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCommand {
    pub sender_id: String,
    pub commands: CommandSet,
    /// Unix seconds.
    pub received_at: i64,
}

/// A link share waiting for its command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLink {
    pub sender_id: String,
    pub link: LinkShare,
    /// Unix seconds.
    pub received_at: i64,
}

/// Per-sender pairing state: at most one of each.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderSlots {
    pub command: Option<PendingCommand>,
    pub link: Option<PendingLink>,
}

impl SenderSlots {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.command.is_none() && self.link.is_none()
    }
}

/// A command paired with a link, ready for the backup pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedRequest {
    pub sender_id: String,
    pub commands: CommandSet,
    pub link: LinkShare,
}
