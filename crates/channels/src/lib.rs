//! Chat transport surface.
//!
//! Inbound events arrive as either free text or link shares; replies go out
//! through a [`ChannelOutbound`] implementation supplied by the host.

pub mod error;
pub mod event;
pub mod outbound;

pub use {
    error::{Error, Result},
    event::{InboundEvent, LINK_SHARE_APP_MSG_TYPE, LinkShare},
    outbound::ChannelOutbound,
};
