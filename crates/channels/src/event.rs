use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// App message sub-type of a shared article link.
pub const LINK_SHARE_APP_MSG_TYPE: u32 = 5;

/// An inbound chat event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InboundEvent {
    /// Free text typed by the sender.
    Text {
        sender_id: String,
        text: String,
        /// Unix seconds, as stamped by the chat server.
        received_at: i64,
    },
    /// A shared card. `content` carries the raw XML payload.
    Share {
        sender_id: String,
        app_msg_type: u32,
        received_at: i64,
        content: String,
    },
}

impl InboundEvent {
    #[must_use]
    pub fn sender_id(&self) -> &str {
        match self {
            Self::Text { sender_id, .. } | Self::Share { sender_id, .. } => sender_id,
        }
    }

    #[must_use]
    pub fn received_at(&self) -> i64 {
        match self {
            Self::Text { received_at, .. } | Self::Share { received_at, .. } => *received_at,
        }
    }
}

/// The four fields pulled out of a link-share payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkShare {
    pub title: String,
    pub url: String,
    pub description: String,
    /// Display name of the publishing account.
    pub source: String,
}

#[derive(Deserialize)]
struct MsgXml {
    appmsg: AppMsgXml,
}

#[derive(Deserialize)]
struct AppMsgXml {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    des: String,
    #[serde(default)]
    sourcedisplayname: String,
}

impl LinkShare {
    /// Parse a share payload of the given sub-type.
    ///
    /// Only [`LINK_SHARE_APP_MSG_TYPE`] is accepted. The payload is the
    /// `<msg><appmsg>…</appmsg></msg>` document; anything before the first
    /// `<` (some clients prefix the sender id) is skipped.
    pub fn parse(app_msg_type: u32, content: &str) -> Result<Self> {
        if app_msg_type != LINK_SHARE_APP_MSG_TYPE {
            return Err(Error::UnsupportedShare { app_msg_type });
        }

        let start = content
            .find('<')
            .ok_or_else(|| Error::malformed("payload contains no XML"))?;
        let msg: MsgXml = quick_xml::de::from_str(&content[start..]).map_err(Error::malformed)?;
        let app = msg.appmsg;

        let url = app.url.trim().to_string();
        if url.is_empty() {
            return Err(Error::malformed("link share has no url"));
        }

        Ok(Self {
            title: app.title.trim().to_string(),
            url,
            description: app.des.trim().to_string(),
            source: app.sourcedisplayname.trim().to_string(),
        })
    }
}
