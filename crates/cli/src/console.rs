//! Line-oriented console channel.
//!
//! Each stdin line is one JSON [`InboundEvent`]; `received_at` may be left
//! out and defaults to the current time. Replies are printed to stdout as
//! `{"to": …, "text": …}` lines.

use {
    async_trait::async_trait,
    pagekeep_channels::{ChannelOutbound, Error as ChannelError, InboundEvent},
    tokio::{
        io::{AsyncWrite, AsyncWriteExt, Stdout},
        sync::Mutex,
    },
};

/// Parse one console line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str, now: i64) -> Result<Option<InboundEvent>, ChannelError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut value: serde_json::Value = serde_json::from_str(line)?;
    let object = value
        .as_object_mut()
        .ok_or_else(|| ChannelError::malformed("event must be a JSON object"))?;
    object
        .entry("received_at")
        .or_insert_with(|| serde_json::Value::from(now));
    Ok(Some(serde_json::from_value(value)?))
}

/// Writes replies as JSON lines, stdout by default.
///
/// The writer sits behind a lock so replies from concurrent runs never
/// interleave within a line.
pub struct ConsoleOutbound<W = Stdout> {
    out: Mutex<W>,
}

impl ConsoleOutbound {
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W> ConsoleOutbound<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> ChannelOutbound for ConsoleOutbound<W> {
    async fn send_text(&self, to: &str, text: &str) -> pagekeep_channels::Result<()> {
        let mut line = serde_json::json!({ "to": to, "text": text }).to_string();
        line.push('\n');
        let mut out = self.out.lock().await;
        out.write_all(line.as_bytes())
            .await
            .map_err(|e| ChannelError::external("writing reply", e))?;
        out.flush()
            .await
            .map_err(|e| ChannelError::external("flushing reply", e))
    }
}
