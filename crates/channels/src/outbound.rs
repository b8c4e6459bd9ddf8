use {crate::Result, async_trait::async_trait};

/// Send replies back to a chat peer.
#[async_trait]
pub trait ChannelOutbound: Send + Sync {
    async fn send_text(&self, to: &str, text: &str) -> Result<()>;
}
