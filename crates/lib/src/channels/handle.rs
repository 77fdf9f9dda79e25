//! Outbound side of a channel: deliver a reply into a conversation.

use crate::channels::telegram::ChatId;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("channel request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("channel api error: {0}")]
    Api(String),
    #[error("channel not configured: {0}")]
    NotConfigured(&'static str),
}

/// Handle to a messaging provider that can send text replies.
#[async_trait]
pub trait ChannelHandle: Send + Sync {
    /// Channel id (e.g. "telegram").
    fn id(&self) -> &str;
    /// Send a text message to a conversation (Telegram chat_id).
    async fn send_message(&self, chat_id: &ChatId, text: &str) -> Result<(), ChannelError>;
}
