//! Telegram channel: webhook update payloads and the Bot API calls the relay makes
//! (sendMessage, setWebhook, deleteWebhook).

use crate::channels::handle::{ChannelError, ChannelHandle};
use crate::config::DEFAULT_TELEGRAM_API_BASE;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Telegram update payload (webhook POST body). Only `message.chat` and `message.text` are read;
/// everything else, whatever its type, is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct TelegramUpdate {
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    /// Any non-null value marks the update as a chat message.
    #[serde(default)]
    pub chat: Option<serde_json::Value>,
    #[serde(default)]
    pub text: Option<serde_json::Value>,
}

/// Opaque chat identifier. Telegram uses integers; sendMessage also accepts `@channelusername`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Username(String),
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatId::Id(id) => write!(f, "{}", id),
            ChatId::Username(name) => f.write_str(name),
        }
    }
}

/// A chat message taken from an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// None when the chat object carries no usable id.
    pub chat_id: Option<ChatId>,
    /// Trimmed text; empty when the message carries none (stickers, photos, ...).
    pub text: String,
}

impl TelegramUpdate {
    /// The chat message in this update, if it has a `message` with a `chat`.
    pub fn chat_message(&self) -> Option<ChatMessage> {
        let msg = self.message.as_ref()?;
        let chat = msg.chat.as_ref()?;
        let chat_id = chat
            .get("id")
            .and_then(|id| serde_json::from_value(id.clone()).ok());
        let text = msg.text.as_ref().map(text_value).unwrap_or_default();
        Some(ChatMessage {
            chat_id,
            text: text.trim().to_string(),
        })
    }
}

/// Strings as-is, numbers and booleans stringified, anything else empty.
fn text_value(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a ChatId,
    text: &'a str,
}

/// Telegram Bot API client used to reply into chats and manage the webhook registration.
pub struct TelegramChannel {
    id: String,
    token: Option<String>,
    api_base: String,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(token: Option<String>, api_base: Option<String>) -> Self {
        let api_base = api_base
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE.to_string());
        Self {
            id: "telegram".to_string(),
            token,
            api_base,
            client: reqwest::Client::new(),
        }
    }

    fn method_url(&self, method: &str) -> Result<String, ChannelError> {
        let token = self
            .token
            .as_ref()
            .ok_or(ChannelError::NotConfigured("telegram bot token"))?;
        Ok(format!("{}/bot{}/{}", self.api_base, token, method))
    }

    async fn post(&self, method: &str, body: &impl Serialize) -> Result<(), ChannelError> {
        let url = self.method_url(method)?;
        let res = self.client.post(&url).json(body).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ChannelError::Api(format!("{} failed: {} {}", method, status, body)));
        }
        Ok(())
    }

    /// Send a text message to a chat via sendMessage API.
    pub async fn send_message(&self, chat_id: &ChatId, text: &str) -> Result<(), ChannelError> {
        self.post("sendMessage", &SendMessageRequest { chat_id, text })
            .await
    }

    /// Set webhook URL (and optional secret). Telegram then POSTs updates to the URL,
    /// echoing the secret in X-Telegram-Bot-Api-Secret-Token.
    pub async fn set_webhook(&self, url: &str, secret: Option<&str>) -> Result<(), ChannelError> {
        let mut body = serde_json::json!({ "url": url });
        if let Some(s) = secret {
            body["secret_token"] = serde_json::Value::String(s.to_string());
        }
        self.post("setWebhook", &body).await
    }

    /// Remove the webhook registration.
    pub async fn delete_webhook(&self) -> Result<(), ChannelError> {
        self.post("deleteWebhook", &serde_json::json!({})).await
    }
}

#[async_trait]
impl ChannelHandle for TelegramChannel {
    fn id(&self) -> &str {
        &self.id
    }

    async fn send_message(&self, chat_id: &ChatId, text: &str) -> Result<(), ChannelError> {
        TelegramChannel::send_message(self, chat_id, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> TelegramUpdate {
        serde_json::from_str(s).unwrap()
    }

    fn chat(id: Option<ChatId>, text: &str) -> Option<ChatMessage> {
        Some(ChatMessage {
            chat_id: id,
            text: text.to_string(),
        })
    }

    #[test]
    fn chat_message_with_integer_id_and_trimmed_text() {
        let u = parse(
            r#"{"update_id": 7, "message": {"message_id": 1, "chat": {"id": -100123, "type": "group"}, "text": "  hi there \n"}}"#,
        );
        assert_eq!(u.chat_message(), chat(Some(ChatId::Id(-100123)), "hi there"));
    }

    #[test]
    fn chat_message_with_string_id() {
        let u = parse(r#"{"message": {"chat": {"id": "@news"}, "text": "x"}}"#);
        assert_eq!(
            u.chat_message(),
            chat(Some(ChatId::Username("@news".into())), "x")
        );
    }

    #[test]
    fn missing_text_is_empty() {
        let u = parse(r#"{"message": {"chat": {"id": 5}, "sticker": {}}}"#);
        assert_eq!(u.chat_message(), chat(Some(ChatId::Id(5)), ""));
        let u = parse(r#"{"message": {"chat": {"id": 5}, "text": null}}"#);
        assert_eq!(u.chat_message(), chat(Some(ChatId::Id(5)), ""));
    }

    #[test]
    fn unread_fields_of_any_type_are_ignored() {
        let u = parse(
            r#"{"update_id": "1", "message": {"message_id": [], "date": "x", "chat": {"id": 42}, "text": "hi"}}"#,
        );
        assert_eq!(u.chat_message(), chat(Some(ChatId::Id(42)), "hi"));
    }

    #[test]
    fn scalar_text_is_stringified() {
        let u = parse(r#"{"message": {"chat": {"id": 1}, "text": 123}}"#);
        assert_eq!(u.chat_message(), chat(Some(ChatId::Id(1)), "123"));
        let u = parse(r#"{"message": {"chat": {"id": 1}, "text": true}}"#);
        assert_eq!(u.chat_message(), chat(Some(ChatId::Id(1)), "true"));
        let u = parse(r#"{"message": {"chat": {"id": 1}, "text": {"a": 1}}}"#);
        assert_eq!(u.chat_message(), chat(Some(ChatId::Id(1)), ""));
    }

    #[test]
    fn chat_without_usable_id_is_still_a_chat_message() {
        let u = parse(r#"{"message": {"chat": {}, "text": "hi"}}"#);
        assert_eq!(u.chat_message(), chat(None, "hi"));
        let u = parse(r#"{"message": {"chat": {"id": 1.5}, "text": "hi"}}"#);
        assert_eq!(u.chat_message(), chat(None, "hi"));
    }

    #[test]
    fn not_a_chat_message() {
        assert!(parse("{}").chat_message().is_none());
        assert!(parse(r#"{"edited_message": {"chat": {"id": 1}}}"#)
            .chat_message()
            .is_none());
        assert!(parse(r#"{"message": {"text": "no chat"}}"#)
            .chat_message()
            .is_none());
        assert!(parse(r#"{"message": {"chat": null, "text": "x"}}"#)
            .chat_message()
            .is_none());
    }

    #[test]
    fn send_message_body_keeps_numeric_chat_id() {
        let id = ChatId::Id(42);
        let body = serde_json::to_value(SendMessageRequest {
            chat_id: &id,
            text: "hello",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "chat_id": 42, "text": "hello" }));
    }

    #[test]
    fn method_url_requires_token() {
        let ch = TelegramChannel::new(None, None);
        assert!(matches!(
            ch.method_url("sendMessage"),
            Err(ChannelError::NotConfigured(_))
        ));
        let ch = TelegramChannel::new(Some("123:abc".into()), Some("http://localhost:9/".into()));
        assert_eq!(
            ch.method_url("sendMessage").unwrap(),
            "http://localhost:9/bot123:abc/sendMessage"
        );
    }
}
