//! Communication channels (Telegram).
//!
//! The webhook handler talks to the messaging provider only through [`ChannelHandle`],
//! so tests can swap the live Bot API client for a scripted double.

mod handle;
mod telegram;

pub use handle::{ChannelError, ChannelHandle};
pub use telegram::{ChatId, ChatMessage, TelegramChannel, TelegramMessage, TelegramUpdate};
