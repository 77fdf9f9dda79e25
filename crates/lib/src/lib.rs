//! Relay core library: Telegram webhook handling, the Grok client, configuration,
//! and the gateway host used by the CLI.

pub mod channels;
pub mod config;
pub mod gateway;
pub mod init;
pub mod llm;
