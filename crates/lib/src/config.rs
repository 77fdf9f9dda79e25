//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.tgrelay/config.json`) and environment.
//! Secrets may live in either place; the environment wins when set.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_AI_ENDPOINT: &str = "https://api.grok.ai/v1/respond";
pub const DEFAULT_FALLBACK_REPLY: &str = "Sorry, I could not process that.";

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Gateway server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Channel settings (Telegram).
    #[serde(default)]
    pub channels: ChannelsConfig,

    /// AI provider settings.
    #[serde(default)]
    pub ai: AiConfig,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 3000).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    3000
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// Per-channel config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsConfig {
    #[serde(default)]
    pub telegram: TelegramChannelConfig,
}

/// Telegram channel config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramChannelConfig {
    /// Bot token from BotFather. Overridden by TELEGRAM_BOT_TOKEN env when set.
    pub bot_token: Option<String>,
    /// Bot API base URL. Only changed for tests or a self-hosted Bot API server.
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
    /// Shared secret expected in X-Telegram-Bot-Api-Secret-Token. Overridden by TELEGRAM_SECRET env.
    pub webhook_secret: Option<String>,
    /// When set, the gateway registers this URL with setWebhook on startup and removes it on shutdown.
    pub webhook_url: Option<String>,
}

fn default_telegram_api_base() -> String {
    DEFAULT_TELEGRAM_API_BASE.to_string()
}

impl Default for TelegramChannelConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base: default_telegram_api_base(),
            webhook_secret: None,
            webhook_url: None,
        }
    }
}

/// AI provider config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiConfig {
    /// Bearer key for the AI provider. Overridden by GROK_API_KEY env.
    pub api_key: Option<String>,
    /// Endpoint receiving `{"prompt": ...}`.
    #[serde(default = "default_ai_endpoint")]
    pub endpoint: String,
    /// Response fields checked for the reply text, first non-empty string wins.
    #[serde(default = "default_reply_fields")]
    pub reply_fields: Vec<String>,
    /// Sent to the chat when the provider's answer cannot be used.
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,
}

fn default_ai_endpoint() -> String {
    DEFAULT_AI_ENDPOINT.to_string()
}

pub fn default_reply_fields() -> Vec<String> {
    vec!["text".to_string(), "response".to_string(), "result".to_string()]
}

fn default_fallback_reply() -> String {
    DEFAULT_FALLBACK_REPLY.to_string()
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_ai_endpoint(),
            reply_fields: default_reply_fields(),
            fallback_reply: default_fallback_reply(),
        }
    }
}

/// Secrets the webhook handler needs, resolved once from config and environment.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub bot_token: Option<String>,
    pub ai_api_key: Option<String>,
    pub webhook_secret: Option<String>,
}

impl Secrets {
    /// True when both required secrets (bot token, AI key) are present.
    pub fn is_complete(&self) -> bool {
        self.bot_token.is_some() && self.ai_api_key.is_some()
    }
}

/// Trim and drop empty values.
fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

/// Env var wins over the config value; blank values on either side count as unset.
fn env_or(var: &str, configured: Option<&String>) -> Option<String> {
    std::env::var(var)
        .ok()
        .and_then(|s| non_empty(&s))
        .or_else(|| configured.and_then(|s| non_empty(s)))
}

/// Like `env_or` but keeps the value byte for byte; only an empty string counts as unset.
fn env_or_verbatim(var: &str, configured: Option<&String>) -> Option<String> {
    std::env::var(var)
        .ok()
        .filter(|s| !s.is_empty())
        .or_else(|| configured.filter(|s| !s.is_empty()).cloned())
}

/// Resolve the Telegram bot token: env TELEGRAM_BOT_TOKEN overrides config.
pub fn resolve_telegram_token(config: &Config) -> Option<String> {
    env_or("TELEGRAM_BOT_TOKEN", config.channels.telegram.bot_token.as_ref())
}

/// Resolve the AI API key: env GROK_API_KEY overrides config.
pub fn resolve_ai_api_key(config: &Config) -> Option<String> {
    env_or("GROK_API_KEY", config.ai.api_key.as_ref())
}

/// Resolve the webhook secret: env TELEGRAM_SECRET overrides config. None disables the header check.
/// Not trimmed, since the header is compared verbatim.
pub fn resolve_webhook_secret(config: &Config) -> Option<String> {
    env_or_verbatim("TELEGRAM_SECRET", config.channels.telegram.webhook_secret.as_ref())
}

pub fn resolve_secrets(config: &Config) -> Secrets {
    Secrets {
        bot_token: resolve_telegram_token(config),
        ai_api_key: resolve_ai_api_key(config),
        webhook_secret: resolve_webhook_secret(config),
    }
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("TGRELAY_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".tgrelay").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, or the default path (or TGRELAY_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
