//! Gateway HTTP server: health check and the Telegram webhook relay.

use crate::channels::{ChannelHandle, ChatMessage, TelegramChannel, TelegramUpdate};
use crate::config::{self, Config, Secrets};
use crate::llm::{extract_reply, AiProvider, Completion, GrokClient, LlmError};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Header Telegram uses to echo the secret given to setWebhook.
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Shared state for the gateway (config, resolved secrets, providers).
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub secrets: Arc<Secrets>,
    pub ai: Arc<dyn AiProvider>,
    pub channel: Arc<dyn ChannelHandle>,
}

impl GatewayState {
    pub fn new(
        config: Config,
        secrets: Secrets,
        ai: Arc<dyn AiProvider>,
        channel: Arc<dyn ChannelHandle>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            secrets: Arc::new(secrets),
            ai,
            channel,
        }
    }
}

/// Routes: `GET /` health, webhook at `/api/webhook` and `/telegram/webhook`.
/// The webhook routes accept every method so non-POST calls get the handler's own 405.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/api/webhook", any(telegram_webhook))
        .route("/telegram/webhook", any(telegram_webhook))
        .with_state(state)
}

pub async fn run_gateway(config: Config) -> Result<()> {
    let secrets = config::resolve_secrets(&config);
    if !secrets.is_complete() {
        log::warn!(
            "TELEGRAM_BOT_TOKEN or GROK_API_KEY not set; webhook calls will be answered with 500"
        );
    }
    if secrets.webhook_secret.is_none() {
        log::info!("no webhook secret configured; secret header check disabled");
    }

    let telegram = Arc::new(TelegramChannel::new(
        secrets.bot_token.clone(),
        Some(config.channels.telegram.api_base.clone()),
    ));
    let grok = Arc::new(GrokClient::new(
        Some(config.ai.endpoint.clone()),
        secrets.ai_api_key.clone(),
    ));

    let registered_webhook = match (&config.channels.telegram.webhook_url, &secrets.bot_token) {
        (Some(url), Some(_)) => {
            match telegram
                .set_webhook(url, secrets.webhook_secret.as_deref())
                .await
            {
                Ok(()) => {
                    log::info!("telegram webhook registered: {}", url);
                    Some(telegram.clone())
                }
                Err(e) => {
                    log::warn!("telegram set_webhook failed: {}", e);
                    None
                }
            }
        }
        (Some(_), None) => {
            log::warn!("webhookUrl is set but no bot token; skipping setWebhook");
            None
        }
        _ => None,
    };

    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    let state = GatewayState::new(config, secrets, grok, telegram);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(registered_webhook))
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
/// Removes the Telegram webhook if this process registered it.
async fn shutdown_signal(registered_webhook: Option<Arc<TelegramChannel>>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");

    if let Some(t) = registered_webhook {
        if let Err(e) = t.delete_webhook().await {
            log::debug!("telegram delete_webhook on shutdown: {}", e);
        }
    }
}

/// Webhook entry point. Every outcome is an HTTP response; downstream failures
/// are logged and still acknowledged with 200 so Telegram does not redeliver.
async fn telegram_webhook(
    State(state): State<GatewayState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "POST")],
            "Method Not Allowed",
        )
            .into_response();
    }

    if let Some(ref expected) = state.secrets.webhook_secret {
        let provided = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if provided != Some(expected.as_str()) {
            log::warn!("webhook called with invalid secret token");
            return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        }
    }

    let update: TelegramUpdate = match serde_json::from_slice(&body) {
        Ok(u) => u,
        Err(e) => {
            log::debug!("webhook body is not a telegram update: {}", e);
            TelegramUpdate::default()
        }
    };
    let Some(message) = update.chat_message() else {
        return (StatusCode::OK, "Ignored").into_response();
    };

    if !state.secrets.is_complete() {
        log::error!("missing TELEGRAM_BOT_TOKEN or GROK_API_KEY");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Server misconfigured").into_response();
    }

    match relay_message(&state, &message).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "ok": true }))).into_response(),
        Err(e) => {
            log::error!("processing error: {}", e);
            (StatusCode::OK, "Error handled").into_response()
        }
    }
}

/// Ask the AI provider, then deliver its reply (or the fallback) to the chat.
/// Only a failed AI call is an error; a failed or impossible send is logged and swallowed.
async fn relay_message(state: &GatewayState, message: &ChatMessage) -> Result<(), LlmError> {
    let completion = state.ai.complete(&message.text).await?;
    let reply = reply_text(completion, &state.config.ai.reply_fields, &state.config.ai.fallback_reply);

    let Some(ref chat_id) = message.chat_id else {
        log::error!("update chat has no usable id; reply dropped");
        return Ok(());
    };
    if let Err(e) = state.channel.send_message(chat_id, &reply).await {
        log::error!("failed sending to {} chat {}: {}", state.channel.id(), chat_id, e);
    }
    Ok(())
}

fn reply_text(completion: Completion, fields: &[String], fallback: &str) -> String {
    match completion {
        Completion::Status(status) => {
            log::error!("grok api returned status {}", status);
            fallback.to_string()
        }
        Completion::Body(body) => body
            .as_ref()
            .and_then(|b| extract_reply(b, fields))
            .unwrap_or_else(|| fallback.to_string()),
    }
}

/// GET / returns a simple health JSON.
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.gateway.port,
    }))
}
