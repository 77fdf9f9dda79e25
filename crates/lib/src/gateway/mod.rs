//! Gateway: HTTP host for the webhook relay.
//!
//! Single port serves a health check and the Telegram webhook. The webhook handler
//! makes one AI call and one sendMessage call per update and always answers Telegram.

mod server;

pub use server::{build_router, run_gateway, GatewayState, SECRET_HEADER};
