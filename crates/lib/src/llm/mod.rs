//! AI provider abstraction and the Grok client.
//!
//! The handler only sees [`AiProvider`]; reply text is pulled out of the provider's JSON
//! with [`extract_reply`] against a configurable list of field names.

mod grok;

pub use grok::{extract_reply, AiProvider, Completion, GrokClient, LlmError};
