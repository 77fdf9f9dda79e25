//! Grok API client (https://api.grok.ai/v1/respond by default).
//! One POST per prompt: bearer auth, body `{"prompt": ...}`.

use crate::config::DEFAULT_AI_ENDPOINT;
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("ai request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("ai api error: {0}")]
    Api(String),
}

/// What came back from the provider when the request itself went through.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// 2xx response. `None` when the body was not JSON.
    Body(Option<serde_json::Value>),
    /// Any other status code.
    Status(u16),
}

/// A conversational AI backend that answers a single prompt.
#[async_trait]
pub trait AiProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<Completion, LlmError>;
}

/// Client for the Grok HTTP API.
#[derive(Clone)]
pub struct GrokClient {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct RespondRequest<'a> {
    prompt: &'a str,
}

impl GrokClient {
    pub fn new(endpoint: Option<String>, api_key: Option<String>) -> Self {
        let endpoint = endpoint
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_AI_ENDPOINT.to_string());
        Self {
            endpoint,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AiProvider for GrokClient {
    async fn complete(&self, prompt: &str) -> Result<Completion, LlmError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LlmError::Api("api key not configured".to_string()))?;
        let res = self
            .client
            .post(&self.endpoint)
            .bearer_auth(key)
            .json(&RespondRequest { prompt })
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            return Ok(Completion::Status(status.as_u16()));
        }
        // An unreadable body counts as "no data", same as one that is not JSON.
        let body = match res.bytes().await {
            Ok(bytes) => serde_json::from_slice(&bytes).ok(),
            Err(e) => {
                log::debug!("grok response body unreadable: {}", e);
                None
            }
        };
        Ok(Completion::Body(body))
    }
}

/// First non-empty string among `fields` in a JSON object, in the given order.
/// Non-object bodies, missing fields, empty strings and non-string values are skipped.
pub fn extract_reply(body: &serde_json::Value, fields: &[String]) -> Option<String> {
    let obj = body.as_object()?;
    fields
        .iter()
        .filter_map(|f| obj.get(f).and_then(|v| v.as_str()))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_reply_fields;
    use serde_json::json;

    #[test]
    fn text_wins_over_response_and_result() {
        let body = json!({ "result": "c", "response": "b", "text": "a" });
        assert_eq!(
            extract_reply(&body, &default_reply_fields()).as_deref(),
            Some("a")
        );
    }

    #[test]
    fn falls_through_in_order() {
        let fields = default_reply_fields();
        assert_eq!(
            extract_reply(&json!({ "response": "b", "result": "c" }), &fields).as_deref(),
            Some("b")
        );
        assert_eq!(
            extract_reply(&json!({ "result": "c" }), &fields).as_deref(),
            Some("c")
        );
    }

    #[test]
    fn empty_and_non_string_values_are_skipped() {
        let body = json!({ "text": "", "response": 42, "result": "ok" });
        assert_eq!(
            extract_reply(&body, &default_reply_fields()).as_deref(),
            Some("ok")
        );
    }

    #[test]
    fn nothing_usable() {
        let fields = default_reply_fields();
        assert_eq!(extract_reply(&json!({ "choices": [] }), &fields), None);
        assert_eq!(extract_reply(&json!(["text"]), &fields), None);
        assert_eq!(extract_reply(&json!("text"), &fields), None);
        assert_eq!(extract_reply(&json!({ "text": null }), &fields), None);
    }

    #[test]
    fn custom_field_order() {
        let fields = vec!["answer".to_string(), "text".to_string()];
        let body = json!({ "text": "a", "answer": "z" });
        assert_eq!(extract_reply(&body, &fields).as_deref(), Some("z"));
    }

    #[test]
    fn blank_endpoint_uses_default() {
        let c = GrokClient::new(Some("  ".into()), None);
        assert_eq!(c.endpoint(), DEFAULT_AI_ENDPOINT);
    }

    #[tokio::test]
    async fn missing_key_is_an_api_error() {
        let c = GrokClient::new(Some("http://127.0.0.1:9/respond".into()), None);
        assert!(matches!(c.complete("hi").await, Err(LlmError::Api(_))));
    }
}
