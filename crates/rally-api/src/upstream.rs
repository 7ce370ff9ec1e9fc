//! Hosted text-generation model client.
//!
//! Builds a single prompt from the conversation, posts it to the inference
//! endpoint, and pulls the first generated text out of whichever response
//! shape the provider returns.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use rally_core::config::ModelConfig;
use rally_core::ConversationMessage;

/// Errors talking to the hosted model.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("upstream request failed: {0}")]
    Transport(String),
    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        UpstreamError::Transport(err.to_string())
    }
}

/// A text-generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Whether a credential is available. Unconfigured generators are never called.
    fn is_configured(&self) -> bool;

    /// Model identifier, for diagnostics.
    fn model(&self) -> &str;

    /// Generate a completion. `Ok(None)` means the call succeeded but produced no text.
    async fn generate(&self, prompt: &str) -> Result<Option<String>, UpstreamError>;
}

/// Render the conversation as a completion prompt: one `role: content` line
/// per turn, then the new question and an open assistant turn.
pub fn build_prompt(history: &[ConversationMessage], prompt: &str) -> String {
    let mut out = String::new();
    for turn in history {
        out.push_str(turn.role.as_str());
        out.push_str(": ");
        out.push_str(&turn.content);
        out.push('\n');
    }
    out.push_str("user: ");
    out.push_str(prompt);
    out.push_str("\nassistant:");
    out
}

/// First `generated_text` from a list of objects, or from a single object.
pub fn extract_generated_text(data: &Value) -> Option<String> {
    let first = match data {
        Value::Array(items) => items.first()?,
        other => other,
    };
    first
        .get("generated_text")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Pull a human-readable message out of an upstream failure body.
fn upstream_message(body: &str, status: reqwest::StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(msg) = value.get("error").and_then(Value::as_str) {
            return msg.to_string();
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("upstream request failed")
        .to_string()
}

// =============================================================================
// HuggingFaceClient
// =============================================================================

/// Hugging Face Inference API client.
#[derive(Debug, Clone)]
pub struct HuggingFaceClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    max_new_tokens: u32,
}

impl HuggingFaceClient {
    pub fn from_config(config: &ModelConfig) -> Self {
        if config.api_key.is_none() {
            tracing::warn!(model = %config.model, "Model client created without API key");
        }
        Self {
            client: Client::new(),
            endpoint: config.endpoint(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            max_new_tokens: config.max_new_tokens,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextGenerator for HuggingFaceClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<Option<String>, UpstreamError> {
        let body = json!({
            "inputs": prompt,
            "parameters": { "max_new_tokens": self.max_new_tokens },
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = upstream_message(&text, status);
            tracing::warn!(status = status.as_u16(), message = %message, "Model call failed");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?;
        Ok(extract_generated_text(&data))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};

    #[derive(Default)]
    struct Captured {
        body: Option<Value>,
        auth: Option<String>,
    }

    type Shared = Arc<Mutex<Captured>>;

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client_for(base: &str, api_key: Option<&str>) -> HuggingFaceClient {
        let config = ModelConfig {
            base_url: format!("{base}/models"),
            model: "test/model".to_string(),
            max_new_tokens: 50,
            api_key: api_key.map(str::to_string),
        };
        HuggingFaceClient::from_config(&config)
    }

    #[test]
    fn test_build_prompt_with_history() {
        let history = vec![
            ConversationMessage::user("hola"),
            ConversationMessage::assistant("buenas"),
            ConversationMessage::user("qué tal"),
        ];
        assert_eq!(
            build_prompt(&history, "qué tal"),
            "user: hola\nassistant: buenas\nuser: qué tal\nuser: qué tal\nassistant:"
        );
    }

    #[test]
    fn test_build_prompt_without_history() {
        assert_eq!(build_prompt(&[], "hola"), "user: hola\nassistant:");
    }

    #[test]
    fn test_extract_from_list() {
        let data = json!([{ "generated_text": "primero" }, { "generated_text": "segundo" }]);
        assert_eq!(extract_generated_text(&data).as_deref(), Some("primero"));
    }

    #[test]
    fn test_extract_from_object() {
        let data = json!({ "generated_text": "solo" });
        assert_eq!(extract_generated_text(&data).as_deref(), Some("solo"));
    }

    #[test]
    fn test_extract_missing_or_empty() {
        assert_eq!(extract_generated_text(&json!([])), None);
        assert_eq!(extract_generated_text(&json!([{ "score": 0.3 }])), None);
        assert_eq!(extract_generated_text(&json!({ "generated_text": "" })), None);
        assert_eq!(extract_generated_text(&json!({ "generated_text": 7 })), None);
        assert_eq!(extract_generated_text(&json!("texto")), None);
    }

    #[test]
    fn test_upstream_message() {
        let status = reqwest::StatusCode::SERVICE_UNAVAILABLE;
        assert_eq!(
            upstream_message(r#"{"error":"Model is loading","estimated_time":20}"#, status),
            "Model is loading"
        );
        assert_eq!(upstream_message("gateway down", status), "gateway down");
        assert_eq!(upstream_message("", status), "Service Unavailable");
    }

    #[test]
    fn test_client_configuration() {
        let client = client_for("http://127.0.0.1:1", None);
        assert!(!client.is_configured());
        assert_eq!(client.model(), "test/model");
        assert_eq!(client.endpoint(), "http://127.0.0.1:1/models/test/model");

        assert!(client_for("http://127.0.0.1:1", Some("hf_x")).is_configured());
    }

    #[tokio::test]
    async fn test_generate_sends_inputs_and_bearer() {
        let captured: Shared = Arc::default();
        let router = Router::new()
            .route(
                "/models/test/model",
                post(
                    |State(captured): State<Shared>, headers: HeaderMap, Json(body): Json<Value>| async move {
                        let mut c = captured.lock().unwrap();
                        c.body = Some(body);
                        c.auth = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        Json(json!([{ "generated_text": "Buen golpe." }]))
                    },
                ),
            )
            .with_state(Arc::clone(&captured));
        let base = spawn(router).await;

        let client = client_for(&base, Some("hf_secret"));
        let text = client.generate("user: hola\nassistant:").await.unwrap();
        assert_eq!(text.as_deref(), Some("Buen golpe."));

        let c = captured.lock().unwrap();
        assert_eq!(c.auth.as_deref(), Some("Bearer hf_secret"));
        let body = c.body.as_ref().unwrap();
        assert_eq!(body["inputs"], "user: hola\nassistant:");
        assert_eq!(body["parameters"]["max_new_tokens"], 50);
    }

    #[tokio::test]
    async fn test_generate_maps_upstream_failure() {
        let router = Router::new().route(
            "/models/test/model",
            post(|| async {
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "error": "Model test/model is currently loading" })),
                )
            }),
        );
        let base = spawn(router).await;

        let err = client_for(&base, Some("hf_x"))
            .generate("hola")
            .await
            .unwrap_err();
        match err {
            UpstreamError::Status { status, message } => {
                assert_eq!(status, 503);
                assert!(message.contains("currently loading"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_without_text() {
        let router = Router::new().route(
            "/models/test/model",
            post(|| async { Json(json!({ "warnings": [] })) }),
        );
        let base = spawn(router).await;

        let text = client_for(&base, Some("hf_x")).generate("hola").await.unwrap();
        assert_eq!(text, None);
    }

    #[tokio::test]
    async fn test_generate_invalid_json() {
        let router = Router::new().route("/models/test/model", post(|| async { "<html>" }));
        let base = spawn(router).await;

        let err = client_for(&base, Some("hf_x"))
            .generate("hola")
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_generate_transport_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client_for(&format!("http://{addr}"), Some("hf_x"))
            .generate("hola")
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Transport(_)));
    }
}
