//! Client side of the text-generation proxy.

use async_trait::async_trait;
use reqwest::Client;

use rally_core::{ConversationMessage, VoiceAgentRequest, VoiceAgentResponse};

use crate::error::VoiceError;

/// Anything that can answer a free-text prompt given the conversation so far.
///
/// `Ok(None)` means the model answered successfully but said nothing.
#[async_trait]
pub trait RemoteModel: Send + Sync {
    async fn ask(
        &self,
        prompt: &str,
        history: &[ConversationMessage],
    ) -> Result<Option<String>, VoiceError>;
}

/// Posts `{prompt, history}` to a `/api/voice-agent` endpoint.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: Client,
    endpoint: String,
}

impl ProxyClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RemoteModel for ProxyClient {
    async fn ask(
        &self,
        prompt: &str,
        history: &[ConversationMessage],
    ) -> Result<Option<String>, VoiceError> {
        let body = VoiceAgentRequest {
            prompt: prompt.to_string(),
            history: history.to_vec(),
        };

        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "Model proxy returned failure status");
            return Err(VoiceError::Status {
                status: status.as_u16(),
            });
        }

        let data: VoiceAgentResponse = response
            .json()
            .await
            .map_err(|e| VoiceError::InvalidResponse(e.to_string()))?;
        Ok(data.answer)
    }
}

// =============================================================================
// Tests
// =============================================================================
