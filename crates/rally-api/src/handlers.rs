//! Route handler functions for all API endpoints.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use rally_core::{now_millis, StatsSummary, VoiceAgentRequest, VoiceAgentResponse};

use crate::error::ApiError;
use crate::state::AppState;
use crate::upstream::build_prompt;

/// Answer when the model call succeeds without generated text.
pub const NO_ANSWER: &str = "Lo siento, no tengo una respuesta.";

/// Answer when no model credential is configured.
pub const NOT_CONFIGURED: &str = "El agente de voz no está configurado.";

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub model: String,
    pub model_configured: bool,
}

// =============================================================================
// Handler functions
// =============================================================================

/// POST /api/voice-agent - forward a conversational prompt to the model.
pub async fn voice_agent(
    State(state): State<AppState>,
    Json(req): Json<VoiceAgentRequest>,
) -> Result<Json<VoiceAgentResponse>, ApiError> {
    if req.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("prompt is required".to_string()));
    }

    if !state.generator.is_configured() {
        tracing::debug!("Voice agent called without model credential");
        return Ok(Json(VoiceAgentResponse::answer(NOT_CONFIGURED)));
    }

    let prompt = build_prompt(&req.history, &req.prompt);
    tracing::debug!(
        model = state.generator.model(),
        history = req.history.len(),
        "Forwarding prompt to model"
    );

    let answer = state
        .generator
        .generate(&prompt)
        .await?
        .unwrap_or_else(|| NO_ANSWER.to_string());

    Ok(Json(VoiceAgentResponse::answer(answer)))
}

/// GET /api/stats - snapshot of the session telemetry.
pub async fn stats(State(state): State<AppState>) -> Json<StatsSummary> {
    Json(state.stats.lock().summary(now_millis()))
}

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        model: state.generator.model().to_string(),
        model_configured: state.generator.is_configured(),
    })
}
