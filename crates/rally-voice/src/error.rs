//! Error types for the voice assistant.

use rally_core::error::RallyError;

/// Errors from speech backends and the remote model.
///
/// None of these reach the caller of `handle_query`; remote failures are
/// turned into a spoken apology instead.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    #[error("request to model proxy failed: {0}")]
    Transport(String),
    #[error("model proxy returned status {status}")]
    Status { status: u16 },
    #[error("invalid model proxy response: {0}")]
    InvalidResponse(String),
    #[error("speech recognition unavailable: {0}")]
    RecognizerUnavailable(String),
    #[error("speech error: {0}")]
    Speech(String),
}

impl From<reqwest::Error> for VoiceError {
    fn from(err: reqwest::Error) -> Self {
        VoiceError::Transport(err.to_string())
    }
}

impl From<VoiceError> for RallyError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::RecognizerUnavailable(_) | VoiceError::Speech(_) => {
                RallyError::Speech(err.to_string())
            }
            _ => RallyError::Model(err.to_string()),
        }
    }
}
