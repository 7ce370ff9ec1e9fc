//! Domain types shared across Rally crates.
//!
//! Timestamps are epoch milliseconds so point durations can be computed
//! with plain integer arithmetic.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Epoch milliseconds.
pub type Timestamp = i64;

/// Current wall-clock time as epoch milliseconds.
pub fn now_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}

// =============================================================================
// Match telemetry
// =============================================================================

/// Timing of a single point. `end` is `None` while the point is in play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointRecord {
    pub start: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Timestamp>,
}

impl PointRecord {
    /// Whether the point has concluded.
    pub fn is_closed(&self) -> bool {
        self.end.is_some()
    }

    /// Duration in milliseconds, using `now` as the end of a point still in play.
    pub fn duration_millis(&self, now: Timestamp) -> i64 {
        self.end.unwrap_or(now) - self.start
    }
}

/// A detected serve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServeRecord {
    /// Ball speed in km/h.
    pub speed: f64,
    pub timestamp: Timestamp,
}

/// One tracked ball position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    pub x: f64,
    pub y: f64,
    pub time: Timestamp,
}

/// An ordered sequence of tracked ball positions for one shot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRecord {
    pub positions: Vec<TrajectorySample>,
}

// =============================================================================
// Conversation
// =============================================================================

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single turn of the voice conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// =============================================================================
// Voice agent wire format
// =============================================================================

/// Body of `POST /api/voice-agent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceAgentRequest {
    pub prompt: String,
    #[serde(default)]
    pub history: Vec<ConversationMessage>,
}

/// Successful response of `POST /api/voice-agent`. Failures use the API's
/// JSON error body instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceAgentResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl VoiceAgentResponse {
    pub fn answer(answer: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
