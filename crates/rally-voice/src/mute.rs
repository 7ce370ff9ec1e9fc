//! Mute control for the voice assistant.
//!
//! Two states:
//! - Active -> Muted (explicit toggle)
//! - Muted -> Active (explicit toggle, or the activation keyword)
//!
//! Ordinary queries never change the state.

use std::fmt;
use std::sync::Mutex;

/// Whether the assistant currently answers queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MuteState {
    #[default]
    Active,
    Muted,
}

impl fmt::Display for MuteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MuteState::Active => write!(f, "Active"),
            MuteState::Muted => write!(f, "Muted"),
        }
    }
}

impl MuteState {
    pub fn toggled(self) -> Self {
        match self {
            MuteState::Active => MuteState::Muted,
            MuteState::Muted => MuteState::Active,
        }
    }
}

/// Thread-safe holder of the mute state, starting `Active`.
#[derive(Debug, Default)]
pub struct MuteControl {
    state: Mutex<MuteState>,
}

impl MuteControl {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MuteState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current(&self) -> MuteState {
        *self.lock()
    }

    pub fn is_muted(&self) -> bool {
        self.current() == MuteState::Muted
    }

    /// Unmute regardless of the prior state. Returns the prior state.
    pub fn activate(&self) -> MuteState {
        let mut state = self.lock();
        let previous = *state;
        if previous != MuteState::Active {
            tracing::debug!("Mute state: {} -> {}", previous, MuteState::Active);
        }
        *state = MuteState::Active;
        previous
    }

    /// Flip the state. Returns the new state.
    pub fn toggle(&self) -> MuteState {
        let mut state = self.lock();
        let next = state.toggled();
        tracing::debug!("Mute state: {} -> {}", *state, next);
        *state = next;
        next
    }
}

// =============================================================================
// Tests
// =============================================================================
