//! Application state shared across all route handlers.
//!
//! AppState is passed to handlers via axum's State extractor.

use std::sync::Arc;
use std::time::Instant;

use rally_core::{RallyConfig, SharedStatStore};

use crate::upstream::{HuggingFaceClient, TextGenerator};

/// Shared application state.
///
/// All fields use `Arc` (or an `Arc`-backed handle) for cheap cloning across
/// handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration, fixed for the life of the server.
    pub config: Arc<RallyConfig>,
    /// Text-generation backend behind `/api/voice-agent`.
    pub generator: Arc<dyn TextGenerator>,
    /// Session telemetry.
    pub stats: SharedStatStore,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: RallyConfig,
        generator: Arc<dyn TextGenerator>,
        stats: SharedStatStore,
    ) -> Self {
        Self {
            config: Arc::new(config),
            generator,
            stats,
            start_time: Instant::now(),
        }
    }

    /// State backed by the Hugging Face client described by `config.model`.
    pub fn from_config(config: RallyConfig, stats: SharedStatStore) -> Self {
        let generator = Arc::new(HuggingFaceClient::from_config(&config.model));
        Self::new(config, generator, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_without_key_is_unconfigured() {
        let state = AppState::from_config(RallyConfig::default(), SharedStatStore::new());
        assert!(!state.generator.is_configured());
        assert_eq!(state.generator.model(), "google/flan-t5-base");
        assert_eq!(state.config.general.port, 3030);
    }

    #[test]
    fn test_from_config_with_key_is_configured() {
        let mut config = RallyConfig::default();
        config.model.api_key = Some("hf_test".to_string());
        let state = AppState::from_config(config, SharedStatStore::new());
        assert!(state.generator.is_configured());
    }

    #[test]
    fn test_state_shares_stats() {
        let stats = SharedStatStore::new();
        let state = AppState::from_config(RallyConfig::default(), stats.clone());
        stats.lock().record_serve(150.0);
        assert_eq!(state.stats.lock().serves().len(), 1);
    }
}
