//! Rally API crate - axum HTTP server and the text-generation proxy.
//!
//! Serves `POST /api/voice-agent`, which turns a conversation into a single
//! prompt for a hosted model, plus session stats and a health check.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod upstream;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
pub use upstream::{HuggingFaceClient, TextGenerator, UpstreamError};
