pub mod config;
pub mod error;
pub mod stats;
pub mod types;

pub use config::RallyConfig;
pub use error::{RallyError, Result};
pub use stats::{SharedStatStore, StatStore, StatsSummary};
pub use types::*;
