//! Rally simulation crate - match scoring and a simulated detection feed.

pub mod score;
pub mod simulator;

pub use score::{Player, ScoreEvent, Scoreboard, SetScore};
pub use simulator::{MatchSimulator, PointOutcome, PointResult, Rally, Swing, SwingKind};
