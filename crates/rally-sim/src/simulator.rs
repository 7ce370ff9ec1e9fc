//! Simulated ball-tracking feed.
//!
//! Stands in for the camera pipeline: every tick it may detect a swing,
//! opening a point in the [`StatStore`](rally_core::StatStore), and after a
//! short delay it closes the point, sometimes deciding it on the scoreboard.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::time::MissedTickBehavior;

use rally_core::config::SimulationConfig;
use rally_core::{now_millis, SharedStatStore, TrajectorySample};

use crate::score::{Player, ScoreEvent, Scoreboard};

/// What kind of swing was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SwingKind {
    FirstServe,
    SecondServe,
    Stroke,
}

impl SwingKind {
    pub fn is_serve(self) -> bool {
        !matches!(self, SwingKind::Stroke)
    }
}

/// How a decided point ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PointOutcome {
    Winner,
    UnforcedError,
    ForcedError,
    Ace,
}

impl PointOutcome {
    pub const ALL: [PointOutcome; 4] = [
        PointOutcome::Winner,
        PointOutcome::UnforcedError,
        PointOutcome::ForcedError,
        PointOutcome::Ace,
    ];
}

impl fmt::Display for PointOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointOutcome::Winner => write!(f, "winner"),
            PointOutcome::UnforcedError => write!(f, "unforced-error"),
            PointOutcome::ForcedError => write!(f, "forced-error"),
            PointOutcome::Ace => write!(f, "ace"),
        }
    }
}

/// A detected swing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Swing {
    pub kind: SwingKind,
    /// Ball speed in km/h.
    pub speed: f64,
    pub player: Player,
    pub position: TrajectorySample,
}

/// A rally opened by one tick, waiting to be resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rally {
    pub swing: Swing,
    /// Whether resolving this rally awards a point.
    pub decided: bool,
}

/// A point that changed the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointResult {
    pub winner: Player,
    pub outcome: PointOutcome,
    pub event: ScoreEvent,
}

/// Drives a [`Scoreboard`] and a shared stat store from random detections.
pub struct MatchSimulator<R = StdRng> {
    config: SimulationConfig,
    stats: SharedStatStore,
    scoreboard: Scoreboard,
    results: Vec<PointResult>,
    rng: R,
}

impl MatchSimulator<StdRng> {
    pub fn new(config: SimulationConfig, stats: SharedStatStore) -> Self {
        Self::with_rng(config, stats, StdRng::from_os_rng())
    }
}

impl<R: Rng> MatchSimulator<R> {
    pub fn with_rng(config: SimulationConfig, stats: SharedStatStore, rng: R) -> Self {
        Self {
            config,
            stats,
            scoreboard: Scoreboard::new(),
            results: Vec::new(),
            rng,
        }
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    /// Decided points so far, in order.
    pub fn results(&self) -> &[PointResult] {
        &self.results
    }

    pub fn player_name(&self, player: Player) -> &str {
        &self.config.players[player.index()]
    }

    fn chance(&mut self, probability: f64) -> bool {
        let p = if probability.is_finite() {
            probability.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.rng.random_bool(p)
    }

    /// One detection tick. Returns the rally it opened, if any.
    pub fn tick(&mut self) -> Option<Rally> {
        if self.scoreboard.is_finished() || !self.chance(self.config.point_probability) {
            return None;
        }

        let player = self.scoreboard.server();
        let kind = if self.chance(self.config.serve_probability) {
            if self.chance(self.config.second_serve_probability) {
                SwingKind::SecondServe
            } else {
                SwingKind::FirstServe
            }
        } else {
            SwingKind::Stroke
        };
        let speed_range = if kind.is_serve() { 120..200u32 } else { 80..130u32 };
        let speed = f64::from(self.rng.random_range(speed_range));
        let x = match player {
            Player::First => self.rng.random_range(50.0..250.0),
            Player::Second => self.rng.random_range(250.0..450.0),
        };
        let y = self.rng.random_range(200.0..300.0);
        let position = TrajectorySample {
            x,
            y,
            time: now_millis(),
        };
        let decided = self.chance(self.config.decided_probability);

        {
            let mut stats = self.stats.lock();
            stats.start_point();
            if kind.is_serve() {
                stats.record_serve(speed);
            }
            stats.record_trajectory(vec![position]);
        }

        tracing::debug!(
            player = self.player_name(player),
            kind = ?kind,
            speed,
            "Swing detected"
        );

        Some(Rally {
            swing: Swing {
                kind,
                speed,
                player,
                position,
            },
            decided,
        })
    }

    /// Close the point opened by `rally`, awarding it when the rally was decided.
    pub fn resolve(&mut self, rally: &Rally) -> Option<PointResult> {
        let result = if rally.decided {
            let winner = if self.chance(0.5) {
                Player::First
            } else {
                Player::Second
            };
            let outcome = PointOutcome::ALL[self.rng.random_range(0..PointOutcome::ALL.len())];
            self.scoreboard
                .award_point(winner)
                .map(|event| PointResult {
                    winner,
                    outcome,
                    event,
                })
        } else {
            None
        };

        self.stats.lock().end_point();

        if let Some(result) = result {
            tracing::info!(
                winner = self.player_name(result.winner),
                outcome = %result.outcome,
                event = ?result.event,
                "Point decided"
            );
            self.results.push(result);
        }
        result
    }
}

impl<R: Rng + Send> MatchSimulator<R> {
    /// Tick until the match is over or `shutdown` resolves. Returns the final
    /// scoreboard.
    ///
    /// A point opened right before shutdown is closed without being decided.
    pub async fn run<F>(mut self, shutdown: F) -> Scoreboard
    where
        F: Future<Output = ()>,
    {
        let tick = Duration::from_millis(self.config.tick_ms.max(1));
        let resolve_delay = Duration::from_millis(self.config.resolve_delay_ms);

        tracing::info!(
            tick_ms = self.config.tick_ms,
            players = ?self.config.players,
            "Match simulation started"
        );

        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; detections start one period in.
        interval.tick().await;
        tokio::pin!(shutdown);

        while !self.scoreboard.is_finished() {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => {}
            }

            let Some(rally) = self.tick() else {
                continue;
            };

            tokio::select! {
                _ = &mut shutdown => {
                    self.stats.lock().end_point();
                    break;
                }
                _ = tokio::time::sleep(resolve_delay) => {}
            }

            self.resolve(&rally);
        }

        tracing::info!(
            finished = self.scoreboard.is_finished(),
            points = self.results.len(),
            "Match simulation stopped"
        );
        self.scoreboard
    }
}

// =============================================================================
// Tests
// =============================================================================
