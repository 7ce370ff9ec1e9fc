//! In-memory match statistics for the current session.
//!
//! `StatStore` keeps three append-only logs (points, serves, trajectories).
//! It is constructed explicitly and shared through [`SharedStatStore`] by
//! whichever components need it; nothing here is global.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::types::{
    now_millis, PointRecord, ServeRecord, Timestamp, TrajectoryRecord, TrajectorySample,
};

/// Handle to a store shared between the simulator, the dispatcher and the API.
#[derive(Debug, Clone, Default)]
pub struct SharedStatStore {
    inner: Arc<Mutex<StatStore>>,
}

impl SharedStatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the store. Every operation on `StatStore` is total, so a
    /// poisoned lock still holds consistent data and is recovered.
    pub fn lock(&self) -> MutexGuard<'_, StatStore> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Append-only session telemetry.
#[derive(Debug, Clone, Default)]
pub struct StatStore {
    points: Vec<PointRecord>,
    serves: Vec<ServeRecord>,
    trajectories: Vec<TrajectoryRecord>,
}

impl StatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything recorded so far.
    pub fn reset(&mut self) {
        self.points.clear();
        self.serves.clear();
        self.trajectories.clear();
    }

    // -----------------------------------------------------------------
    // Recording
    // -----------------------------------------------------------------

    /// Open a new point starting now.
    pub fn start_point(&mut self) {
        self.start_point_at(now_millis());
    }

    pub fn start_point_at(&mut self, start: Timestamp) {
        self.points.push(PointRecord { start, end: None });
    }

    /// Close the most recently opened point.
    ///
    /// No-op when there are no points or the last one is already closed.
    pub fn end_point(&mut self) {
        self.end_point_at(now_millis());
    }

    pub fn end_point_at(&mut self, end: Timestamp) {
        match self.points.last_mut() {
            Some(point) if point.end.is_none() => point.end = Some(end),
            _ => tracing::trace!("end_point ignored: no open point"),
        }
    }

    /// Record a serve speed in km/h. The value is not range-checked.
    pub fn record_serve(&mut self, speed: f64) {
        self.record_serve_at(speed, now_millis());
    }

    pub fn record_serve_at(&mut self, speed: f64, timestamp: Timestamp) {
        self.serves.push(ServeRecord { speed, timestamp });
    }

    pub fn record_trajectory(&mut self, positions: Vec<TrajectorySample>) {
        self.trajectories.push(TrajectoryRecord { positions });
    }

    // -----------------------------------------------------------------
    // Reading
    // -----------------------------------------------------------------

    pub fn points(&self) -> &[PointRecord] {
        &self.points
    }

    pub fn serves(&self) -> &[ServeRecord] {
        &self.serves
    }

    pub fn trajectories(&self) -> &[TrajectoryRecord] {
        &self.trajectories
    }

    /// Mean point duration in seconds. Points still in play count up to `now`.
    ///
    /// Returns `None` when no point has been recorded.
    pub fn average_point_duration_secs(&self, now: Timestamp) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        let total_ms: i64 = self.points.iter().map(|p| p.duration_millis(now)).sum();
        Some(total_ms as f64 / 1000.0 / self.points.len() as f64)
    }

    /// Fastest recorded serve in km/h, or `None` when no serve was recorded.
    pub fn max_serve_speed(&self) -> Option<f64> {
        self.serves.iter().map(|s| s.speed).reduce(f64::max)
    }

    pub fn summary(&self, now: Timestamp) -> StatsSummary {
        StatsSummary {
            points: self.points.len(),
            open_points: self.points.iter().filter(|p| !p.is_closed()).count(),
            average_point_secs: self.average_point_duration_secs(now),
            serves: self.serves.len(),
            max_serve_kmh: self.max_serve_speed(),
            trajectories: self.trajectories.len(),
        }
    }
}

/// Point-in-time snapshot of a [`StatStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub points: usize,
    pub open_points: usize,
    pub average_point_secs: Option<f64>,
    pub serves: usize,
    pub max_serve_kmh: Option<f64>,
    pub trajectories: usize,
}

// =============================================================================
// Tests
// =============================================================================
