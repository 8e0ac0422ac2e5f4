//! Time budgeting and search limits.
//!
//! [`allocate_time`] decides how much of the remaining clock a move may use.
//! [`SearchLimits`] bundles the simulation cap with that time slice, and
//! [`TimeControl`] is the running clock the search polls between
//! simulations.

use std::time::{Duration, Instant};

/// Moves numbered below this are opening moves.
pub const OPENING_END_MOVE: u32 = 15;
/// Moves numbered from this onwards get the late-game allocation.
pub const MIDDLEGAME_END_MOVE: u32 = 50;

const OPENING_FRACTION: f64 = 0.025;
const MIDDLEGAME_FRACTION: f64 = 0.05;
const LATE_FRACTION: f64 = 0.01;

/// Share of the remaining clock to spend on the move with number
/// `move_number`.
///
/// Small in the opening, largest in the middlegame, and small again once
/// the game runs long.
pub fn allocate_time(move_number: u32, remaining: Duration) -> Duration {
    let fraction = if move_number < OPENING_END_MOVE {
        OPENING_FRACTION
    } else if move_number < MIDDLEGAME_END_MOVE {
        MIDDLEGAME_FRACTION
    } else {
        LATE_FRACTION
    };
    remaining.mul_f64(fraction)
}

/// Limits that control when a search stops.
///
/// The search ends after `simulations` iterations or once `move_time` has
/// elapsed, whichever comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Maximum number of simulations
    pub simulations: u32,
    /// Wall-clock budget for this move (None = unbounded)
    pub move_time: Option<Duration>,
}

impl SearchLimits {
    /// Only a simulation cap.
    pub fn simulations(simulations: u32) -> Self {
        Self {
            simulations,
            move_time: None,
        }
    }

    /// Simulation cap plus a time budget.
    pub fn simulations_and_time(simulations: u32, move_time: Duration) -> Self {
        Self {
            simulations,
            move_time: Some(move_time),
        }
    }

    /// Start the clock for a search under these limits.
    pub fn start(&self) -> TimeControl {
        TimeControl::start(self.move_time)
    }
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self::simulations(800)
    }
}

/// A started clock with an optional limit.
///
/// Checking is cooperative: the owner calls [`TimeControl::expired`] at
/// points where stopping is safe.
#[derive(Debug, Clone, Copy)]
pub struct TimeControl {
    start: Instant,
    time_limit: Option<Duration>,
}

impl TimeControl {
    pub fn start(time_limit: Option<Duration>) -> Self {
        Self {
            start: Instant::now(),
            time_limit,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// True once the elapsed time exceeds the limit.
    pub fn expired(&self) -> bool {
        self.time_limit
            .is_some_and(|limit| self.start.elapsed() > limit)
    }

    /// Get remaining time (None if no limit).
    pub fn remaining(&self) -> Option<Duration> {
        let limit = self.time_limit?;
        Some(limit.saturating_sub(self.elapsed()))
    }
}

#[cfg(test)]
#[path = "time_control_tests.rs"]
mod time_control_tests;
