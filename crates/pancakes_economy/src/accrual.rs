//! # Accrual Engine
//!
//! Converts focused study time into coins at whole-minute boundaries.
//!
//! ## The Watermark
//!
//! ```text
//! combined = total + session            (microseconds, exact)
//! minutes  = floor(floor(combined) / 60)
//! new      = minutes - credited         (never negative)
//! credited += new ; coins += new * rate
//! ```
//!
//! Crediting looks at the combined time, never the session alone, so a
//! pause (which folds the session into the total) cannot re-credit minutes
//! that were already paid out. The watermark only moves forward.
//!
//! The engine holds no state of its own beyond the rate. Suspension (hidden
//! tab, minimised window) is the driver's business: it simply stops calling
//! [`AccrualEngine::tick`].

use std::time::Duration;

use tracing::debug;

use crate::error::{EconomyError, EconomyResult};
use crate::state::StudyState;
use crate::study_time::StudyTime;

/// Coins credited per full minute of study.
pub const RATE_PER_MIN: u64 = 10;

/// Outcome of a single tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Accrual {
    /// Minutes newly credited by this tick.
    pub minutes: u64,
    /// Coins added by this tick.
    pub coins: u64,
}

impl Accrual {
    /// True if the tick crossed at least one minute boundary.
    #[inline]
    #[must_use]
    pub const fn credited(&self) -> bool {
        self.minutes > 0
    }
}

/// Time bookkeeping and coin crediting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccrualEngine {
    rate_per_min: u64,
}

impl Default for AccrualEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AccrualEngine {
    /// Creates an engine paying [`RATE_PER_MIN`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rate_per_min: RATE_PER_MIN,
        }
    }

    /// Coins per credited minute.
    #[inline]
    #[must_use]
    pub const fn rate_per_min(&self) -> u64 {
        self.rate_per_min
    }

    /// Marks the timer running.
    ///
    /// Returns `false` (and changes nothing) if it already was.
    pub fn start(&self, state: &mut StudyState, now_ms: u64) -> bool {
        if state.running {
            return false;
        }
        state.running = true;
        state.started_at = Some(now_ms);
        true
    }

    /// Stops the timer and commits the session into the lifetime total.
    ///
    /// Returns `false` (and changes nothing) if the timer was not running.
    pub fn pause(&self, state: &mut StudyState) -> bool {
        if !state.running {
            return false;
        }
        state.running = false;
        state.total_seconds += state.session_seconds;
        state.session_seconds = StudyTime::ZERO;
        true
    }

    /// Adds elapsed time and credits any newly completed minutes.
    ///
    /// Negative, NaN and infinite deltas count as zero.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::ArithmeticOverflow` if the coin balance would
    /// overflow; the elapsed time is still recorded and the watermark is not
    /// moved, so the minutes are credited once the balance allows it.
    pub fn tick(&self, state: &mut StudyState, elapsed_secs: f64) -> EconomyResult<Accrual> {
        self.advance(state, StudyTime::from_secs_f64(elapsed_secs))
    }

    /// [`Self::tick`] for a `Duration` delta.
    ///
    /// # Errors
    ///
    /// See [`Self::tick`].
    pub fn tick_duration(&self, state: &mut StudyState, elapsed: Duration) -> EconomyResult<Accrual> {
        self.advance(state, StudyTime::from_duration(elapsed))
    }

    fn advance(&self, state: &mut StudyState, elapsed: StudyTime) -> EconomyResult<Accrual> {
        state.session_seconds += elapsed;

        let new_minutes = state.uncredited_minutes();
        if new_minutes == 0 {
            return Ok(Accrual::default());
        }

        let earned = new_minutes
            .checked_mul(self.rate_per_min)
            .ok_or(EconomyError::ArithmeticOverflow)?;
        state.coins = state
            .coins
            .checked_add(earned)
            .ok_or(EconomyError::ArithmeticOverflow)?;
        state.credited_minutes += new_minutes;

        debug!(
            minutes = new_minutes,
            coins = earned,
            credited_total = state.credited_minutes,
            "credited study minutes"
        );

        Ok(Accrual {
            minutes: new_minutes,
            coins: earned,
        })
    }

    /// Discards the current session without touching the lifetime total.
    ///
    /// Credited minutes and coins are kept; any fractional progress toward
    /// the next minute made in this session is lost.
    pub fn reset_session(&self, state: &mut StudyState) {
        state.session_seconds = StudyTime::ZERO;
    }

    /// Clears every time field. Part of the full reset.
    pub fn hard_reset_time(&self, state: &mut StudyState) {
        state.running = false;
        state.started_at = None;
        state.session_seconds = StudyTime::ZERO;
        state.total_seconds = StudyTime::ZERO;
        state.credited_minutes = 0;
    }
}
