//! # Frame Driver
//!
//! Turns a stream of frame instants into `tick` calls:
//!
//! ```text
//! Frame N:
//! ┌──────────────────────────────────────────────────────────────┐
//! │ paused or suspended?                                         │
//! │   yes ─> re-arm `last = now`, nothing accrues                │
//! │   no  ─> tick(now - last), `last = now`                      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Re-arming on every idle frame means the first tick after a start or a
//! resume only carries the time since the previous frame, never the time
//! spent paused or hidden.

use std::time::{Duration, Instant};

use pancakes_economy::{Accrual, EconomyResult, StateStore, StudyEvent, StudyTracker};
use tracing::{debug, info};

/// Gaps longer than this are logged (laptop lid closed, process stopped).
pub const LONG_FRAME: Duration = Duration::from_secs(5);

/// Per-run counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames seen.
    pub frames: u64,
    /// Frames that fed time into the tracker.
    pub ticked_frames: u64,
    /// Minutes credited across all frames.
    pub minutes_credited: u64,
    /// Coins credited across all frames.
    pub coins_credited: u64,
}

impl FrameStats {
    fn record(&mut self, accrual: Accrual) {
        self.ticked_frames += 1;
        self.minutes_credited += accrual.minutes;
        self.coins_credited += accrual.coins;
    }
}

/// Feeds real elapsed time into a tracker.
#[derive(Debug)]
pub struct FrameDriver {
    /// Instant of the previous frame.
    last: Instant,
    /// True while the host is hidden.
    suspended: bool,
    /// Counters.
    stats: FrameStats,
}

impl FrameDriver {
    /// Creates a driver whose first frame measures from `now`.
    #[must_use]
    pub fn new(now: Instant) -> Self {
        Self {
            last: now,
            suspended: false,
            stats: FrameStats::default(),
        }
    }

    /// Runs one frame.
    ///
    /// # Errors
    ///
    /// Propagates the tracker's tick error (coin overflow).
    pub fn frame<S: StateStore>(
        &mut self,
        now: Instant,
        tracker: &mut StudyTracker<S>,
    ) -> EconomyResult<Accrual> {
        self.stats.frames += 1;
        let elapsed = now.saturating_duration_since(self.last);
        self.last = now;

        if self.suspended || !tracker.is_running() {
            return Ok(Accrual::default());
        }

        if elapsed > LONG_FRAME {
            debug!(gap_ms = elapsed.as_millis(), "long frame");
        }

        let accrual = tracker.tick_duration(elapsed)?;
        self.stats.record(accrual);
        Ok(accrual)
    }

    /// Marks the host hidden or visible.
    ///
    /// Hidden time never accrues. The change is announced only while the
    /// timer runs. Returns `false` if the flag did not change.
    pub fn set_suspended<S: StateStore>(
        &mut self,
        suspended: bool,
        now: Instant,
        tracker: &StudyTracker<S>,
    ) -> bool {
        if self.suspended == suspended {
            return false;
        }
        self.suspended = suspended;
        self.last = now;

        if tracker.is_running() {
            info!(suspended, "visibility changed");
            let event = if suspended {
                StudyEvent::Suspended
            } else {
                StudyEvent::Resumed
            };
            tracker.events().send(event);
        }
        true
    }

    /// True while hidden.
    #[inline]
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}
