//! # Study State
//!
//! The single aggregate shared by the accrual engine and the economy engine.
//! The host owns it (through [`crate::StudyTracker`]), persists it as a whole,
//! and hands it by reference to the engines.
//!
//! ## Persisted Record
//!
//! ```text
//! {
//!   "running": false,
//!   "startedAt": 1700000000000,
//!   "sessionSeconds": 12.5,
//!   "totalSeconds": 3600.0,
//!   "creditedMinutes": 60,
//!   "coins": 140,
//!   "inventory": {"flour": 2, "egg": 1, "milk": 1, "sugar": 1, "butter": 1},
//!   "pancakesCooked": 3,
//!   "batchesCooked": 3,
//!   "notes": [{"timestamp": 1700000000000, "text": "chapter 4"}]
//! }
//! ```
//!
//! Every field is optional on load. The short names written by the browser
//! build (`sessionSec`, `totalSec`, `inv`, `pancakes`, `batches`, note `t`)
//! are accepted as aliases.

use serde::{Deserialize, Serialize};

use crate::pantry::Pantry;
use crate::study_time::StudyTime;

/// A user-authored annotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Wall-clock time the note was taken, in Unix epoch milliseconds.
    #[serde(rename = "timestamp", alias = "t")]
    pub timestamp_ms: u64,
    /// Trimmed, non-empty text.
    pub text: String,
}

/// All mutable tracker state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StudyState {
    /// Whether accrual is active.
    pub running: bool,
    /// Epoch milliseconds of the most recent start.
    pub started_at: Option<u64>,
    /// Time in the current, uncommitted run.
    #[serde(alias = "sessionSec")]
    pub session_seconds: StudyTime,
    /// Committed lifetime time (excludes the current session).
    #[serde(alias = "totalSec")]
    pub total_seconds: StudyTime,
    /// Watermark of whole minutes already converted to coins.
    pub credited_minutes: u64,
    /// Coin balance.
    pub coins: u64,
    /// Ingredient counts.
    #[serde(alias = "inv")]
    pub inventory: Pantry,
    /// Lifetime pancakes produced.
    #[serde(alias = "pancakes")]
    pub pancakes_cooked: u64,
    /// Lifetime batches cooked.
    #[serde(alias = "batches")]
    pub batches_cooked: u64,
    /// Notes in chronological order.
    pub notes: Vec<Note>,
}

impl StudyState {
    /// Creates a fresh state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed time plus the current session.
    #[inline]
    #[must_use]
    pub fn combined_time(&self) -> StudyTime {
        self.total_seconds + self.session_seconds
    }

    /// Whole minutes of combined time not yet converted to coins.
    #[must_use]
    pub fn uncredited_minutes(&self) -> u64 {
        self.combined_time()
            .whole_minutes()
            .saturating_sub(self.credited_minutes)
    }

    /// Combined time still needed before the next coin is paid.
    ///
    /// Measured against the credited watermark, not the next clock minute:
    /// after a session reset the watermark can sit ahead of combined time.
    /// Zero when a credit is already due.
    #[must_use]
    pub fn until_next_credit(&self) -> StudyTime {
        let next = self.credited_minutes.saturating_add(1).saturating_mul(60);
        StudyTime::from_secs(next).saturating_sub(self.combined_time())
    }

    /// The last `limit` notes, oldest first.
    #[must_use]
    pub fn recent_notes(&self, limit: usize) -> &[Note] {
        let start = self.notes.len().saturating_sub(limit);
        &self.notes[start..]
    }
}
