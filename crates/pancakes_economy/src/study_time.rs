//! # Study Time
//!
//! **NO FLOATING POINT ACCUMULATION OF STUDY TIME**
//!
//! Frame deltas arrive as `f64` seconds or `Duration`s. Adding thousands of
//! sixty-hertz floats drifts, so every delta is converted once into an
//! integer count of microseconds and summed exactly.
//!
//! - Six implicit decimal places of a second
//! - Whole seconds and whole minutes are plain integer division
//! - Seconds as `f64` only exist at the edges (display, persistence)

use std::fmt;
use std::ops::{Add, AddAssign};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of decimal places of a second.
const DECIMAL_PLACES: u32 = 6;

/// Microseconds per second.
const MICROS_PER_SEC: u64 = 10u64.pow(DECIMAL_PLACES);

/// Microseconds per minute.
const MICROS_PER_MIN: u64 = 60 * MICROS_PER_SEC;

/// Elapsed study time with microsecond resolution.
///
/// Internally stores seconds * 1,000,000 as a u64.
///
/// # Range
///
/// - Minimum: 0.000000 s
/// - Maximum: roughly 584,000 years
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct StudyTime(u64);

impl StudyTime {
    /// Zero elapsed time.
    pub const ZERO: Self = Self(0);

    /// One second.
    pub const SECOND: Self = Self(MICROS_PER_SEC);

    /// One minute.
    pub const MINUTE: Self = Self(MICROS_PER_MIN);

    /// Maximum representable time.
    pub const MAX: Self = Self(u64::MAX);

    /// Creates a time from whole seconds.
    #[inline]
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(MICROS_PER_SEC))
    }

    /// Creates a time from raw microseconds.
    #[inline]
    #[must_use]
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Converts a floating-point seconds count.
    ///
    /// NaN, negative and infinite input clamp to zero; everything else is
    /// rounded to the nearest microsecond and saturates at [`Self::MAX`].
    #[must_use]
    pub fn from_secs_f64(secs: f64) -> Self {
        if !secs.is_finite() || secs <= 0.0 {
            return Self::ZERO;
        }
        let micros = (secs * MICROS_PER_SEC as f64).round();
        if micros >= u64::MAX as f64 {
            Self::MAX
        } else {
            Self(micros as u64)
        }
    }

    /// Converts a `Duration`, rounding to the nearest microsecond.
    #[must_use]
    pub fn from_duration(duration: Duration) -> Self {
        let micros = (duration.as_nanos() + 500) / 1_000;
        Self(u64::try_from(micros).unwrap_or(u64::MAX))
    }

    /// Returns the raw microsecond count.
    #[inline]
    #[must_use]
    pub const fn as_micros(self) -> u64 {
        self.0
    }

    /// Returns the time as floating-point seconds.
    #[inline]
    #[must_use]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / MICROS_PER_SEC as f64
    }

    /// Returns the number of whole seconds.
    #[inline]
    #[must_use]
    pub const fn whole_seconds(self) -> u64 {
        self.0 / MICROS_PER_SEC
    }

    /// Returns the number of whole minutes.
    #[inline]
    #[must_use]
    pub const fn whole_minutes(self) -> u64 {
        self.0 / MICROS_PER_MIN
    }

    /// Returns true if no time has elapsed.
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition. Returns `None` on overflow.
    #[inline]
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Saturating addition.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction.
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Add for StudyTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl AddAssign for StudyTime {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = self.saturating_add(rhs);
    }
}

impl From<Duration> for StudyTime {
    fn from(duration: Duration) -> Self {
        Self::from_duration(duration)
    }
}

impl fmt::Debug for StudyTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StudyTime({}.{:06}s)",
            self.whole_seconds(),
            self.0 % MICROS_PER_SEC
        )
    }
}

/// Renders `HH:MM:SS`, zero-padded. Hours keep growing past 99.
impl fmt::Display for StudyTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.whole_seconds();
        write!(f, "{:02}:{:02}:{:02}", t / 3600, (t % 3600) / 60, t % 60)
    }
}

/// Formats a seconds count as `HH:MM:SS`.
///
/// Fractions are floored; negative and NaN input render as `00:00:00`.
#[must_use]
pub fn format_hms(secs: f64) -> String {
    let floored = if secs.is_finite() { secs.floor() } else { 0.0 };
    StudyTime::from_secs_f64(floored).to_string()
}

impl Serialize for StudyTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_secs_f64())
    }
}

impl<'de> Deserialize<'de> for StudyTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(serde::de::Error::custom(format!(
                "study time must be a non-negative number of seconds, got {secs}"
            )));
        }
        Ok(Self::from_secs_f64(secs))
    }
}
