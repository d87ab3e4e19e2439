//! Simulation time and durations.
//!
//! [`SimTime`] wraps an `f64` with a total order and explicit
//! positive/negative infinity. NaN is rejected at construction, so
//! every held value is comparable and [`Eq`]/[`Ord`] hold. Negative
//! zero is normalized to positive zero on the way in, keeping the
//! total order consistent with IEEE equality.
//!
//! The same type serves as both a point in time and a duration: a
//! model's time advance is a duration added to the current time via
//! [`SimTime::checked_add`], which is the single place infinity
//! arithmetic is resolved.

use std::cmp::Ordering;
use std::fmt;

use crate::error::TimeError;

/// A point in simulation time, or a duration between two points.
///
/// Positive infinity means "never" (the next event of a passive
/// model); negative infinity sorts before every finite time. NaN
/// cannot be constructed.
#[derive(Clone, Copy, Debug)]
pub struct SimTime(f64);

impl SimTime {
    /// Time zero.
    pub const ZERO: SimTime = SimTime(0.0);

    /// Positive infinity: the time of an event that never occurs.
    pub const INFINITY: SimTime = SimTime(f64::INFINITY);

    /// Negative infinity: sorts before every other time.
    pub const NEG_INFINITY: SimTime = SimTime(f64::NEG_INFINITY);

    /// Create a time from a raw `f64`.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::NotANumber`] if `value` is NaN.
    pub fn new(value: f64) -> Result<Self, TimeError> {
        if value.is_nan() {
            return Err(TimeError::NotANumber);
        }
        // Collapse -0.0 so total_cmp agrees with IEEE equality.
        let value = if value == 0.0 { 0.0 } else { value };
        Ok(Self(value))
    }

    /// Whether this time is neither infinity.
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    /// Whether this time is positive or negative infinity.
    pub fn is_infinite(self) -> bool {
        self.0.is_infinite()
    }

    /// The raw `f64` value.
    pub fn as_f64(self) -> f64 {
        self.0
    }

    /// Add a non-negative duration to this time.
    ///
    /// This is the only arithmetic defined on times:
    ///
    /// - a finite time plus a finite duration is the plain sum;
    /// - anything plus an infinite duration is [`SimTime::INFINITY`];
    /// - an infinite time plus a finite duration keeps its sign of
    ///   infinity;
    /// - negative infinity plus an infinite duration has no defined
    ///   value and fails.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::NegativeDuration`] if `duration` is
    /// negative (including negative infinity), and
    /// [`TimeError::IndeterminateSum`] for the `-inf + inf` case.
    pub fn checked_add(self, duration: SimTime) -> Result<Self, TimeError> {
        if duration.0 < 0.0 {
            return Err(TimeError::NegativeDuration { duration });
        }
        if self.0 == f64::NEG_INFINITY && duration.0 == f64::INFINITY {
            return Err(TimeError::IndeterminateSum);
        }
        // The remaining infinity cases fall out of f64 addition and
        // can never produce NaN.
        Self::new(self.0 + duration.0)
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == f64::INFINITY {
            write!(f, "+inf")
        } else if self.0 == f64::NEG_INFINITY {
            write!(f, "-inf")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
