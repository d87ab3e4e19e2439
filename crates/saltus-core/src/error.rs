//! Error types shared across the Saltus workspace.
//!
//! Each subsystem defines its own error enum close to the code that
//! raises it; this module holds the two that belong to the core
//! vocabulary. Time arithmetic failures are [`TimeError`]; failures
//! raised inside model dynamics hooks are [`DynamicsError`].

use std::error::Error;
use std::fmt;

use crate::time::SimTime;

/// Errors from [`SimTime`](crate::time::SimTime) construction and
/// arithmetic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeError {
    /// NaN was passed where a time or duration is required.
    NotANumber,
    /// A negative duration was passed to an additive operation.
    NegativeDuration {
        /// The offending duration.
        duration: SimTime,
    },
    /// `-inf + inf` has no defined value.
    IndeterminateSum,
}

impl fmt::Display for TimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotANumber => write!(f, "time must not be NaN"),
            Self::NegativeDuration { duration } => {
                write!(f, "duration must be non-negative, got {duration}")
            }
            Self::IndeterminateSum => write!(f, "-inf + inf is indeterminate"),
        }
    }
}

impl Error for TimeError {}

/// Errors raised by model dynamics hooks.
///
/// The engine wraps these with the failing model's name and aborts
/// the step; there is no retry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DynamicsError {
    /// The hook failed for a model-specific reason.
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// An incoming event lacked an attribute the model requires.
    MissingAttribute {
        /// Port the event arrived on.
        port: String,
        /// Name of the missing attribute.
        attribute: String,
    },
}

impl fmt::Display for DynamicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExecutionFailed { reason } => write!(f, "execution failed: {reason}"),
            Self::MissingAttribute { port, attribute } => {
                write!(f, "event on port '{port}' is missing attribute '{attribute}'")
            }
        }
    }
}

impl Error for DynamicsError {}
