//! The [`Behavior`] sum over plain and privileged model behavior.

use std::fmt;

use crate::dynamics::Dynamics;
use crate::executive::Executive;

/// What drives one atomic model: plain dynamics, or an executive
/// with structural-change privileges.
///
/// The engine dispatches every hook through this enum, so the two
/// kinds of model share one simulator implementation.
pub enum Behavior {
    /// Plain model behavior.
    Atomic(Box<dyn Dynamics>),
    /// Structure-mutating behavior, scoped to its coupled model.
    Executive(Box<dyn Executive>),
}

impl Behavior {
    /// Box plain dynamics.
    pub fn atomic(dynamics: impl Dynamics) -> Self {
        Self::Atomic(Box::new(dynamics))
    }

    /// Box an executive.
    pub fn executive(executive: impl Executive) -> Self {
        Self::Executive(Box::new(executive))
    }

    /// Whether this behavior carries structural-change privileges.
    pub fn is_executive(&self) -> bool {
        matches!(self, Self::Executive(_))
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atomic(_) => f.write_str("Behavior::Atomic(..)"),
            Self::Executive(_) => f.write_str("Behavior::Executive(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_and_classifies() {
        struct Inert;
        impl Dynamics for Inert {}
        struct Boss;
        impl Executive for Boss {}

        assert!(!Behavior::atomic(Inert).is_executive());
        assert!(Behavior::executive(Boss).is_executive());
        assert_eq!(format!("{:?}", Behavior::atomic(Inert)), "Behavior::Atomic(..)");
    }
}
