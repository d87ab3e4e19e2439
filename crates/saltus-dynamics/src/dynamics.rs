//! The [`Dynamics`] trait: behavior of one atomic model.

use saltus_core::{Bag, DynamicsError, ObservationEvent, OutputEvents, SimTime, Value};

/// Behavior of one atomic model.
///
/// The simulator drives the model exclusively through these hooks.
/// Every hook has a default, so a model implements only what it
/// needs; the default model is passive and silent.
///
/// # Contract
///
/// - Each hook runs to completion before the engine proceeds; there
///   is no suspension point inside a hook.
/// - [`time_advance`](Dynamics::time_advance) must not return a
///   negative duration. The engine treats that as fatal and aborts
///   the run naming the model.
/// - [`observation`](Dynamics::observation) takes `&self` and must
///   answer from current state without mutating it.
/// - A returned [`DynamicsError`] aborts the run; hooks are never
///   retried.
///
/// # Object safety
///
/// This trait is object-safe; the engine stores each model's
/// behavior as a `Box<dyn Dynamics>`.
///
/// # Examples
///
/// A relay that re-emits everything it receives after a fixed delay:
///
/// ```
/// use saltus_core::{Bag, DynamicsError, OutputEvents, SimTime};
/// use saltus_dynamics::Dynamics;
///
/// struct Relay {
///     delay: SimTime,
///     pending: usize,
/// }
///
/// impl Dynamics for Relay {
///     fn time_advance(&self) -> SimTime {
///         if self.pending > 0 {
///             self.delay
///         } else {
///             SimTime::INFINITY
///         }
///     }
///
///     fn output(&self, _time: SimTime, out: &mut OutputEvents) -> Result<(), DynamicsError> {
///         for _ in 0..self.pending {
///             out.emit("out");
///         }
///         Ok(())
///     }
///
///     fn internal_transition(&mut self, _time: SimTime) -> Result<(), DynamicsError> {
///         self.pending = 0;
///         Ok(())
///     }
///
///     fn external_transition(&mut self, bag: &Bag, _time: SimTime) -> Result<(), DynamicsError> {
///         self.pending += bag.len();
///         Ok(())
///     }
/// }
///
/// let relay = Relay { delay: SimTime::new(0.5).unwrap(), pending: 0 };
/// assert_eq!(relay.time_advance(), SimTime::INFINITY, "idle relay is passive");
/// ```
pub trait Dynamics: Send + 'static {
    /// Called once when the model enters the simulation: at run
    /// start, or at the current time for models inserted mid-run.
    ///
    /// Returns the first time advance, the duration until the first
    /// internal transition.
    ///
    /// Default: [`SimTime::INFINITY`] (start passive).
    fn init(&mut self, _time: SimTime) -> Result<SimTime, DynamicsError> {
        Ok(SimTime::INFINITY)
    }

    /// Duration the model stays in its current state before its next
    /// internal transition.
    ///
    /// Queried after every transition. [`SimTime::INFINITY`] means
    /// passive: no internal transition until an external event
    /// arrives.
    ///
    /// Default: [`SimTime::INFINITY`].
    fn time_advance(&self) -> SimTime {
        SimTime::INFINITY
    }

    /// Collect this model's emissions for the current instant.
    ///
    /// Called only when the model is imminent, and always before any
    /// transition of the step is applied.
    ///
    /// Default: emits nothing.
    fn output(&self, _time: SimTime, _output: &mut OutputEvents) -> Result<(), DynamicsError> {
        Ok(())
    }

    /// The scheduled internal transition fired and no external
    /// events arrived at the same instant.
    ///
    /// Default: no state change.
    fn internal_transition(&mut self, _time: SimTime) -> Result<(), DynamicsError> {
        Ok(())
    }

    /// External events arrived while the model was not imminent.
    ///
    /// All events addressed to the model at one instant arrive
    /// coalesced into a single `bag`.
    ///
    /// Default: no state change.
    fn external_transition(&mut self, _bag: &Bag, _time: SimTime) -> Result<(), DynamicsError> {
        Ok(())
    }

    /// The model is imminent and external events arrived at the same
    /// instant.
    ///
    /// The engine makes exactly this one call; how the internal and
    /// external transitions compose is the model's decision.
    ///
    /// Default: internal first, then external.
    fn confluent_transition(&mut self, time: SimTime, bag: &Bag) -> Result<(), DynamicsError> {
        self.internal_transition(time)?;
        self.external_transition(bag, time)
    }

    /// Answer an observation request from current state.
    ///
    /// Default: nothing observable.
    fn observation(&self, _event: &ObservationEvent) -> Option<Box<dyn Value>> {
        None
    }

    /// Called exactly once when the run terminates.
    ///
    /// Default: nothing to release.
    fn finish(&mut self) {}
}
