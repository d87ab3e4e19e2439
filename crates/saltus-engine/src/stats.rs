//! Per-step and per-run counters.
//!
//! [`StepStats`] is returned from every executed step so callers can
//! watch a run without instrumenting their models. [`RunSummary`]
//! aggregates the same counters across a whole [`RootCoordinator`]
//! run.
//!
//! [`RootCoordinator`]: crate::root::RootCoordinator

use saltus_core::SimTime;

/// Counters for one executed step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Simulators whose internal event fired this step.
    pub imminent: usize,
    /// External events delivered after routing fan-out.
    pub routed_events: usize,
    /// Internal transitions executed.
    pub internal_transitions: usize,
    /// External transitions executed.
    pub external_transitions: usize,
    /// Confluent transitions executed.
    pub confluent_transitions: usize,
    /// Structural changes applied at the end of the step.
    pub structural_changes: usize,
    /// Observation samples pushed to view sinks.
    pub observations: usize,
}

impl StepStats {
    /// Total transitions of any kind.
    pub fn transitions(&self) -> usize {
        self.internal_transitions + self.external_transitions + self.confluent_transitions
    }
}

/// Aggregated result of one completed run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Steps executed.
    pub steps: u64,
    /// Transitions of any kind across the run.
    pub transitions: u64,
    /// External events delivered across the run.
    pub routed_events: u64,
    /// Observation samples pushed across the run.
    pub observations: u64,
    /// Global time when the run stopped.
    pub final_time: SimTime,
    /// Whether a stop handle ended the run early.
    pub stopped: bool,
    /// Whether the run ended because no events remained.
    pub exhausted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_sums_all_three_kinds() {
        let stats = StepStats {
            internal_transitions: 3,
            external_transitions: 2,
            confluent_transitions: 1,
            ..StepStats::default()
        };
        assert_eq!(stats.transitions(), 6);
    }
}
