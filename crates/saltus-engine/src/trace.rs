//! Optional per-run recording of events and hook invocations.
//!
//! Tracing is off by default and enabled per run through
//! [`SimulationConfig::record_trace`](crate::config::SimulationConfig).
//! The trace is owned by its coordinator, so nested runs record
//! independently and concurrent runs never share a buffer.

use saltus_core::{Event, ModelId, SimTime};

/// Which dynamics hook a [`HookRecord`] refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookKind {
    /// `init` at the start of a run or on dynamic insertion.
    Init,
    /// `internal_transition`.
    Internal,
    /// `external_transition`.
    External,
    /// `confluent_transition`.
    Confluent,
    /// `finish` at the end of a run.
    Finish,
}

/// One hook invocation on one model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HookRecord {
    /// Global time of the invocation.
    pub time: SimTime,
    /// The model whose hook ran.
    pub model: ModelId,
    /// Which hook ran.
    pub hook: HookKind,
}

/// In-memory record of everything a run did, in execution order.
#[derive(Clone, Debug, Default)]
pub struct Trace {
    events: Vec<Event>,
    hooks: Vec<HookRecord>,
}

impl Trace {
    /// An empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_event(&mut self, event: Event) {
        self.events.push(event);
    }

    pub(crate) fn record_hook(&mut self, time: SimTime, model: ModelId, hook: HookKind) {
        self.hooks.push(HookRecord { time, model, hook });
    }

    /// Every recorded event, in the order it was resolved.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Every hook invocation, in execution order.
    pub fn hooks(&self) -> &[HookRecord] {
        &self.hooks
    }

    /// Hook invocations for one model, in execution order.
    pub fn hooks_for(&self, model: ModelId) -> Vec<HookRecord> {
        self.hooks
            .iter()
            .filter(|record| record.model == model)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saltus_core::{InternalEvent, SimulatorId};

    #[test]
    fn records_preserve_order() {
        let mut trace = Trace::new();
        let model = ModelId::new(1, 0);
        let time = SimTime::new(2.0).unwrap();
        trace.record_hook(SimTime::ZERO, model, HookKind::Init);
        trace.record_event(Event::Internal(InternalEvent {
            time,
            model,
            simulator: SimulatorId(0),
        }));
        trace.record_hook(time, model, HookKind::Internal);

        assert_eq!(trace.events().len(), 1);
        assert_eq!(trace.hooks().len(), 2);
        assert_eq!(trace.hooks()[0].hook, HookKind::Init);
        assert_eq!(trace.hooks()[1].hook, HookKind::Internal);
    }

    #[test]
    fn hooks_for_filters_by_model() {
        let mut trace = Trace::new();
        let a = ModelId::new(1, 0);
        let b = ModelId::new(2, 0);
        trace.record_hook(SimTime::ZERO, a, HookKind::Init);
        trace.record_hook(SimTime::ZERO, b, HookKind::Init);
        trace.record_hook(SimTime::ZERO, a, HookKind::Finish);

        let for_a = trace.hooks_for(a);
        assert_eq!(for_a.len(), 2);
        assert!(for_a.iter().all(|record| record.model == a));
    }
}
