//! One running atomic model: behavior, bag, and scheduling state.
//!
//! A [`Simulator`] wraps a [`Behavior`] together with the bookkeeping
//! the coordinator needs: the last event time, the next scheduled
//! internal time, and the bag of external events pending for the
//! current step. The coordinator owns one simulator per atomic model
//! and assigns ids in model creation order.

use std::mem;

use saltus_core::{
    Bag, DynamicsError, ExternalEvent, ModelId, ObservationEvent, OutputEvents, SimTime,
    SimulatorId, Value,
};
use saltus_dynamics::{Behavior, ChangeSet, ExecutiveContext};
use saltus_graph::ModelGraph;

use crate::coordinator::StepError;

/// Drives one atomic model on behalf of the coordinator.
#[derive(Debug)]
pub struct Simulator {
    id: SimulatorId,
    model: ModelId,
    name: String,
    parent: ModelId,
    behavior: Behavior,
    last_event_time: SimTime,
    next_internal: Option<SimTime>,
    bag: Bag,
}

impl Simulator {
    /// `name` is the model's full dotted name; `parent` is the coupled
    /// model an executive behavior operates on.
    pub(crate) fn new(
        id: SimulatorId,
        model: ModelId,
        name: String,
        parent: ModelId,
        behavior: Behavior,
    ) -> Self {
        Self {
            id,
            model,
            name,
            parent,
            behavior,
            // Replaced by the first init call.
            last_event_time: SimTime::NEG_INFINITY,
            next_internal: None,
            bag: Bag::new(),
        }
    }

    /// The simulator's id, assigned in model creation order.
    pub fn id(&self) -> SimulatorId {
        self.id
    }

    /// The atomic model this simulator drives.
    pub fn model(&self) -> ModelId {
        self.model
    }

    /// The model's full dotted name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the behavior is a structure-changing executive.
    pub fn is_executive(&self) -> bool {
        self.behavior.is_executive()
    }

    /// Time of the most recent init or transition.
    pub fn last_event_time(&self) -> SimTime {
        self.last_event_time
    }

    /// The next scheduled internal time, `None` while passive.
    pub fn next_internal(&self) -> Option<SimTime> {
        self.next_internal
    }

    pub(crate) fn push_external(&mut self, event: ExternalEvent) {
        self.bag.push(event);
    }

    pub(crate) fn has_bag_events(&self) -> bool {
        !self.bag.is_empty()
    }

    /// Run the init hook at `time` and return the first internal time.
    pub(crate) fn init(
        &mut self,
        time: SimTime,
        graph: &ModelGraph,
        changes: &mut ChangeSet,
    ) -> Result<Option<SimTime>, StepError> {
        self.last_event_time = time;
        let result = match &mut self.behavior {
            Behavior::Atomic(dynamics) => dynamics.init(time),
            Behavior::Executive(executive) => {
                let mut ctx = ExecutiveContext::new(graph, self.parent, time, changes);
                executive.init(time, &mut ctx)
            }
        };
        let advance = result.map_err(|source| self.dynamics_error(source))?;
        self.apply_advance(time, advance)
    }

    /// Run the internal transition at `time`; the bag is empty.
    pub(crate) fn internal_transition(
        &mut self,
        time: SimTime,
        graph: &ModelGraph,
        changes: &mut ChangeSet,
    ) -> Result<Option<SimTime>, StepError> {
        let result = match &mut self.behavior {
            Behavior::Atomic(dynamics) => dynamics.internal_transition(time),
            Behavior::Executive(executive) => {
                let mut ctx = ExecutiveContext::new(graph, self.parent, time, changes);
                executive.internal_transition(time, &mut ctx)
            }
        };
        result.map_err(|source| self.dynamics_error(source))?;
        self.settle(time)
    }

    /// Run the external transition at `time`, consuming the bag.
    pub(crate) fn external_transition(
        &mut self,
        time: SimTime,
        graph: &ModelGraph,
        changes: &mut ChangeSet,
    ) -> Result<Option<SimTime>, StepError> {
        let bag = mem::take(&mut self.bag);
        let result = match &mut self.behavior {
            Behavior::Atomic(dynamics) => dynamics.external_transition(&bag, time),
            Behavior::Executive(executive) => {
                let mut ctx = ExecutiveContext::new(graph, self.parent, time, changes);
                executive.external_transition(&bag, time, &mut ctx)
            }
        };
        result.map_err(|source| self.dynamics_error(source))?;
        self.settle(time)
    }

    /// Run the confluent transition at `time`, consuming the bag.
    pub(crate) fn confluent_transition(
        &mut self,
        time: SimTime,
        graph: &ModelGraph,
        changes: &mut ChangeSet,
    ) -> Result<Option<SimTime>, StepError> {
        let bag = mem::take(&mut self.bag);
        let result = match &mut self.behavior {
            Behavior::Atomic(dynamics) => dynamics.confluent_transition(time, &bag),
            Behavior::Executive(executive) => {
                let mut ctx = ExecutiveContext::new(graph, self.parent, time, changes);
                executive.confluent_transition(time, &bag, &mut ctx)
            }
        };
        result.map_err(|source| self.dynamics_error(source))?;
        self.settle(time)
    }

    /// Collect the model's emissions for its imminent event at `time`.
    pub(crate) fn output(&self, time: SimTime, output: &mut OutputEvents) -> Result<(), StepError> {
        let result = match &self.behavior {
            Behavior::Atomic(dynamics) => dynamics.output(time, output),
            Behavior::Executive(executive) => executive.output(time, output),
        };
        result.map_err(|source| self.dynamics_error(source))
    }

    /// Answer one observation probe without touching state.
    pub(crate) fn observation(&self, event: &ObservationEvent) -> Option<Box<dyn Value>> {
        match &self.behavior {
            Behavior::Atomic(dynamics) => dynamics.observation(event),
            Behavior::Executive(executive) => executive.observation(event),
        }
    }

    /// Run the finish hook at the end of a run.
    pub(crate) fn finish(&mut self) {
        match &mut self.behavior {
            Behavior::Atomic(dynamics) => dynamics.finish(),
            Behavior::Executive(executive) => executive.finish(),
        }
    }

    /// Record the transition time, then query the next advance.
    fn settle(&mut self, time: SimTime) -> Result<Option<SimTime>, StepError> {
        self.last_event_time = time;
        let advance = match &self.behavior {
            Behavior::Atomic(dynamics) => dynamics.time_advance(),
            Behavior::Executive(executive) => executive.time_advance(),
        };
        self.apply_advance(time, advance)
    }

    /// Resolve `time + advance` into the next internal time.
    ///
    /// An infinite advance means passive; a finite advance whose sum
    /// leaves the finite range also never fires.
    fn apply_advance(
        &mut self,
        time: SimTime,
        advance: SimTime,
    ) -> Result<Option<SimTime>, StepError> {
        if advance == SimTime::INFINITY {
            self.next_internal = None;
            return Ok(None);
        }
        let next = time
            .checked_add(advance)
            .map_err(|_| StepError::InvalidTimeAdvance {
                model: self.name.clone(),
                advance,
            })?;
        self.next_internal = next.is_finite().then_some(next);
        Ok(self.next_internal)
    }

    fn dynamics_error(&self, source: DynamicsError) -> StepError {
        StepError::Dynamics {
            model: self.name.clone(),
            source,
        }
    }
}
