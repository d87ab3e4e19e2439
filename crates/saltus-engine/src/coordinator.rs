//! The coordinator: step execution over one model graph.
//!
//! [`Coordinator`] owns the simulators, the event table, the views,
//! and the structural-change queue for one run. Each
//! [`step()`](Coordinator::step) advances global time to the next
//! pending instant and executes four phases in order:
//!
//! 1. **Output**: every imminent simulator emits, emissions are
//!    routed through the graph, and per-target bags are assembled.
//! 2. **Transitions**: imminent simulators without a bag take the
//!    internal transition, bag receivers the external one, and
//!    simulators that are both take the confluent one. Ties execute
//!    in ascending simulator id, which is model creation order.
//! 3. **Structure**: changes queued by executives are applied, in
//!    request order, after all transitions at this instant.
//! 4. **Observation**: due views probe their subscribed models.
//!
//! The run window is half-open. An event at `begin + duration` is
//! not executed; [`StepOutcome::TerminalReached`] reports it instead.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;

use indexmap::IndexMap;
use smallvec::SmallVec;

use saltus_core::{
    DynamicsError, Event, ExternalEvent, InternalEvent, ModelId, ObservationEvent, OutputEvent,
    OutputEvents, SimTime, SimulatorId, TimeError,
};
use saltus_dynamics::{Behavior, ChangeSet, CouplingSpec, ScopedChange, StructuralChange};
use saltus_graph::{Coupling, ModelGraph, RouteTarget, StructuralError};
use saltus_obs::{ViewCadence, ViewSet};

use crate::config::{ConfigError, SimulationConfig};
use crate::schedule::{EventTable, ScheduleError};
use crate::simulator::Simulator;
use crate::stats::StepStats;
use crate::trace::{HookKind, Trace};

// ── CoordinatorState ───────────────────────────────────────────────

/// Lifecycle state of a [`Coordinator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoordinatorState {
    /// Constructed; no model hook has run.
    Uninitialized,
    /// Initialized and stepping.
    Running,
    /// Finished; no further steps are possible.
    Finished,
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Running => write!(f, "running"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

// ── StepError ──────────────────────────────────────────────────────

/// Errors from [`Coordinator::init`], [`Coordinator::step`], and
/// [`Coordinator::finish`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepError {
    /// No pending event and no armed timed view remains.
    ///
    /// [`RootCoordinator::run`](crate::root::RootCoordinator::run)
    /// treats this as a clean end of the run, not a failure.
    EmptySchedule,
    /// The next pending instant is earlier than the current time.
    TimeWentBackward {
        /// Current global time.
        from: SimTime,
        /// The offending earlier time.
        to: SimTime,
    },
    /// An operation was called in a state it is not valid in.
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// The coordinator's state at the time.
        state: CoordinatorState,
    },
    /// A model hook failed; the run stops with the cause unchanged.
    Dynamics {
        /// Full name of the failing model.
        model: String,
        /// The hook's own error.
        source: DynamicsError,
    },
    /// A model declared a negative time advance.
    InvalidTimeAdvance {
        /// Full name of the offending model.
        model: String,
        /// The rejected advance.
        advance: SimTime,
    },
    /// A routed event targets a model with no live simulator.
    UnboundModel {
        /// The unresolvable target model.
        model: ModelId,
    },
    /// The event table rejected a schedule request.
    Schedule(ScheduleError),
    /// The graph rejected a routing query or structural change.
    Structural(StructuralError),
    /// Time arithmetic failed outside any one model's hooks.
    Time(TimeError),
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySchedule => write!(f, "no pending events remain"),
            Self::TimeWentBackward { from, to } => {
                write!(f, "time went backward from {from} to {to}")
            }
            Self::InvalidState { operation, state } => {
                write!(f, "cannot {operation} while {state}")
            }
            Self::Dynamics { model, source } => {
                write!(f, "model '{model}': {source}")
            }
            Self::InvalidTimeAdvance { model, advance } => {
                write!(f, "model '{model}': negative time advance {advance}")
            }
            Self::UnboundModel { model } => {
                write!(f, "no simulator bound to model {model}")
            }
            Self::Schedule(e) => write!(f, "event table: {e}"),
            Self::Structural(e) => write!(f, "structure: {e}"),
            Self::Time(e) => write!(f, "time: {e}"),
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Dynamics { source, .. } => Some(source),
            Self::Schedule(e) => Some(e),
            Self::Structural(e) => Some(e),
            Self::Time(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ScheduleError> for StepError {
    fn from(e: ScheduleError) -> Self {
        Self::Schedule(e)
    }
}

impl From<StructuralError> for StepError {
    fn from(e: StructuralError) -> Self {
        Self::Structural(e)
    }
}

impl From<TimeError> for StepError {
    fn from(e: TimeError) -> Self {
        Self::Time(e)
    }
}

// ── StepOutcome ────────────────────────────────────────────────────

/// Result of a successful [`Coordinator::step`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// A step executed at `time`.
    Advanced {
        /// The instant the step executed at.
        time: SimTime,
        /// What the step did.
        stats: StepStats,
    },
    /// The next pending instant lies at or beyond the end of the run
    /// window; nothing was executed.
    TerminalReached {
        /// The instant that was not executed.
        next_event: SimTime,
    },
}

// ── Coordinator ────────────────────────────────────────────────────

/// Drives one model graph through a simulation run.
#[derive(Debug)]
pub struct Coordinator {
    graph: ModelGraph,
    simulators: IndexMap<SimulatorId, Simulator>,
    by_model: IndexMap<ModelId, SimulatorId>,
    table: EventTable,
    views: ViewSet,
    changes: ChangeSet,
    route_cache: HashMap<(ModelId, String), Vec<RouteTarget>>,
    next_simulator: u32,
    current_time: SimTime,
    begin: SimTime,
    terminal: SimTime,
    state: CoordinatorState,
    trace: Option<Trace>,
}

impl Coordinator {
    /// Build a coordinator from a configuration.
    ///
    /// Validates the configuration and binds one simulator per atomic
    /// model, in model creation order. No model hook runs until
    /// [`init()`](Coordinator::init).
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let SimulationConfig {
            graph,
            bindings,
            begin,
            duration,
            views,
            record_trace,
        } = config;
        let terminal = begin.checked_add(duration)?;

        let mut behaviors: IndexMap<ModelId, Behavior> = bindings.into_iter().collect();
        let mut simulators = IndexMap::new();
        let mut by_model = IndexMap::new();
        let mut next_simulator = 0u32;
        for model in graph.atomics() {
            let behavior = behaviors
                .shift_remove(&model)
                .expect("validation checked one binding per atomic model");
            let name = graph
                .full_name(model)
                .expect("atomics come from the live graph");
            let parent = graph
                .parent(model)
                .expect("atomics come from the live graph")
                .expect("atomic models always have a parent");
            let id = SimulatorId(next_simulator);
            next_simulator += 1;
            simulators.insert(id, Simulator::new(id, model, name, parent, behavior));
            by_model.insert(model, id);
        }

        let mut view_set = ViewSet::new();
        for view in views {
            view_set.push(view);
        }

        Ok(Self {
            graph,
            simulators,
            by_model,
            table: EventTable::new(),
            views: view_set,
            changes: ChangeSet::new(),
            route_cache: HashMap::new(),
            next_simulator,
            current_time: begin,
            begin,
            terminal,
            state: CoordinatorState::Uninitialized,
            trace: record_trace.then(Trace::new),
        })
    }

    /// Run every simulator's init hook at the begin time and arm the
    /// views.
    pub fn init(&mut self) -> Result<(), StepError> {
        if self.state != CoordinatorState::Uninitialized {
            return Err(StepError::InvalidState {
                operation: "init",
                state: self.state,
            });
        }
        self.current_time = self.begin;
        let ids: Vec<SimulatorId> = self.simulators.keys().copied().collect();
        for id in ids {
            self.init_simulator(id, self.begin)?;
        }
        // Executives may queue changes from init.
        if !self.changes.is_empty() {
            self.apply_structural_changes(self.begin)?;
        }
        self.views.arm(self.begin);
        self.state = CoordinatorState::Running;
        Ok(())
    }

    /// Execute one step.
    pub fn step(&mut self) -> Result<StepOutcome, StepError> {
        if self.state != CoordinatorState::Running {
            return Err(StepError::InvalidState {
                operation: "step",
                state: self.state,
            });
        }

        // The next instant is the earlier of the next pending event
        // and the next due timed view. A due view without a pending
        // event yields an observation-only step.
        let next_event = self.table.peek_time();
        let next_view = self.views.next_timed_due();
        let t = match (next_event, next_view) {
            (Some(event), Some(view)) => event.min(view),
            (Some(event), None) => event,
            (None, Some(view)) => view,
            (None, None) => return Err(StepError::EmptySchedule),
        };

        if t >= self.terminal {
            return Ok(StepOutcome::TerminalReached { next_event: t });
        }
        if t < self.current_time {
            return Err(StepError::TimeWentBackward {
                from: self.current_time,
                to: t,
            });
        }
        self.current_time = t;

        let mut stats = StepStats::default();

        let imminent: Vec<SimulatorId> = if next_event == Some(t) {
            let (_, set) = self
                .table
                .pop_imminent()
                .expect("peeked time implies pending entries");
            set
        } else {
            Vec::new()
        };
        stats.imminent = imminent.len();

        // Output phase: collect emissions from every imminent
        // simulator and resolve them to atomic endpoints.
        let mut deliveries: Vec<(SimulatorId, ExternalEvent)> = Vec::new();
        for &id in &imminent {
            let mut output = OutputEvents::new();
            let source = {
                let sim = self
                    .simulators
                    .get(&id)
                    .expect("imminent simulators are live");
                sim.output(t, &mut output)?;
                sim.model()
            };
            if let Some(trace) = self.trace.as_mut() {
                trace.record_event(Event::Internal(InternalEvent {
                    time: t,
                    model: source,
                    simulator: id,
                }));
            }
            for OutputEvent { port, attributes } in output.drain() {
                let key = (source, port);
                self.ensure_route(&key)?;
                let targets = self
                    .route_cache
                    .get(&key)
                    .expect("route resolved just above");
                for target in targets {
                    let Some(&sid) = self.by_model.get(&target.model) else {
                        return Err(StepError::UnboundModel {
                            model: target.model,
                        });
                    };
                    let event = ExternalEvent {
                        time: t,
                        source,
                        target: target.model,
                        port: target.port.clone(),
                        attributes: attributes.clone(),
                    };
                    if let Some(trace) = self.trace.as_mut() {
                        trace.record_event(Event::External(event.clone()));
                    }
                    deliveries.push((sid, event));
                }
            }
        }
        stats.routed_events = deliveries.len();

        // Assemble bags. Every event for one target lands in the same
        // bag regardless of which source emitted it.
        let mut receivers: SmallVec<[SimulatorId; 8]> = SmallVec::new();
        for (sid, event) in deliveries {
            let sim = self
                .simulators
                .get_mut(&sid)
                .expect("delivery targets were resolved against live simulators");
            if !sim.has_bag_events() && imminent.binary_search(&sid).is_err() {
                receivers.push(sid);
            }
            sim.push_external(event);
        }

        // Transition phase in ascending simulator order.
        let mut touched: SmallVec<[SimulatorId; 8]> = SmallVec::new();
        touched.extend(imminent.iter().copied());
        touched.extend(receivers.iter().copied());
        touched.sort_unstable();

        for &sid in touched.iter() {
            let was_imminent = imminent.binary_search(&sid).is_ok();
            let sim = self
                .simulators
                .get_mut(&sid)
                .expect("touched simulators are live");
            let model = sim.model();
            let has_bag = sim.has_bag_events();
            let (next, hook) = if was_imminent && has_bag {
                (
                    sim.confluent_transition(t, &self.graph, &mut self.changes)?,
                    HookKind::Confluent,
                )
            } else if was_imminent {
                (
                    sim.internal_transition(t, &self.graph, &mut self.changes)?,
                    HookKind::Internal,
                )
            } else {
                (
                    sim.external_transition(t, &self.graph, &mut self.changes)?,
                    HookKind::External,
                )
            };
            match hook {
                HookKind::Confluent => stats.confluent_transitions += 1,
                HookKind::Internal => stats.internal_transitions += 1,
                _ => stats.external_transitions += 1,
            }
            let last = sim.last_event_time();
            if let Some(next_time) = next {
                self.table.schedule(sid, next_time, last)?;
            }
            if let Some(trace) = self.trace.as_mut() {
                trace.record_hook(t, model, hook);
            }
        }

        // Structure phase: changes requested during this step apply
        // only after every transition at this instant has run.
        if !self.changes.is_empty() {
            stats.structural_changes = self.changes.len();
            self.apply_structural_changes(t)?;
        }

        // Observation phase.
        stats.observations = self.dispatch_observations(t, &touched);

        Ok(StepOutcome::Advanced { time: t, stats })
    }

    /// Finish the run: final hooks in creation order, sinks flushed,
    /// table released.
    pub fn finish(&mut self) -> Result<(), StepError> {
        if self.state != CoordinatorState::Running {
            return Err(StepError::InvalidState {
                operation: "finish",
                state: self.state,
            });
        }
        for (_, sim) in self.simulators.iter_mut() {
            sim.finish();
            if let Some(trace) = self.trace.as_mut() {
                trace.record_hook(self.current_time, sim.model(), HookKind::Finish);
            }
        }
        self.views.finish(self.current_time);
        self.table.clear();
        self.state = CoordinatorState::Finished;
        Ok(())
    }

    /// Current global time.
    pub fn current_time(&self) -> SimTime {
        self.current_time
    }

    /// End of the run window.
    pub fn terminal(&self) -> SimTime {
        self.terminal
    }

    /// Lifecycle state.
    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    /// The live model graph.
    pub fn graph(&self) -> &ModelGraph {
        &self.graph
    }

    /// Number of live simulators.
    pub fn simulator_count(&self) -> usize {
        self.simulators.len()
    }

    /// The simulator currently bound to `model`, if any.
    pub fn simulator_id(&self, model: ModelId) -> Option<SimulatorId> {
        self.by_model.get(&model).copied()
    }

    /// Take the recorded trace, if tracing was enabled.
    pub fn take_trace(&mut self) -> Option<Trace> {
        self.trace.take()
    }

    // ── Internals ────────────────────────────────────────────────────

    /// Init one simulator at `time` and schedule its first internal
    /// event.
    fn init_simulator(&mut self, id: SimulatorId, time: SimTime) -> Result<(), StepError> {
        let sim = self
            .simulators
            .get_mut(&id)
            .expect("callers pass live simulator ids");
        let next = sim.init(time, &self.graph, &mut self.changes)?;
        let model = sim.model();
        let last = sim.last_event_time();
        if let Some(first) = next {
            self.table.schedule(id, first, last)?;
        }
        if let Some(trace) = self.trace.as_mut() {
            trace.record_hook(time, model, HookKind::Init);
        }
        Ok(())
    }

    fn ensure_route(&mut self, key: &(ModelId, String)) -> Result<(), StepError> {
        if !self.route_cache.contains_key(key) {
            let targets = self.graph.resolve_route(key.0, &key.1)?;
            self.route_cache.insert(key.clone(), targets);
        }
        Ok(())
    }

    /// Apply queued structural changes in request order.
    fn apply_structural_changes(&mut self, time: SimTime) -> Result<(), StepError> {
        let entries = self.changes.drain();
        if entries.is_empty() {
            return Ok(());
        }
        for ScopedChange { scope, change } in entries {
            match change {
                StructuralChange::AddModel {
                    name,
                    input_ports,
                    output_ports,
                    build,
                } => {
                    let model = self.graph.add_atomic(scope, &name)?;
                    for port in &input_ports {
                        self.graph.add_input_port(model, port)?;
                    }
                    for port in &output_ports {
                        self.graph.add_output_port(model, port)?;
                    }
                    let id = SimulatorId(self.next_simulator);
                    self.next_simulator += 1;
                    let full = self.graph.full_name(model)?;
                    let behavior = Behavior::Atomic(build());
                    self.simulators
                        .insert(id, Simulator::new(id, model, full, scope, behavior));
                    self.by_model.insert(model, id);
                    self.init_simulator(id, time)?;
                }
                StructuralChange::RemoveModel { name } => {
                    let model = match self.graph.child(scope, &name)? {
                        Some(model) => model,
                        None => {
                            return Err(StepError::Structural(StructuralError::UnknownChild {
                                parent: self.graph.full_name(scope)?,
                                name,
                            }));
                        }
                    };
                    // Removed simulators are dropped without a finish
                    // hook; finish marks the end of a run, not of a
                    // model.
                    for removed in self.graph.remove_model(model)? {
                        if let Some(sid) = self.by_model.shift_remove(&removed) {
                            self.table.cancel(sid);
                            self.simulators.shift_remove(&sid);
                        }
                    }
                }
                StructuralChange::Connect(spec) => match self.resolve_spec(scope, &spec)? {
                    Coupling::Internal {
                        source,
                        source_port,
                        target,
                        target_port,
                    } => {
                        self.graph
                            .connect_internal(scope, source, &source_port, target, &target_port)?;
                    }
                    Coupling::Input {
                        source_port,
                        target,
                        target_port,
                    } => {
                        self.graph
                            .connect_input(scope, &source_port, target, &target_port)?;
                    }
                    Coupling::Output {
                        source,
                        source_port,
                        target_port,
                    } => {
                        self.graph
                            .connect_output(scope, source, &source_port, &target_port)?;
                    }
                },
                StructuralChange::Disconnect(spec) => {
                    let coupling = self.resolve_spec(scope, &spec)?;
                    self.graph.disconnect(scope, &coupling)?;
                }
            }
        }
        // Old routes may now dangle or new ones exist; recompute on
        // demand.
        self.route_cache.clear();
        Ok(())
    }

    /// Resolve a name-based coupling spec against `scope`.
    ///
    /// A side naming the coupled model itself selects its boundary
    /// ports; any other name must be a direct child.
    fn resolve_spec(&self, scope: ModelId, spec: &CouplingSpec) -> Result<Coupling, StepError> {
        let scope_name = self.graph.name(scope)?.to_string();
        let source_is_scope = spec.source == scope_name;
        let target_is_scope = spec.target == scope_name;
        if source_is_scope && target_is_scope {
            return Err(StepError::Structural(StructuralError::PassThrough {
                model: self.graph.full_name(scope)?,
            }));
        }
        if source_is_scope {
            return Ok(Coupling::Input {
                source_port: spec.source_port.clone(),
                target: self.child_of(scope, &spec.target)?,
                target_port: spec.target_port.clone(),
            });
        }
        if target_is_scope {
            return Ok(Coupling::Output {
                source: self.child_of(scope, &spec.source)?,
                source_port: spec.source_port.clone(),
                target_port: spec.target_port.clone(),
            });
        }
        Ok(Coupling::Internal {
            source: self.child_of(scope, &spec.source)?,
            source_port: spec.source_port.clone(),
            target: self.child_of(scope, &spec.target)?,
            target_port: spec.target_port.clone(),
        })
    }

    fn child_of(&self, scope: ModelId, name: &str) -> Result<ModelId, StepError> {
        match self.graph.child(scope, name)? {
            Some(model) => Ok(model),
            None => Err(StepError::Structural(StructuralError::UnknownChild {
                parent: self.graph.full_name(scope)?,
                name: name.to_string(),
            })),
        }
    }

    /// Probe subscribed models for every due view.
    ///
    /// On-change views sample only models that transitioned this
    /// step; due timed views sample all their subscriptions.
    /// Subscriptions to removed models are skipped.
    fn dispatch_observations(&mut self, time: SimTime, touched: &[SimulatorId]) -> usize {
        let mut count = 0;
        for view in self.views.iter_mut() {
            let due = view.is_due(time);
            let on_change = matches!(view.cadence(), ViewCadence::OnChange);
            if !due && !on_change {
                continue;
            }
            let subscriptions: Vec<(ModelId, String)> = view.subscriptions().to_vec();
            for (model, port) in subscriptions {
                let Some(&sid) = self.by_model.get(&model) else {
                    continue;
                };
                let sim = self
                    .simulators
                    .get(&sid)
                    .expect("bound simulators are live");
                if on_change && touched.binary_search(&sid).is_err() {
                    continue;
                }
                let event = ObservationEvent {
                    time,
                    model,
                    port: port.clone(),
                };
                let value = sim.observation(&event);
                if let Some(trace) = self.trace.as_mut() {
                    trace.record_event(Event::Observation(event));
                }
                view.record(time, model, &port, value);
                count += 1;
            }
            if due {
                view.advance(time);
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use saltus_core::{Bag, Value};
    use saltus_dynamics::Dynamics;
    use saltus_obs::{MemorySink, View};

    /// Scripted model: fires `first` after init, `rest` after every
    /// transition, optionally emitting on a port, and logs each hook.
    struct Probe {
        label: &'static str,
        first: SimTime,
        rest: SimTime,
        emit_on: Option<&'static str>,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Probe {
        fn new(label: &'static str, first: SimTime, log: &Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                label,
                first,
                rest: SimTime::INFINITY,
                emit_on: None,
                log: Arc::clone(log),
            }
        }

        fn emitting(mut self, port: &'static str) -> Self {
            self.emit_on = Some(port);
            self
        }

        fn passive(log: &Arc<Mutex<Vec<String>>>, label: &'static str) -> Self {
            Self::new(label, SimTime::INFINITY, log)
        }
    }

    impl Dynamics for Probe {
        fn init(&mut self, _time: SimTime) -> Result<SimTime, DynamicsError> {
            Ok(self.first)
        }

        fn time_advance(&self) -> SimTime {
            self.rest
        }

        fn output(
            &self,
            _time: SimTime,
            output: &mut OutputEvents,
        ) -> Result<(), DynamicsError> {
            if let Some(port) = self.emit_on {
                output.emit(port);
            }
            Ok(())
        }

        fn internal_transition(&mut self, time: SimTime) -> Result<(), DynamicsError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:internal@{time}", self.label));
            Ok(())
        }

        fn external_transition(&mut self, bag: &Bag, time: SimTime) -> Result<(), DynamicsError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:external@{time}x{}", self.label, bag.len()));
            Ok(())
        }

        fn confluent_transition(&mut self, time: SimTime, bag: &Bag) -> Result<(), DynamicsError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:confluent@{time}x{}", self.label, bag.len()));
            Ok(())
        }

        fn observation(&self, event: &ObservationEvent) -> Option<Box<dyn Value>> {
            Some(Box::new(format!("{}:{}", self.label, event.port)))
        }
    }

    fn t(value: f64) -> SimTime {
        SimTime::new(value).unwrap()
    }

    /// `top { src, dst }` with `src.out -> dst.in`.
    fn pair_graph() -> (ModelGraph, ModelId, ModelId) {
        let mut graph = ModelGraph::new("top").unwrap();
        let src = graph.add_atomic(graph.root(), "src").unwrap();
        let dst = graph.add_atomic(graph.root(), "dst").unwrap();
        graph.add_output_port(src, "out").unwrap();
        graph.add_input_port(dst, "in").unwrap();
        graph
            .connect_internal(graph.root(), src, "out", dst, "in")
            .unwrap();
        (graph, src, dst)
    }

    // ── Lifecycle ────────────────────────────────────────────

    #[test]
    fn step_before_init_is_rejected() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (graph, src, dst) = pair_graph();
        let mut coordinator = Coordinator::new(SimulationConfig {
            bindings: vec![
                (src, Behavior::atomic(Probe::passive(&log, "src"))),
                (dst, Behavior::atomic(Probe::passive(&log, "dst"))),
            ],
            ..SimulationConfig::new(graph, t(10.0))
        })
        .unwrap();

        match coordinator.step() {
            Err(StepError::InvalidState { operation, state }) => {
                assert_eq!(operation, "step");
                assert_eq!(state, CoordinatorState::Uninitialized);
            }
            other => panic!("expected InvalidState, got {other:?}"),
        }
    }

    #[test]
    fn init_twice_is_rejected() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (graph, src, dst) = pair_graph();
        let mut coordinator = Coordinator::new(SimulationConfig {
            bindings: vec![
                (src, Behavior::atomic(Probe::passive(&log, "src"))),
                (dst, Behavior::atomic(Probe::passive(&log, "dst"))),
            ],
            ..SimulationConfig::new(graph, t(10.0))
        })
        .unwrap();

        coordinator.init().unwrap();
        assert_eq!(coordinator.state(), CoordinatorState::Running);
        match coordinator.init() {
            Err(StepError::InvalidState { state, .. }) => {
                assert_eq!(state, CoordinatorState::Running);
            }
            other => panic!("expected InvalidState, got {other:?}"),
        }
    }

    #[test]
    fn fully_passive_graph_exhausts_immediately() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (graph, src, dst) = pair_graph();
        let mut coordinator = Coordinator::new(SimulationConfig {
            bindings: vec![
                (src, Behavior::atomic(Probe::passive(&log, "src"))),
                (dst, Behavior::atomic(Probe::passive(&log, "dst"))),
            ],
            ..SimulationConfig::new(graph, t(10.0))
        })
        .unwrap();

        coordinator.init().unwrap();
        match coordinator.step() {
            Err(StepError::EmptySchedule) => {}
            other => panic!("expected EmptySchedule, got {other:?}"),
        }
    }

    #[test]
    fn finish_moves_to_finished_and_blocks_stepping() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (graph, src, dst) = pair_graph();
        let mut coordinator = Coordinator::new(SimulationConfig {
            bindings: vec![
                (src, Behavior::atomic(Probe::passive(&log, "src"))),
                (dst, Behavior::atomic(Probe::passive(&log, "dst"))),
            ],
            ..SimulationConfig::new(graph, t(10.0))
        })
        .unwrap();

        coordinator.init().unwrap();
        coordinator.finish().unwrap();
        assert_eq!(coordinator.state(), CoordinatorState::Finished);
        match coordinator.step() {
            Err(StepError::InvalidState { state, .. }) => {
                assert_eq!(state, CoordinatorState::Finished);
            }
            other => panic!("expected InvalidState, got {other:?}"),
        }
    }

    // ── Stepping ─────────────────────────────────────────────

    #[test]
    fn routed_output_drives_external_transition_in_same_step() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (graph, src, dst) = pair_graph();
        let mut coordinator = Coordinator::new(SimulationConfig {
            bindings: vec![
                (
                    src,
                    Behavior::atomic(Probe::new("src", t(1.0), &log).emitting("out")),
                ),
                (dst, Behavior::atomic(Probe::passive(&log, "dst"))),
            ],
            ..SimulationConfig::new(graph, t(10.0))
        })
        .unwrap();

        coordinator.init().unwrap();
        match coordinator.step().unwrap() {
            StepOutcome::Advanced { time, stats } => {
                assert_eq!(time, t(1.0));
                assert_eq!(stats.imminent, 1);
                assert_eq!(stats.routed_events, 1);
                assert_eq!(stats.internal_transitions, 1);
                assert_eq!(stats.external_transitions, 1);
                assert_eq!(stats.confluent_transitions, 0);
            }
            other => panic!("expected Advanced, got {other:?}"),
        }
        assert_eq!(
            *log.lock().unwrap(),
            vec!["src:internal@1".to_string(), "dst:external@1x1".to_string()]
        );
        assert_eq!(coordinator.current_time(), t(1.0));
    }

    #[test]
    fn simultaneous_events_drain_in_creation_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut graph = ModelGraph::new("top").unwrap();
        let a = graph.add_atomic(graph.root(), "a").unwrap();
        let b = graph.add_atomic(graph.root(), "b").unwrap();
        let mut coordinator = Coordinator::new(SimulationConfig {
            bindings: vec![
                (b, Behavior::atomic(Probe::new("b", t(1.0), &log))),
                (a, Behavior::atomic(Probe::new("a", t(1.0), &log))),
            ],
            ..SimulationConfig::new(graph, t(10.0))
        })
        .unwrap();

        coordinator.init().unwrap();
        coordinator.step().unwrap();
        // Binding order above is reversed; execution still follows
        // creation order.
        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:internal@1".to_string(), "b:internal@1".to_string()]
        );
    }

    #[test]
    fn events_from_two_sources_coalesce_into_one_bag() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut graph = ModelGraph::new("top").unwrap();
        let a = graph.add_atomic(graph.root(), "a").unwrap();
        let b = graph.add_atomic(graph.root(), "b").unwrap();
        let dst = graph.add_atomic(graph.root(), "dst").unwrap();
        graph.add_output_port(a, "out").unwrap();
        graph.add_output_port(b, "out").unwrap();
        graph.add_input_port(dst, "in").unwrap();
        graph
            .connect_internal(graph.root(), a, "out", dst, "in")
            .unwrap();
        graph
            .connect_internal(graph.root(), b, "out", dst, "in")
            .unwrap();

        let mut coordinator = Coordinator::new(SimulationConfig {
            bindings: vec![
                (
                    a,
                    Behavior::atomic(Probe::new("a", t(1.0), &log).emitting("out")),
                ),
                (
                    b,
                    Behavior::atomic(Probe::new("b", t(1.0), &log).emitting("out")),
                ),
                (dst, Behavior::atomic(Probe::passive(&log, "dst"))),
            ],
            ..SimulationConfig::new(graph, t(10.0))
        })
        .unwrap();

        coordinator.init().unwrap();
        match coordinator.step().unwrap() {
            StepOutcome::Advanced { stats, .. } => {
                assert_eq!(stats.routed_events, 2);
                assert_eq!(stats.external_transitions, 1);
            }
            other => panic!("expected Advanced, got {other:?}"),
        }
        assert!(log
            .lock()
            .unwrap()
            .contains(&"dst:external@1x2".to_string()));
    }

    #[test]
    fn imminent_receiver_takes_confluent_transition() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (graph, src, dst) = pair_graph();
        let mut coordinator = Coordinator::new(SimulationConfig {
            bindings: vec![
                (
                    src,
                    Behavior::atomic(Probe::new("src", t(1.0), &log).emitting("out")),
                ),
                (dst, Behavior::atomic(Probe::new("dst", t(1.0), &log))),
            ],
            ..SimulationConfig::new(graph, t(10.0))
        })
        .unwrap();

        coordinator.init().unwrap();
        match coordinator.step().unwrap() {
            StepOutcome::Advanced { stats, .. } => {
                assert_eq!(stats.confluent_transitions, 1);
                assert_eq!(stats.internal_transitions, 1);
                assert_eq!(stats.external_transitions, 0);
            }
            other => panic!("expected Advanced, got {other:?}"),
        }
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "src:internal@1".to_string(),
                "dst:confluent@1x1".to_string()
            ]
        );
    }

    #[test]
    fn terminal_time_is_exclusive() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (graph, src, dst) = pair_graph();
        let mut coordinator = Coordinator::new(SimulationConfig {
            bindings: vec![
                (src, Behavior::atomic(Probe::new("src", t(5.0), &log))),
                (dst, Behavior::atomic(Probe::passive(&log, "dst"))),
            ],
            ..SimulationConfig::new(graph, t(5.0))
        })
        .unwrap();

        coordinator.init().unwrap();
        match coordinator.step().unwrap() {
            StepOutcome::TerminalReached { next_event } => {
                assert_eq!(next_event, t(5.0));
            }
            other => panic!("expected TerminalReached, got {other:?}"),
        }
        // The event at the window edge never executed.
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(coordinator.current_time(), SimTime::ZERO);
    }

    // ── Observation ──────────────────────────────────────────

    #[test]
    fn timed_view_samples_on_observation_only_steps() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (graph, src, dst) = pair_graph();
        let sink = MemorySink::new();
        let mut coordinator = Coordinator::new(SimulationConfig {
            bindings: vec![
                (src, Behavior::atomic(Probe::passive(&log, "src"))),
                (dst, Behavior::atomic(Probe::passive(&log, "dst"))),
            ],
            views: vec![View::timed("watch", t(1.0), sink.clone()).subscribe(dst, "state")],
            ..SimulationConfig::new(graph, t(2.5))
        })
        .unwrap();

        coordinator.init().unwrap();
        // Due at 0, 1, and 2; 3 lies beyond the window.
        for expected in [0.0, 1.0, 2.0] {
            match coordinator.step().unwrap() {
                StepOutcome::Advanced { time, stats } => {
                    assert_eq!(time, t(expected));
                    assert_eq!(stats.imminent, 0);
                    assert_eq!(stats.observations, 1);
                }
                other => panic!("expected Advanced, got {other:?}"),
            }
        }
        match coordinator.step().unwrap() {
            StepOutcome::TerminalReached { next_event } => {
                assert_eq!(next_event, t(3.0));
            }
            other => panic!("expected TerminalReached, got {other:?}"),
        }

        let records = sink.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].time, SimTime::ZERO);
        assert_eq!(records[2].time, t(2.0));
        let value = records[0].value.as_ref().unwrap();
        assert_eq!(
            value.downcast_ref::<String>().unwrap(),
            &"dst:state".to_string()
        );
    }

    #[test]
    fn on_change_view_samples_only_transitioned_models() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (graph, src, dst) = pair_graph();
        let sink = MemorySink::new();
        let mut coordinator = Coordinator::new(SimulationConfig {
            bindings: vec![
                (src, Behavior::atomic(Probe::new("src", t(1.0), &log))),
                (dst, Behavior::atomic(Probe::passive(&log, "dst"))),
            ],
            views: vec![View::on_change("watch", sink.clone())
                .subscribe(src, "state")
                .subscribe(dst, "state")],
            ..SimulationConfig::new(graph, t(10.0))
        })
        .unwrap();

        coordinator.init().unwrap();
        coordinator.step().unwrap();
        // Only src transitioned, so only src was sampled.
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].port, "state");
        let value = records[0].value.as_ref().unwrap();
        assert_eq!(
            value.downcast_ref::<String>().unwrap(),
            &"src:state".to_string()
        );
    }

    // ── Trace ────────────────────────────────────────────────

    #[test]
    fn trace_records_hooks_and_events_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (graph, src, dst) = pair_graph();
        let mut coordinator = Coordinator::new(SimulationConfig {
            bindings: vec![
                (
                    src,
                    Behavior::atomic(Probe::new("src", t(1.0), &log).emitting("out")),
                ),
                (dst, Behavior::atomic(Probe::passive(&log, "dst"))),
            ],
            record_trace: true,
            ..SimulationConfig::new(graph, t(10.0))
        })
        .unwrap();

        coordinator.init().unwrap();
        coordinator.step().unwrap();
        coordinator.finish().unwrap();

        let trace = coordinator.take_trace().unwrap();
        let hooks: Vec<HookKind> = trace.hooks().iter().map(|h| h.hook).collect();
        assert_eq!(
            hooks,
            vec![
                HookKind::Init,
                HookKind::Init,
                HookKind::Internal,
                HookKind::External,
                HookKind::Finish,
                HookKind::Finish,
            ]
        );
        // One internal event and one routed external event.
        assert_eq!(trace.events().len(), 2);
        match &trace.events()[1] {
            Event::External(event) => {
                assert_eq!(event.source, src);
                assert_eq!(event.target, dst);
                assert_eq!(event.port, "in");
            }
            other => panic!("expected External, got {other:?}"),
        }
        // A second take yields nothing.
        assert!(coordinator.take_trace().is_none());
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn simultaneous_sources_coalesce_into_one_bag(n in 1usize..12) {
                let log = Arc::new(Mutex::new(Vec::new()));
                let mut graph = ModelGraph::new("top").unwrap();
                let root = graph.root();
                let sink = graph.add_atomic(root, "sink").unwrap();
                graph.add_input_port(sink, "in").unwrap();

                let mut bindings = vec![(sink, Behavior::atomic(Probe::passive(&log, "sink")))];
                for i in 0..n {
                    let src = graph.add_atomic(root, &format!("g{i}")).unwrap();
                    graph.add_output_port(src, "out").unwrap();
                    graph.connect_internal(root, src, "out", sink, "in").unwrap();
                    bindings.push((
                        src,
                        Behavior::atomic(Probe::new("src", t(1.0), &log).emitting("out")),
                    ));
                }

                let mut coordinator = Coordinator::new(SimulationConfig {
                    bindings,
                    ..SimulationConfig::new(graph, t(10.0))
                })
                .unwrap();
                coordinator.init().unwrap();

                match coordinator.step().unwrap() {
                    StepOutcome::Advanced { stats, .. } => {
                        prop_assert_eq!(stats.routed_events, n);
                        prop_assert_eq!(stats.internal_transitions, n);
                        prop_assert_eq!(stats.external_transitions, 1);
                    }
                    other => panic!("expected Advanced, got {other:?}"),
                }
                let expected = format!("sink:external@1x{n}");
                prop_assert!(log.lock().unwrap().contains(&expected));
            }
        }
    }
}
