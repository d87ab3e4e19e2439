//! Reusable scripted models for simulation tests.
//!
//! Standard fixtures for engine and scenario testing:
//!
//! - [`Generator`] — emits on a port at a fixed period.
//! - [`Collector`] — records every arriving external event.
//! - [`Relay`] — re-emits received events after a fixed delay.
//! - [`Recorder`] — logs every hook invocation to a shared log.
//! - [`FailAfter`] — fails deterministically after N transitions.
//! - [`SeededNoise`] — fires at seeded pseudo-random intervals.
//! - [`Spawner`], [`Pruner`], [`Rewire`] — executives exercising the
//!   three structural-change kinds.
//! - [`NestedRunner`] — runs a complete inner simulation from inside
//!   a transition.

use std::sync::{Arc, Mutex};

use rand::{RngExt, SeedableRng};
use rand_chacha::ChaCha8Rng;

use saltus_core::{Bag, DynamicsError, ModelId, ObservationEvent, OutputEvents, SimTime, Value};
use saltus_dynamics::{Dynamics, Executive, ExecutiveContext};
use saltus_engine::{RootCoordinator, RunSummary, SimulationConfig};
use saltus_graph::ModelGraph;

/// Shared hook log for comparing execution order across runs.
pub type HookLog = Arc<Mutex<Vec<String>>>;

/// `top { src, dst }` with `src.out -> dst.in`.
pub fn pair_graph() -> (ModelGraph, ModelId, ModelId) {
    let mut graph = ModelGraph::new("top").expect("valid root name");
    let src = graph
        .add_atomic(graph.root(), "src")
        .expect("fresh child name");
    let dst = graph
        .add_atomic(graph.root(), "dst")
        .expect("fresh child name");
    graph.add_output_port(src, "out").expect("fresh port name");
    graph.add_input_port(dst, "in").expect("fresh port name");
    graph
        .connect_internal(graph.root(), src, "out", dst, "in")
        .expect("declared ports");
    (graph, src, dst)
}

// ── Generator ──────────────────────────────────────────────────────

/// Emits one event on `port` every `period`, starting after
/// `start_delay`. Observable on port `"count"`.
pub struct Generator {
    pub port: String,
    pub start_delay: SimTime,
    pub period: SimTime,
    count: u64,
}

impl Generator {
    pub fn new(port: impl Into<String>, start_delay: SimTime, period: SimTime) -> Self {
        Self {
            port: port.into(),
            start_delay,
            period,
            count: 0,
        }
    }
}

impl Dynamics for Generator {
    fn init(&mut self, _time: SimTime) -> Result<SimTime, DynamicsError> {
        Ok(self.start_delay)
    }

    fn time_advance(&self) -> SimTime {
        self.period
    }

    fn output(&self, _time: SimTime, output: &mut OutputEvents) -> Result<(), DynamicsError> {
        output.emit(&self.port);
        Ok(())
    }

    fn internal_transition(&mut self, _time: SimTime) -> Result<(), DynamicsError> {
        self.count += 1;
        Ok(())
    }

    fn observation(&self, event: &ObservationEvent) -> Option<Box<dyn Value>> {
        (event.port == "count").then(|| Box::new(self.count) as Box<dyn Value>)
    }
}

// ── Collector ──────────────────────────────────────────────────────

/// Records `(time, port)` for every arriving external event.
///
/// The arrival log is shared; clone a handle with
/// [`arrivals()`](Collector::arrivals) before moving the collector
/// into a configuration.
#[derive(Default)]
pub struct Collector {
    arrivals: Arc<Mutex<Vec<(SimTime, String)>>>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle onto the shared arrival log.
    pub fn arrivals(&self) -> Arc<Mutex<Vec<(SimTime, String)>>> {
        Arc::clone(&self.arrivals)
    }
}

impl Dynamics for Collector {
    fn external_transition(&mut self, bag: &Bag, time: SimTime) -> Result<(), DynamicsError> {
        let mut arrivals = self.arrivals.lock().expect("arrival log mutex poisoned");
        for event in bag.iter() {
            arrivals.push((time, event.port.clone()));
        }
        Ok(())
    }

    fn observation(&self, event: &ObservationEvent) -> Option<Box<dyn Value>> {
        if event.port != "received" {
            return None;
        }
        let count = self.arrivals.lock().expect("arrival log mutex poisoned").len();
        Some(Box::new(count as u64))
    }
}

// ── Relay ──────────────────────────────────────────────────────────

/// Re-emits every received event on `out_port` after `delay`.
///
/// Arrivals during the holding period extend the batch and restart
/// the delay.
pub struct Relay {
    pub delay: SimTime,
    pub out_port: String,
    pending: usize,
}

impl Relay {
    pub fn new(delay: SimTime, out_port: impl Into<String>) -> Self {
        Self {
            delay,
            out_port: out_port.into(),
            pending: 0,
        }
    }
}

impl Dynamics for Relay {
    fn time_advance(&self) -> SimTime {
        if self.pending > 0 {
            self.delay
        } else {
            SimTime::INFINITY
        }
    }

    fn output(&self, _time: SimTime, output: &mut OutputEvents) -> Result<(), DynamicsError> {
        for _ in 0..self.pending {
            output.emit(&self.out_port);
        }
        Ok(())
    }

    fn internal_transition(&mut self, _time: SimTime) -> Result<(), DynamicsError> {
        self.pending = 0;
        Ok(())
    }

    fn external_transition(&mut self, bag: &Bag, _time: SimTime) -> Result<(), DynamicsError> {
        self.pending += bag.len();
        Ok(())
    }
}

// ── Recorder ───────────────────────────────────────────────────────

/// Logs every hook invocation as `label:hook@time` to a shared log.
///
/// Fires `first` after init and `rest` after every transition;
/// optionally emits on a port at each internal event. The default
/// `rest` of infinity makes it a one-shot.
pub struct Recorder {
    pub label: String,
    pub first: SimTime,
    pub rest: SimTime,
    pub emit_on: Option<String>,
    log: HookLog,
}

impl Recorder {
    pub fn new(label: impl Into<String>, first: SimTime, log: &HookLog) -> Self {
        Self {
            label: label.into(),
            first,
            rest: SimTime::INFINITY,
            emit_on: None,
            log: Arc::clone(log),
        }
    }

    /// A recorder that never schedules its own events.
    pub fn passive(label: impl Into<String>, log: &HookLog) -> Self {
        Self::new(label, SimTime::INFINITY, log)
    }

    /// Keep firing every `rest` after the first event.
    pub fn repeating(mut self, rest: SimTime) -> Self {
        self.rest = rest;
        self
    }

    /// Emit on `port` at every internal event.
    pub fn emitting(mut self, port: impl Into<String>) -> Self {
        self.emit_on = Some(port.into());
        self
    }

    fn record(&self, line: String) {
        self.log.lock().expect("hook log mutex poisoned").push(line);
    }
}

impl Dynamics for Recorder {
    fn init(&mut self, time: SimTime) -> Result<SimTime, DynamicsError> {
        self.record(format!("{}:init@{time}", self.label));
        Ok(self.first)
    }

    fn time_advance(&self) -> SimTime {
        self.rest
    }

    fn output(&self, _time: SimTime, output: &mut OutputEvents) -> Result<(), DynamicsError> {
        if let Some(port) = &self.emit_on {
            output.emit(port);
        }
        Ok(())
    }

    fn internal_transition(&mut self, time: SimTime) -> Result<(), DynamicsError> {
        self.record(format!("{}:internal@{time}", self.label));
        Ok(())
    }

    fn external_transition(&mut self, bag: &Bag, time: SimTime) -> Result<(), DynamicsError> {
        self.record(format!("{}:external@{time}x{}", self.label, bag.len()));
        Ok(())
    }

    fn confluent_transition(&mut self, time: SimTime, bag: &Bag) -> Result<(), DynamicsError> {
        self.record(format!("{}:confluent@{time}x{}", self.label, bag.len()));
        Ok(())
    }

    fn observation(&self, event: &ObservationEvent) -> Option<Box<dyn Value>> {
        Some(Box::new(format!("{}:{}", self.label, event.port)))
    }

    fn finish(&mut self) {
        self.record(format!("{}:finish", self.label));
    }
}

// ── FailAfter ──────────────────────────────────────────────────────

/// Fires every `period` and fails deterministically after
/// `succeed_count` successful internal transitions.
pub struct FailAfter {
    pub period: SimTime,
    pub succeed_count: usize,
    calls: usize,
}

impl FailAfter {
    pub fn new(period: SimTime, succeed_count: usize) -> Self {
        Self {
            period,
            succeed_count,
            calls: 0,
        }
    }
}

impl Dynamics for FailAfter {
    fn init(&mut self, _time: SimTime) -> Result<SimTime, DynamicsError> {
        Ok(self.period)
    }

    fn time_advance(&self) -> SimTime {
        self.period
    }

    fn internal_transition(&mut self, _time: SimTime) -> Result<(), DynamicsError> {
        if self.calls >= self.succeed_count {
            return Err(DynamicsError::ExecutionFailed {
                reason: format!(
                    "deliberate failure after {} successful transitions",
                    self.succeed_count
                ),
            });
        }
        self.calls += 1;
        Ok(())
    }
}

// ── SeededNoise ────────────────────────────────────────────────────

/// Emits on `port` at pseudo-random intervals drawn from a seeded
/// RNG: `base_period * [0.5, 1.5)`.
///
/// Two instances with the same seed fire at identical times, which
/// makes it a stress source for determinism comparisons. Observable
/// on port `"fired"`.
pub struct SeededNoise {
    pub port: String,
    base_period: f64,
    rng: ChaCha8Rng,
    advance: SimTime,
    fired: u64,
}

impl SeededNoise {
    pub fn new(port: impl Into<String>, base_period: f64, seed: u64) -> Self {
        Self {
            port: port.into(),
            base_period,
            rng: ChaCha8Rng::seed_from_u64(seed),
            advance: SimTime::INFINITY,
            fired: 0,
        }
    }

    fn draw(&mut self) -> SimTime {
        let jitter: f64 = self.rng.random_range(0.5..1.5);
        SimTime::new(self.base_period * jitter).expect("jittered period is finite")
    }
}

impl Dynamics for SeededNoise {
    fn init(&mut self, _time: SimTime) -> Result<SimTime, DynamicsError> {
        self.advance = self.draw();
        Ok(self.advance)
    }

    fn time_advance(&self) -> SimTime {
        self.advance
    }

    fn output(&self, _time: SimTime, output: &mut OutputEvents) -> Result<(), DynamicsError> {
        output.emit(&self.port);
        Ok(())
    }

    fn internal_transition(&mut self, _time: SimTime) -> Result<(), DynamicsError> {
        self.fired += 1;
        self.advance = self.draw();
        Ok(())
    }

    fn observation(&self, event: &ObservationEvent) -> Option<Box<dyn Value>> {
        (event.port == "fired").then(|| Box::new(self.fired) as Box<dyn Value>)
    }
}

// ── Structural executives ──────────────────────────────────────────

/// Executive that adds a [`Generator`] child after `delay`.
///
/// The spawned model is named `child`, declares output port `"out"`,
/// and optionally gets wired to a sibling's input port.
pub struct Spawner {
    pub delay: SimTime,
    pub child: String,
    pub child_start: SimTime,
    pub child_period: SimTime,
    pub wire_to: Option<(String, String)>,
    done: bool,
}

impl Spawner {
    pub fn new(
        delay: SimTime,
        child: impl Into<String>,
        child_start: SimTime,
        child_period: SimTime,
    ) -> Self {
        Self {
            delay,
            child: child.into(),
            child_start,
            child_period,
            wire_to: None,
            done: false,
        }
    }

    /// Also connect the spawned model's `out` to `target.port`.
    pub fn wired_to(mut self, target: impl Into<String>, port: impl Into<String>) -> Self {
        self.wire_to = Some((target.into(), port.into()));
        self
    }
}

impl Executive for Spawner {
    fn init(
        &mut self,
        _time: SimTime,
        _ctx: &mut ExecutiveContext<'_>,
    ) -> Result<SimTime, DynamicsError> {
        Ok(self.delay)
    }

    fn time_advance(&self) -> SimTime {
        if self.done {
            SimTime::INFINITY
        } else {
            self.delay
        }
    }

    fn internal_transition(
        &mut self,
        _time: SimTime,
        ctx: &mut ExecutiveContext<'_>,
    ) -> Result<(), DynamicsError> {
        let start = self.child_start;
        let period = self.child_period;
        ctx.add_atomic(self.child.as_str(), &[], &["out"], move || {
            Box::new(Generator::new("out", start, period))
        });
        if let Some((target, port)) = &self.wire_to {
            ctx.connect(self.child.as_str(), "out", target.as_str(), port.as_str());
        }
        self.done = true;
        Ok(())
    }
}

/// Executive that removes the child named `victim` after `delay`.
pub struct Pruner {
    pub delay: SimTime,
    pub victim: String,
    done: bool,
}

impl Pruner {
    pub fn new(delay: SimTime, victim: impl Into<String>) -> Self {
        Self {
            delay,
            victim: victim.into(),
            done: false,
        }
    }
}

impl Executive for Pruner {
    fn init(
        &mut self,
        _time: SimTime,
        _ctx: &mut ExecutiveContext<'_>,
    ) -> Result<SimTime, DynamicsError> {
        Ok(self.delay)
    }

    fn time_advance(&self) -> SimTime {
        if self.done {
            SimTime::INFINITY
        } else {
            self.delay
        }
    }

    fn internal_transition(
        &mut self,
        _time: SimTime,
        ctx: &mut ExecutiveContext<'_>,
    ) -> Result<(), DynamicsError> {
        ctx.remove_model(self.victim.as_str());
        self.done = true;
        Ok(())
    }
}

/// Executive that applies one disconnect and/or one connect after
/// `delay`, in that order.
pub struct Rewire {
    pub delay: SimTime,
    disconnect: Option<(String, String, String, String)>,
    connect: Option<(String, String, String, String)>,
    done: bool,
}

impl Rewire {
    pub fn new(delay: SimTime) -> Self {
        Self {
            delay,
            disconnect: None,
            connect: None,
            done: false,
        }
    }

    pub fn disconnecting(
        mut self,
        source: &str,
        source_port: &str,
        target: &str,
        target_port: &str,
    ) -> Self {
        self.disconnect = Some((
            source.to_string(),
            source_port.to_string(),
            target.to_string(),
            target_port.to_string(),
        ));
        self
    }

    pub fn connecting(
        mut self,
        source: &str,
        source_port: &str,
        target: &str,
        target_port: &str,
    ) -> Self {
        self.connect = Some((
            source.to_string(),
            source_port.to_string(),
            target.to_string(),
            target_port.to_string(),
        ));
        self
    }
}

impl Executive for Rewire {
    fn init(
        &mut self,
        _time: SimTime,
        _ctx: &mut ExecutiveContext<'_>,
    ) -> Result<SimTime, DynamicsError> {
        Ok(self.delay)
    }

    fn time_advance(&self) -> SimTime {
        if self.done {
            SimTime::INFINITY
        } else {
            self.delay
        }
    }

    fn internal_transition(
        &mut self,
        _time: SimTime,
        ctx: &mut ExecutiveContext<'_>,
    ) -> Result<(), DynamicsError> {
        if let Some((source, source_port, target, target_port)) = &self.disconnect {
            ctx.disconnect(
                source.as_str(),
                source_port.as_str(),
                target.as_str(),
                target_port.as_str(),
            );
        }
        if let Some((source, source_port, target, target_port)) = &self.connect {
            ctx.connect(
                source.as_str(),
                source_port.as_str(),
                target.as_str(),
                target_port.as_str(),
            );
        }
        self.done = true;
        Ok(())
    }
}

// ── NestedRunner ───────────────────────────────────────────────────

/// Runs a complete inner simulation once, from inside its own
/// internal transition at `delay`.
///
/// The inner configuration is supplied up front and consumed by the
/// run; the resulting summary lands in the shared slot obtained from
/// [`summary_handle()`](NestedRunner::summary_handle). Inner failures
/// surface as [`DynamicsError::ExecutionFailed`] in the outer run.
pub struct NestedRunner {
    pub delay: SimTime,
    inner: Option<SimulationConfig>,
    summary: Arc<Mutex<Option<RunSummary>>>,
}

impl NestedRunner {
    pub fn new(delay: SimTime, inner: SimulationConfig) -> Self {
        Self {
            delay,
            inner: Some(inner),
            summary: Arc::new(Mutex::new(None)),
        }
    }

    /// Handle onto the slot the inner run's summary lands in.
    pub fn summary_handle(&self) -> Arc<Mutex<Option<RunSummary>>> {
        Arc::clone(&self.summary)
    }
}

impl Dynamics for NestedRunner {
    fn init(&mut self, _time: SimTime) -> Result<SimTime, DynamicsError> {
        Ok(self.delay)
    }

    fn internal_transition(&mut self, _time: SimTime) -> Result<(), DynamicsError> {
        if let Some(config) = self.inner.take() {
            let mut root =
                RootCoordinator::new(config).map_err(|e| DynamicsError::ExecutionFailed {
                    reason: format!("inner run: {e}"),
                })?;
            let summary = root.run().map_err(|e| DynamicsError::ExecutionFailed {
                reason: format!("inner run: {e}"),
            })?;
            *self.summary.lock().expect("summary mutex poisoned") = Some(summary);
        }
        Ok(())
    }
}
