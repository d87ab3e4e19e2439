//! Views: named subscriptions with a sampling cadence.

use std::fmt;

use saltus_core::{ModelId, SimTime, Value};

use crate::sink::ObservationSink;

/// When a view samples its subscriptions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewCadence {
    /// Sample a subscribed model whenever it transitions.
    OnChange,
    /// Sample every subscription on a fixed period, starting at the
    /// run's begin time.
    Timed {
        /// Interval between samples; must be positive and finite.
        period: SimTime,
    },
}

/// A named set of (model, port) subscriptions feeding one sink.
///
/// Built before the run with the chainable
/// [`subscribe`](View::subscribe); armed and dispatched by the
/// engine afterwards.
pub struct View {
    name: String,
    cadence: ViewCadence,
    subscriptions: Vec<(ModelId, String)>,
    sink: Box<dyn ObservationSink>,
    next_due: Option<SimTime>,
}

impl View {
    /// Create a view that samples subscribed models as they change.
    pub fn on_change(name: impl Into<String>, sink: impl ObservationSink + 'static) -> Self {
        Self {
            name: name.into(),
            cadence: ViewCadence::OnChange,
            subscriptions: Vec::new(),
            sink: Box::new(sink),
            next_due: None,
        }
    }

    /// Create a view that samples all subscriptions every `period`.
    pub fn timed(
        name: impl Into<String>,
        period: SimTime,
        sink: impl ObservationSink + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            cadence: ViewCadence::Timed { period },
            subscriptions: Vec::new(),
            sink: Box::new(sink),
            next_due: None,
        }
    }

    /// Subscribe to one (model, port) pair. The port names whatever
    /// the model's `observation` hook answers for; it does not have
    /// to be a declared event port.
    pub fn subscribe(mut self, model: ModelId, port: impl Into<String>) -> Self {
        self.subscriptions.push((model, port.into()));
        self
    }

    /// The view's name, unique within one simulation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The sampling cadence.
    pub fn cadence(&self) -> ViewCadence {
        self.cadence
    }

    /// Subscriptions in registration order.
    pub fn subscriptions(&self) -> &[(ModelId, String)] {
        &self.subscriptions
    }

    /// For timed views, when the next sample is due. `None` for
    /// on-change views.
    pub fn next_due(&self) -> Option<SimTime> {
        self.next_due
    }

    /// Arm the cadence at the run's begin time. A timed view's first
    /// sample is due at `begin` itself.
    pub fn arm(&mut self, begin: SimTime) {
        if let ViewCadence::Timed { .. } = self.cadence {
            self.next_due = Some(begin);
        }
    }

    /// Whether a timed sample is due at `time`.
    pub fn is_due(&self, time: SimTime) -> bool {
        self.next_due.is_some_and(|due| due <= time)
    }

    /// Move a due timed view one period past `time`.
    pub fn advance(&mut self, time: SimTime) {
        if let ViewCadence::Timed { period } = self.cadence {
            // A sum that leaves the finite range means no further
            // samples.
            self.next_due = time.checked_add(period).ok().filter(|t| t.is_finite());
        }
    }

    /// Forward one sample to the sink.
    pub fn record(
        &mut self,
        time: SimTime,
        model: ModelId,
        port: &str,
        value: Option<Box<dyn Value>>,
    ) {
        self.sink.on_observation(time, model, port, value);
    }

    /// Tell the sink the run is over.
    pub fn finish(&mut self, time: SimTime) {
        self.sink.finish(time);
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("name", &self.name)
            .field("cadence", &self.cadence)
            .field("subscriptions", &self.subscriptions)
            .field("next_due", &self.next_due)
            .finish_non_exhaustive()
    }
}

/// All views of one simulation, dispatched together each step.
#[derive(Debug, Default)]
pub struct ViewSet {
    views: Vec<View>,
}

impl ViewSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a view.
    pub fn push(&mut self, view: View) {
        self.views.push(view);
    }

    /// Arm every view at the run's begin time.
    pub fn arm(&mut self, begin: SimTime) {
        for view in &mut self.views {
            view.arm(begin);
        }
    }

    /// Earliest pending timed sample across all views.
    pub fn next_timed_due(&self) -> Option<SimTime> {
        self.views.iter().filter_map(|v| v.next_due()).min()
    }

    /// Iterate views in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &View> {
        self.views.iter()
    }

    /// Iterate views mutably in registration order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut View> {
        self.views.iter_mut()
    }

    /// Number of views.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Whether there are no views.
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Tell every sink the run is over.
    pub fn finish(&mut self, time: SimTime) {
        for view in &mut self.views {
            view.finish(time);
        }
    }
}
