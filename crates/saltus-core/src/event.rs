//! Event structs exchanged between simulators.
//!
//! Three kinds of event flow through a running simulation:
//!
//! - **Internal**: a scheduled state transition of one model.
//! - **External**: a message arriving on a model's input port.
//! - **Observation**: a read-only sample of a model's state.
//!
//! [`Event`] is the tagged sum over the three, used wherever events
//! of mixed kind travel together (tracing, observation dispatch).
//! During a step, a model's emissions are collected in
//! [`OutputEvents`] and the messages delivered to it are coalesced
//! into a [`Bag`].

use smallvec::SmallVec;

use crate::id::{ModelId, SimulatorId};
use crate::time::SimTime;
use crate::value::Attributes;

/// A scheduled internal transition of one model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InternalEvent {
    /// When the transition fires.
    pub time: SimTime,
    /// The model whose transition fires.
    pub model: ModelId,
    /// The simulator driving that model.
    pub simulator: SimulatorId,
}

/// A message delivered to a model's input port.
#[derive(Clone, Debug)]
pub struct ExternalEvent {
    /// When the message arrives.
    pub time: SimTime,
    /// The atomic model that emitted the message.
    pub source: ModelId,
    /// The atomic model receiving the message.
    pub target: ModelId,
    /// Input port of `target` the message arrives on.
    pub port: String,
    /// Message payload.
    pub attributes: Attributes,
}

/// A read-only sample request against a model's state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObservationEvent {
    /// When the sample is taken.
    pub time: SimTime,
    /// The model being sampled.
    pub model: ModelId,
    /// The observable port being sampled.
    pub port: String,
}

/// Any event, tagged by kind.
#[derive(Clone, Debug)]
pub enum Event {
    /// A scheduled internal transition.
    Internal(InternalEvent),
    /// A message delivered to an input port.
    External(ExternalEvent),
    /// A state sample.
    Observation(ObservationEvent),
}

impl Event {
    /// The time the event occurs.
    pub fn time(&self) -> SimTime {
        match self {
            Self::Internal(e) => e.time,
            Self::External(e) => e.time,
            Self::Observation(e) => e.time,
        }
    }

    /// The model the event acts on. For external events this is the
    /// receiving model, not the emitter.
    pub fn model(&self) -> ModelId {
        match self {
            Self::Internal(e) => e.model,
            Self::External(e) => e.target,
            Self::Observation(e) => e.model,
        }
    }
}

/// One emission from a model's output phase: a port plus payload.
#[derive(Clone, Debug, Default)]
pub struct OutputEvent {
    /// Output port the emission leaves on.
    pub port: String,
    /// Emission payload.
    pub attributes: Attributes,
}

/// Collects a model's emissions during a single output phase.
///
/// Backed by a `SmallVec`, so the common one-or-two-port case stays
/// off the heap.
#[derive(Clone, Debug, Default)]
pub struct OutputEvents {
    events: SmallVec<[OutputEvent; 4]>,
}

impl OutputEvents {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit an empty payload on `port`.
    pub fn emit(&mut self, port: impl Into<String>) {
        self.events.push(OutputEvent {
            port: port.into(),
            attributes: Attributes::new(),
        });
    }

    /// Emit `attributes` on `port`.
    pub fn emit_with(&mut self, port: impl Into<String>, attributes: Attributes) {
        self.events.push(OutputEvent {
            port: port.into(),
            attributes,
        });
    }

    /// Iterate over emissions in emit order.
    pub fn iter(&self) -> impl Iterator<Item = &OutputEvent> {
        self.events.iter()
    }

    /// Number of emissions.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing was emitted.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drain all emissions in emit order.
    pub fn drain(&mut self) -> impl Iterator<Item = OutputEvent> + '_ {
        self.events.drain(..)
    }
}

/// All external events delivered to one model at one instant.
///
/// Messages from several sources arriving simultaneously are
/// coalesced into a single bag and handed to the model in one
/// external (or confluent) transition.
#[derive(Clone, Debug, Default)]
pub struct Bag {
    events: SmallVec<[ExternalEvent; 4]>,
}

impl Bag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event. Delivery order is preserved.
    pub fn push(&mut self, event: ExternalEvent) {
        self.events.push(event);
    }

    /// Iterate over events in delivery order.
    pub fn iter(&self) -> impl Iterator<Item = &ExternalEvent> {
        self.events.iter()
    }

    /// Iterate over only the events that arrived on `port`.
    pub fn on_port<'a>(&'a self, port: &'a str) -> impl Iterator<Item = &'a ExternalEvent> + 'a {
        self.events.iter().filter(move |e| e.port == port)
    }

    /// Number of events in the bag.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
