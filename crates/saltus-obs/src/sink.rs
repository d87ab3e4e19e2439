//! Observation delivery: the sink trait and the in-memory sink.

use std::sync::{Arc, Mutex};

use saltus_core::{ModelId, SimTime, Value};

/// Receives observation samples pushed by the engine.
///
/// One sink belongs to one view. `on_observation` is called from
/// inside the step loop, so implementations should hand off or store
/// cheaply rather than block.
pub trait ObservationSink: Send {
    /// Receive one sample. `value` is whatever the model's
    /// `observation` hook returned, `None` when the model had
    /// nothing to report for this port.
    fn on_observation(
        &mut self,
        time: SimTime,
        model: ModelId,
        port: &str,
        value: Option<Box<dyn Value>>,
    );

    /// The run finished; flush anything buffered.
    ///
    /// Default: nothing to flush.
    fn finish(&mut self, _time: SimTime) {}
}

/// One recorded sample.
#[derive(Clone, Debug)]
pub struct ObservationRecord {
    /// When the sample was taken.
    pub time: SimTime,
    /// The sampled model.
    pub model: ModelId,
    /// The sampled port.
    pub port: String,
    /// The value the model reported, if any.
    pub value: Option<Box<dyn Value>>,
}

/// An [`ObservationSink`] that appends records to shared memory.
///
/// Cloning yields another handle to the same storage, so tests hand
/// one clone to a view and read results through the other after the
/// run.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<ObservationRecord>>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far, in arrival order.
    pub fn records(&self) -> Vec<ObservationRecord> {
        self.records.lock().expect("sink mutex poisoned").clone()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.lock().expect("sink mutex poisoned").len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObservationSink for MemorySink {
    fn on_observation(
        &mut self,
        time: SimTime,
        model: ModelId,
        port: &str,
        value: Option<Box<dyn Value>>,
    ) {
        self.records
            .lock()
            .expect("sink mutex poisoned")
            .push(ObservationRecord {
                time,
                model,
                port: port.to_string(),
                value,
            });
    }
}
