//! Observation views and sinks for Saltus simulations.
//!
//! A [`View`] subscribes to (model, port) pairs and fires either on
//! every change to a subscribed model or on a fixed period. Samples
//! are answered by the model's own `observation` hook and pushed
//! into the view's [`ObservationSink`]. The engine dispatches views
//! at the end of each step, after all transitions have applied.
//!
//! [`MemorySink`] is the bundled in-process sink; anything that
//! implements [`ObservationSink`] can receive samples instead.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod sink;
pub mod view;

// Public re-exports for the primary API surface.
pub use sink::{MemorySink, ObservationRecord, ObservationSink};
pub use view::{View, ViewCadence, ViewSet};
