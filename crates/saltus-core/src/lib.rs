//! Core types for the Saltus discrete-event simulation kernel.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the rest of the workspace: simulation
//! time, model and simulator identifiers, dynamically typed attribute
//! values, and the event structs exchanged between simulators.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod event;
pub mod id;
pub mod time;
pub mod value;

// Public re-exports for the primary API surface.
pub use error::{DynamicsError, TimeError};
pub use event::{
    Bag, Event, ExternalEvent, InternalEvent, ObservationEvent, OutputEvent, OutputEvents,
};
pub use id::{ModelId, SimulatorId};
pub use time::SimTime;
pub use value::{Attributes, Value};
