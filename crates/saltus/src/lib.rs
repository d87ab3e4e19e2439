//! Saltus: a discrete-event simulation kernel with hierarchical
//! models and dynamic structure.
//!
//! This is the top-level facade crate that re-exports the public API
//! from all Saltus sub-crates. For most users, adding `saltus` as a
//! single dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use saltus::prelude::*;
//!
//! // A model that fires once at 1.0 and then goes passive.
//! struct Pulse {
//!     fired: bool,
//! }
//!
//! impl Dynamics for Pulse {
//!     fn init(&mut self, _time: SimTime) -> Result<SimTime, DynamicsError> {
//!         Ok(SimTime::new(1.0).unwrap())
//!     }
//!     fn time_advance(&self) -> SimTime {
//!         if self.fired {
//!             SimTime::INFINITY
//!         } else {
//!             SimTime::new(1.0).unwrap()
//!         }
//!     }
//!     fn output(&self, _time: SimTime, out: &mut OutputEvents) -> Result<(), DynamicsError> {
//!         out.emit("pulse");
//!         Ok(())
//!     }
//!     fn internal_transition(&mut self, _time: SimTime) -> Result<(), DynamicsError> {
//!         self.fired = true;
//!         Ok(())
//!     }
//! }
//!
//! // One atomic model under the root coupled model.
//! let mut graph = ModelGraph::new("top").unwrap();
//! let pulse = graph.add_atomic(graph.root(), "pulse").unwrap();
//! graph.add_output_port(pulse, "pulse").unwrap();
//!
//! let mut config = SimulationConfig::new(graph, SimTime::new(5.0).unwrap());
//! config.bindings.push((pulse, Behavior::atomic(Pulse { fired: false })));
//!
//! let mut root = RootCoordinator::new(config).unwrap();
//! let summary = root.run().unwrap();
//! assert_eq!(summary.steps, 1);
//! assert_eq!(summary.final_time, SimTime::new(1.0).unwrap());
//! assert!(summary.exhausted, "nothing left after the pulse");
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in
//! the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `saltus-core` | Time, IDs, events, attribute values, core errors |
//! | [`graph`] | `saltus-graph` | Model hierarchy, ports, couplings, route resolution |
//! | [`dynamics`] | `saltus-dynamics` | Model behavior traits and structural changes |
//! | [`obs`] | `saltus-obs` | Views, cadences, and observation sinks |
//! | [`engine`] | `saltus-engine` | Coordinators, the event table, run tracing |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and IDs (`saltus-core`).
///
/// Contains [`types::SimTime`], model and simulator identity, event
/// structs, dynamically typed attributes, and the core error enums.
pub use saltus_core as types;

/// Model hierarchy and couplings (`saltus-graph`).
///
/// Build a [`graph::ModelGraph`] of coupled and atomic models, declare
/// ports, and connect them; the engine resolves emissions through it.
pub use saltus_graph as graph;

/// Model behavior (`saltus-dynamics`).
///
/// The [`dynamics::Dynamics`] trait is the main extension point for
/// user models; [`dynamics::Executive`] adds structural-change
/// privileges for dynamic-structure simulations.
pub use saltus_dynamics as dynamics;

/// Observation views and sinks (`saltus-obs`).
///
/// Subscribe a [`obs::View`] to model state on a timed or on-change
/// cadence and collect samples through an [`obs::ObservationSink`].
pub use saltus_obs as obs;

/// Simulation engine (`saltus-engine`).
///
/// [`engine::RootCoordinator`] drives a whole run;
/// [`engine::Coordinator`] exposes single-step control underneath it.
pub use saltus_engine as engine;

/// Common imports for typical Saltus usage.
///
/// ```rust
/// use saltus::prelude::*;
/// ```
///
/// This imports the most frequently used types: the model graph, the
/// behavior traits, time, configuration, and the run driver.
pub mod prelude {
    // Time, identity, and event payloads
    pub use saltus_core::{
        Attributes, Bag, ModelId, ObservationEvent, OutputEvents, SimTime, SimulatorId, Value,
    };

    // Errors
    pub use saltus_core::{DynamicsError, TimeError};

    // Model graph
    pub use saltus_graph::{Coupling, ModelGraph, StructuralError};

    // Behavior
    pub use saltus_dynamics::{Behavior, Dynamics, Executive, ExecutiveContext};

    // Observation
    pub use saltus_obs::{MemorySink, ObservationSink, View, ViewCadence};

    // Engine
    pub use saltus_engine::{
        ConfigError, RootCoordinator, RunSummary, SimulationConfig, StepError, StepOutcome,
        StopHandle,
    };
}
