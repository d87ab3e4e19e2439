//! Simulation engine for Saltus model graphs.
//!
//! This crate drives the structures declared in `saltus-graph` with
//! the behaviors declared in `saltus-dynamics`: it owns the event
//! table, executes steps, routes emissions, applies structural
//! changes, and dispatches observations.
//!
//! # Architecture
//!
//! - [`config`]: run configuration and startup validation.
//! - [`schedule`]: the pending-event table with deterministic tie
//!   ordering.
//! - [`simulator`]: the per-model driver wrapping one behavior.
//! - [`coordinator`]: step execution in output, transition,
//!   structure, and observation phases.
//! - [`root`]: the run loop, cooperative stop, and run summaries.
//! - [`stats`] and [`trace`]: per-step counters and optional per-run
//!   recording.
//!
//! Determinism is structural rather than best-effort: simultaneous
//! events execute in ascending simulator id, bags preserve delivery
//! order, and structural changes apply in request order, so two runs
//! of the same configuration produce identical histories.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod coordinator;
pub mod root;
pub mod schedule;
pub mod simulator;
pub mod stats;
pub mod trace;

// Public re-exports for the primary API surface.
pub use config::{ConfigError, SimulationConfig};
pub use coordinator::{Coordinator, CoordinatorState, StepError, StepOutcome};
pub use root::{RootCoordinator, StopHandle};
pub use schedule::{EventTable, ScheduleError};
pub use simulator::Simulator;
pub use stats::{RunSummary, StepStats};
pub use trace::{HookKind, HookRecord, Trace};
