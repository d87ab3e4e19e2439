//! Behavior contracts for Saltus simulations.
//!
//! Atomic models supply their behavior through the [`Dynamics`]
//! trait: time advance, output, and the three transition hooks of
//! the DEVS formalism. [`Executive`] is the privileged variant that
//! can additionally mutate the model structure of its own coupled
//! model mid-run; its requested changes are queued in a
//! [`ChangeSet`] and applied by the engine between step phases,
//! never while routing is in flight.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod behavior;
pub mod change;
pub mod dynamics;
pub mod executive;

// Public re-exports for the primary API surface.
pub use behavior::Behavior;
pub use change::{ChangeSet, CouplingSpec, DynamicsFactory, ScopedChange, StructuralChange};
pub use dynamics::Dynamics;
pub use executive::{Executive, ExecutiveContext};
