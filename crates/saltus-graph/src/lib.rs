//! Hierarchical model structure for Saltus simulations.
//!
//! A simulation's shape is a tree of models: coupled models contain
//! children plus the couplings that wire their ports together;
//! atomic models are the leaves that carry behavior. The tree lives
//! in an arena of generational slots, so removing a model at runtime
//! invalidates its ID instead of letting it dangle.
//!
//! Routing ([`ModelGraph::resolve_route`]) flattens the hierarchy:
//! an emission is walked through output, internal, and input
//! couplings until only atomic input ports remain, because only
//! atomic models have running simulators.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod graph;
pub mod node;

// Public re-exports for the primary API surface.
pub use error::StructuralError;
pub use graph::ModelGraph;
pub use node::{Coupling, RouteTarget};
