//! Test fixtures and scripted models for Saltus development.
//!
//! Provides small dynamics and executive implementations with
//! predictable schedules, plus graph builders, for engine unit tests
//! and scenario tests. Everything here is deterministic by
//! construction so traces can be compared across runs.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{
    pair_graph, Collector, FailAfter, Generator, HookLog, NestedRunner, Pruner, Recorder, Relay,
    Rewire, SeededNoise, Spawner,
};
