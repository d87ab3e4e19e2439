//! Benchmark profiles for the Saltus simulation kernel.
//!
//! Provides pre-built [`SimulationConfig`] profiles for benchmarking:
//!
//! - [`pipeline_profile`]: a generator feeding a chain of relays into
//!   a collector, for per-step routing cost at depth
//! - [`fanout_profile`]: one generator wired to many collectors, for
//!   wide delivery cost

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use saltus_core::SimTime;
use saltus_dynamics::Behavior;
use saltus_engine::SimulationConfig;
use saltus_graph::ModelGraph;
use saltus_test_utils::{Collector, Generator, Relay};

fn t(value: f64) -> SimTime {
    SimTime::new(value).expect("bench times are finite")
}

/// Build a pipeline profile: a generator firing every 1.0, `stages`
/// relays each holding for 0.25, and a collector at the end.
///
/// With more than four stages the waves overlap, so several relays
/// are in flight at once.
pub fn pipeline_profile(stages: usize, duration: SimTime) -> SimulationConfig {
    let mut graph = ModelGraph::new("bench").expect("valid root name");
    let gen = graph.add_atomic(graph.root(), "gen").expect("fresh name");
    graph.add_output_port(gen, "out").expect("fresh port");

    let mut bindings = vec![(
        gen,
        Behavior::atomic(Generator::new("out", t(1.0), t(1.0))),
    )];

    let mut upstream = (gen, "out".to_string());
    for i in 0..stages {
        let relay = graph
            .add_atomic(graph.root(), &format!("relay{i}"))
            .expect("fresh name");
        graph.add_input_port(relay, "in").expect("fresh port");
        graph.add_output_port(relay, "fwd").expect("fresh port");
        graph
            .connect_internal(graph.root(), upstream.0, &upstream.1, relay, "in")
            .expect("declared ports");
        bindings.push((relay, Behavior::atomic(Relay::new(t(0.25), "fwd"))));
        upstream = (relay, "fwd".to_string());
    }

    let sink = graph.add_atomic(graph.root(), "sink").expect("fresh name");
    graph.add_input_port(sink, "in").expect("fresh port");
    graph
        .connect_internal(graph.root(), upstream.0, &upstream.1, sink, "in")
        .expect("declared ports");
    bindings.push((sink, Behavior::atomic(Collector::new())));

    SimulationConfig {
        bindings,
        ..SimulationConfig::new(graph, duration)
    }
}

/// Build a fan-out profile: one generator firing every 1.0 into
/// `sinks` collectors over a single output port.
///
/// Every firing routes to all sinks at once, so the per-step cost is
/// dominated by delivery.
pub fn fanout_profile(sinks: usize, duration: SimTime) -> SimulationConfig {
    let mut graph = ModelGraph::new("bench").expect("valid root name");
    let gen = graph.add_atomic(graph.root(), "gen").expect("fresh name");
    graph.add_output_port(gen, "out").expect("fresh port");

    let mut bindings = vec![(
        gen,
        Behavior::atomic(Generator::new("out", t(1.0), t(1.0))),
    )];

    for i in 0..sinks {
        let sink = graph
            .add_atomic(graph.root(), &format!("sink{i}"))
            .expect("fresh name");
        graph.add_input_port(sink, "in").expect("fresh port");
        graph
            .connect_internal(graph.root(), gen, "out", sink, "in")
            .expect("declared ports");
        bindings.push((sink, Behavior::atomic(Collector::new())));
    }

    SimulationConfig {
        bindings,
        ..SimulationConfig::new(graph, duration)
    }
}
