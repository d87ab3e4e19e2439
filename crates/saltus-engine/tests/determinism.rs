//! Determinism verification across repeated runs.
//!
//! Each test builds the same configuration twice, runs both with
//! tracing enabled, and compares the recorded hook sequences. Equal
//! seeds must reproduce the run exactly; tie-breaks and delivery
//! order must not depend on anything outside the configuration.

use saltus_core::SimTime;
use saltus_dynamics::Behavior;
use saltus_engine::{HookRecord, RootCoordinator, RunSummary, SimulationConfig};
use saltus_graph::ModelGraph;
use saltus_test_utils::{Collector, Relay, SeededNoise};

fn t(value: f64) -> SimTime {
    SimTime::new(value).unwrap()
}

/// noise -> relay -> sink, with the noise source's schedule drawn
/// from `seed`.
fn noisy_config(seed: u64, duration: SimTime) -> SimulationConfig {
    let mut graph = ModelGraph::new("top").unwrap();
    let noise = graph.add_atomic(graph.root(), "noise").unwrap();
    let relay = graph.add_atomic(graph.root(), "relay").unwrap();
    let sink = graph.add_atomic(graph.root(), "sink").unwrap();
    graph.add_output_port(noise, "out").unwrap();
    graph.add_input_port(relay, "in").unwrap();
    graph.add_output_port(relay, "fwd").unwrap();
    graph.add_input_port(sink, "in").unwrap();
    graph
        .connect_internal(graph.root(), noise, "out", relay, "in")
        .unwrap();
    graph
        .connect_internal(graph.root(), relay, "fwd", sink, "in")
        .unwrap();

    SimulationConfig {
        bindings: vec![
            (noise, Behavior::atomic(SeededNoise::new("out", 1.0, seed))),
            (relay, Behavior::atomic(Relay::new(t(0.25), "fwd"))),
            (sink, Behavior::atomic(Collector::new())),
        ],
        record_trace: true,
        ..SimulationConfig::new(graph, duration)
    }
}

fn run_traced(config: SimulationConfig) -> (Vec<HookRecord>, usize, RunSummary) {
    let mut root = RootCoordinator::new(config).unwrap();
    let summary = root.run().unwrap();
    let trace = root.take_trace().expect("tracing was enabled");
    (trace.hooks().to_vec(), trace.events().len(), summary)
}

#[test]
fn identical_configs_replay_identically() {
    let (hooks_a, events_a, summary_a) = run_traced(noisy_config(42, t(20.0)));
    let (hooks_b, events_b, summary_b) = run_traced(noisy_config(42, t(20.0)));

    assert!(summary_a.steps > 10, "the window should hold a real run");
    assert_eq!(hooks_a, hooks_b, "hook sequences must match record for record");
    assert_eq!(events_a, events_b);
    assert_eq!(summary_a, summary_b);
}

#[test]
fn different_seeds_produce_different_schedules() {
    let (hooks_a, _, _) = run_traced(noisy_config(1, t(20.0)));
    let (hooks_b, _, _) = run_traced(noisy_config(2, t(20.0)));

    assert_ne!(hooks_a, hooks_b, "seeded jitter must reach the schedule");
}

/// A longer window with a faster source, so the comparison covers
/// hundreds of steps with batched deliveries at the relay.
#[test]
fn long_noisy_run_is_reproducible() {
    let make = || {
        let mut config = noisy_config(1234, t(100.0));
        // A second seeded source into the same relay forces frequent
        // simultaneous arrivals.
        let extra = config.graph.add_atomic(config.graph.root(), "extra").unwrap();
        config.graph.add_output_port(extra, "out").unwrap();
        let relay = config
            .graph
            .child(config.graph.root(), "relay")
            .unwrap()
            .expect("relay exists");
        config
            .graph
            .connect_internal(config.graph.root(), extra, "out", relay, "in")
            .unwrap();
        config
            .bindings
            .push((extra, Behavior::atomic(SeededNoise::new("out", 0.3, 77))));
        config
    };

    let (hooks_a, events_a, summary_a) = run_traced(make());
    let (hooks_b, events_b, summary_b) = run_traced(make());

    assert!(
        summary_a.steps > 100,
        "expected hundreds of steps, got {}",
        summary_a.steps
    );
    assert_eq!(hooks_a.len(), hooks_b.len());
    assert_eq!(hooks_a, hooks_b);
    assert_eq!(events_a, events_b);
    assert_eq!(summary_a, summary_b);
}

/// Simulator identity follows model creation order even when the
/// bindings list is shuffled, so simultaneous events break ties the
/// same way in every run.
#[test]
fn tie_break_is_independent_of_binding_order() {
    let make = |flip: bool| {
        let mut graph = ModelGraph::new("top").unwrap();
        let a = graph.add_atomic(graph.root(), "a").unwrap();
        let b = graph.add_atomic(graph.root(), "b").unwrap();
        graph.add_output_port(a, "out").unwrap();
        graph.add_output_port(b, "out").unwrap();

        let mut bindings = vec![
            (a, Behavior::atomic(SeededNoise::new("out", 1.0, 5))),
            (b, Behavior::atomic(SeededNoise::new("out", 1.0, 5))),
        ];
        if flip {
            bindings.reverse();
        }
        SimulationConfig {
            bindings,
            record_trace: true,
            ..SimulationConfig::new(graph, t(10.0))
        }
    };

    // Same seed on both models: every firing is simultaneous, so the
    // whole run is tie-breaks.
    let (hooks_a, _, _) = run_traced(make(false));
    let (hooks_b, _, _) = run_traced(make(true));
    assert_eq!(hooks_a, hooks_b);
}
