//! Re-entrant runs: a model launches a complete inner simulation
//! from inside one of its own transitions.
//!
//! The inner run gets its own coordinator, schedule, and clock, so
//! nothing it does may leak into the outer run's timing or state.

use saltus_core::{DynamicsError, SimTime};
use saltus_dynamics::Behavior;
use saltus_engine::{RootCoordinator, SimulationConfig, StepError};
use saltus_graph::ModelGraph;
use saltus_test_utils::{pair_graph, Collector, FailAfter, Generator, NestedRunner};

fn t(value: f64) -> SimTime {
    SimTime::new(value).unwrap()
}

/// gen firing every 1.0 from 1.0 into a collector, over `duration`.
fn inner_config(duration: SimTime) -> SimulationConfig {
    let (graph, src, dst) = pair_graph();
    SimulationConfig {
        bindings: vec![
            (src, Behavior::atomic(Generator::new("out", t(1.0), t(1.0)))),
            (dst, Behavior::atomic(Collector::new())),
        ],
        ..SimulationConfig::new(graph, duration)
    }
}

#[test]
fn inner_run_completes_inside_an_outer_transition() {
    let mut graph = ModelGraph::new("top").unwrap();
    let runner = graph.add_atomic(graph.root(), "runner").unwrap();
    let gen = graph.add_atomic(graph.root(), "gen").unwrap();
    let sink = graph.add_atomic(graph.root(), "sink").unwrap();
    graph.add_output_port(gen, "out").unwrap();
    graph.add_input_port(sink, "in").unwrap();
    graph
        .connect_internal(graph.root(), gen, "out", sink, "in")
        .unwrap();

    let nested = NestedRunner::new(t(2.0), inner_config(t(3.0)));
    let inner_summary = nested.summary_handle();

    let config = SimulationConfig {
        bindings: vec![
            (runner, Behavior::atomic(nested)),
            (gen, Behavior::atomic(Generator::new("out", t(1.0), t(1.0)))),
            (sink, Behavior::atomic(Collector::new())),
        ],
        ..SimulationConfig::new(graph, t(4.0))
    };

    let mut root = RootCoordinator::new(config).unwrap();
    let outer = root.run().unwrap();

    // The outer run is undisturbed by the inner one.
    assert_eq!(outer.steps, 3, "outer events at 1.0, 2.0, 3.0");
    assert_eq!(outer.final_time, t(3.0));

    // The inner window [0, 3) holds events at 1.0 and 2.0.
    let inner = inner_summary.lock().unwrap();
    let inner = inner.as_ref().expect("inner run completed");
    assert_eq!(inner.steps, 2);
    assert_eq!(inner.routed_events, 2);
    assert_eq!(inner.final_time, t(2.0));
    assert!(!inner.exhausted);
}

#[test]
fn inner_failure_aborts_the_outer_run() {
    let mut inner_graph = ModelGraph::new("top").unwrap();
    let bad = inner_graph.add_atomic(inner_graph.root(), "bad").unwrap();
    let inner = SimulationConfig {
        bindings: vec![(bad, Behavior::atomic(FailAfter::new(t(1.0), 1)))],
        ..SimulationConfig::new(inner_graph, t(10.0))
    };

    let mut graph = ModelGraph::new("top").unwrap();
    let runner = graph.add_atomic(graph.root(), "runner").unwrap();
    let config = SimulationConfig {
        bindings: vec![(runner, Behavior::atomic(NestedRunner::new(t(1.0), inner)))],
        ..SimulationConfig::new(graph, t(5.0))
    };

    let mut root = RootCoordinator::new(config).unwrap();
    let err = match root.run() {
        Err(e) => e,
        Ok(_) => panic!("inner failure should abort the outer run"),
    };

    match err {
        StepError::Dynamics { model, source } => {
            assert_eq!(model, "top.runner", "the outer model carries the blame");
            match source {
                DynamicsError::ExecutionFailed { reason } => {
                    assert!(reason.contains("inner run"), "unexpected reason: {reason}");
                }
                other => panic!("expected ExecutionFailed, got {other:?}"),
            }
        }
        other => panic!("expected Dynamics, got {other:?}"),
    }
}

#[test]
fn two_nested_runs_are_independent() {
    let mut graph = ModelGraph::new("top").unwrap();
    let short = graph.add_atomic(graph.root(), "short").unwrap();
    let long = graph.add_atomic(graph.root(), "long").unwrap();

    let first = NestedRunner::new(t(1.0), inner_config(t(3.0)));
    let first_summary = first.summary_handle();
    let second = NestedRunner::new(t(2.0), inner_config(t(5.0)));
    let second_summary = second.summary_handle();

    let config = SimulationConfig {
        bindings: vec![
            (short, Behavior::atomic(first)),
            (long, Behavior::atomic(second)),
        ],
        ..SimulationConfig::new(graph, t(4.0))
    };

    let mut root = RootCoordinator::new(config).unwrap();
    root.run().unwrap();

    let first = first_summary.lock().unwrap();
    let second = second_summary.lock().unwrap();
    assert_eq!(first.as_ref().expect("first inner run completed").steps, 2);
    assert_eq!(second.as_ref().expect("second inner run completed").steps, 4);
}
