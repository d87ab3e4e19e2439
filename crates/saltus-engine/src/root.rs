//! The run driver: init, step loop, finish, cooperative stop.
//!
//! [`RootCoordinator`] is the primary user-facing API for running a
//! simulation to completion. [`run()`](RootCoordinator::run) drives
//! the underlying [`Coordinator`] until the run window closes, the
//! schedule is exhausted, or a [`StopHandle`] fires, then executes
//! the finish hooks and returns a [`RunSummary`].
//!
//! # Ownership model
//!
//! `RootCoordinator` is [`Send`] but not [`Sync`]: a run can be moved
//! to a worker thread, and all stepping goes through `&mut self`.
//! Each instance is fully self-contained, so a model may construct
//! and drive another `RootCoordinator` from inside its own transition
//! without touching the outer run.
//!
//! # Stopping
//!
//! [`StopHandle::stop`] is cooperative: the request is observed at
//! the next step boundary, so the step in flight always completes and
//! the finish hooks still run.

use crossbeam_channel::{Receiver, Sender};

use saltus_core::SimTime;
use saltus_graph::ModelGraph;

use crate::config::{ConfigError, SimulationConfig};
use crate::coordinator::{Coordinator, CoordinatorState, StepError, StepOutcome};
use crate::stats::RunSummary;
use crate::trace::Trace;

// Compile-time assertion: RootCoordinator is Send, so runs can be
// driven from worker threads. Fails to compile if any field is !Send.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<RootCoordinator>();
    }
};

// ── StopHandle ─────────────────────────────────────────────────────

/// Requests a cooperative stop of a running [`RootCoordinator`].
///
/// Cloneable and cheap; handles stay valid after the run ends, at
/// which point [`stop()`](StopHandle::stop) has no effect.
#[derive(Clone, Debug)]
pub struct StopHandle {
    tx: Sender<()>,
}

impl StopHandle {
    /// Request a stop, taking effect at the next step boundary.
    pub fn stop(&self) {
        // A full channel already carries a pending request.
        let _ = self.tx.try_send(());
    }
}

// ── RootCoordinator ────────────────────────────────────────────────

/// Owns a [`Coordinator`] and drives it through a complete run.
#[derive(Debug)]
pub struct RootCoordinator {
    coordinator: Coordinator,
    stop_tx: Sender<()>,
    stop_rx: Receiver<()>,
}

impl RootCoordinator {
    /// Load a configuration into a fresh driver.
    ///
    /// Validates the configuration; no model hook runs yet.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        Ok(Self {
            coordinator: Coordinator::new(config)?,
            stop_tx,
            stop_rx,
        })
    }

    /// A handle for stopping this run from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            tx: self.stop_tx.clone(),
        }
    }

    /// Run until the window closes, the schedule is exhausted, or a
    /// stop is requested.
    ///
    /// Initializes on first use, so `run()` on a fresh driver is the
    /// whole lifecycle in one call. On success the finish hooks have
    /// run and the summary covers every executed step. A step failure
    /// aborts the run immediately with the originating error; finish
    /// hooks do not run in that case.
    pub fn run(&mut self) -> Result<RunSummary, StepError> {
        if self.coordinator.state() == CoordinatorState::Uninitialized {
            self.coordinator.init()?;
        }

        let mut steps = 0u64;
        let mut transitions = 0u64;
        let mut routed_events = 0u64;
        let mut observations = 0u64;
        let mut stopped = false;
        let mut exhausted = false;

        loop {
            if self.stop_rx.try_recv().is_ok() {
                stopped = true;
                break;
            }
            match self.coordinator.step() {
                Ok(StepOutcome::Advanced { stats, .. }) => {
                    steps += 1;
                    transitions += stats.transitions() as u64;
                    routed_events += stats.routed_events as u64;
                    observations += stats.observations as u64;
                }
                Ok(StepOutcome::TerminalReached { .. }) => break,
                Err(StepError::EmptySchedule) => {
                    // Every model going passive is a clean end of the
                    // run, not a failure.
                    exhausted = true;
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        self.coordinator.finish()?;
        Ok(RunSummary {
            steps,
            transitions,
            routed_events,
            observations,
            final_time: self.coordinator.current_time(),
            stopped,
            exhausted,
        })
    }

    /// Execute a single step, initializing on first use.
    pub fn run_one_step(&mut self) -> Result<StepOutcome, StepError> {
        if self.coordinator.state() == CoordinatorState::Uninitialized {
            self.coordinator.init()?;
        }
        self.coordinator.step()
    }

    /// Finish early without reaching the end of the window.
    pub fn finish(&mut self) -> Result<(), StepError> {
        self.coordinator.finish()
    }

    /// Current global time.
    pub fn current_time(&self) -> SimTime {
        self.coordinator.current_time()
    }

    /// Lifecycle state of the underlying coordinator.
    pub fn state(&self) -> CoordinatorState {
        self.coordinator.state()
    }

    /// The live model graph.
    pub fn graph(&self) -> &ModelGraph {
        self.coordinator.graph()
    }

    /// Number of live simulators, tracking structural changes.
    pub fn simulator_count(&self) -> usize {
        self.coordinator.simulator_count()
    }

    /// Take the recorded trace, if tracing was enabled.
    pub fn take_trace(&mut self) -> Option<Trace> {
        self.coordinator.take_trace()
    }
}
