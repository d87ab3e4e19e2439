//! Run configuration, validation, and its error type.
//!
//! [`SimulationConfig`] is the input for constructing a coordinator.
//! [`validate()`](SimulationConfig::validate) checks the bindings and
//! views against the graph before any model hook runs, so a run that
//! starts is structurally sound.

use std::collections::HashSet;
use std::error::Error;
use std::fmt;

use saltus_core::{ModelId, SimTime, TimeError};
use saltus_dynamics::Behavior;
use saltus_graph::{ModelGraph, StructuralError};
use saltus_obs::{View, ViewCadence};

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`SimulationConfig::validate()`].
#[derive(Debug)]
pub enum ConfigError {
    /// The begin time is not finite.
    NonFiniteBegin {
        /// The rejected begin time.
        begin: SimTime,
    },
    /// The run duration is negative.
    NegativeDuration {
        /// The rejected duration.
        duration: SimTime,
    },
    /// A binding targets a model that is not in the graph.
    UnknownModel {
        /// The unresolvable model id.
        model: ModelId,
    },
    /// A binding targets a coupled model.
    NotAtomic {
        /// Full name of the coupled model.
        model: String,
    },
    /// Two bindings target the same model.
    DuplicateBinding {
        /// Full name of the doubly bound model.
        model: String,
    },
    /// An atomic model has no binding.
    MissingDynamics {
        /// Full name of the unbound model.
        model: String,
    },
    /// Two views share a name.
    DuplicateView {
        /// The repeated view name.
        name: String,
    },
    /// A timed view's period is not finite and positive.
    InvalidViewPeriod {
        /// The view's name.
        view: String,
        /// The rejected period.
        period: SimTime,
    },
    /// A view subscription targets a model that is not in the graph.
    UnknownViewModel {
        /// The view's name.
        view: String,
        /// The unresolvable model id.
        model: ModelId,
    },
    /// A view subscription targets a coupled model.
    ViewTargetNotAtomic {
        /// The view's name.
        view: String,
        /// Full name of the coupled model.
        model: String,
    },
    /// Graph inspection failed.
    Structural(StructuralError),
    /// Time arithmetic on the run window failed.
    Time(TimeError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFiniteBegin { begin } => {
                write!(f, "begin time must be finite, got {begin}")
            }
            Self::NegativeDuration { duration } => {
                write!(f, "duration must be non-negative, got {duration}")
            }
            Self::UnknownModel { model } => {
                write!(f, "binding targets unknown model {model}")
            }
            Self::NotAtomic { model } => {
                write!(f, "binding targets coupled model '{model}'")
            }
            Self::DuplicateBinding { model } => {
                write!(f, "model '{model}' is bound twice")
            }
            Self::MissingDynamics { model } => {
                write!(f, "atomic model '{model}' has no dynamics binding")
            }
            Self::DuplicateView { name } => {
                write!(f, "view name '{name}' is used twice")
            }
            Self::InvalidViewPeriod { view, period } => {
                write!(
                    f,
                    "view '{view}' period must be finite and positive, got {period}"
                )
            }
            Self::UnknownViewModel { view, model } => {
                write!(f, "view '{view}' subscribes to unknown model {model}")
            }
            Self::ViewTargetNotAtomic { view, model } => {
                write!(f, "view '{view}' subscribes to coupled model '{model}'")
            }
            Self::Structural(e) => write!(f, "structure: {e}"),
            Self::Time(e) => write!(f, "time: {e}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Structural(e) => Some(e),
            Self::Time(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StructuralError> for ConfigError {
    fn from(e: StructuralError) -> Self {
        Self::Structural(e)
    }
}

impl From<TimeError> for ConfigError {
    fn from(e: TimeError) -> Self {
        Self::Time(e)
    }
}

// ── SimulationConfig ───────────────────────────────────────────────

/// Complete configuration for one simulation run.
///
/// The run covers the half-open window `[begin, begin + duration)`;
/// an event landing exactly on the end of the window is not executed.
/// An infinite duration runs until the schedule is exhausted.
pub struct SimulationConfig {
    /// The model structure to simulate.
    pub graph: ModelGraph,
    /// One behavior per atomic model in `graph`.
    pub bindings: Vec<(ModelId, Behavior)>,
    /// Global time the run starts at.
    pub begin: SimTime,
    /// Length of the run window.
    pub duration: SimTime,
    /// Observation views dispatched during the run.
    pub views: Vec<View>,
    /// Record a per-run [`Trace`](crate::trace::Trace) of events and
    /// hook invocations.
    pub record_trace: bool,
}

impl SimulationConfig {
    /// A run over `[ZERO, duration)` with no bindings or views yet.
    pub fn new(graph: ModelGraph, duration: SimTime) -> Self {
        Self {
            graph,
            bindings: Vec::new(),
            begin: SimTime::ZERO,
            duration,
            views: Vec::new(),
            record_trace: false,
        }
    }

    /// Validate the configuration against the graph.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. The begin time must be finite.
        if !self.begin.is_finite() {
            return Err(ConfigError::NonFiniteBegin { begin: self.begin });
        }
        // 2. The duration must be non-negative. Infinite is allowed
        //    and means "run until exhaustion".
        if self.duration < SimTime::ZERO {
            return Err(ConfigError::NegativeDuration {
                duration: self.duration,
            });
        }
        // 3. Every binding must target a live atomic model, at most
        //    once.
        let mut bound = HashSet::new();
        for (model, _) in &self.bindings {
            if !self.graph.contains(*model) {
                return Err(ConfigError::UnknownModel { model: *model });
            }
            if !self.graph.is_atomic(*model)? {
                return Err(ConfigError::NotAtomic {
                    model: self.graph.full_name(*model)?,
                });
            }
            if !bound.insert(*model) {
                return Err(ConfigError::DuplicateBinding {
                    model: self.graph.full_name(*model)?,
                });
            }
        }
        // 4. Every atomic model must have a binding.
        for model in self.graph.atomics() {
            if !bound.contains(&model) {
                return Err(ConfigError::MissingDynamics {
                    model: self.graph.full_name(model)?,
                });
            }
        }
        // 5. View names must be unique, timed periods finite and
        //    positive, and subscriptions must target live atomic
        //    models. Ports are not checked: a view may probe any
        //    name the model chooses to answer.
        let mut names = HashSet::new();
        for view in &self.views {
            if !names.insert(view.name().to_string()) {
                return Err(ConfigError::DuplicateView {
                    name: view.name().to_string(),
                });
            }
            if let ViewCadence::Timed { period } = view.cadence() {
                if !period.is_finite() || period <= SimTime::ZERO {
                    return Err(ConfigError::InvalidViewPeriod {
                        view: view.name().to_string(),
                        period,
                    });
                }
            }
            for (model, _) in view.subscriptions() {
                if !self.graph.contains(*model) {
                    return Err(ConfigError::UnknownViewModel {
                        view: view.name().to_string(),
                        model: *model,
                    });
                }
                if !self.graph.is_atomic(*model)? {
                    return Err(ConfigError::ViewTargetNotAtomic {
                        view: view.name().to_string(),
                        model: self.graph.full_name(*model)?,
                    });
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for SimulationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationConfig")
            .field("models", &self.graph.model_count())
            .field("bindings", &self.bindings.len())
            .field("begin", &self.begin)
            .field("duration", &self.duration)
            .field("views", &self.views.len())
            .field("record_trace", &self.record_trace)
            .finish()
    }
}
