//! Structural errors raised while building or mutating a model graph.

use saltus_core::ModelId;
use std::error::Error;
use std::fmt;

/// Errors from graph construction, coupling, and runtime mutation.
///
/// All structural problems are reported eagerly by the operation that
/// introduces them, never deferred to simulation time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StructuralError {
    /// The ID does not name a live model (never existed, or removed).
    UnknownModel {
        /// The stale or dangling ID.
        model: ModelId,
    },
    /// A model or port name is empty or contains the path separator.
    InvalidName {
        /// The rejected name.
        name: String,
    },
    /// The parent already has a child with this name.
    DuplicateName {
        /// Full name of the parent.
        parent: String,
        /// The colliding child name.
        name: String,
    },
    /// The model already has a port with this name.
    DuplicatePort {
        /// Full name of the model.
        model: String,
        /// The colliding port name.
        port: String,
    },
    /// The model has no port with this name.
    UnknownPort {
        /// Full name of the model.
        model: String,
        /// The missing port name.
        port: String,
    },
    /// An operation that requires a coupled model was given an atomic.
    NotCoupled {
        /// Full name of the model.
        model: String,
    },
    /// The model is not a direct child of the named parent.
    NotAChild {
        /// Full name of the model.
        model: String,
        /// Full name of the expected parent.
        parent: String,
    },
    /// The coupled model has no child with this name.
    UnknownChild {
        /// Full name of the parent.
        parent: String,
        /// The missing child name.
        name: String,
    },
    /// No coupling in the parent matches the one to disconnect.
    UnknownConnection {
        /// Full name of the parent.
        parent: String,
    },
    /// A coupling from a coupled model's input port directly to its
    /// own output port has no atomic endpoint.
    PassThrough {
        /// Full name of the coupled model.
        model: String,
    },
    /// The root model cannot be removed.
    RemoveRoot,
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownModel { model } => write!(f, "unknown or removed model {model}"),
            Self::InvalidName { name } => {
                write!(f, "invalid name '{name}': must be non-empty without '.'")
            }
            Self::DuplicateName { parent, name } => {
                write!(f, "'{parent}' already has a child named '{name}'")
            }
            Self::DuplicatePort { model, port } => {
                write!(f, "model '{model}' already has a port named '{port}'")
            }
            Self::UnknownPort { model, port } => {
                write!(f, "model '{model}' has no port named '{port}'")
            }
            Self::NotCoupled { model } => write!(f, "model '{model}' is not a coupled model"),
            Self::NotAChild { model, parent } => {
                write!(f, "model '{model}' is not a direct child of '{parent}'")
            }
            Self::UnknownChild { parent, name } => {
                write!(f, "coupled model '{parent}' has no child named '{name}'")
            }
            Self::UnknownConnection { parent } => {
                write!(f, "no matching coupling in '{parent}'")
            }
            Self::PassThrough { model } => {
                write!(
                    f,
                    "cannot couple an input port of '{model}' directly to its own output port"
                )
            }
            Self::RemoveRoot => write!(f, "the root model cannot be removed"),
        }
    }
}

impl Error for StructuralError {}
