//! Queued structural changes and the [`ChangeSet`] they collect in.
//!
//! Executives never touch the graph directly. Each request is
//! recorded as a [`StructuralChange`] scoped to the executive's own
//! coupled model, and the engine applies the queue after the
//! transition phase of the step that produced it. Events already
//! routed earlier in that step are unaffected.

use std::fmt;

use saltus_core::ModelId;

use crate::dynamics::Dynamics;

/// Deferred constructor for the dynamics of a model added mid-run.
///
/// Boxed so a change can travel through the queue; called exactly
/// once when the change is applied.
pub type DynamicsFactory = Box<dyn FnOnce() -> Box<dyn Dynamics> + Send>;

/// Endpoints of a coupling, named relative to one coupled model.
///
/// `source` and `target` are leaf names resolved when the change is
/// applied: a name equal to the coupled model's own name denotes the
/// coupled model itself (its input side as a source, its output side
/// as a target); any other name must be a direct child.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CouplingSpec {
    /// Emitting side.
    pub source: String,
    /// Port the event leaves on.
    pub source_port: String,
    /// Receiving side.
    pub target: String,
    /// Port the event arrives on.
    pub target_port: String,
}

/// One structural mutation requested by an executive.
pub enum StructuralChange {
    /// Add an atomic model with the given ports, building its
    /// dynamics when the change is applied.
    AddModel {
        /// Leaf name of the new model.
        name: String,
        /// Input ports to declare, in order.
        input_ports: Vec<String>,
        /// Output ports to declare, in order.
        output_ports: Vec<String>,
        /// Constructor for the model's dynamics.
        build: DynamicsFactory,
    },
    /// Remove a direct child and everything beneath it.
    RemoveModel {
        /// Leaf name of the child to remove.
        name: String,
    },
    /// Add a coupling described by name.
    Connect(CouplingSpec),
    /// Remove the first coupling matching the description.
    Disconnect(CouplingSpec),
}

impl fmt::Debug for StructuralChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddModel {
                name,
                input_ports,
                output_ports,
                ..
            } => f
                .debug_struct("AddModel")
                .field("name", name)
                .field("input_ports", input_ports)
                .field("output_ports", output_ports)
                .finish_non_exhaustive(),
            Self::RemoveModel { name } => {
                f.debug_struct("RemoveModel").field("name", name).finish()
            }
            Self::Connect(spec) => f.debug_tuple("Connect").field(spec).finish(),
            Self::Disconnect(spec) => f.debug_tuple("Disconnect").field(spec).finish(),
        }
    }
}

/// A change plus the coupled model it applies inside.
#[derive(Debug)]
pub struct ScopedChange {
    /// The coupled model whose executive requested the change.
    pub scope: ModelId,
    /// The requested change.
    pub change: StructuralChange,
}

/// FIFO queue of structural changes gathered during one step.
///
/// Owned by the engine; executives reach it through their context.
/// Draining preserves request order, so changes from several
/// executives apply in the order their transitions ran.
#[derive(Debug, Default)]
pub struct ChangeSet {
    entries: Vec<ScopedChange>,
}

impl ChangeSet {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a change scoped to `scope`.
    pub fn push(&mut self, scope: ModelId, change: StructuralChange) {
        self.entries.push(ScopedChange { scope, change });
    }

    /// Take every queued change, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<ScopedChange> {
        std::mem::take(&mut self.entries)
    }

    /// Number of queued changes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_preserves_request_order() {
        let scope = ModelId::new(0, 0);
        let mut changes = ChangeSet::new();
        changes.push(
            scope,
            StructuralChange::RemoveModel {
                name: "a".to_string(),
            },
        );
        changes.push(
            scope,
            StructuralChange::RemoveModel {
                name: "b".to_string(),
            },
        );

        let drained = changes.drain();
        assert!(changes.is_empty());
        let names: Vec<&str> = drained
            .iter()
            .map(|entry| match &entry.change {
                StructuralChange::RemoveModel { name } => name.as_str(),
                other => panic!("expected RemoveModel, got {other:?}"),
            })
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn factory_builds_on_demand() {
        struct Pinger;
        impl Dynamics for Pinger {
            fn time_advance(&self) -> saltus_core::SimTime {
                saltus_core::SimTime::ZERO
            }
        }

        let change = StructuralChange::AddModel {
            name: "ping".to_string(),
            input_ports: vec![],
            output_ports: vec!["out".to_string()],
            build: Box::new(|| Box::new(Pinger)),
        };

        match change {
            StructuralChange::AddModel { build, .. } => {
                let dynamics = build();
                assert_eq!(dynamics.time_advance(), saltus_core::SimTime::ZERO);
            }
            other => panic!("expected AddModel, got {other:?}"),
        }
    }
}
