//! Node, coupling, and route-endpoint types for the model graph.

use indexmap::{IndexMap, IndexSet};
use saltus_core::ModelId;

/// One node in the model tree.
#[derive(Clone, Debug)]
pub(crate) struct ModelNode {
    /// Leaf name, unique among siblings.
    pub(crate) name: String,
    /// Owning coupled model; `None` only for the root.
    pub(crate) parent: Option<ModelId>,
    /// Declared input ports, in declaration order.
    pub(crate) input_ports: IndexSet<String>,
    /// Declared output ports, in declaration order.
    pub(crate) output_ports: IndexSet<String>,
    /// Atomic leaf or coupled composite.
    pub(crate) kind: ModelKind,
}

impl ModelNode {
    pub(crate) fn new(name: String, parent: Option<ModelId>, kind: ModelKind) -> Self {
        Self {
            name,
            parent,
            input_ports: IndexSet::new(),
            output_ports: IndexSet::new(),
            kind,
        }
    }
}

/// What a node is: a behavioral leaf or a composite of children.
#[derive(Clone, Debug)]
pub(crate) enum ModelKind {
    Atomic,
    Coupled {
        /// Children by leaf name, in creation order.
        children: IndexMap<String, ModelId>,
        /// Couplings declared inside this model, in declaration order.
        couplings: Vec<Coupling>,
    },
}

impl ModelKind {
    pub(crate) fn coupled() -> Self {
        Self::Coupled {
            children: IndexMap::new(),
            couplings: Vec::new(),
        }
    }
}

/// One coupling edge inside a coupled model.
///
/// Couplings are owned by the coupled model they are declared in and
/// only ever reference that model's own ports and its direct
/// children. Cross-level delivery emerges from chaining couplings,
/// resolved by [`ModelGraph::resolve_route`](crate::ModelGraph::resolve_route).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Coupling {
    /// Child output port to sibling input port.
    Internal {
        /// Emitting child.
        source: ModelId,
        /// Output port of `source`.
        source_port: String,
        /// Receiving child.
        target: ModelId,
        /// Input port of `target`.
        target_port: String,
    },
    /// Owner input port down to a child input port.
    Input {
        /// Input port of the owning coupled model.
        source_port: String,
        /// Receiving child.
        target: ModelId,
        /// Input port of `target`.
        target_port: String,
    },
    /// Child output port up to an owner output port.
    Output {
        /// Emitting child.
        source: ModelId,
        /// Output port of `source`.
        source_port: String,
        /// Output port of the owning coupled model.
        target_port: String,
    },
}

impl Coupling {
    /// Whether this coupling references `model` as an endpoint.
    pub(crate) fn touches(&self, model: ModelId) -> bool {
        match self {
            Self::Internal { source, target, .. } => *source == model || *target == model,
            Self::Input { target, .. } => *target == model,
            Self::Output { source, .. } => *source == model,
        }
    }
}

/// Terminal endpoint of a resolved route: an atomic model input port.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RouteTarget {
    /// The atomic model the event is delivered to.
    pub model: ModelId,
    /// The input port it arrives on.
    pub port: String,
}
