//! The model graph: an arena-backed tree of atomic and coupled models.
//!
//! # Structure
//!
//! Nodes live in generational slots. Removing a model bumps its
//! slot's generation, so every previously handed-out [`ModelId`] for
//! that slot stops resolving instead of aliasing the next occupant.
//! Parent/child references are IDs into the arena, never pointers.
//!
//! # Validation
//!
//! Every mutating operation checks its preconditions eagerly and
//! fails with a [`StructuralError`] before touching the graph. A
//! graph that builds without error has no dangling couplings and no
//! duplicate names, which is what lets routing run unchecked on the
//! hot path.

use std::collections::{HashSet, VecDeque};

use saltus_core::ModelId;

use crate::error::StructuralError;
use crate::node::{Coupling, ModelKind, ModelNode, RouteTarget};

/// One arena slot. `node` is `None` while the slot sits on the free
/// list; the generation counts occupants.
#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    node: Option<ModelNode>,
}

/// Work item for the route walk. `Out` hops climb toward the root
/// and `In` hops descend toward atomic leaves, so the walk always
/// terminates without a visited set.
enum Hop {
    Out(ModelId, String),
    In(ModelId, String),
}

/// The hierarchical model structure of one simulation.
///
/// Created with a coupled root model; children are added underneath
/// it. Names are unique among siblings and must not contain `.`,
/// which [`ModelGraph::full_name`] uses as the path separator.
#[derive(Clone, Debug)]
pub struct ModelGraph {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: ModelId,
}

impl ModelGraph {
    /// Create a graph containing only a coupled root model.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError::InvalidName`] if `root_name` is
    /// empty or contains `.`.
    pub fn new(root_name: &str) -> Result<Self, StructuralError> {
        Self::validate_name(root_name)?;
        let mut graph = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: ModelId::new(0, 0),
        };
        graph.root = graph.alloc(ModelNode::new(
            root_name.to_string(),
            None,
            ModelKind::coupled(),
        ));
        Ok(graph)
    }

    /// The root coupled model.
    pub fn root(&self) -> ModelId {
        self.root
    }

    /// Whether `model` names a live node.
    pub fn contains(&self, model: ModelId) -> bool {
        self.node(model).is_ok()
    }

    /// Number of live models, the root included.
    pub fn model_count(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    // ── Construction ─────────────────────────────────────────────────

    /// Add an atomic model under `parent`.
    pub fn add_atomic(&mut self, parent: ModelId, name: &str) -> Result<ModelId, StructuralError> {
        self.add_child(parent, name, ModelKind::Atomic)
    }

    /// Add a coupled model under `parent`.
    pub fn add_coupled(&mut self, parent: ModelId, name: &str) -> Result<ModelId, StructuralError> {
        self.add_child(parent, name, ModelKind::coupled())
    }

    /// Declare an input port on `model`.
    pub fn add_input_port(&mut self, model: ModelId, port: &str) -> Result<(), StructuralError> {
        Self::validate_name(port)?;
        let name = self.full_name(model)?;
        let node = self.node_mut(model)?;
        if !node.input_ports.insert(port.to_string()) {
            return Err(StructuralError::DuplicatePort {
                model: name,
                port: port.to_string(),
            });
        }
        Ok(())
    }

    /// Declare an output port on `model`.
    pub fn add_output_port(&mut self, model: ModelId, port: &str) -> Result<(), StructuralError> {
        Self::validate_name(port)?;
        let name = self.full_name(model)?;
        let node = self.node_mut(model)?;
        if !node.output_ports.insert(port.to_string()) {
            return Err(StructuralError::DuplicatePort {
                model: name,
                port: port.to_string(),
            });
        }
        Ok(())
    }

    /// Couple a child's output port to a sibling child's input port.
    ///
    /// Both models must be direct children of `parent` and both ports
    /// must already be declared.
    pub fn connect_internal(
        &mut self,
        parent: ModelId,
        source: ModelId,
        source_port: &str,
        target: ModelId,
        target_port: &str,
    ) -> Result<(), StructuralError> {
        self.ensure_coupled(parent)?;
        self.ensure_child(parent, source)?;
        self.ensure_child(parent, target)?;
        self.ensure_output_port(source, source_port)?;
        self.ensure_input_port(target, target_port)?;
        self.push_coupling(
            parent,
            Coupling::Internal {
                source,
                source_port: source_port.to_string(),
                target,
                target_port: target_port.to_string(),
            },
        )
    }

    /// Couple an input port of `parent` down to a child's input port.
    pub fn connect_input(
        &mut self,
        parent: ModelId,
        source_port: &str,
        target: ModelId,
        target_port: &str,
    ) -> Result<(), StructuralError> {
        self.ensure_coupled(parent)?;
        self.ensure_input_port(parent, source_port)?;
        self.ensure_child(parent, target)?;
        self.ensure_input_port(target, target_port)?;
        self.push_coupling(
            parent,
            Coupling::Input {
                source_port: source_port.to_string(),
                target,
                target_port: target_port.to_string(),
            },
        )
    }

    /// Couple a child's output port up to an output port of `parent`.
    pub fn connect_output(
        &mut self,
        parent: ModelId,
        source: ModelId,
        source_port: &str,
        target_port: &str,
    ) -> Result<(), StructuralError> {
        self.ensure_coupled(parent)?;
        self.ensure_child(parent, source)?;
        self.ensure_output_port(source, source_port)?;
        self.ensure_output_port(parent, target_port)?;
        self.push_coupling(
            parent,
            Coupling::Output {
                source,
                source_port: source_port.to_string(),
                target_port: target_port.to_string(),
            },
        )
    }

    /// Remove the first coupling in `parent` equal to `coupling`.
    pub fn disconnect(
        &mut self,
        parent: ModelId,
        coupling: &Coupling,
    ) -> Result<(), StructuralError> {
        let parent_name = self.full_name(parent)?;
        if let ModelKind::Coupled { couplings, .. } = &mut self.node_mut(parent)?.kind {
            if let Some(pos) = couplings.iter().position(|c| c == coupling) {
                couplings.remove(pos);
                return Ok(());
            }
            return Err(StructuralError::UnknownConnection {
                parent: parent_name,
            });
        }
        Err(StructuralError::NotCoupled { model: parent_name })
    }

    /// Remove `model` and everything beneath it.
    ///
    /// Cascades: couplings in the parent that reference the removed
    /// child are severed, the child is detached from the parent's
    /// child set, and every slot in the subtree is recycled (stale
    /// IDs stop resolving). Returns the removed atomic models in
    /// depth-first order so callers can retire their simulators.
    pub fn remove_model(&mut self, model: ModelId) -> Result<Vec<ModelId>, StructuralError> {
        if model == self.root {
            return Err(StructuralError::RemoveRoot);
        }
        let node = self.node(model)?;
        let name = node.name.clone();
        let parent = node.parent.expect("non-root models always have a parent");

        // Collect the subtree in depth-first creation order.
        let mut subtree = Vec::new();
        let mut stack = vec![model];
        while let Some(id) = stack.pop() {
            subtree.push(id);
            if let ModelKind::Coupled { children, .. } = &self.node(id)?.kind {
                stack.extend(children.values().rev().copied());
            }
        }

        // Detach from the parent and sever couplings that touch the
        // removed child. Couplings deeper in the subtree vanish with
        // their owning nodes.
        if let ModelKind::Coupled { children, couplings } = &mut self.node_mut(parent)?.kind {
            children.shift_remove(&name);
            couplings.retain(|c| !c.touches(model));
        }

        let mut atomics = Vec::new();
        for id in subtree {
            if matches!(self.node(id)?.kind, ModelKind::Atomic) {
                atomics.push(id);
            }
            let slot = &mut self.slots[id.index() as usize];
            slot.node = None;
            slot.generation += 1;
            self.free.push(id.index());
        }
        Ok(atomics)
    }

    // ── Routing ──────────────────────────────────────────────────────

    /// Resolve an emission on `source.port` to the set of atomic
    /// input ports it reaches.
    ///
    /// Walks the coupling chain across levels: output couplings climb
    /// to the owner's port, internal couplings cross to siblings,
    /// input couplings descend into coupled children, until only
    /// atomic endpoints remain. Each endpoint appears once even when
    /// several parallel couplings reach it. An output wired to
    /// nothing resolves to an empty set.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError::UnknownPort`] if `source` does not
    /// declare `port` as an output port.
    pub fn resolve_route(
        &self,
        source: ModelId,
        port: &str,
    ) -> Result<Vec<RouteTarget>, StructuralError> {
        self.ensure_output_port(source, port)?;

        let mut targets = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(Hop::Out(source, port.to_string()));

        while let Some(hop) = queue.pop_front() {
            match hop {
                Hop::Out(model, port) => {
                    // An emission leaving the root has nowhere to go.
                    let Some(parent) = self.node(model)?.parent else {
                        continue;
                    };
                    for c in self.couplings(parent)? {
                        match c {
                            Coupling::Internal {
                                source,
                                source_port,
                                target,
                                target_port,
                            } if *source == model && *source_port == port => {
                                queue.push_back(Hop::In(*target, target_port.clone()));
                            }
                            Coupling::Output {
                                source,
                                source_port,
                                target_port,
                            } if *source == model && *source_port == port => {
                                queue.push_back(Hop::Out(parent, target_port.clone()));
                            }
                            _ => {}
                        }
                    }
                }
                Hop::In(model, port) => match &self.node(model)?.kind {
                    ModelKind::Atomic => {
                        if seen.insert((model, port.clone())) {
                            targets.push(RouteTarget { model, port });
                        }
                    }
                    ModelKind::Coupled { couplings, .. } => {
                        for c in couplings {
                            if let Coupling::Input {
                                source_port,
                                target,
                                target_port,
                            } = c
                            {
                                if *source_port == port {
                                    queue.push_back(Hop::In(*target, target_port.clone()));
                                }
                            }
                        }
                    }
                },
            }
        }

        Ok(targets)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Leaf name of `model`.
    pub fn name(&self, model: ModelId) -> Result<&str, StructuralError> {
        Ok(&self.node(model)?.name)
    }

    /// Dot-joined path from the root, e.g. `top.sub.gen`.
    pub fn full_name(&self, model: ModelId) -> Result<String, StructuralError> {
        let node = self.node(model)?;
        let mut parts = vec![node.name.as_str()];
        let mut cursor = node.parent;
        while let Some(id) = cursor {
            let node = self
                .node(id)
                .expect("parent ids in a live graph always resolve");
            parts.push(node.name.as_str());
            cursor = node.parent;
        }
        parts.reverse();
        Ok(parts.join("."))
    }

    /// Parent of `model`; `None` for the root.
    pub fn parent(&self, model: ModelId) -> Result<Option<ModelId>, StructuralError> {
        Ok(self.node(model)?.parent)
    }

    /// Whether `model` is an atomic leaf.
    pub fn is_atomic(&self, model: ModelId) -> Result<bool, StructuralError> {
        Ok(matches!(self.node(model)?.kind, ModelKind::Atomic))
    }

    /// Look up a direct child of `parent` by leaf name.
    pub fn child(
        &self,
        parent: ModelId,
        name: &str,
    ) -> Result<Option<ModelId>, StructuralError> {
        match &self.node(parent)?.kind {
            ModelKind::Atomic => Err(StructuralError::NotCoupled {
                model: self.full_name(parent)?,
            }),
            ModelKind::Coupled { children, .. } => Ok(children.get(name).copied()),
        }
    }

    /// Direct children of `parent` in creation order.
    pub fn children(&self, parent: ModelId) -> Result<Vec<ModelId>, StructuralError> {
        match &self.node(parent)?.kind {
            ModelKind::Atomic => Err(StructuralError::NotCoupled {
                model: self.full_name(parent)?,
            }),
            ModelKind::Coupled { children, .. } => Ok(children.values().copied().collect()),
        }
    }

    /// Couplings declared inside `parent`, in declaration order.
    pub fn couplings(&self, parent: ModelId) -> Result<&[Coupling], StructuralError> {
        match &self.node(parent)?.kind {
            ModelKind::Atomic => Err(StructuralError::NotCoupled {
                model: self.full_name(parent)?,
            }),
            ModelKind::Coupled { couplings, .. } => Ok(couplings),
        }
    }

    /// Declared input ports of `model`, in declaration order.
    pub fn input_ports(
        &self,
        model: ModelId,
    ) -> Result<impl Iterator<Item = &str>, StructuralError> {
        Ok(self.node(model)?.input_ports.iter().map(String::as_str))
    }

    /// Declared output ports of `model`, in declaration order.
    pub fn output_ports(
        &self,
        model: ModelId,
    ) -> Result<impl Iterator<Item = &str>, StructuralError> {
        Ok(self.node(model)?.output_ports.iter().map(String::as_str))
    }

    /// Every atomic model, in depth-first creation order.
    ///
    /// This order is stable for an unchanged graph and is what gives
    /// simulators their creation indices.
    pub fn atomics(&self) -> Vec<ModelId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = self
                .node(id)
                .expect("child ids in a live graph always resolve");
            match &node.kind {
                ModelKind::Atomic => out.push(id),
                ModelKind::Coupled { children, .. } => {
                    stack.extend(children.values().rev().copied());
                }
            }
        }
        out
    }

    // ── Internals ────────────────────────────────────────────────────

    fn validate_name(name: &str) -> Result<(), StructuralError> {
        if name.is_empty() || name.contains('.') {
            return Err(StructuralError::InvalidName {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn node(&self, id: ModelId) -> Result<&ModelNode, StructuralError> {
        self.slots
            .get(id.index() as usize)
            .filter(|s| s.generation == id.generation())
            .and_then(|s| s.node.as_ref())
            .ok_or(StructuralError::UnknownModel { model: id })
    }

    fn node_mut(&mut self, id: ModelId) -> Result<&mut ModelNode, StructuralError> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|s| s.generation == id.generation())
            .and_then(|s| s.node.as_mut())
            .ok_or(StructuralError::UnknownModel { model: id })
    }

    fn alloc(&mut self, node: ModelNode) -> ModelId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            ModelId::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            ModelId::new(index, 0)
        }
    }

    fn add_child(
        &mut self,
        parent: ModelId,
        name: &str,
        kind: ModelKind,
    ) -> Result<ModelId, StructuralError> {
        Self::validate_name(name)?;
        let parent_name = self.full_name(parent)?;
        match &self.node(parent)?.kind {
            ModelKind::Atomic => {
                return Err(StructuralError::NotCoupled { model: parent_name });
            }
            ModelKind::Coupled { children, .. } => {
                if children.contains_key(name) {
                    return Err(StructuralError::DuplicateName {
                        parent: parent_name,
                        name: name.to_string(),
                    });
                }
            }
        }
        let id = self.alloc(ModelNode::new(name.to_string(), Some(parent), kind));
        if let ModelKind::Coupled { children, .. } = &mut self.node_mut(parent)?.kind {
            children.insert(name.to_string(), id);
        }
        Ok(id)
    }

    fn ensure_coupled(&self, model: ModelId) -> Result<(), StructuralError> {
        if matches!(self.node(model)?.kind, ModelKind::Atomic) {
            return Err(StructuralError::NotCoupled {
                model: self.full_name(model)?,
            });
        }
        Ok(())
    }

    fn ensure_child(&self, parent: ModelId, model: ModelId) -> Result<(), StructuralError> {
        if self.node(model)?.parent != Some(parent) {
            return Err(StructuralError::NotAChild {
                model: self.full_name(model)?,
                parent: self.full_name(parent)?,
            });
        }
        Ok(())
    }

    fn ensure_input_port(&self, model: ModelId, port: &str) -> Result<(), StructuralError> {
        if !self.node(model)?.input_ports.contains(port) {
            return Err(StructuralError::UnknownPort {
                model: self.full_name(model)?,
                port: port.to_string(),
            });
        }
        Ok(())
    }

    fn ensure_output_port(&self, model: ModelId, port: &str) -> Result<(), StructuralError> {
        if !self.node(model)?.output_ports.contains(port) {
            return Err(StructuralError::UnknownPort {
                model: self.full_name(model)?,
                port: port.to_string(),
            });
        }
        Ok(())
    }

    fn push_coupling(&mut self, parent: ModelId, coupling: Coupling) -> Result<(), StructuralError> {
        if let ModelKind::Coupled { couplings, .. } = &mut self.node_mut(parent)?.kind {
            couplings.push(coupling);
        }
        Ok(())
    }
}
