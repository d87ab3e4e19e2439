//! Strongly-typed identifiers for models and simulators.

use std::fmt;

/// Identifies a model node within a model hierarchy.
///
/// Model IDs are generational: the `index` names a slot in the graph's
/// node arena and the `generation` distinguishes successive occupants
/// of that slot. A stale ID held across a structural change is
/// rejected by the graph instead of silently resolving to the new
/// occupant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId {
    index: u32,
    generation: u32,
}

impl ModelId {
    /// Create an ID from a slot index and generation.
    ///
    /// Only the graph allocating the slot can vouch for validity;
    /// arbitrary pairs are representable but resolve to nothing.
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The slot index in the node arena.
    pub fn index(self) -> u32 {
        self.index
    }

    /// The generation of the slot this ID refers to.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Identifies a simulator attached to an atomic model.
///
/// Allocated sequentially in model creation order. Ties between
/// simultaneously imminent simulators are broken by ascending
/// `SimulatorId`, so creation order is the deterministic tie-break.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimulatorId(pub u32);

impl fmt::Display for SimulatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SimulatorId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
