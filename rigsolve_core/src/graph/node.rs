// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node identity and edge types.

use core::fmt;

use crate::recalc::{LayerMask, RelationMask};
use crate::scene::{DataId, ObjectId};

/// Index of a node in a [`Graph`](super::Graph). Stable for the graph's
/// lifetime.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    /// The scene-root sentinel, present in every graph.
    pub const ROOT: Self = Self(0);

    #[inline]
    pub(crate) const fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeIndex({})", self.0)
    }
}

/// The entity a graph node stands for.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum EntityRef {
    /// The scene root.
    Scene,
    /// An object.
    Object(ObjectId),
    /// A shared data block.
    Data(DataId),
    /// A pose channel of an armature, by index.
    PoseChannel(ObjectId, u32),
}

impl EntityRef {
    /// The object this entity belongs to, if any.
    #[must_use]
    pub const fn object(self) -> Option<ObjectId> {
        match self {
            Self::Object(id) | Self::PoseChannel(id, _) => Some(id),
            Self::Scene | Self::Data(_) => None,
        }
    }

    /// Whether this is an object node.
    #[must_use]
    pub const fn is_object(self) -> bool {
        matches!(self, Self::Object(_))
    }
}

/// DFS color of a node.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Color {
    /// Not yet discovered.
    #[default]
    White,
    /// Discovered, not finished.
    Gray,
    /// Finished.
    Black,
}

/// A directed edge from a parent node (the one that must be evaluated first)
/// to a dependent node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphEdge {
    /// The other end of the edge: the child for child lists, the parent for
    /// parent lists.
    pub target: NodeIndex,
    /// Union of every relation recorded between the two nodes.
    pub relation: RelationMask,
    /// How many times the relation was recorded.
    pub count: u32,
    /// Layers reachable through this edge; set by layer flushing.
    pub layer: LayerMask,
    /// Label of the first relation recorded, for diagnostics.
    pub name: &'static str,
}
