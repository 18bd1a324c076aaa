// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Object, data, and resource identity types.

use core::fmt;

/// A handle to an object in a [`Scene`](super::Scene).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after an object is removed and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId {
    /// Slot index into the scene's object table.
    pub(crate) idx: u32,
    /// Generation counter; must match the scene's generation for this slot.
    pub(crate) generation: u32,
}

impl ObjectId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({}@gen{})", self.idx, self.generation)
    }
}

/// An opaque reference to a shared data block (mesh, curve, armature, ...).
///
/// Several objects may point at the same block; the graph models this with a
/// separate data node per block.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataId(pub u32);

impl fmt::Debug for DataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataId({})", self.0)
    }
}

/// A handle to a group of objects.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct GroupId(pub u32);

/// An opaque reference to an animation curve owned by an
/// [`AnimEvaluator`](crate::provider::AnimEvaluator).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CurveId(pub u32);

/// An opaque reference to an action (a set of keyed channel transforms).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ActionId(pub u32);

/// An opaque reference to a script run by a
/// [`ScriptHost`](crate::provider::ScriptHost).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ScriptId(pub u32);
