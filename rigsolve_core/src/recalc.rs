// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Relation kinds, recalc flags, and layer masks.
//!
//! Every dependency edge carries a [`RelationMask`] describing which part of
//! the parent feeds which part of the child. Flushing reads those masks to
//! decide whether a change to a parent's transform or data should mark the
//! child's transform ([`RecalcFlags::OBJECT`]) or data ([`RecalcFlags::DATA`])
//! for recomputation.
//!
//! [`LayerMask`] is the 32-bit visibility mask shared by objects, edges, and
//! the scene's set of visible layers.

use core::fmt;
use core::ops::{BitAnd, BitOr, BitOrAssign};

/// Bit set of relation kinds carried by a dependency edge.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RelationMask(pub u8);

impl RelationMask {
    /// No relation.
    pub const NONE: Self = Self(0);
    /// Scene-level link, used for edges out of the root node.
    pub const SCENE: Self = Self(1);
    /// Data-level link between two data nodes.
    pub const DATA: Self = Self(2);
    /// Parent transform affects child transform.
    pub const OB_OB: Self = Self(4);
    /// Parent transform affects child data (deformation).
    pub const OB_DATA: Self = Self(8);
    /// Parent data affects child transform.
    pub const DATA_OB: Self = Self(16);
    /// Parent data affects child data.
    pub const DATA_DATA: Self = Self(32);
    /// Every relation kind.
    pub const ALL: Self = Self(63);
    /// Every relation kind except [`DATA`](Self::DATA); the mask used for
    /// scene sorting.
    pub const ALL_BUT_DATA: Self = Self(61);

    /// Returns `true` if every bit of `other` is set in `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if any bit of `other` is set in `self`.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns `true` if no bits are set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Bitwise union.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Bitwise intersection.
    #[inline]
    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Whether this edge propagates something into the child's transform.
    #[inline]
    #[must_use]
    pub const fn affects_object(self) -> bool {
        self.intersects(Self(Self::OB_OB.0 | Self::DATA_OB.0))
    }

    /// Whether this edge propagates something into the child's data.
    #[inline]
    #[must_use]
    pub const fn affects_data(self) -> bool {
        self.intersects(Self(Self::OB_DATA.0 | Self::DATA_DATA.0))
    }
}

impl BitOr for RelationMask {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for RelationMask {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for RelationMask {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        self.intersection(rhs)
    }
}

impl fmt::Debug for RelationMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(RelationMask, &str); 6] = [
            (RelationMask::SCENE, "SCENE"),
            (RelationMask::DATA, "DATA"),
            (RelationMask::OB_OB, "OB_OB"),
            (RelationMask::OB_DATA, "OB_DATA"),
            (RelationMask::DATA_OB, "DATA_OB"),
            (RelationMask::DATA_DATA, "DATA_DATA"),
        ];
        if self.is_empty() {
            return f.write_str("RelationMask(NONE)");
        }
        f.write_str("RelationMask(")?;
        let mut first = true;
        for (bit, name) in NAMES {
            if self.contains(bit) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        f.write_str(")")
    }
}

/// Per-object flags requesting recomputation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct RecalcFlags(pub u8);

impl RecalcFlags {
    /// Nothing to recompute.
    pub const NONE: Self = Self(0);
    /// The object's world transform must be recomputed.
    pub const OBJECT: Self = Self(1);
    /// The object's derived data must be recomputed.
    pub const DATA: Self = Self(2);
    /// The object changes with time (animated).
    pub const TIME: Self = Self(4);
    /// Transform and data.
    pub const ALL: Self = Self(3);

    /// Returns `true` if every bit of `other` is set in `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if any bit of `other` is set in `self`.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns `true` if no bits are set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Sets the bits of `other`.
    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clears the bits of `other`.
    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for RecalcFlags {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for RecalcFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// 32-bit layer visibility mask.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// No layers.
    pub const NONE: Self = Self(0);
    /// Every layer.
    pub const ALL: Self = Self(u32::MAX);

    /// A mask with only layer `index` (0-based) set.
    #[inline]
    #[must_use]
    pub const fn layer(index: u32) -> Self {
        Self(1 << (index & 31))
    }

    /// Returns `true` if the masks share a layer.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns `true` if no layer is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for LayerMask {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for LayerMask {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for LayerMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerMask({:#010x})", self.0)
    }
}
