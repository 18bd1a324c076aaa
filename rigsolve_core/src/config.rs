// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Configuration presets for graph building and layout.

use crate::recalc::RelationMask;

/// Configuration for [`build_dependency_graph`](crate::graph::build_dependency_graph).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildConfig {
    /// Relation kinds to record. Data nodes are only created when this
    /// contains [`RelationMask::DATA`].
    pub relations: RelationMask,
    /// OR the union of every object's incoming object-to-object relations
    /// back into each of those edges.
    pub unify_incoming: bool,
    /// Link every node without incoming edges to the root.
    pub link_orphans: bool,
}

impl BuildConfig {
    /// Configuration used for scene sorting: every relation but object→data
    /// links, with the post-passes enabled.
    #[must_use]
    pub const fn sorting() -> Self {
        Self {
            relations: RelationMask::ALL_BUT_DATA,
            unify_incoming: true,
            link_orphans: true,
        }
    }

    /// Configuration used for recalc flushing: every relation including data
    /// nodes.
    #[must_use]
    pub const fn complete() -> Self {
        Self {
            relations: RelationMask::ALL,
            unify_incoming: true,
            link_orphans: true,
        }
    }

    /// Records only the given relations, with the post-passes enabled.
    #[must_use]
    pub const fn with_relations(relations: RelationMask) -> Self {
        Self {
            relations,
            unify_incoming: true,
            link_orphans: true,
        }
    }

    /// The same relations with both post-passes switched off.
    #[must_use]
    pub const fn without_post_passes(self) -> Self {
        Self {
            unify_incoming: false,
            link_orphans: false,
            ..self
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::complete()
    }
}

impl From<RelationMask> for BuildConfig {
    fn from(relations: RelationMask) -> Self {
        Self::with_relations(relations)
    }
}

/// Spacing for [`breadth_first_layered`](crate::graph::breadth_first_layered).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
    /// Distance between BFS levels along X.
    pub horizontal_spacing: f64,
    /// Distance between slots of one level along Y.
    pub vertical_spacing: f64,
}

impl LayoutConfig {
    /// Spacing used by the graph viewer.
    #[must_use]
    pub const fn viewer() -> Self {
        Self {
            horizontal_spacing: 150.0,
            vertical_spacing: 50.0,
        }
    }

    /// Unit spacing; positions equal (level, slot).
    #[must_use]
    pub const fn unit() -> Self {
        Self {
            horizontal_spacing: 1.0,
            vertical_spacing: 1.0,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::viewer()
    }
}
