// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene dependency graph.
//!
//! A [`Graph`] has one node per object, shared data block, or pose channel
//! plus the scene-root sentinel at [`NodeIndex::ROOT`]. An edge `a → b`
//! records that `b` depends on `a`, with a [`RelationMask`] saying which
//! part of `b` follows which part of `a`.
//!
//! The typical cycle is:
//!
//! 1. [`topologically_sort_scene`] after relations change, which builds a
//!    graph and reorders the scene bases;
//! 2. [`build_dependency_graph`] with [`BuildConfig::complete`] and
//!    [`mark_object_dirty_and_flush`] or [`mark_time_dependent`] each time
//!    something is edited or the frame changes;
//! 3. [`update_scene`](crate::eval::update_scene) to re-evaluate the
//!    flagged objects in base order.
//!
//! Cycles and unreachable nodes are tolerated: they are logged, reported to
//! the tracer, and sorted best-effort.
//!
//! [`RelationMask`]: crate::recalc::RelationMask
//! [`BuildConfig::complete`]: crate::config::BuildConfig::complete

mod build;
mod flush;
mod node;
mod sort;
mod store;
mod traverse;

pub use build::{build_dependency_graph, build_pose_graph};
pub use flush::{FlushReport, flush_recalc_flags, mark_object_dirty_and_flush, mark_time_dependent};
pub use node::{Color, EntityRef, GraphEdge, NodeIndex};
pub use sort::{SortReport, sort_pose, topologically_sort_scene};
pub use store::Graph;
pub use traverse::{
    DfsReport, DfsVisitor, EdgeClass, ancestors_of, breadth_first_layered, data_owners,
    depth_first, descendants_of, direct_ancestors, topological_sort,
};
