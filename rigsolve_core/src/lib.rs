// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene dependency graph and constraint solver for rigged 3D scenes.
//!
//! `rigsolve_core` decides the order in which the objects of a scene must be
//! evaluated, which of them need re-evaluation after an edit or a frame
//! change, and how each object's constraint stack rewrites its world matrix.
//! It is `no_std` compatible (with `alloc`); geometry, animation curves,
//! scripts, and IK numerics are supplied by the embedding application.
//!
//! # Architecture
//!
//! ```text
//!   Scene (objects, bases, poses, constraint stacks)
//!       │
//!       ▼
//!   build_dependency_graph ──► Graph ──► topologically_sort_scene
//!                                 │              (base order)
//!                                 ▼
//!   mark_object_dirty_and_flush / mark_time_dependent
//!                                 │        (recalc flags)
//!                                 ▼
//!   update_scene ──► where_is_object ──► solve_constraints
//!                └─► where_is_pose ────► IkSolver
//! ```
//!
//! **[`scene`]**: Objects addressed by generational handles, the ordered
//! base list, groups, and armature poses.
//!
//! **[`graph`]**: The dependency graph: construction from a scene, depth-
//! and breadth-first traversal, cycle reporting, topological sorting of bases
//! and pose channels, and recalc-flag propagation gated by visible layers.
//!
//! **[`constraint`]**: The constraint data model, the static table of
//! per-type operations, conversion between constraint spaces, and the stack
//! solver.
//!
//! **[`eval`]**: Per-frame evaluation of parent chains, constraint stacks,
//! and poses, including IK chain scheduling.
//!
//! **[`provider`]**: Traits for the collaborators this crate does not own.
//!
//! **[`recalc`]**: Relation, recalc, and layer bit sets.
//!
//! **[`transform`]**: Matrix helpers in the column-vector convention.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! graph and solver instrumentation, with a zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-target
//!   samples during constraint solving.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod config;
pub mod constraint;
pub mod error;
pub mod eval;
pub mod graph;
pub mod provider;
pub mod recalc;
pub mod scene;
pub mod trace;
pub mod transform;
