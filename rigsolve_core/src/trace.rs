// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for graph passes and constraint solving.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! graph building, sorting, flushing, and the solver call at each stage. All
//! method bodies default to no-ops, so implementing only the events you care
//! about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! [`SolveSummaryBuilder`] collects per-constraint outcomes during one stack
//! solve and produces a [`SolveSummary`] at the end.
//!
//! Cycles and unreachable nodes are also logged through `log` regardless of
//! these features; the sink is the structured channel for tools.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`TargetSample`] events plus the
//!   corresponding `TraceSink` method.

#[cfg(feature = "trace-rich")]
use glam::DMat4;

use crate::constraint::{ConstraintType, OwnerRef};
use crate::graph::EntityRef;
#[cfg(feature = "trace-rich")]
use crate::scene::ObjectId;
use crate::recalc::{LayerMask, RelationMask};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which pass is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Building the dependency graph from the scene.
    Build,
    /// Topological sort of scene bases or pose channels.
    Sort,
    /// Bottom-up layer aggregation.
    LayerFlush,
    /// Relation-gated recalc flag propagation.
    RecalcFlush,
    /// Per-frame object and pose evaluation.
    Solve,
}

/// Why the solver skipped a constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The type tag has no registry entry.
    Unregistered,
    /// The constraint carries the disable flag.
    Disabled,
    /// Influence is zero.
    ZeroInfluence,
    /// The type has no evaluate operation (IK, rigid body joint).
    NoEvaluate,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Marks the beginning of a pass.
#[derive(Clone, Copy, Debug)]
pub struct PassBeginEvent {
    /// Which pass is starting.
    pub pass: PassKind,
    /// Graph clock stamp at the start of the pass (0 outside graph passes).
    pub stamp: u32,
}

/// Marks the end of a pass.
#[derive(Clone, Copy, Debug)]
pub struct PassEndEvent {
    /// Which pass is ending.
    pub pass: PassKind,
    /// Graph clock stamp at the end of the pass.
    pub stamp: u32,
}

/// Emitted after a dependency graph has been built.
#[derive(Clone, Copy, Debug)]
pub struct GraphBuiltEvent {
    /// Number of nodes, including the root.
    pub nodes: u32,
    /// Number of edges.
    pub edges: u32,
    /// Relation kinds that were recorded.
    pub relations: RelationMask,
}

/// Emitted for every back edge found while sorting.
#[derive(Clone, Copy, Debug)]
pub struct CycleEvent {
    /// The node the back edge leaves.
    pub from: EntityRef,
    /// The node the back edge reaches; `from` depends on it again.
    pub to: EntityRef,
    /// Relation carried by the edge.
    pub relation: RelationMask,
    /// Label of the relation that created the edge.
    pub name: &'static str,
}

/// Emitted for every node not reachable from the root.
#[derive(Clone, Copy, Debug)]
pub struct UnreachableEvent {
    /// The unreached entity.
    pub entity: EntityRef,
}

/// Emitted after recalc flags have been flushed.
#[derive(Clone, Copy, Debug)]
pub struct FlushEvent {
    /// Layers considered visible during the flush.
    pub visible_layers: LayerMask,
    /// Objects carrying a recalc flag after the flush.
    pub flagged: u32,
    /// Objects whose cached data was released because they are invisible.
    pub released: u32,
}

/// Emitted for every evaluated constraint.
#[derive(Clone, Copy, Debug)]
pub struct ConstraintEvent {
    /// The owner being solved.
    pub owner: OwnerRef,
    /// Index of the constraint in its stack.
    pub index: u32,
    /// Constraint type.
    pub ty: ConstraintType,
    /// Influence the result was blended with.
    pub influence: f32,
}

/// Emitted for every skipped constraint.
#[derive(Clone, Copy, Debug)]
pub struct ConstraintSkipEvent {
    /// The owner being solved.
    pub owner: OwnerRef,
    /// Index of the constraint in its stack.
    pub index: u32,
    /// Constraint type.
    pub ty: ConstraintType,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Per-owner summary produced by [`SolveSummaryBuilder`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolveSummary {
    /// The owner that was solved.
    pub owner: OwnerRef,
    /// Scene time of the solve.
    pub time: f32,
    /// Constraints evaluated.
    pub evaluated: u32,
    /// Constraints skipped.
    pub skipped: u32,
    /// Evaluated constraints whose result was blended (influence below 1).
    pub blended: u32,
}

/// A resolved constraint target.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct TargetSample {
    /// The target object, if any.
    pub object: Option<ObjectId>,
    /// The matrix handed to evaluate, in the constraint's target space.
    pub matrix: DMat4,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from graph passes and the solver.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called at the beginning of a pass.
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        _ = e;
    }

    /// Called at the end of a pass.
    fn on_pass_end(&mut self, e: &PassEndEvent) {
        _ = e;
    }

    /// Called after a graph has been built.
    fn on_graph_built(&mut self, e: &GraphBuiltEvent) {
        _ = e;
    }

    /// Called for every dependency cycle found.
    fn on_cycle(&mut self, e: &CycleEvent) {
        _ = e;
    }

    /// Called for every node not reachable from the root.
    fn on_unreachable(&mut self, e: &UnreachableEvent) {
        _ = e;
    }

    /// Called after a recalc flush.
    fn on_flush(&mut self, e: &FlushEvent) {
        _ = e;
    }

    /// Called after a constraint has been evaluated.
    fn on_constraint(&mut self, e: &ConstraintEvent) {
        _ = e;
    }

    /// Called when a constraint is skipped.
    fn on_constraint_skipped(&mut self, e: &ConstraintSkipEvent) {
        _ = e;
    }

    /// Called with a per-owner solve summary.
    fn on_solve_summary(&mut self, s: &SolveSummary) {
        _ = s;
    }

    /// Called with the resolved targets of a constraint (requires
    /// `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_targets(&mut self, owner: OwnerRef, index: u32, targets: &[TargetSample]) {
        _ = (owner, index, targets);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`PassBeginEvent`].
    #[inline]
    pub fn pass_begin(&mut self, e: &PassBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PassEndEvent`].
    #[inline]
    pub fn pass_end(&mut self, e: &PassEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`GraphBuiltEvent`].
    #[inline]
    pub fn graph_built(&mut self, e: &GraphBuiltEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_graph_built(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CycleEvent`].
    #[inline]
    pub fn cycle(&mut self, e: &CycleEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_cycle(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`UnreachableEvent`].
    #[inline]
    pub fn unreachable(&mut self, e: &UnreachableEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_unreachable(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FlushEvent`].
    #[inline]
    pub fn flush(&mut self, e: &FlushEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_flush(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ConstraintEvent`].
    #[inline]
    pub fn constraint(&mut self, e: &ConstraintEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_constraint(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ConstraintSkipEvent`].
    #[inline]
    pub fn constraint_skipped(&mut self, e: &ConstraintSkipEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_constraint_skipped(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SolveSummary`].
    #[inline]
    pub fn solve_summary(&mut self, s: &SolveSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_solve_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits resolved targets (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn targets(&mut self, owner: OwnerRef, index: u32, targets: &[TargetSample]) {
        if let Some(s) = &mut self.sink {
            s.on_targets(owner, index, targets);
        }
    }
}

// ---------------------------------------------------------------------------
// SolveSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects per-constraint outcomes during one stack solve and produces a
/// [`SolveSummary`].
#[derive(Debug)]
pub struct SolveSummaryBuilder {
    owner: OwnerRef,
    time: f32,
    evaluated: u32,
    skipped: u32,
    blended: u32,
}

impl SolveSummaryBuilder {
    /// Starts a summary for `owner` at scene time `time`.
    #[must_use]
    pub fn new(owner: OwnerRef, time: f32) -> Self {
        Self {
            owner,
            time,
            evaluated: 0,
            skipped: 0,
            blended: 0,
        }
    }

    /// Records an evaluated constraint and the influence it was applied with.
    pub fn evaluated(&mut self, influence: f32) {
        self.evaluated += 1;
        if influence < 1.0 {
            self.blended += 1;
        }
    }

    /// Records a skipped constraint.
    pub fn skipped(&mut self) {
        self.skipped += 1;
    }

    /// Consumes the builder and produces the final [`SolveSummary`].
    #[must_use]
    pub fn finish(self) -> SolveSummary {
        SolveSummary {
            owner: self.owner,
            time: self.time,
            evaluated: self.evaluated,
            skipped: self.skipped,
            blended: self.blended,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
