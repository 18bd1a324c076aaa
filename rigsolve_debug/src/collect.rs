// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event collection.
//!
//! [`CollectingSink`] implements [`TraceSink`] and keeps every event as a
//! [`RecordedEvent`], in emission order. Target samples are kept as a count
//! per constraint.

use rigsolve_core::constraint::OwnerRef;
use rigsolve_core::trace::{
    ConstraintEvent, ConstraintSkipEvent, CycleEvent, FlushEvent, GraphBuiltEvent, PassBeginEvent,
    PassEndEvent, SolveSummary, TargetSample, TraceSink, UnreachableEvent,
};

/// One collected event.
#[derive(Clone, Copy, Debug)]
pub enum RecordedEvent {
    /// A [`PassBeginEvent`].
    PassBegin(PassBeginEvent),
    /// A [`PassEndEvent`].
    PassEnd(PassEndEvent),
    /// A [`GraphBuiltEvent`].
    GraphBuilt(GraphBuiltEvent),
    /// A [`CycleEvent`].
    Cycle(CycleEvent),
    /// An [`UnreachableEvent`].
    Unreachable(UnreachableEvent),
    /// A [`FlushEvent`].
    Flush(FlushEvent),
    /// A [`ConstraintEvent`].
    Constraint(ConstraintEvent),
    /// A [`ConstraintSkipEvent`].
    ConstraintSkipped(ConstraintSkipEvent),
    /// A [`SolveSummary`].
    SolveSummary(SolveSummary),
    /// Target count of one constraint.
    TargetsCount {
        /// The owner being solved.
        owner: OwnerRef,
        /// Index of the constraint in its stack.
        index: u32,
        /// Number of targets resolved.
        count: u32,
    },
}

/// A [`TraceSink`] that keeps every event in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Vec<RecordedEvent>,
}

impl CollectingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The events collected so far.
    #[must_use]
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Removes and returns the events collected so far.
    pub fn take(&mut self) -> Vec<RecordedEvent> {
        std::mem::take(&mut self.events)
    }

    /// Number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The collected cycle events.
    pub fn cycles(&self) -> impl Iterator<Item = &CycleEvent> + '_ {
        self.events.iter().filter_map(|e| match e {
            RecordedEvent::Cycle(c) => Some(c),
            _ => None,
        })
    }

    /// The collected solve summaries.
    pub fn summaries(&self) -> impl Iterator<Item = &SolveSummary> + '_ {
        self.events.iter().filter_map(|e| match e {
            RecordedEvent::SolveSummary(s) => Some(s),
            _ => None,
        })
    }
}

impl TraceSink for CollectingSink {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        self.events.push(RecordedEvent::PassBegin(*e));
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        self.events.push(RecordedEvent::PassEnd(*e));
    }

    fn on_graph_built(&mut self, e: &GraphBuiltEvent) {
        self.events.push(RecordedEvent::GraphBuilt(*e));
    }

    fn on_cycle(&mut self, e: &CycleEvent) {
        self.events.push(RecordedEvent::Cycle(*e));
    }

    fn on_unreachable(&mut self, e: &UnreachableEvent) {
        self.events.push(RecordedEvent::Unreachable(*e));
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        self.events.push(RecordedEvent::Flush(*e));
    }

    fn on_constraint(&mut self, e: &ConstraintEvent) {
        self.events.push(RecordedEvent::Constraint(*e));
    }

    fn on_constraint_skipped(&mut self, e: &ConstraintSkipEvent) {
        self.events.push(RecordedEvent::ConstraintSkipped(*e));
    }

    fn on_solve_summary(&mut self, s: &SolveSummary) {
        self.events.push(RecordedEvent::SolveSummary(*s));
    }

    fn on_targets(&mut self, owner: OwnerRef, index: u32, targets: &[TargetSample]) {
        self.events.push(RecordedEvent::TargetsCount {
            owner,
            index,
            count: u32::try_from(targets.len()).unwrap_or(u32::MAX),
        });
    }
}
