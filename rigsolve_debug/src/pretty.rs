// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Owners are
//! printed as `ob#<index>` and `ob#<index>/bone#<channel>`.

use std::io::Write;

use rigsolve_core::constraint::OwnerRef;
use rigsolve_core::graph::EntityRef;
use rigsolve_core::trace::{
    ConstraintEvent, ConstraintSkipEvent, CycleEvent, FlushEvent, GraphBuiltEvent, PassBeginEvent,
    PassEndEvent, PassKind, SolveSummary, TargetSample, TraceSink, UnreachableEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn pass_name(pass: PassKind) -> &'static str {
    match pass {
        PassKind::Build => "build",
        PassKind::Sort => "sort",
        PassKind::LayerFlush => "layers",
        PassKind::RecalcFlush => "recalc",
        PassKind::Solve => "solve",
    }
}

/// Short form of a constraint owner.
pub(crate) fn owner_name(owner: OwnerRef) -> String {
    match owner {
        OwnerRef::Object(id) => format!("ob#{}", id.index()),
        OwnerRef::Bone(id, idx) => format!("ob#{}/bone#{idx}", id.index()),
    }
}

/// Short form of a graph entity.
pub(crate) fn entity_name(entity: EntityRef) -> String {
    match entity {
        EntityRef::Scene => "scene".into(),
        EntityRef::Object(id) => format!("ob#{}", id.index()),
        EntityRef::Data(data) => format!("data#{}", data.0),
        EntityRef::PoseChannel(id, idx) => format!("ob#{}/bone#{idx}", id.index()),
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[pass:begin] {} stamp={}",
            pass_name(e.pass),
            e.stamp,
        );
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        let _ = writeln!(
            self.writer,
            "[pass:end] {} stamp={}",
            pass_name(e.pass),
            e.stamp,
        );
    }

    fn on_graph_built(&mut self, e: &GraphBuiltEvent) {
        let _ = writeln!(
            self.writer,
            "[graph] nodes={} edges={} relations={:?}",
            e.nodes, e.edges, e.relations,
        );
    }

    fn on_cycle(&mut self, e: &CycleEvent) {
        let _ = writeln!(
            self.writer,
            "[cycle] {} -> {} via {} {:?}",
            entity_name(e.from),
            entity_name(e.to),
            e.name,
            e.relation,
        );
    }

    fn on_unreachable(&mut self, e: &UnreachableEvent) {
        let _ = writeln!(self.writer, "[unreachable] {}", entity_name(e.entity));
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        let _ = writeln!(
            self.writer,
            "[flush] visible={:?} flagged={} released={}",
            e.visible_layers, e.flagged, e.released,
        );
    }

    fn on_constraint(&mut self, e: &ConstraintEvent) {
        let _ = writeln!(
            self.writer,
            "[constraint] {} #{} {:?} influence={:.3}",
            owner_name(e.owner),
            e.index,
            e.ty,
            e.influence,
        );
    }

    fn on_constraint_skipped(&mut self, e: &ConstraintSkipEvent) {
        let _ = writeln!(
            self.writer,
            "[constraint:skip] {} #{} {:?} reason={:?}",
            owner_name(e.owner),
            e.index,
            e.ty,
            e.reason,
        );
    }

    fn on_solve_summary(&mut self, s: &SolveSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] {} time={:.2} evaluated={} skipped={} blended={}",
            owner_name(s.owner),
            s.time,
            s.evaluated,
            s.skipped,
            s.blended,
        );
    }

    fn on_targets(&mut self, owner: OwnerRef, index: u32, targets: &[TargetSample]) {
        let _ = writeln!(
            self.writer,
            "[targets] {} #{index} count={}",
            owner_name(owner),
            targets.len(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigsolve_core::constraint::ConstraintType;
    use rigsolve_core::scene::{Object, ObjectKind, Scene};
    use rigsolve_core::trace::SkipReason;

    #[test]
    fn pretty_print_constraint() {
        let mut scene = Scene::new();
        let id = scene.add_object(Object::new("Owner", ObjectKind::Empty));
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_constraint(&ConstraintEvent {
            owner: OwnerRef::Object(id),
            index: 2,
            ty: ConstraintType::LocLike,
            influence: 0.5,
        });
        sink.on_constraint_skipped(&ConstraintSkipEvent {
            owner: OwnerRef::Bone(id, 3),
            index: 0,
            ty: ConstraintType::Kinematic,
            reason: SkipReason::NoEvaluate,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("[constraint] ob#0 #2 LocLike influence=0.500"), "got: {output}");
        assert!(output.contains("ob#0/bone#3"), "got: {output}");
        assert!(output.contains("NoEvaluate"), "got: {output}");
    }

    #[test]
    fn pretty_print_pass_markers() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_pass_begin(&PassBeginEvent {
            pass: PassKind::RecalcFlush,
            stamp: 4,
        });
        sink.on_pass_end(&PassEndEvent {
            pass: PassKind::RecalcFlush,
            stamp: 5,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(output, "[pass:begin] recalc stamp=4\n[pass:end] recalc stamp=5\n");
    }
}
