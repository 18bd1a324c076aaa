// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Evaluation of a constraint stack on one owner.
//!
//! A solve runs between [`ConstraintOb::make`] and [`ConstraintOb::clear`]:
//! `make` captures the owner's world matrix, [`solve_constraints`] rewrites
//! it constraint by constraint, and `clear` writes the result back and
//! records the inverse of the total change so the owner can be manipulated
//! in its unconstrained frame.

use alloc::vec::Vec;
use core::mem;

use glam::DMat4;

use super::registry::ConstraintRegistry;
use super::space::convert_space;
use super::target::mark_stale;
use super::{
    Constraint, ConstraintFlags, ConstraintOb, ConstraintSpace, ConstraintTarget, EvalContext,
    OwnerRef,
};
use crate::provider::{AnimEvaluator, Providers};
use crate::scene::Scene;
use crate::trace::{ConstraintEvent, ConstraintSkipEvent, SkipReason, SolveSummaryBuilder, Tracer};
use crate::transform::blend;

impl ConstraintOb {
    /// Captures the world matrix of `owner`.
    ///
    /// Objects start from their world matrix and bones from
    /// `obmat * pose_mat`. A stale owner starts from identity.
    #[must_use]
    pub fn make(scene: &Scene, owner: OwnerRef) -> Self {
        let matrix = match owner {
            OwnerRef::Object(id) => scene.object(id).map(|ob| ob.world),
            OwnerRef::Bone(id, idx) => scene.object(id).and_then(|ob| {
                let ch = ob.pose.as_ref()?.channel(idx)?;
                Some(ob.world * ch.pose_mat)
            }),
        }
        .unwrap_or(DMat4::IDENTITY);
        Self {
            owner,
            matrix,
            start_matrix: matrix,
        }
    }

    /// Writes the solved matrix back to the owner and stores the inverse of
    /// the change as its constraint inverse.
    pub fn clear(self, scene: &mut Scene) {
        let delta = self.matrix * self.start_matrix.inverse();
        let inverse = delta.inverse();
        match self.owner {
            OwnerRef::Object(id) => {
                if let Some(ob) = scene.object_mut(id) {
                    ob.world = self.matrix;
                    ob.constraint_inverse = inverse;
                }
            }
            OwnerRef::Bone(id, idx) => {
                if let Some(ob) = scene.object_mut(id) {
                    let world_inv = ob.world.inverse();
                    if let Some(ch) = ob.pose.as_mut().and_then(|p| p.channel_mut(idx)) {
                        ch.pose_mat = world_inv * self.matrix;
                        ch.constraint_inverse = inverse;
                    }
                }
            }
        }
    }
}

/// Evaluates `stack` on `cob`, front to back.
///
/// Each constraint runs in its own owner space: the matrix is converted
/// out of world space, targets are resolved, the type's evaluate rewrites
/// the matrix, the result is blended with the pre-evaluation matrix by the
/// constraint's influence, and the matrix is converted back (unless the
/// constraint asks to stay in its space with [`ConstraintFlags::SPACE_ONCE`]).
///
/// Disabled, zero-influence, and unregistered constraints are skipped
/// without touching their targets. `None` for `cob` is a no-op.
pub fn solve_constraints(
    registry: &ConstraintRegistry,
    stack: &mut [Constraint],
    cob: Option<&mut ConstraintOb>,
    ctx: &EvalContext<'_>,
    tracer: &mut Tracer<'_>,
) {
    let Some(cob) = cob else {
        return;
    };
    let owner = cob.owner;
    let mut summary = SolveSummaryBuilder::new(owner, ctx.time);
    let mut targets: Vec<ConstraintTarget> = Vec::new();

    for (i, con) in stack.iter_mut().enumerate() {
        let index = u32::try_from(i).unwrap_or(u32::MAX);
        let ty = con.ty;
        let skip = |reason| ConstraintSkipEvent {
            owner,
            index,
            ty,
            reason,
        };

        let Some(info) = registry.type_info(ty) else {
            tracer.constraint_skipped(&skip(SkipReason::Unregistered));
            summary.skipped();
            continue;
        };
        if con.is_disabled() {
            tracer.constraint_skipped(&skip(SkipReason::Disabled));
            summary.skipped();
            continue;
        }
        if con.influence <= 0.0 {
            tracer.constraint_skipped(&skip(SkipReason::ZeroInfluence));
            summary.skipped();
            continue;
        }
        let Some(evaluate) = info.evaluate else {
            tracer.constraint_skipped(&skip(SkipReason::NoEvaluate));
            summary.skipped();
            continue;
        };

        cob.matrix = convert_space(
            ctx.scene,
            owner,
            &cob.matrix,
            ConstraintSpace::World,
            con.owner_space,
        );
        let pre = cob.matrix;

        targets.clear();
        if let Some(get_targets) = info.get_targets {
            get_targets(con, ctx.scene, &mut targets);
            for ct in &mut targets {
                mark_stale(ct, ctx.scene);
                match info.get_target_matrix {
                    Some(resolve) if !ct.stale => resolve(con, cob, ct, ctx),
                    _ => ct.matrix = DMat4::IDENTITY,
                }
            }
        }

        #[cfg(feature = "trace-rich")]
        {
            let samples: Vec<crate::trace::TargetSample> = targets
                .iter()
                .map(|ct| crate::trace::TargetSample {
                    object: ct.object,
                    matrix: ct.matrix,
                })
                .collect();
            tracer.targets(owner, index, &samples);
        }

        evaluate(con, cob, &targets, ctx);

        match info.flush_targets {
            Some(flush) => flush(con, &mut targets, true),
            None => targets.clear(),
        }

        let influence = con.influence;
        if influence < 1.0 {
            let delta = cob.matrix * pre.inverse();
            let delta = blend(&DMat4::IDENTITY, &delta, f64::from(influence));
            cob.matrix = delta * pre;
        }

        if !con.flags.contains(ConstraintFlags::SPACE_ONCE) {
            cob.matrix = convert_space(
                ctx.scene,
                owner,
                &cob.matrix,
                con.owner_space,
                ConstraintSpace::World,
            );
        }

        tracer.constraint(&ConstraintEvent {
            owner,
            index,
            ty,
            influence,
        });
        summary.evaluated(influence);
    }

    tracer.solve_summary(&summary.finish());
}

/// Solves the constraint stack stored on `owner` and writes the result
/// back. Returns without effect for a stale owner or an empty stack.
pub fn evaluate_owner_constraints(
    scene: &mut Scene,
    registry: &ConstraintRegistry,
    owner: OwnerRef,
    providers: Providers<'_>,
    time: f32,
    tracer: &mut Tracer<'_>,
) {
    let Some(mut stack) = take_stack(scene, owner) else {
        return;
    };
    if stack.is_empty() {
        restore_stack(scene, owner, stack);
        return;
    }
    let mut cob = ConstraintOb::make(scene, owner);
    {
        let ctx = EvalContext {
            scene: &*scene,
            providers,
            time,
        };
        solve_constraints(registry, &mut stack, Some(&mut cob), &ctx, tracer);
    }
    restore_stack(scene, owner, stack);
    cob.clear(scene);
}

fn take_stack(scene: &mut Scene, owner: OwnerRef) -> Option<Vec<Constraint>> {
    let ob = scene.object_mut(owner.object())?;
    match owner {
        OwnerRef::Object(_) => Some(mem::take(&mut ob.constraints)),
        OwnerRef::Bone(_, idx) => {
            let ch = ob.pose.as_mut()?.channel_mut(idx)?;
            Some(mem::take(&mut ch.constraints))
        }
    }
}

fn restore_stack(scene: &mut Scene, owner: OwnerRef, stack: Vec<Constraint>) {
    let Some(ob) = scene.object_mut(owner.object()) else {
        return;
    };
    match owner {
        OwnerRef::Object(_) => ob.constraints = stack,
        OwnerRef::Bone(_, idx) => {
            if let Some(ch) = ob.pose.as_mut().and_then(|p| p.channel_mut(idx)) {
                ch.constraints = stack;
            }
        }
    }
}

/// Sets the influence of every constraint that owns an influence curve
/// from the curve's value at `time`.
pub fn animate_influences(stack: &mut [Constraint], anim: &dyn AnimEvaluator, time: f32) {
    for con in stack {
        if !con.flags.contains(ConstraintFlags::OWN_CURVE) {
            continue;
        }
        if let Some(curve) = con.influence_curve
            && let Some(value) = anim.evaluate(curve, time)
        {
            con.set_influence(value);
        }
    }
}

/// Resolves target `index` of `con` for `owner` outside of a solve.
///
/// Returns `None` when the type has no targets, `index` is out of range, or
/// the target object was removed.
#[must_use]
pub fn constraint_target_matrix(
    registry: &ConstraintRegistry,
    scene: &Scene,
    providers: Providers<'_>,
    con: &Constraint,
    owner: OwnerRef,
    index: usize,
    time: f32,
) -> Option<DMat4> {
    let info = registry.type_info(con.ty)?;
    let get_targets = info.get_targets?;
    let mut targets = Vec::new();
    get_targets(con, scene, &mut targets);
    let mut ct = targets.into_iter().nth(index)?;
    mark_stale(&mut ct, scene);
    if ct.stale {
        return None;
    }
    let cob = ConstraintOb::make(scene, owner);
    let ctx = EvalContext {
        scene,
        providers,
        time,
    };
    match info.get_target_matrix {
        Some(resolve) => resolve(con, &cob, &mut ct, &ctx),
        None => ct.matrix = DMat4::IDENTITY,
    }
    Some(ct.matrix)
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use glam::DVec3;

    use super::*;
    use crate::constraint::{
        ConstraintData, ConstraintType, LocLikeData, LocLimitData, PropertyBag, PythonData,
        TargetRef,
    };
    use crate::provider::ScriptHost;
    use crate::scene::{CurveId, Object, ObjectId, ObjectKind, ScriptId};
    use crate::transform::{MatrixExt, approx_eq};

    /// Counts every call made to it.
    #[derive(Default)]
    struct Spy {
        calls: Cell<u32>,
    }

    impl ScriptHost for Spy {
        fn target_matrix(
            &self,
            _script: ScriptId,
            _props: &PropertyBag,
            _target: &ConstraintTarget,
        ) -> Option<DMat4> {
            self.calls.set(self.calls.get() + 1);
            None
        }

        fn compute(
            &self,
            _script: ScriptId,
            _props: &PropertyBag,
            owner: &DMat4,
            _targets: &[DMat4],
        ) -> Option<DMat4> {
            self.calls.set(self.calls.get() + 1);
            Some(*owner)
        }
    }

    fn scene_with_target(at: DVec3) -> (Scene, ObjectId, ObjectId) {
        let mut scene = Scene::new();
        let mut target = Object::new("Target", ObjectKind::Empty);
        target.world = DMat4::from_translation(at);
        let target = scene.add_object(target);
        let owner = scene.add_object(Object::new("Owner", ObjectKind::Empty));
        (scene, owner, target)
    }

    fn copy_location(target: ObjectId) -> Constraint {
        Constraint::new(ConstraintData::LocLike(LocLikeData::new(TargetRef::object(target))))
    }

    fn solve(scene: &Scene, owner: ObjectId, stack: &mut [Constraint]) -> DMat4 {
        let mut cob = ConstraintOb::make(scene, OwnerRef::Object(owner));
        let ctx = EvalContext {
            scene,
            providers: Providers::none(),
            time: 0.0,
        };
        solve_constraints(
            ConstraintRegistry::builtin(),
            stack,
            Some(&mut cob),
            &ctx,
            &mut Tracer::none(),
        );
        cob.matrix
    }

    #[test]
    fn zero_influence_never_touches_targets() {
        let (scene, owner, target) = scene_with_target(DVec3::ONE);
        let spy = Spy::default();
        let mut con = Constraint::new(ConstraintData::Python(PythonData {
            targets: alloc::vec![TargetRef::object(target)],
            script: Some(ScriptId(1)),
            ..PythonData::default()
        }));
        con.set_influence(0.0);
        let mut stack = [con];
        let mut cob = ConstraintOb::make(&scene, OwnerRef::Object(owner));
        let ctx = EvalContext {
            scene: &scene,
            providers: Providers::none().with_scripts(&spy),
            time: 0.0,
        };
        let registry = ConstraintRegistry::builtin();
        solve_constraints(registry, &mut stack, Some(&mut cob), &ctx, &mut Tracer::none());
        assert_eq!(spy.calls.get(), 0);
        assert_eq!(cob.matrix, DMat4::IDENTITY);

        stack[0].set_influence(1.0);
        solve_constraints(registry, &mut stack, Some(&mut cob), &ctx, &mut Tracer::none());
        assert_eq!(spy.calls.get(), 2);
    }

    #[test]
    fn full_influence_keeps_evaluated_matrix() {
        let (scene, owner, target) = scene_with_target(DVec3::new(2.0, 3.0, 4.0));
        let mut stack = [copy_location(target)];
        let out = solve(&scene, owner, &mut stack);
        assert_eq!(out, DMat4::from_translation(DVec3::new(2.0, 3.0, 4.0)));
    }

    #[test]
    fn partial_influence_blends() {
        let (scene, owner, target) = scene_with_target(DVec3::new(2.0, 0.0, 0.0));
        let mut stack = [copy_location(target).with_influence(0.5)];
        let out = solve(&scene, owner, &mut stack);
        assert!((out.translation() - DVec3::new(1.0, 0.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn skipped_entries_leave_matrix() {
        let (scene, owner, target) = scene_with_target(DVec3::new(2.0, 0.0, 0.0));
        let mut disabled = copy_location(target);
        disabled.flags.insert(ConstraintFlags::DISABLE);
        let ik = Constraint::new(ConstraintData::zeroed(ConstraintType::Kinematic));
        let mut stack = [disabled, ik];
        assert_eq!(solve(&scene, owner, &mut stack), DMat4::IDENTITY);
    }

    #[test]
    fn missing_owner_is_a_no_op() {
        let scene = Scene::new();
        let ctx = EvalContext {
            scene: &scene,
            providers: Providers::none(),
            time: 0.0,
        };
        let mut stack = [Constraint::new(ConstraintData::DistLimit(
            crate::constraint::DistLimitData::default(),
        ))];
        let before = stack.clone();
        solve_constraints(ConstraintRegistry::builtin(), &mut stack, None, &ctx, &mut Tracer::none());
        assert_eq!(stack, before);
    }

    #[test]
    fn stack_runs_in_order() {
        let (scene, owner, target) = scene_with_target(DVec3::new(5.0, -5.0, 0.0));
        let limit = Constraint::new(ConstraintData::LocLimit(LocLimitData {
            use_min: [true; 3],
            use_max: [true; 3],
            min: DVec3::new(0.0, -2.0, 0.0),
            max: DVec3::new(1.0, 2.0, 0.0),
        }));
        let mut stack = [copy_location(target), limit];
        let out = solve(&scene, owner, &mut stack);
        assert_eq!(out.translation(), DVec3::new(1.0, -2.0, 0.0));
    }

    #[test]
    fn bracket_writes_back_and_records_inverse() {
        let (mut scene, owner, target) = scene_with_target(DVec3::new(0.0, 0.0, 3.0));
        if let Some(ob) = scene.object_mut(owner) {
            ob.constraints.push(copy_location(target));
        }
        evaluate_owner_constraints(
            &mut scene,
            ConstraintRegistry::builtin(),
            OwnerRef::Object(owner),
            Providers::none(),
            0.0,
            &mut Tracer::none(),
        );
        let ob = scene.object(owner).expect("owner exists");
        assert_eq!(ob.constraints.len(), 1);
        assert_eq!(ob.world.translation(), DVec3::new(0.0, 0.0, 3.0));
        assert!(approx_eq(
            &ob.constraint_inverse,
            &DMat4::from_translation(DVec3::new(0.0, 0.0, -3.0)),
            1e-12
        ));
    }

    #[test]
    fn influence_curve_drives_influence() {
        struct Quarter;
        impl AnimEvaluator for Quarter {
            fn evaluate(&self, _curve: CurveId, _time: f32) -> Option<f32> {
                Some(0.25)
            }
        }
        let mut con = copy_location(ObjectId { idx: 0, generation: 0 });
        con.influence_curve = Some(CurveId(2));
        let untouched = con.clone();
        con.flags.insert(ConstraintFlags::OWN_CURVE);
        let mut stack = [con, untouched];
        animate_influences(&mut stack, &Quarter, 10.0);
        assert_eq!(stack[0].influence, 0.25);
        assert_eq!(stack[1].influence, 1.0);
    }

    #[test]
    fn target_matrix_outside_solve() {
        let (scene, owner, target) = scene_with_target(DVec3::new(1.0, 2.0, 3.0));
        let con = copy_location(target);
        let registry = ConstraintRegistry::builtin();
        let m = constraint_target_matrix(
            registry,
            &scene,
            Providers::none(),
            &con,
            OwnerRef::Object(owner),
            0,
            0.0,
        );
        assert_eq!(m.map(|m| m.translation()), Some(DVec3::new(1.0, 2.0, 3.0)));
        let none = constraint_target_matrix(
            registry,
            &scene,
            Providers::none(),
            &con,
            OwnerRef::Object(owner),
            1,
            0.0,
        );
        assert!(none.is_none());
    }

    #[test]
    fn removed_target_leaves_owner_alone() {
        let (mut scene, owner, target) = scene_with_target(DVec3::new(1.0, 1.0, 1.0));
        let start = DMat4::from_translation(DVec3::new(5.0, 6.0, 7.0));
        if let Some(ob) = scene.object_mut(owner) {
            ob.world = start;
            ob.constraints.push(copy_location(target));
        }
        scene.remove_object(target).expect("target exists");

        evaluate_owner_constraints(
            &mut scene,
            ConstraintRegistry::builtin(),
            OwnerRef::Object(owner),
            Providers::none(),
            0.0,
            &mut Tracer::none(),
        );
        let ob = scene.object(owner).expect("owner exists");
        assert_eq!(ob.world, start);
        assert!(approx_eq(&ob.constraint_inverse, &DMat4::IDENTITY, 1e-12));

        let con = &ob.constraints[0];
        let m = constraint_target_matrix(
            ConstraintRegistry::builtin(),
            &scene,
            Providers::none(),
            con,
            OwnerRef::Object(owner),
            0,
            0.0,
        );
        assert!(m.is_none(), "removed target still resolves: {m:?}");
    }

    #[test]
    fn removed_script_target_is_not_resolved() {
        let (mut scene, owner, target) = scene_with_target(DVec3::ONE);
        let spy = Spy::default();
        let mut stack = [Constraint::new(ConstraintData::Python(PythonData {
            targets: alloc::vec![TargetRef::object(target)],
            script: Some(ScriptId(1)),
            ..PythonData::default()
        }))];
        scene.remove_object(target).expect("target exists");
        let mut cob = ConstraintOb::make(&scene, OwnerRef::Object(owner));
        let ctx = EvalContext {
            scene: &scene,
            providers: Providers::none().with_scripts(&spy),
            time: 0.0,
        };
        solve_constraints(
            ConstraintRegistry::builtin(),
            &mut stack,
            Some(&mut cob),
            &ctx,
            &mut Tracer::none(),
        );
        // Only `compute` runs; the stale target is never handed to the host.
        assert_eq!(spy.calls.get(), 1);
    }

    #[test]
    fn null_tag_is_a_no_op() {
        let (scene, owner, target) = scene_with_target(DVec3::new(2.0, 3.0, 4.0));
        let spy = Spy::default();
        let mut script = Constraint::new(ConstraintData::Python(PythonData {
            targets: alloc::vec![TargetRef::object(target)],
            script: Some(ScriptId(1)),
            ..PythonData::default()
        }));
        script.ty = ConstraintType::Null;
        let mut leftover = copy_location(target);
        leftover.ty = ConstraintType::Null;
        let mut stack = [script, leftover];

        let start = DMat4::from_rotation_z(0.3) * DMat4::from_translation(DVec3::new(-1.0, 0.5, 9.0));
        let mut cob = ConstraintOb::make(&scene, OwnerRef::Object(owner));
        cob.matrix = start;
        let ctx = EvalContext {
            scene: &scene,
            providers: Providers::none().with_scripts(&spy),
            time: 0.0,
        };
        solve_constraints(
            ConstraintRegistry::builtin(),
            &mut stack,
            Some(&mut cob),
            &ctx,
            &mut Tracer::none(),
        );
        assert_eq!(cob.matrix.to_cols_array(), start.to_cols_array());
        assert_eq!(spy.calls.get(), 0);
    }
}
