// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Inverse kinematics. The chain itself is solved outside the stack by an
//! [`IkSolver`](crate::provider::IkSolver); this type only supplies the goal
//! and pole matrices.

use alloc::vec::Vec;

use glam::{DMat4, DVec3};

use crate::constraint::registry::ConstraintTypeInfo;
use crate::constraint::target::{default_target_matrix, relink_targets, target_kind};
use crate::constraint::{
    Constraint, ConstraintData, ConstraintOb, ConstraintTarget, ConstraintType, EvalContext,
    TargetRef,
};
use crate::scene::Scene;
use crate::transform::MatrixExt;

/// Settings of [`ConstraintType::Kinematic`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KinematicData {
    /// Goal.
    pub target: TargetRef,
    /// Pole the chain bends towards.
    pub pole: TargetRef,
    /// Roll of the chain around the pole direction, in radians.
    pub pole_angle: f32,
    /// Position weight.
    pub weight: f32,
    /// Rotation weight.
    pub orient_weight: f32,
    /// Iteration cap.
    pub iterations: u16,
    /// Convergence tolerance.
    pub tolerance: f32,
    /// Number of bones in the chain; 0 reaches the root.
    pub chain_len: u16,
    /// Include the owning bone's tip rather than stopping at its head.
    pub use_tip: bool,
    /// Allow bones to stretch.
    pub use_stretch: bool,
    /// Match the goal position.
    pub use_position: bool,
    /// Match the goal rotation.
    pub use_rotation: bool,
    /// Grab mode: without a goal object, chase `grab_target`.
    pub auto_ik: bool,
    /// Goal in the armature's object space for grab mode.
    pub grab_target: DVec3,
}

pub(crate) const INFO: ConstraintTypeInfo = {
    let mut info = ConstraintTypeInfo::empty(ConstraintType::Kinematic, "KinematicData");
    info.relink_data = Some(relink_targets);
    info.new_data = Some(new_data);
    info.get_targets = Some(get_targets);
    info.flush_targets = Some(flush_targets);
    info.get_target_matrix = Some(get_target_matrix);
    info
};

fn new_data(data: &mut ConstraintData) {
    if let ConstraintData::Kinematic(d) = data {
        d.weight = 1.0;
        d.orient_weight = 1.0;
        d.iterations = 500;
        d.tolerance = 0.001;
        d.use_tip = true;
        d.use_stretch = true;
        d.use_position = true;
    }
}

/// Always two targets: the goal, then the pole.
fn get_targets(con: &Constraint, scene: &Scene, out: &mut Vec<ConstraintTarget>) -> usize {
    let ConstraintData::Kinematic(d) = &con.data else {
        return 0;
    };
    for t in [&d.target, &d.pole] {
        let kind = target_kind(scene, t.object, &t.subtarget);
        out.push(ConstraintTarget::new(t, con.target_space, kind));
    }
    2
}

fn flush_targets(con: &mut Constraint, list: &mut Vec<ConstraintTarget>, discard: bool) {
    if !discard {
        if let Some(first) = list.first() {
            con.target_space = first.space;
        }
        if let ConstraintData::Kinematic(d) = &mut con.data {
            for (t, ct) in [&mut d.target, &mut d.pole].into_iter().zip(list.iter()) {
                t.object = ct.object;
                t.subtarget.clone_from(&ct.subtarget);
            }
        }
    }
    list.clear();
}

/// The default matrix for set targets. An unset goal in grab mode becomes
/// the armature matrix moved to the grab point; otherwise identity.
fn get_target_matrix(
    con: &Constraint,
    cob: &ConstraintOb,
    ct: &mut ConstraintTarget,
    ctx: &EvalContext<'_>,
) {
    if ct.object.is_some() {
        default_target_matrix(con, cob, ct, ctx);
        return;
    }
    let ConstraintData::Kinematic(d) = &con.data else {
        ct.matrix = DMat4::IDENTITY;
        return;
    };
    ct.matrix = match ctx.scene.object(cob.owner.object()) {
        Some(ob) if d.auto_ik => {
            let mut m = ob.world;
            m.set_translation(ob.world.transform_point3(d.grab_target));
            m
        }
        _ => DMat4::IDENTITY,
    };
}
