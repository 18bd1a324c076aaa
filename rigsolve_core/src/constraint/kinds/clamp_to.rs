// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clamp To: pin the owner onto a path curve, picking the point by the
//! owner's position along one axis of the curve's bounding box.

use glam::{DMat4, DVec3};
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::constraint::registry::ConstraintTypeInfo;
use crate::constraint::target::{first_valid, single_target_info};
use crate::constraint::{
    Constraint, ConstraintData, ConstraintOb, ConstraintTarget, ConstraintType, EvalContext,
    TargetRef,
};
use crate::provider::GeometryProvider;
use crate::scene::ObjectId;
use crate::transform::MatrixExt;

/// Axis of the bounding box used to find the point on the path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClampAxis {
    /// The longest axis of the box.
    #[default]
    Auto,
    /// X.
    X,
    /// Y.
    Y,
    /// Z.
    Z,
}

/// Settings of [`ConstraintType::ClampTo`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClampToData {
    /// The path curve.
    pub target: TargetRef,
    /// Axis to measure along.
    pub axis: ClampAxis,
    /// Wrap around past the ends of the box instead of stopping.
    pub cyclic: bool,
}

pub(crate) const INFO: ConstraintTypeInfo = {
    let mut info = single_target_info(ConstraintType::ClampTo, "ClampToData");
    info.get_target_matrix = Some(get_target_matrix);
    info.evaluate = Some(evaluate);
    info
};

fn get_target_matrix(
    _con: &Constraint,
    _cob: &ConstraintOb,
    ct: &mut ConstraintTarget,
    ctx: &EvalContext<'_>,
) {
    if let Some(id) = ct.object
        && ctx.providers.geometry.path_length(id).is_none()
    {
        ctx.providers.geometry.ensure_path(id);
    }
    ct.matrix = DMat4::IDENTITY;
}

/// World-space bounds of `object`, from its object-space box.
fn world_bounds(
    geometry: &dyn GeometryProvider,
    object: ObjectId,
    world: &DMat4,
) -> Option<(DVec3, DVec3)> {
    let (lo, hi) = geometry.bounds(object)?;
    let mut min = DVec3::splat(f64::INFINITY);
    let mut max = DVec3::splat(f64::NEG_INFINITY);
    for i in 0..8 {
        let corner = DVec3::new(
            if i & 1 == 0 { lo.x } else { hi.x },
            if i & 2 == 0 { lo.y } else { hi.y },
            if i & 4 == 0 { lo.z } else { hi.z },
        );
        let p = world.transform_point3(corner);
        min = min.min(p);
        max = max.max(p);
    }
    Some((min, max))
}

fn pick_axis(axis: ClampAxis, extent: DVec3) -> usize {
    match axis {
        ClampAxis::X => 0,
        ClampAxis::Y => 1,
        ClampAxis::Z => 2,
        ClampAxis::Auto => {
            if extent.z > extent.x && extent.z > extent.y {
                2
            } else if extent.y > extent.x && extent.y > extent.z {
                1
            } else {
                0
            }
        }
    }
}

/// Path parameter for an owner at `own` along a box spanning `min..max`.
fn clamp_parameter(own: f64, min: f64, max: f64, cyclic: bool) -> f64 {
    let len = max - min;
    if len <= 0.0 {
        return 0.0;
    }
    if cyclic {
        let offset = min - ((min - own) / len).ceil() * len;
        (own - offset) / len
    } else if own <= min {
        0.0
    } else if own >= max {
        1.0
    } else {
        (own - min) / len
    }
}

fn evaluate(
    con: &mut Constraint,
    cob: &mut ConstraintOb,
    targets: &[ConstraintTarget],
    ctx: &EvalContext<'_>,
) {
    let ConstraintData::ClampTo(d) = &con.data else {
        return;
    };
    let Some(id) = first_valid(targets).and_then(|ct| ct.object) else {
        return;
    };
    let Some(tar) = ctx.scene.object(id) else {
        return;
    };
    let geometry = ctx.providers.geometry;
    let Some((min, max)) = world_bounds(geometry, id, &tar.world) else {
        return;
    };
    let axis = pick_axis(d.axis, max - min);
    let own = cob.matrix.translation();
    let t = clamp_parameter(own[axis], min[axis], max[axis], d.cyclic);
    let Some(point) = geometry.where_on_path(id, t) else {
        return;
    };
    cob.matrix.set_translation(tar.world.transform_point3(point.position));
}
