// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stretch To: aim the owner's Y axis at the target and scale it to reach,
//! optionally preserving volume on the other two axes.

use glam::{DMat3, DVec3};
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::constraint::registry::ConstraintTypeInfo;
use crate::constraint::target::{first_valid, single_target_info};
use crate::constraint::{
    Constraint, ConstraintData, ConstraintOb, ConstraintTarget, ConstraintType, EvalContext,
    TargetRef,
};
use crate::transform::{MatrixExt, mat4_from_mat3};

/// Which axes shrink as the owner stretches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VolumeMode {
    /// X and Z, preserving volume.
    #[default]
    XZ,
    /// X only.
    X,
    /// Z only.
    Z,
    /// Neither.
    None,
}

/// Which of the owner's original axes is kept in the rotation plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StretchPlane {
    /// Keep X.
    #[default]
    X,
    /// Keep Z.
    Z,
}

/// Settings of [`ConstraintType::StretchTo`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StretchToData {
    /// Object stretched to.
    pub target: TargetRef,
    /// Volume handling.
    pub volume: VolumeMode,
    /// Kept plane.
    pub plane: StretchPlane,
    /// Rest length; zero is replaced by the current distance on the first
    /// evaluation.
    pub orig_length: f64,
    /// Strength of the volume compensation; zero is treated as one.
    pub bulge: f64,
}

pub(crate) const INFO: ConstraintTypeInfo = {
    let mut info = single_target_info(ConstraintType::StretchTo, "StretchToData");
    info.new_data = Some(new_data);
    info.evaluate = Some(evaluate);
    info
};

fn new_data(data: &mut ConstraintData) {
    if let ConstraintData::StretchTo(d) = data {
        d.bulge = 1.0;
    }
}

fn volume_scale(mode: VolumeMode, bulge: f64, ratio: f64) -> (f64, f64) {
    match mode {
        VolumeMode::XZ => {
            let s = 1.0 - bulge.sqrt() + (bulge * ratio).sqrt();
            (s, s)
        }
        VolumeMode::X => (1.0 + bulge * (ratio - 1.0), 1.0),
        VolumeMode::Z => (1.0, 1.0 + bulge * (ratio - 1.0)),
        VolumeMode::None => (1.0, 1.0),
    }
}

fn evaluate(
    con: &mut Constraint,
    cob: &mut ConstraintOb,
    targets: &[ConstraintTarget],
    _ctx: &EvalContext<'_>,
) {
    let ConstraintData::StretchTo(d) = &mut con.data else {
        return;
    };
    let Some(ct) = first_valid(targets) else {
        return;
    };
    let size = cob.matrix.size();
    if size.cmpeq(DVec3::ZERO).any() {
        return;
    }
    let xx = cob.matrix.axis(0).normalize_or_zero();
    let zz = cob.matrix.axis(2).normalize_or_zero();
    let own = cob.matrix.translation();
    let tar = ct.matrix.translation();

    let dist = ((own - tar) / size).length();
    if dist == 0.0 {
        return;
    }
    if d.orig_length == 0.0 {
        d.orig_length = dist;
    }
    if d.bulge == 0.0 {
        d.bulge = 1.0;
    }
    let ratio = d.orig_length / dist;
    let (sx, sz) = volume_scale(d.volume, d.bulge, ratio);
    let scale = DVec3::new(sx, dist / d.orig_length, sz);

    let y = (tar - own).normalize_or_zero();
    let (x, z) = match d.plane {
        StretchPlane::X => {
            let z = xx.cross(y).normalize_or_zero();
            (y.cross(z).normalize_or_zero(), z)
        }
        StretchPlane::Z => {
            let x = y.cross(zz).normalize_or_zero();
            (x, x.cross(y).normalize_or_zero())
        }
    };
    if x == DVec3::ZERO || z == DVec3::ZERO {
        return;
    }
    let s = size * scale;
    let mut m = mat4_from_mat3(&DMat3::from_cols(x * s.x, y * s.y, z * s.z));
    m.set_translation(own);
    cob.matrix = m;
}
