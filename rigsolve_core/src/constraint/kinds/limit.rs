// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Limit Rotation, Limit Location, and Limit Scale. None of them has
//! targets; they clamp the owner matrix in its own space.

use glam::{DMat4, DVec3};

use super::rescale_axis;
use crate::constraint::registry::ConstraintTypeInfo;
use crate::constraint::{
    Constraint, ConstraintData, ConstraintOb, ConstraintTarget, ConstraintType, EvalContext,
};
use crate::transform::{MatrixExt, loc_euler_size};

/// Settings of [`ConstraintType::RotLimit`]. Angles are in radians.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RotLimitData {
    /// Which Euler components are limited.
    pub use_limit: [bool; 3],
    /// Lower bounds.
    pub min: DVec3,
    /// Upper bounds.
    pub max: DVec3,
}

/// Settings of [`ConstraintType::LocLimit`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LocLimitData {
    /// Which components have a lower bound.
    pub use_min: [bool; 3],
    /// Which components have an upper bound.
    pub use_max: [bool; 3],
    /// Lower bounds.
    pub min: DVec3,
    /// Upper bounds.
    pub max: DVec3,
}

/// Settings of [`ConstraintType::SizeLimit`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SizeLimitData {
    /// Which components have a lower bound.
    pub use_min: [bool; 3],
    /// Which components have an upper bound.
    pub use_max: [bool; 3],
    /// Lower bounds.
    pub min: DVec3,
    /// Upper bounds.
    pub max: DVec3,
}

pub(crate) const ROT_LIMIT: ConstraintTypeInfo = {
    let mut info = ConstraintTypeInfo::empty(ConstraintType::RotLimit, "RotLimitData");
    info.evaluate = Some(rot_limit);
    info
};

pub(crate) const LOC_LIMIT: ConstraintTypeInfo = {
    let mut info = ConstraintTypeInfo::empty(ConstraintType::LocLimit, "LocLimitData");
    info.evaluate = Some(loc_limit);
    info
};

pub(crate) const SIZE_LIMIT: ConstraintTypeInfo = {
    let mut info = ConstraintTypeInfo::empty(ConstraintType::SizeLimit, "SizeLimitData");
    info.evaluate = Some(size_limit);
    info
};

fn clamp_bounded(v: f64, use_min: bool, min: f64, use_max: bool, max: f64) -> f64 {
    let mut v = v;
    if use_min && v < min {
        v = min;
    }
    if use_max && v > max {
        v = max;
    }
    v
}

fn rot_limit(
    con: &mut Constraint,
    cob: &mut ConstraintOb,
    _targets: &[ConstraintTarget],
    _ctx: &EvalContext<'_>,
) {
    let ConstraintData::RotLimit(d) = &con.data else {
        return;
    };
    let m = &cob.matrix;
    let mut eul = m.euler();
    for i in 0..3 {
        eul[i] = clamp_bounded(eul[i], d.use_limit[i], d.min[i], d.use_limit[i], d.max[i]);
    }
    cob.matrix = loc_euler_size(m.translation(), eul, m.size());
}

fn loc_limit(
    con: &mut Constraint,
    cob: &mut ConstraintOb,
    _targets: &[ConstraintTarget],
    _ctx: &EvalContext<'_>,
) {
    let ConstraintData::LocLimit(d) = &con.data else {
        return;
    };
    let mut loc = cob.matrix.translation();
    for i in 0..3 {
        loc[i] = clamp_bounded(loc[i], d.use_min[i], d.min[i], d.use_max[i], d.max[i]);
    }
    cob.matrix.set_translation(loc);
}

fn size_limit(
    con: &mut Constraint,
    cob: &mut ConstraintOb,
    _targets: &[ConstraintTarget],
    _ctx: &EvalContext<'_>,
) {
    let ConstraintData::SizeLimit(d) = &con.data else {
        return;
    };
    let size = cob.matrix.size();
    let mut m: DMat4 = cob.matrix;
    for i in 0..3 {
        let limited = clamp_bounded(size[i], d.use_min[i], d.min[i], d.use_max[i], d.max[i]);
        rescale_axis(&mut m, i, size[i], limited);
    }
    cob.matrix = m;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::kinds::testing::run;
    use crate::scene::Scene;

    #[test]
    fn location_is_clamped_per_axis() {
        let scene = Scene::new();
        let mut con = Constraint::new(ConstraintData::LocLimit(LocLimitData {
            use_min: [true, true, false],
            use_max: [true, true, false],
            min: DVec3::new(0.0, -2.0, 0.0),
            max: DVec3::new(1.0, 2.0, 0.0),
        }));
        let owner = DMat4::from_translation(DVec3::new(5.0, -5.0, 7.0));
        let out = run(&mut con, &scene, &[], owner);
        assert_eq!(out.translation(), DVec3::new(1.0, -2.0, 7.0));
    }

    #[test]
    fn rotation_is_clamped() {
        let scene = Scene::new();
        let mut con = Constraint::new(ConstraintData::RotLimit(RotLimitData {
            use_limit: [false, false, true],
            min: DVec3::new(0.0, 0.0, -0.5),
            max: DVec3::new(0.0, 0.0, 0.5),
        }));
        let owner = loc_euler_size(DVec3::ONE, DVec3::new(0.0, 0.0, 1.2), DVec3::splat(2.0));
        let out = run(&mut con, &scene, &[], owner);
        assert!((out.euler().z - 0.5).abs() < 1e-12);
        assert!((out.size() - DVec3::splat(2.0)).length() < 1e-12);
        assert_eq!(out.translation(), DVec3::ONE);
    }

    #[test]
    fn scale_is_clamped_keeping_direction() {
        let scene = Scene::new();
        let mut con = Constraint::new(ConstraintData::SizeLimit(SizeLimitData {
            use_min: [true; 3],
            use_max: [true; 3],
            min: DVec3::splat(0.5),
            max: DVec3::splat(2.0),
        }));
        let owner = loc_euler_size(DVec3::ZERO, DVec3::new(0.3, 0.0, 0.0), DVec3::new(4.0, 1.0, 0.1));
        let out = run(&mut con, &scene, &[], owner);
        assert!((out.size() - DVec3::new(2.0, 1.0, 0.5)).length() < 1e-12);
        assert!((out.euler() - DVec3::new(0.3, 0.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn disabled_bounds_leave_matrix() {
        let scene = Scene::new();
        let mut con = Constraint::new(ConstraintData::LocLimit(LocLimitData::default()));
        let owner = DMat4::from_translation(DVec3::new(5.0, -5.0, 0.0));
        assert_eq!(run(&mut con, &scene, &[], owner), owner);
    }
}
