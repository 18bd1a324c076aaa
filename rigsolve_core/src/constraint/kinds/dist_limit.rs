// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Limit Distance: keep the owner inside, outside, or on a sphere around
//! the target.

use crate::constraint::registry::ConstraintTypeInfo;
use crate::constraint::target::{first_valid, single_target_info};
use crate::constraint::{
    Constraint, ConstraintData, ConstraintOb, ConstraintTarget, ConstraintType, EvalContext,
    TargetRef,
};
use crate::transform::MatrixExt;

/// Which side of the sphere the owner is kept on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DistLimitMode {
    /// At most `distance` away.
    #[default]
    Inside,
    /// At least `distance` away.
    Outside,
    /// Exactly `distance` away.
    Surface,
}

/// Settings of [`ConstraintType::DistLimit`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DistLimitData {
    /// Centre of the sphere.
    pub target: TargetRef,
    /// Sphere radius. Zero is replaced by the current distance on the
    /// first evaluation.
    pub distance: f64,
    /// Width of the soft zone inside the sphere.
    pub soft: f64,
    /// Whether the soft zone is used; [`DistLimitMode::Inside`] only.
    pub use_soft: bool,
    /// Clamping mode.
    pub mode: DistLimitMode,
}

pub(crate) const INFO: ConstraintTypeInfo = {
    let mut info = single_target_info(ConstraintType::DistLimit, "DistLimitData");
    info.evaluate = Some(evaluate);
    info
};

/// Scale factor along target→owner that brings the owner into range, or
/// `None` if it already is.
fn clamp_factor(d: &DistLimitData, dist: f64) -> Option<f64> {
    let limit = d.distance;
    match d.mode {
        DistLimitMode::Outside => (dist <= limit).then_some(limit / dist),
        DistLimitMode::Inside => {
            if dist >= limit {
                Some(limit / dist)
            } else if d.use_soft && d.soft > 0.0 && dist >= limit - d.soft {
                let eased = d.soft * (1.0 - libm::exp(-(dist - limit) / d.soft)) + limit;
                Some(eased / dist)
            } else {
                None
            }
        }
        DistLimitMode::Surface => (dist != limit).then_some(limit / dist),
    }
}

fn evaluate(
    con: &mut Constraint,
    cob: &mut ConstraintOb,
    targets: &[ConstraintTarget],
    _ctx: &EvalContext<'_>,
) {
    let ConstraintData::DistLimit(d) = &mut con.data else {
        return;
    };
    let Some(ct) = first_valid(targets) else {
        return;
    };
    let own = cob.matrix.translation();
    let tar = ct.matrix.translation();
    let dist = own.distance(tar);
    if dist == 0.0 {
        return;
    }
    if d.distance == 0.0 {
        d.distance = dist;
    }
    if let Some(sfac) = clamp_factor(d, dist) {
        cob.matrix.set_translation(tar.lerp(own, sfac));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::kinds::testing::{TARGET, run};
    use crate::scene::Scene;
    use glam::{DMat4, DVec3};

    fn limit(distance: f64, mode: DistLimitMode) -> Constraint {
        Constraint::new(ConstraintData::DistLimit(DistLimitData {
            target: TargetRef::object(TARGET),
            distance,
            mode,
            ..DistLimitData::default()
        }))
    }

    fn run_at(con: &mut Constraint, own: DVec3) -> DVec3 {
        let scene = Scene::new();
        run(con, &scene, &[DMat4::IDENTITY], DMat4::from_translation(own)).translation()
    }

    #[test]
    fn inside_pulls_owner_back() {
        let mut con = limit(2.0, DistLimitMode::Inside);
        assert_eq!(run_at(&mut con, DVec3::new(4.0, 0.0, 0.0)), DVec3::new(2.0, 0.0, 0.0));
        assert_eq!(run_at(&mut con, DVec3::new(0.0, 1.0, 0.0)), DVec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn outside_pushes_owner_away() {
        let mut con = limit(2.0, DistLimitMode::Outside);
        assert_eq!(run_at(&mut con, DVec3::new(1.0, 0.0, 0.0)), DVec3::new(2.0, 0.0, 0.0));
        assert_eq!(run_at(&mut con, DVec3::new(3.0, 0.0, 0.0)), DVec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn surface_moves_both_ways() {
        let mut con = limit(2.0, DistLimitMode::Surface);
        assert_eq!(run_at(&mut con, DVec3::new(0.0, 0.0, 1.0)), DVec3::new(0.0, 0.0, 2.0));
        let out = run_at(&mut con, DVec3::new(0.0, 0.0, 5.0));
        assert!((out - DVec3::new(0.0, 0.0, 2.0)).length() < 1e-12);
    }

    #[test]
    fn zero_distance_is_initialised_from_current() {
        let mut con = limit(0.0, DistLimitMode::Inside);
        assert_eq!(run_at(&mut con, DVec3::new(3.0, 0.0, 0.0)), DVec3::new(3.0, 0.0, 0.0));
        let ConstraintData::DistLimit(d) = &con.data else { unreachable!() };
        assert_eq!(d.distance, 3.0);
        assert_eq!(run_at(&mut con, DVec3::new(6.0, 0.0, 0.0)), DVec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn coincident_owner_is_left_alone() {
        let mut con = limit(2.0, DistLimitMode::Surface);
        assert_eq!(run_at(&mut con, DVec3::ZERO), DVec3::ZERO);
    }

    #[test]
    fn soft_zone_eases_inside() {
        let mut con = Constraint::new(ConstraintData::DistLimit(DistLimitData {
            target: TargetRef::object(TARGET),
            distance: 2.0,
            soft: 1.0,
            use_soft: true,
            mode: DistLimitMode::Inside,
        }));
        let out = run_at(&mut con, DVec3::new(1.5, 0.0, 0.0));
        let expected = 1.0 * (1.0 - libm::exp(0.5)) + 2.0;
        assert!((out.x - expected).abs() < 1e-12);
        assert_eq!(run_at(&mut con, DVec3::new(0.5, 0.0, 0.0)), DVec3::new(0.5, 0.0, 0.0));
    }
}
