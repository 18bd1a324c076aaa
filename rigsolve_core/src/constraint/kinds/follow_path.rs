// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Follow Path: move the owner along a path curve over time.

use glam::{DMat4, DQuat};

use crate::constraint::registry::ConstraintTypeInfo;
use crate::constraint::target::{first_valid, single_target_info};
use crate::constraint::{
    Constraint, ConstraintData, ConstraintOb, ConstraintTarget, ConstraintType, EvalContext,
    TargetRef,
};
use crate::provider::{PathPoint, Providers};
use crate::scene::{ObjectId, Scene};
use crate::transform::{MatrixExt, TrackAxis, UpAxis, track_quat};

use super::rescale_axis;

/// Settings of [`ConstraintType::FollowPath`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FollowPathData {
    /// The path curve.
    pub target: TargetRef,
    /// Frames subtracted from the curve's time.
    pub offset: f32,
    /// Orient the owner along the path tangent.
    pub follow_curve: bool,
    /// Axis aligned with the tangent.
    pub track: TrackAxis,
    /// Axis kept upwards.
    pub up: UpAxis,
}

pub(crate) const INFO: ConstraintTypeInfo = {
    let mut info = single_target_info(ConstraintType::FollowPath, "FollowPathData");
    info.new_data = Some(new_data);
    info.get_target_matrix = Some(get_target_matrix);
    info.evaluate = Some(evaluate);
    info
};

fn new_data(data: &mut ConstraintData) {
    if let ConstraintData::FollowPath(d) = data {
        d.track = TrackAxis::Y;
        d.up = UpAxis::Z;
    }
}

/// Path parameter in `0..=1` of `path` at `time` (in the path's own time).
///
/// The curve's speed curve maps time directly when present and evaluable;
/// otherwise time is divided by the path length and clamped. Asks the
/// geometry provider to build a missing path and returns `None` if there
/// still is none.
pub(crate) fn path_parameter(
    scene: &Scene,
    providers: &Providers<'_>,
    path: ObjectId,
    time: f32,
) -> Option<f64> {
    let ob = scene.object(path)?;
    let length = match providers.geometry.path_length(path) {
        Some(len) => len,
        None => {
            providers.geometry.ensure_path(path);
            providers.geometry.path_length(path)?
        }
    };
    if let Some(curve) = ob.curve.speed_curve
        && let Some(value) = providers.anim.evaluate(curve, time)
    {
        return Some(f64::from(value));
    }
    if length <= 0.0 {
        return Some(0.0);
    }
    Some((f64::from(time) / length).clamp(0.0, 1.0))
}

/// Rotation of a path follower: `track` along the tangent, `up` towards Z,
/// then rolled by the path tilt.
pub(crate) fn path_rotation(point: &PathPoint, track: TrackAxis, up: UpAxis) -> DQuat {
    let quat = track_quat(point.direction, track, up);
    let dir = point.direction.normalize_or_zero();
    if dir == glam::DVec3::ZERO {
        return quat;
    }
    (DQuat::from_axis_angle(dir, -point.tilt) * quat).normalize()
}

fn get_target_matrix(
    con: &Constraint,
    _cob: &ConstraintOb,
    ct: &mut ConstraintTarget,
    ctx: &EvalContext<'_>,
) {
    ct.matrix = DMat4::IDENTITY;
    let ConstraintData::FollowPath(data) = &con.data else {
        return;
    };
    let Some(id) = ct.object else {
        return;
    };
    let Some(tar) = ctx.scene.object(id) else {
        return;
    };
    let time = tar.local_time(ctx.time) - data.offset;
    let Some(t) = path_parameter(ctx.scene, &ctx.providers, id, time) else {
        return;
    };
    let Some(point) = ctx.providers.geometry.where_on_path(id, t) else {
        return;
    };
    let mut local = if data.follow_curve {
        DMat4::from_quat(path_rotation(&point, data.track, data.up))
    } else {
        DMat4::IDENTITY
    };
    local.set_translation(point.position);
    ct.matrix = tar.world * local;
}

fn evaluate(
    _con: &mut Constraint,
    cob: &mut ConstraintOb,
    targets: &[ConstraintTarget],
    _ctx: &EvalContext<'_>,
) {
    let Some(ct) = first_valid(targets) else {
        return;
    };
    let size = cob.matrix.size();
    let mut m = ct.matrix * cob.matrix;
    let moved = m.size();
    for i in 0..3 {
        rescale_axis(&mut m, i, moved[i], size[i]);
    }
    cob.matrix = m;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{AnimEvaluator, GeometryProvider};
    use crate::scene::{CurveId, Object, ObjectKind};
    use glam::DVec3;

    /// A straight path along +X of length 10 over 100 frames.
    struct Line;

    impl GeometryProvider for Line {
        fn where_on_path(&self, _object: ObjectId, t: f64) -> Option<PathPoint> {
            Some(PathPoint {
                position: DVec3::new(10.0 * t, 0.0, 0.0),
                direction: DVec3::X,
                tilt: 0.0,
            })
        }

        fn path_length(&self, _object: ObjectId) -> Option<f64> {
            Some(100.0)
        }
    }

    struct Half;

    impl AnimEvaluator for Half {
        fn evaluate(&self, _curve: CurveId, _time: f32) -> Option<f32> {
            Some(0.5)
        }
    }

    fn path_scene() -> (Scene, ObjectId) {
        let mut scene = Scene::new();
        let mut curve = Object::new("Path", ObjectKind::Curve);
        curve.curve.is_path = true;
        curve.world = DMat4::from_translation(DVec3::new(0.0, 0.0, 1.0));
        let id = scene.add_object(curve);
        (scene, id)
    }

    fn follow(id: ObjectId, follow_curve: bool) -> Constraint {
        let mut data = ConstraintData::FollowPath(FollowPathData {
            target: TargetRef::object(id),
            follow_curve,
            ..FollowPathData::default()
        });
        new_data(&mut data);
        Constraint::new(data)
    }

    #[test]
    fn parameter_clamps_time_over_length() {
        let (scene, id) = path_scene();
        let line = Line;
        let p = Providers::none().with_geometry(&line);
        assert_eq!(path_parameter(&scene, &p, id, 50.0), Some(0.5));
        assert_eq!(path_parameter(&scene, &p, id, 500.0), Some(1.0));
        assert_eq!(path_parameter(&scene, &p, id, -5.0), Some(0.0));
        assert_eq!(path_parameter(&scene, &Providers::none(), id, 5.0), None);
    }

    #[test]
    fn speed_curve_overrides_time() {
        let (mut scene, id) = path_scene();
        scene.object_mut(id).unwrap().curve.speed_curve = Some(CurveId(0));
        let (line, half) = (Line, Half);
        let p = Providers::none().with_geometry(&line).with_anim(&half);
        assert_eq!(path_parameter(&scene, &p, id, 90.0), Some(0.5));
    }

    #[test]
    fn target_matrix_places_on_path() {
        let (scene, id) = path_scene();
        let line = Line;
        let ctx = EvalContext {
            scene: &scene,
            providers: Providers::none().with_geometry(&line),
            time: 25.0,
        };
        let con = follow(id, true);
        let cob = ConstraintOb {
            owner: crate::constraint::OwnerRef::Object(id),
            matrix: DMat4::IDENTITY,
            start_matrix: DMat4::IDENTITY,
        };
        let mut targets = alloc::vec::Vec::new();
        crate::constraint::target::single_get_targets(&con, &scene, &mut targets);
        get_target_matrix(&con, &cob, &mut targets[0], &ctx);
        let m = targets[0].matrix;
        assert!((m.translation() - DVec3::new(2.5, 0.0, 1.0)).length() < 1e-12);
        assert!((m.axis(1) - DVec3::X).length() < 1e-9);
    }

    #[test]
    fn evaluate_keeps_owner_scale() {
        let scene = Scene::new();
        let mut con = follow(crate::constraint::kinds::testing::TARGET, false);
        let target = DMat4::from_scale_rotation_translation(
            DVec3::splat(3.0),
            DQuat::IDENTITY,
            DVec3::new(1.0, 2.0, 3.0),
        );
        let owner = DMat4::from_scale(DVec3::new(1.0, 2.0, 1.0));
        let out = crate::constraint::kinds::testing::run(&mut con, &scene, &[target], owner);
        assert!((out.size() - DVec3::new(1.0, 2.0, 1.0)).length() < 1e-12);
        assert!((out.translation() - DVec3::new(1.0, 2.0, 3.0)).length() < 1e-12);
    }
}
