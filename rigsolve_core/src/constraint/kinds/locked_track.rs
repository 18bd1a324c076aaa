// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Locked Track: point one axis at the target while another axis of the
//! owner stays fixed.

use glam::{DMat3, DVec3};

use super::with_rotation;
use crate::constraint::registry::ConstraintTypeInfo;
use crate::constraint::target::{first_valid, single_target_info};
use crate::constraint::{
    Constraint, ConstraintData, ConstraintOb, ConstraintTarget, ConstraintType, EvalContext,
    TargetRef,
};
use crate::transform::{MatrixExt, TrackAxis, UpAxis, project};

/// Settings of [`ConstraintType::LockedTrack`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LockedTrackData {
    /// Object tracked.
    pub target: TargetRef,
    /// Axis pointed at the target.
    pub track: TrackAxis,
    /// Axis of the owner left in place.
    pub lock: UpAxis,
}

pub(crate) const INFO: ConstraintTypeInfo = {
    let mut info = single_target_info(ConstraintType::LockedTrack, "LockedTrackData");
    info.new_data = Some(new_data);
    info.evaluate = Some(evaluate);
    info
};

fn new_data(data: &mut ConstraintData) {
    if let ConstraintData::LockedTrack(d) = data {
        d.track = TrackAxis::Y;
        d.lock = UpAxis::Z;
    }
}

/// Rotation with `lock` along `lock_axis` and `track` as close to `dir` as
/// the lock allows. `None` when the two are parallel or name one axis.
fn locked_basis(dir: DVec3, lock_axis: DVec3, track: TrackAxis, lock: UpAxis) -> Option<DMat3> {
    let t = track.index();
    let l = lock.index();
    if t == l {
        return None;
    }
    let lock_axis = lock_axis.normalize_or_zero();
    if lock_axis == DVec3::ZERO {
        return None;
    }
    let mut v = (dir - project(dir, lock_axis)).normalize_or_zero();
    if v == DVec3::ZERO {
        return None;
    }
    if track.is_negative() {
        v = -v;
    }
    let mut cols = [DVec3::ZERO; 3];
    cols[t] = v;
    cols[l] = lock_axis;
    let o = 3 - t - l;
    cols[o] = cols[(o + 1) % 3].cross(cols[(o + 2) % 3]);
    Some(DMat3::from_cols(cols[0], cols[1], cols[2]))
}

fn evaluate(
    con: &mut Constraint,
    cob: &mut ConstraintOb,
    targets: &[ConstraintTarget],
    _ctx: &EvalContext<'_>,
) {
    let ConstraintData::LockedTrack(d) = &con.data else {
        return;
    };
    let Some(ct) = first_valid(targets) else {
        return;
    };
    let dir = ct.matrix.translation() - cob.matrix.translation();
    let lock_axis = cob.matrix.axis(d.lock.index());
    if let Some(rot) = locked_basis(dir, lock_axis, d.track, d.lock) {
        cob.matrix = with_rotation(&cob.matrix, &rot);
    }
}
