// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Track To: point one axis of the owner at the target.

use glam::DVec3;

use super::with_rotation;
use crate::constraint::registry::ConstraintTypeInfo;
use crate::constraint::target::{first_valid, single_target_info};
use crate::constraint::{
    Constraint, ConstraintData, ConstraintOb, ConstraintTarget, ConstraintType, EvalContext,
    TargetRef,
};
use crate::transform::{MatrixExt, TrackAxis, UpAxis, track_basis};

/// Settings of [`ConstraintType::TrackTo`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackToData {
    /// The tracked object.
    pub target: TargetRef,
    /// Axis pointed at the target.
    pub track: TrackAxis,
    /// Axis kept upwards.
    pub up: UpAxis,
    /// Use the target's Z axis as "up" instead of world Z.
    pub target_z_up: bool,
}

pub(crate) const INFO: ConstraintTypeInfo = {
    let mut info = single_target_info(ConstraintType::TrackTo, "TrackToData");
    info.new_data = Some(new_data);
    info.evaluate = Some(evaluate);
    info
};

fn new_data(data: &mut ConstraintData) {
    if let ConstraintData::TrackTo(d) = data {
        d.track = TrackAxis::Y;
        d.up = UpAxis::Z;
    }
}

fn evaluate(
    con: &mut Constraint,
    cob: &mut ConstraintOb,
    targets: &[ConstraintTarget],
    _ctx: &EvalContext<'_>,
) {
    let ConstraintData::TrackTo(data) = &con.data else {
        return;
    };
    let Some(ct) = first_valid(targets) else {
        return;
    };
    let vec = cob.matrix.translation() - ct.matrix.translation();
    let up_ref = if data.target_z_up {
        ct.matrix.axis(2)
    } else {
        DVec3::Z
    };
    let rot = track_basis(vec, up_ref, data.track, data.up);
    cob.matrix = with_rotation(&cob.matrix, &rot);
}
