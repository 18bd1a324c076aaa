// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Floor: keep the owner on one side of a plane through the target.

use glam::{DMat4, DVec3};

use crate::constraint::registry::ConstraintTypeInfo;
use crate::constraint::target::{first_valid, single_target_info};
use crate::constraint::{
    Constraint, ConstraintData, ConstraintOb, ConstraintTarget, ConstraintType, EvalContext,
    TargetRef,
};
use crate::transform::{MatrixExt, TrackAxis};

/// Settings of [`ConstraintType::MinMax`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MinMaxData {
    /// Object defining the plane.
    pub target: TargetRef,
    /// Normal of the plane; the owner stays on its positive side.
    pub axis: TrackAxis,
    /// Distance kept from the plane.
    pub offset: f64,
    /// Once clamped, stay at the first contact point.
    pub sticky: bool,
    /// Use the target's rotation for the plane.
    pub use_rotation: bool,
    /// Whether a sticky owner is currently stuck.
    pub stuck: bool,
    /// Contact point of a stuck owner.
    pub cache: DVec3,
}

pub(crate) const INFO: ConstraintTypeInfo = {
    let mut info = single_target_info(ConstraintType::MinMax, "MinMaxData");
    info.new_data = Some(new_data);
    info.evaluate = Some(evaluate);
    info
};

fn new_data(data: &mut ConstraintData) {
    if let ConstraintData::MinMax(d) = data {
        d.axis = TrackAxis::Z;
    }
}

fn evaluate(
    con: &mut Constraint,
    cob: &mut ConstraintOb,
    targets: &[ConstraintTarget],
    _ctx: &EvalContext<'_>,
) {
    let ConstraintData::MinMax(d) = &mut con.data else {
        return;
    };
    let Some(ct) = first_valid(targets) else {
        return;
    };
    let (mut ob, tar) = if d.use_rotation {
        (ct.matrix.inverse() * cob.matrix, DMat4::IDENTITY)
    } else {
        (cob.matrix, ct.matrix)
    };
    let i = d.axis.index();
    let tar_t = tar.translation();
    let mut ob_t = ob.translation();
    let (below, above) = if d.axis.is_negative() {
        (ob_t[i] - d.offset, tar_t[i])
    } else {
        (tar_t[i], ob_t[i] - d.offset)
    };
    if below <= above {
        d.stuck = false;
        return;
    }
    ob_t[i] = tar_t[i] + d.offset;
    if d.sticky {
        if d.stuck {
            ob_t = d.cache;
        } else {
            d.cache = ob_t;
            d.stuck = true;
        }
    }
    ob.set_translation(ob_t);
    if d.use_rotation {
        cob.matrix = ct.matrix * ob;
    } else {
        cob.matrix.set_translation(ob_t);
    }
}
