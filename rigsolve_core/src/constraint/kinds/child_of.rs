// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Child Of: parent the owner to the target per channel.

use glam::DMat4;

use crate::constraint::registry::ConstraintTypeInfo;
use crate::constraint::target::{first_valid, single_target_info};
use crate::constraint::{
    Constraint, ConstraintData, ConstraintOb, ConstraintTarget, ConstraintType, EvalContext,
    TargetRef,
};
use crate::transform::{MatrixExt, loc_euler_size};

/// Settings of [`ConstraintType::ChildOf`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChildOfData {
    /// The parent.
    pub target: TargetRef,
    /// Inherited location channels.
    pub use_location: [bool; 3],
    /// Inherited rotation channels.
    pub use_rotation: [bool; 3],
    /// Inherited scale channels.
    pub use_scale: [bool; 3],
    /// Parent inverse captured when the relation was set up.
    pub inverse: DMat4,
}

pub(crate) const INFO: ConstraintTypeInfo = {
    let mut info = single_target_info(ConstraintType::ChildOf, "ChildOfData");
    info.new_data = Some(new_data);
    info.evaluate = Some(evaluate);
    info
};

fn new_data(data: &mut ConstraintData) {
    if let ConstraintData::ChildOf(d) = data {
        d.use_location = [true; 3];
        d.use_rotation = [true; 3];
        d.use_scale = [true; 3];
        d.inverse = DMat4::IDENTITY;
    }
}

/// Drops the disabled channels of `m`.
fn masked(m: &DMat4, data: &ChildOfData) -> DMat4 {
    let mut loc = m.translation();
    let mut eul = m.euler();
    let mut size = m.size();
    for i in 0..3 {
        if !data.use_location[i] {
            loc[i] = 0.0;
        }
        if !data.use_rotation[i] {
            eul[i] = 0.0;
        }
        if !data.use_scale[i] {
            size[i] = 1.0;
        }
    }
    loc_euler_size(loc, eul, size)
}

fn evaluate(
    con: &mut Constraint,
    cob: &mut ConstraintOb,
    targets: &[ConstraintTarget],
    _ctx: &EvalContext<'_>,
) {
    let ConstraintData::ChildOf(data) = &con.data else {
        return;
    };
    let Some(ct) = first_valid(targets) else {
        return;
    };
    let all = [true; 3];
    let parent = if data.use_location == all && data.use_rotation == all && data.use_scale == all {
        ct.matrix * data.inverse
    } else {
        masked(&ct.matrix, data) * masked(&data.inverse, data)
    };
    cob.matrix = parent * cob.matrix;
}
