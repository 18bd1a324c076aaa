// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Copy Rotation, Copy Location, and Copy Scale.

use glam::DVec3;

use super::rescale_axis;
use crate::constraint::registry::ConstraintTypeInfo;
use crate::constraint::target::{first_valid, single_target_info};
use crate::constraint::{
    Constraint, ConstraintData, ConstraintOb, ConstraintTarget, ConstraintType, EvalContext,
    TargetRef,
};
use crate::transform::{MatrixExt, compatible_euler, euler_rotate, loc_euler_size};

/// Settings of [`ConstraintType::RotLike`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RotLikeData {
    /// Object whose rotation is copied.
    pub target: TargetRef,
    /// Which Euler components are copied.
    pub axes: [bool; 3],
    /// Which copied components are negated.
    pub invert: [bool; 3],
    /// Rotate the owner's own rotation by the copied one instead of replacing it.
    pub use_offset: bool,
}

/// Settings of [`ConstraintType::LocLike`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LocLikeData {
    /// Object whose location is copied.
    pub target: TargetRef,
    /// Which components are copied.
    pub axes: [bool; 3],
    /// Which copied components are negated.
    pub invert: [bool; 3],
    /// Add the owner's own location to the copied one.
    pub use_offset: bool,
}

/// Settings of [`ConstraintType::SizeLike`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SizeLikeData {
    /// Object whose scale is copied.
    pub target: TargetRef,
    /// Which components are copied.
    pub axes: [bool; 3],
    /// Add the owner's own scale (minus one) to the copied one.
    pub use_offset: bool,
}

impl LocLikeData {
    /// Copies every axis of `target`'s location.
    #[must_use]
    pub fn new(target: TargetRef) -> Self {
        Self {
            target,
            axes: [true; 3],
            ..Self::default()
        }
    }
}

impl RotLikeData {
    /// Copies every axis of `target`'s rotation.
    #[must_use]
    pub fn new(target: TargetRef) -> Self {
        Self {
            target,
            axes: [true; 3],
            ..Self::default()
        }
    }
}

impl SizeLikeData {
    /// Copies every axis of `target`'s scale.
    #[must_use]
    pub fn new(target: TargetRef) -> Self {
        Self {
            target,
            axes: [true; 3],
            use_offset: false,
        }
    }
}

pub(crate) const ROT_LIKE: ConstraintTypeInfo = {
    let mut info = single_target_info(ConstraintType::RotLike, "RotLikeData");
    info.new_data = Some(new_data);
    info.evaluate = Some(rot_like);
    info
};

pub(crate) const LOC_LIKE: ConstraintTypeInfo = {
    let mut info = single_target_info(ConstraintType::LocLike, "LocLikeData");
    info.new_data = Some(new_data);
    info.evaluate = Some(loc_like);
    info
};

pub(crate) const SIZE_LIKE: ConstraintTypeInfo = {
    let mut info = single_target_info(ConstraintType::SizeLike, "SizeLikeData");
    info.new_data = Some(new_data);
    info.evaluate = Some(size_like);
    info
};

fn new_data(data: &mut ConstraintData) {
    match data {
        ConstraintData::RotLike(d) => d.axes = [true; 3],
        ConstraintData::LocLike(d) => d.axes = [true; 3],
        ConstraintData::SizeLike(d) => d.axes = [true; 3],
        _ => {}
    }
}

fn rot_like(
    con: &mut Constraint,
    cob: &mut ConstraintOb,
    targets: &[ConstraintTarget],
    _ctx: &EvalContext<'_>,
) {
    let ConstraintData::RotLike(d) = &con.data else {
        return;
    };
    let Some(ct) = first_valid(targets) else {
        return;
    };
    let loc = cob.matrix.translation();
    let size = cob.matrix.size();
    let own = cob.matrix.euler();
    let mut eul = ct.matrix.euler();
    for i in 0..3 {
        if !d.axes[i] {
            eul[i] = own[i];
            continue;
        }
        if d.use_offset {
            eul = euler_rotate(eul, own[i], i);
        }
        if d.invert[i] {
            eul[i] = -eul[i];
        }
    }
    let eul = compatible_euler(eul, own);
    cob.matrix = loc_euler_size(loc, eul, size);
}

fn loc_like(
    con: &mut Constraint,
    cob: &mut ConstraintOb,
    targets: &[ConstraintTarget],
    _ctx: &EvalContext<'_>,
) {
    let ConstraintData::LocLike(d) = &con.data else {
        return;
    };
    let Some(ct) = first_valid(targets) else {
        return;
    };
    let offset = if d.use_offset {
        cob.matrix.translation()
    } else {
        DVec3::ZERO
    };
    let mut loc = cob.matrix.translation();
    let tar = ct.matrix.translation();
    for i in 0..3 {
        if d.axes[i] {
            let copied = if d.invert[i] { -tar[i] } else { tar[i] };
            loc[i] = copied + offset[i];
        }
    }
    cob.matrix.set_translation(loc);
}

fn size_like(
    con: &mut Constraint,
    cob: &mut ConstraintOb,
    targets: &[ConstraintTarget],
    _ctx: &EvalContext<'_>,
) {
    let ConstraintData::SizeLike(d) = &con.data else {
        return;
    };
    let Some(ct) = first_valid(targets) else {
        return;
    };
    let mut size = ct.matrix.size();
    let own = cob.matrix.size();
    for i in 0..3 {
        if !d.axes[i] {
            continue;
        }
        if d.use_offset {
            size[i] += own[i] - 1.0;
        }
        rescale_axis(&mut cob.matrix, i, own[i], size[i]);
    }
}
