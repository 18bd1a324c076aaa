// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-type settings and operations. Each module exports the registry
//! entry of its type(s).

pub(crate) mod action;
pub(crate) mod child_of;
pub(crate) mod clamp_to;
pub(crate) mod copy;
pub(crate) mod dist_limit;
pub(crate) mod follow_path;
pub(crate) mod kinematic;
pub(crate) mod limit;
pub(crate) mod locked_track;
pub(crate) mod min_max;
pub(crate) mod python;
pub(crate) mod rigid_body;
pub(crate) mod stretch_to;
pub(crate) mod track_to;
pub(crate) mod transformation;

pub use action::ActionData;
pub use child_of::ChildOfData;
pub use clamp_to::{ClampAxis, ClampToData};
pub use copy::{LocLikeData, RotLikeData, SizeLikeData};
pub use dist_limit::{DistLimitData, DistLimitMode};
pub use follow_path::FollowPathData;
pub use kinematic::KinematicData;
pub use limit::{LocLimitData, RotLimitData, SizeLimitData};
pub use locked_track::LockedTrackData;
pub use min_max::MinMaxData;
pub use python::{PropValue, PropertyBag, PythonData};
pub use rigid_body::{JointKind, RigidBodyJointData};
pub use stretch_to::{StretchPlane, StretchToData, VolumeMode};
pub use track_to::TrackToData;
pub use transformation::TransformData;

use glam::{DMat3, DMat4, DVec3};

use crate::transform::{MatrixExt, mat4_from_mat3};

/// Replaces the rotation of `m` with `rot`, keeping its scale and
/// translation.
pub(crate) fn with_rotation(m: &DMat4, rot: &DMat3) -> DMat4 {
    let size = m.size();
    let mut out = mat4_from_mat3(&DMat3::from_cols(
        rot.x_axis * size.x,
        rot.y_axis * size.y,
        rot.z_axis * size.z,
    ));
    out.set_translation(m.translation());
    out
}

/// Rescales axis `i` of `m` from length `from` to `to`; no-op for a
/// degenerate axis.
pub(crate) fn rescale_axis(m: &mut DMat4, i: usize, from: f64, to: f64) {
    if from != 0.0 {
        let axis: DVec3 = m.axis(i);
        m.set_axis(i, axis * (to / from));
    }
}
