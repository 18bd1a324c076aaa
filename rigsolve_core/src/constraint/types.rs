// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Constraint type tags and the per-type settings enum.

use alloc::vec::Vec;

use super::TargetRef;
use super::kinds::{
    ActionData, ChildOfData, ClampToData, DistLimitData, FollowPathData, KinematicData,
    LocLikeData, LocLimitData, LockedTrackData, MinMaxData, PythonData, RigidBodyJointData,
    RotLikeData, RotLimitData, SizeLikeData, SizeLimitData, StretchToData, TrackToData,
    TransformData,
};

/// Constraint type tag. Tag 0 is reserved and never has any operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ConstraintType {
    /// Reserved.
    #[default]
    Null = 0,
    /// Inherit the target's transform like a parent.
    ChildOf = 1,
    /// Point an axis at the target.
    TrackTo = 2,
    /// Inverse kinematics; solved by an external solver.
    Kinematic = 3,
    /// Move along a path curve.
    FollowPath = 4,
    /// Clamp rotation.
    RotLimit = 5,
    /// Clamp location.
    LocLimit = 6,
    /// Clamp scale.
    SizeLimit = 7,
    /// Copy the target's rotation.
    RotLike = 8,
    /// Copy the target's location.
    LocLike = 9,
    /// Copy the target's scale.
    SizeLike = 10,
    /// User script.
    Python = 11,
    /// Apply an action sampled from a target transform channel.
    Action = 12,
    /// Point an axis at the target around a locked axis.
    LockedTrack = 13,
    /// Keep within, outside, or on a sphere around the target.
    DistLimit = 14,
    /// Stretch towards the target, preserving volume.
    StretchTo = 15,
    /// Keep on one side of the target's plane.
    MinMax = 16,
    /// Physics joint marker; evaluated by a physics system.
    RigidBodyJoint = 17,
    /// Clamp onto a path curve.
    ClampTo = 18,
    /// Map one transform channel of the target onto another of the owner.
    Transform = 19,
}

impl ConstraintType {
    /// Number of tags, including [`ConstraintType::Null`].
    pub const COUNT: usize = 20;

    /// Every tag in order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Null,
        Self::ChildOf,
        Self::TrackTo,
        Self::Kinematic,
        Self::FollowPath,
        Self::RotLimit,
        Self::LocLimit,
        Self::SizeLimit,
        Self::RotLike,
        Self::LocLike,
        Self::SizeLike,
        Self::Python,
        Self::Action,
        Self::LockedTrack,
        Self::DistLimit,
        Self::StretchTo,
        Self::MinMax,
        Self::RigidBodyJoint,
        Self::ClampTo,
        Self::Transform,
    ];

    /// Decodes a raw tag; `None` for values outside the tag space.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Option<Self> {
        if (raw as usize) < Self::COUNT {
            Some(Self::ALL[raw as usize])
        } else {
            None
        }
    }

    /// The raw tag.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// Display name, also used as the default constraint name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::ChildOf => "Child Of",
            Self::TrackTo => "Track To",
            Self::Kinematic => "IK",
            Self::FollowPath => "Follow Path",
            Self::RotLimit => "Limit Rotation",
            Self::LocLimit => "Limit Location",
            Self::SizeLimit => "Limit Scale",
            Self::RotLike => "Copy Rotation",
            Self::LocLike => "Copy Location",
            Self::SizeLike => "Copy Scale",
            Self::Python => "Script",
            Self::Action => "Action",
            Self::LockedTrack => "Locked Track",
            Self::DistLimit => "Limit Distance",
            Self::StretchTo => "Stretch To",
            Self::MinMax => "Floor",
            Self::RigidBodyJoint => "Rigid Body Joint",
            Self::ClampTo => "Clamp To",
            Self::Transform => "Transformation",
        }
    }
}

/// A transform channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TransformKind {
    /// Location.
    #[default]
    Location,
    /// Rotation, in radians.
    Rotation,
    /// Scale.
    Scale,
}

impl TransformKind {
    /// Reads the channel's three components from a matrix.
    #[must_use]
    pub fn read(self, m: &glam::DMat4) -> glam::DVec3 {
        use crate::transform::MatrixExt as _;
        match self {
            Self::Location => m.translation(),
            Self::Rotation => m.euler(),
            Self::Scale => m.size(),
        }
    }
}

/// Type-specific constraint settings, one variant per [`ConstraintType`].
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ConstraintData {
    /// No settings.
    #[default]
    Null,
    /// See [`ChildOfData`].
    ChildOf(ChildOfData),
    /// See [`TrackToData`].
    TrackTo(TrackToData),
    /// See [`KinematicData`].
    Kinematic(KinematicData),
    /// See [`FollowPathData`].
    FollowPath(FollowPathData),
    /// See [`RotLimitData`].
    RotLimit(RotLimitData),
    /// See [`LocLimitData`].
    LocLimit(LocLimitData),
    /// See [`SizeLimitData`].
    SizeLimit(SizeLimitData),
    /// See [`RotLikeData`].
    RotLike(RotLikeData),
    /// See [`LocLikeData`].
    LocLike(LocLikeData),
    /// See [`SizeLikeData`].
    SizeLike(SizeLikeData),
    /// See [`PythonData`].
    Python(PythonData),
    /// See [`ActionData`].
    Action(ActionData),
    /// See [`LockedTrackData`].
    LockedTrack(LockedTrackData),
    /// See [`DistLimitData`].
    DistLimit(DistLimitData),
    /// See [`StretchToData`].
    StretchTo(StretchToData),
    /// See [`MinMaxData`].
    MinMax(MinMaxData),
    /// See [`RigidBodyJointData`].
    RigidBodyJoint(RigidBodyJointData),
    /// See [`ClampToData`].
    ClampTo(ClampToData),
    /// See [`TransformData`].
    Transform(TransformData),
}

impl ConstraintData {
    /// All-zero settings for `ty`, before any `new_data` hook has run.
    #[must_use]
    pub fn zeroed(ty: ConstraintType) -> Self {
        match ty {
            ConstraintType::Null => Self::Null,
            ConstraintType::ChildOf => Self::ChildOf(ChildOfData::default()),
            ConstraintType::TrackTo => Self::TrackTo(TrackToData::default()),
            ConstraintType::Kinematic => Self::Kinematic(KinematicData::default()),
            ConstraintType::FollowPath => Self::FollowPath(FollowPathData::default()),
            ConstraintType::RotLimit => Self::RotLimit(RotLimitData::default()),
            ConstraintType::LocLimit => Self::LocLimit(LocLimitData::default()),
            ConstraintType::SizeLimit => Self::SizeLimit(SizeLimitData::default()),
            ConstraintType::RotLike => Self::RotLike(RotLikeData::default()),
            ConstraintType::LocLike => Self::LocLike(LocLikeData::default()),
            ConstraintType::SizeLike => Self::SizeLike(SizeLikeData::default()),
            ConstraintType::Python => Self::Python(PythonData::default()),
            ConstraintType::Action => Self::Action(ActionData::default()),
            ConstraintType::LockedTrack => Self::LockedTrack(LockedTrackData::default()),
            ConstraintType::DistLimit => Self::DistLimit(DistLimitData::default()),
            ConstraintType::StretchTo => Self::StretchTo(StretchToData::default()),
            ConstraintType::MinMax => Self::MinMax(MinMaxData::default()),
            ConstraintType::RigidBodyJoint => {
                Self::RigidBodyJoint(RigidBodyJointData::default())
            }
            ConstraintType::ClampTo => Self::ClampTo(ClampToData::default()),
            ConstraintType::Transform => Self::Transform(TransformData::default()),
        }
    }

    /// The type tag these settings belong to.
    #[must_use]
    pub const fn ty(&self) -> ConstraintType {
        match self {
            Self::Null => ConstraintType::Null,
            Self::ChildOf(_) => ConstraintType::ChildOf,
            Self::TrackTo(_) => ConstraintType::TrackTo,
            Self::Kinematic(_) => ConstraintType::Kinematic,
            Self::FollowPath(_) => ConstraintType::FollowPath,
            Self::RotLimit(_) => ConstraintType::RotLimit,
            Self::LocLimit(_) => ConstraintType::LocLimit,
            Self::SizeLimit(_) => ConstraintType::SizeLimit,
            Self::RotLike(_) => ConstraintType::RotLike,
            Self::LocLike(_) => ConstraintType::LocLike,
            Self::SizeLike(_) => ConstraintType::SizeLike,
            Self::Python(_) => ConstraintType::Python,
            Self::Action(_) => ConstraintType::Action,
            Self::LockedTrack(_) => ConstraintType::LockedTrack,
            Self::DistLimit(_) => ConstraintType::DistLimit,
            Self::StretchTo(_) => ConstraintType::StretchTo,
            Self::MinMax(_) => ConstraintType::MinMax,
            Self::RigidBodyJoint(_) => ConstraintType::RigidBodyJoint,
            Self::ClampTo(_) => ConstraintType::ClampTo,
            Self::Transform(_) => ConstraintType::Transform,
        }
    }

    /// The single stored target of single-target types.
    #[must_use]
    pub fn target(&self) -> Option<&TargetRef> {
        match self {
            Self::ChildOf(d) => Some(&d.target),
            Self::TrackTo(d) => Some(&d.target),
            Self::FollowPath(d) => Some(&d.target),
            Self::RotLike(d) => Some(&d.target),
            Self::LocLike(d) => Some(&d.target),
            Self::SizeLike(d) => Some(&d.target),
            Self::Action(d) => Some(&d.target),
            Self::LockedTrack(d) => Some(&d.target),
            Self::DistLimit(d) => Some(&d.target),
            Self::StretchTo(d) => Some(&d.target),
            Self::MinMax(d) => Some(&d.target),
            Self::RigidBodyJoint(d) => Some(&d.target),
            Self::ClampTo(d) => Some(&d.target),
            Self::Transform(d) => Some(&d.target),
            Self::Null
            | Self::Kinematic(_)
            | Self::RotLimit(_)
            | Self::LocLimit(_)
            | Self::SizeLimit(_)
            | Self::Python(_) => None,
        }
    }

    /// Mutable access to the single stored target.
    pub fn target_mut(&mut self) -> Option<&mut TargetRef> {
        match self {
            Self::ChildOf(d) => Some(&mut d.target),
            Self::TrackTo(d) => Some(&mut d.target),
            Self::FollowPath(d) => Some(&mut d.target),
            Self::RotLike(d) => Some(&mut d.target),
            Self::LocLike(d) => Some(&mut d.target),
            Self::SizeLike(d) => Some(&mut d.target),
            Self::Action(d) => Some(&mut d.target),
            Self::LockedTrack(d) => Some(&mut d.target),
            Self::DistLimit(d) => Some(&mut d.target),
            Self::StretchTo(d) => Some(&mut d.target),
            Self::MinMax(d) => Some(&mut d.target),
            Self::RigidBodyJoint(d) => Some(&mut d.target),
            Self::ClampTo(d) => Some(&mut d.target),
            Self::Transform(d) => Some(&mut d.target),
            Self::Null
            | Self::Kinematic(_)
            | Self::RotLimit(_)
            | Self::LocLimit(_)
            | Self::SizeLimit(_)
            | Self::Python(_) => None,
        }
    }

    /// Every stored target reference, in target order.
    #[must_use]
    pub fn targets(&self) -> Vec<&TargetRef> {
        match self {
            Self::Kinematic(d) => [&d.target, &d.pole]
                .into_iter()
                .filter(|t| t.object.is_some())
                .collect(),
            Self::Python(d) => d.targets.iter().collect(),
            other => other.target().into_iter().collect(),
        }
    }

    /// Mutable access to every stored target reference.
    pub fn targets_mut(&mut self) -> Vec<&mut TargetRef> {
        match self {
            Self::Kinematic(d) => alloc::vec![&mut d.target, &mut d.pole],
            Self::Python(d) => d.targets.iter_mut().collect(),
            other => other.target_mut().into_iter().collect(),
        }
    }
}
