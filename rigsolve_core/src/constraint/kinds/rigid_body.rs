// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rigid Body Joint: settings for an external physics engine. It has a
//! target but never changes the owner.

use glam::DVec3;

use crate::constraint::registry::ConstraintTypeInfo;
use crate::constraint::target::single_target_info;
use crate::constraint::{ConstraintType, TargetRef};

/// Joint type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JointKind {
    /// Ball and socket.
    #[default]
    BallSocket,
    /// Hinge about the joint axis.
    Hinge,
    /// Six degrees of freedom with limits.
    Generic6Dof,
    /// Cone twist.
    ConeTwist,
}

/// Settings of [`ConstraintType::RigidBodyJoint`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RigidBodyJointData {
    /// The other body.
    pub target: TargetRef,
    /// Joint pivot in the owner's space.
    pub pivot: DVec3,
    /// Joint axis as Euler angles.
    pub axis: DVec3,
    /// Joint type.
    pub kind: JointKind,
}

pub(crate) const INFO: ConstraintTypeInfo =
    single_target_info(ConstraintType::RigidBodyJoint, "RigidBodyJointData");
