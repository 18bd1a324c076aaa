// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Constraints: data model, registry, space conversion, and the solver.
//!
//! A constraint is a typed rule that rewrites its owner's world matrix from
//! the matrices of zero or more targets. Owners are objects or pose channels
//! ([`OwnerRef`]); each owns an ordered stack that is evaluated front to back
//! by [`solve_constraints`], every entry blended with its influence.
//!
//! Per-type behaviour lives in a static table of [`ConstraintTypeInfo`]
//! records ([`ConstraintRegistry::builtin`]). Every operation slot is
//! optional; an absent slot means the type does not support it.

use alloc::string::String;

use glam::DMat4;

use crate::provider::Providers;
use crate::scene::{CurveId, ObjectId, Scene};

mod kinds;
mod registry;
mod solver;
mod space;
mod stack;
mod target;
mod types;

pub(crate) use kinds::follow_path::{path_parameter, path_rotation};
pub use kinds::{
    ActionData, ChildOfData, ClampAxis, ClampToData, DistLimitData, DistLimitMode, FollowPathData,
    JointKind, KinematicData, LocLikeData, LocLimitData, LockedTrackData, MinMaxData, PropValue,
    PropertyBag, PythonData, RigidBodyJointData, RotLikeData, RotLimitData, SizeLikeData,
    SizeLimitData, StretchPlane, StretchToData, TrackToData, TransformData, VolumeMode,
};
pub use registry::{
    ConstraintRegistry, ConstraintTypeInfo, CopyDataFn, EvaluateFn, FlushTargetsFn, FreeDataFn,
    GetTargetsFn, NewDataFn, RelinkDataFn, TargetMatrixFn,
};
pub use solver::{
    animate_influences, constraint_target_matrix, evaluate_owner_constraints, solve_constraints,
};
pub use space::convert_space;
pub use stack::{
    IdRemap, add_constraint_to_stack, copy_constraint_stack, find_constraint,
    free_constraint_stack, relink_constraint_stack, remove_constraint, unique_constraint_name,
    validate_targets,
};
pub use target::{target_kind, target_to_matrix};
pub use types::{ConstraintData, ConstraintType, TransformKind};

/// Bit set of per-constraint flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ConstraintFlags(pub u16);

impl ConstraintFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// The constraint is skipped; set for invalid targets.
    pub const DISABLE: Self = Self(1);
    /// Local to a proxy; kept when the proxy is resynced.
    pub const PROXY_LOCAL: Self = Self(2);
    /// Stay in owner space after evaluation instead of converting back.
    pub const SPACE_ONCE: Self = Self(4);
    /// Influence is driven by [`Constraint::influence_curve`].
    pub const OWN_CURVE: Self = Self(8);

    /// Returns `true` if every bit of `other` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Sets the bits of `other`.
    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clears the bits of `other`.
    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Sets or clears the bits of `other`.
    #[inline]
    pub fn set(&mut self, other: Self, on: bool) {
        if on {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }
}

/// Coordinate space a constraint reads or writes matrices in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConstraintSpace {
    /// World space.
    #[default]
    World = 0,
    /// Owner-local space: relative to the parent (objects) or to the rest
    /// pose within the parent bone (bones).
    Local = 1,
    /// Armature space; bones only.
    Pose = 2,
    /// Rest-relative armature space; bones only.
    ParentLocal = 3,
}

impl ConstraintSpace {
    /// Every space.
    pub const ALL: [Self; 4] = [Self::World, Self::Local, Self::Pose, Self::ParentLocal];
}

/// A reference to a target object plus an optional sub-target (bone or
/// vertex group name).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetRef {
    /// Target object.
    pub object: Option<ObjectId>,
    /// Bone or vertex-group name; empty for the whole object.
    pub subtarget: String,
}

impl TargetRef {
    /// Targets a whole object.
    #[must_use]
    pub fn object(object: ObjectId) -> Self {
        Self {
            object: Some(object),
            subtarget: String::new(),
        }
    }

    /// Targets a bone or vertex group of an object.
    #[must_use]
    pub fn sub(object: ObjectId, subtarget: impl Into<String>) -> Self {
        Self {
            object: Some(object),
            subtarget: subtarget.into(),
        }
    }
}

/// A constraint instance in an owner's stack.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    /// Name, unique within the stack.
    pub name: String,
    /// Type tag.
    pub ty: ConstraintType,
    /// Type-specific settings.
    pub data: ConstraintData,
    /// Flags.
    pub flags: ConstraintFlags,
    /// Blend weight in `0..=1`.
    pub influence: f32,
    /// Space the owner matrix is converted to before evaluation.
    pub owner_space: ConstraintSpace,
    /// Space target matrices are expressed in.
    pub target_space: ConstraintSpace,
    /// Curve driving the influence when [`ConstraintFlags::OWN_CURVE`] is set.
    pub influence_curve: Option<CurveId>,
    /// Position along a bone target, 0 at the head and 1 at the tail.
    pub head_tail: f32,
}

impl Constraint {
    /// Creates a constraint around the given settings, named after its type,
    /// with full influence and world spaces.
    #[must_use]
    pub fn new(data: ConstraintData) -> Self {
        let ty = data.ty();
        Self {
            name: String::from(ty.name()),
            ty,
            data,
            flags: ConstraintFlags::NONE,
            influence: 1.0,
            owner_space: ConstraintSpace::World,
            target_space: ConstraintSpace::World,
            influence_curve: None,
            head_tail: 0.0,
        }
    }

    /// Sets the influence, clamped to `0..=1`.
    pub fn set_influence(&mut self, influence: f32) {
        self.influence = if influence.is_nan() {
            0.0
        } else {
            influence.clamp(0.0, 1.0)
        };
    }

    /// Sets the influence and returns `self`.
    #[must_use]
    pub fn with_influence(mut self, influence: f32) -> Self {
        self.set_influence(influence);
        self
    }

    /// Sets both spaces and returns `self`.
    #[must_use]
    pub fn with_spaces(mut self, owner: ConstraintSpace, target: ConstraintSpace) -> Self {
        self.owner_space = owner;
        self.target_space = target;
        self
    }

    /// Whether the disable flag is set.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.flags.contains(ConstraintFlags::DISABLE)
    }
}

/// How a target matrix was derived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// The target object's matrix.
    #[default]
    Object,
    /// A bone of an armature target.
    Bone,
    /// A vertex group of a mesh or lattice target.
    VertexGroup,
}

/// A target resolved for one evaluation; owned by the solver and discarded
/// after the constraint has run.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstraintTarget {
    /// Target object.
    pub object: Option<ObjectId>,
    /// Bone or vertex-group name.
    pub subtarget: String,
    /// Space `matrix` is expressed in.
    pub space: ConstraintSpace,
    /// Resolved matrix.
    pub matrix: DMat4,
    /// How the matrix is derived.
    pub kind: TargetKind,
    /// Always `true` for solver-owned targets.
    pub temp: bool,
    /// Set when `object` no longer resolves in the scene. Stale targets keep
    /// an identity matrix and are ignored by every type.
    pub stale: bool,
}

impl ConstraintTarget {
    /// Creates a transient target with an identity matrix.
    #[must_use]
    pub fn new(target: &TargetRef, space: ConstraintSpace, kind: TargetKind) -> Self {
        Self {
            object: target.object,
            subtarget: target.subtarget.clone(),
            space,
            matrix: DMat4::IDENTITY,
            kind,
            temp: true,
            stale: false,
        }
    }
}

/// The owner of a constraint stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OwnerRef {
    /// An object.
    Object(ObjectId),
    /// A pose channel of an armature object.
    Bone(ObjectId, u32),
}

impl OwnerRef {
    /// The object, or the armature of a bone.
    #[must_use]
    pub const fn object(self) -> ObjectId {
        match self {
            Self::Object(id) | Self::Bone(id, _) => id,
        }
    }
}

/// The working state of one stack solve: the owner and its world matrix.
///
/// Created by [`ConstraintOb::make`] and written back by
/// [`ConstraintOb::clear`].
#[derive(Clone, Debug, PartialEq)]
pub struct ConstraintOb {
    /// The owner being solved.
    pub owner: OwnerRef,
    /// Matrix being rewritten; world space between constraints.
    pub matrix: DMat4,
    /// Matrix before the first constraint ran.
    pub start_matrix: DMat4,
}

/// What constraint operations can read during evaluation.
#[derive(Clone, Copy, Debug)]
pub struct EvalContext<'a> {
    /// The scene, read-only. The owner's own stack is detached while it is
    /// solved.
    pub scene: &'a Scene,
    /// External collaborators.
    pub providers: Providers<'a>,
    /// Scene time in frames.
    pub time: f32,
}
