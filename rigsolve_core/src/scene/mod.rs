// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene data model.
//!
//! A [`Scene`] owns:
//!
//! - **Objects** addressed by generational [`ObjectId`] handles. A handle
//!   becomes stale when its object is removed, and every lookup through a
//!   stale handle yields `None`.
//! - The **base list**, the ordered subset of objects linked into the scene.
//!   Sorting rewrites this order so that every object comes after the objects
//!   it depends on.
//! - **Groups**, which may reference objects that are not linked as bases.
//!
//! Armature objects carry a [`Pose`]; object and pose-channel constraint
//! stacks live directly on their owners.

mod id;
mod modifier;
mod object;
mod pose;
mod store;

pub use id::{ActionId, CurveId, DataId, GroupId, ObjectId, ScriptId};
pub use modifier::{
    Driver, DriverSource, ForceField, Modifier, ModifierDependency, ModifierKind, ParticleSystem,
};
pub use object::{CurveSettings, Object, ObjectKind, Parent, ParentKind};
pub use pose::{Bone, Pose, PoseChannel};
pub use store::{Group, Scene};
