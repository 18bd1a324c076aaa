// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Modifiers, particle systems, drivers, and force fields.
//!
//! Only the coupling these carry to other objects matters here: the graph
//! builder turns each reference into a relation. The geometry work they stand
//! for happens outside this crate.

use alloc::string::String;
use alloc::vec::Vec;

use super::id::{GroupId, ObjectId};
use crate::recalc::RelationMask;

/// The kind of a geometry modifier and the objects it reads.
#[derive(Clone, Debug, PartialEq)]
pub enum ModifierKind {
    /// Deforms by an armature.
    Armature(Option<ObjectId>),
    /// Deforms by a lattice.
    Lattice(Option<ObjectId>),
    /// Deforms along a curve.
    Curve(Option<ObjectId>),
    /// Constructive solid geometry against another mesh.
    Boolean(Option<ObjectId>),
    /// Deforms by a cage mesh.
    MeshDeform(Option<ObjectId>),
    /// Repeats geometry, optionally along a curve and by an offset object.
    Array {
        /// Curve that sets the array length.
        curve: Option<ObjectId>,
        /// Object whose transform offsets each copy.
        offset: Option<ObjectId>,
    },
    /// Moves vertices towards a hook object.
    Hook(Option<ObjectId>),
    /// Mirrors about another object's axes.
    Mirror(Option<ObjectId>),
    /// Displaces by a texture in another object's space.
    Displace(Option<ObjectId>),
    /// Casts towards a shape in another object's space.
    Cast(Option<ObjectId>),
    /// Ripples from another object's origin.
    Wave(Option<ObjectId>),
    /// Projects UVs from a list of projector objects.
    UvProject(Vec<ObjectId>),
    /// Soft body simulation.
    Softbody,
    /// Cloth simulation.
    Cloth,
    /// Subdivision; reads no other object.
    Subsurf,
}

impl ModifierKind {
    /// Whether this modifier is a soft body or cloth simulation.
    #[must_use]
    pub const fn is_simulation(&self) -> bool {
        matches!(self, Self::Softbody | Self::Cloth)
    }
}

/// A dependency reported by a modifier: the object read, the relation, and a
/// label for diagnostics.
pub type ModifierDependency = (ObjectId, RelationMask, &'static str);

/// A geometry modifier.
#[derive(Clone, Debug, PartialEq)]
pub struct Modifier {
    /// Kind and references.
    pub kind: ModifierKind,
    /// Disabled modifiers still report their dependencies.
    pub enabled: bool,
}

impl Modifier {
    /// Creates an enabled modifier.
    #[must_use]
    pub fn new(kind: ModifierKind) -> Self {
        Self {
            kind,
            enabled: true,
        }
    }

    /// Appends the objects this modifier reads to `out`.
    pub fn dependencies(&self, out: &mut Vec<ModifierDependency>) {
        let deform = RelationMask::DATA_DATA | RelationMask::OB_DATA;
        let reference = RelationMask::OB_DATA;
        let mut push = |ob: &Option<ObjectId>, mask, name| {
            if let Some(ob) = ob {
                out.push((*ob, mask, name));
            }
        };
        match &self.kind {
            ModifierKind::Armature(ob) => push(ob, deform, "Armature Modifier"),
            ModifierKind::Lattice(ob) => push(ob, deform, "Lattice Modifier"),
            ModifierKind::Curve(ob) => push(ob, deform, "Curve Modifier"),
            ModifierKind::Boolean(ob) => push(ob, deform, "Boolean Modifier"),
            ModifierKind::MeshDeform(ob) => push(ob, deform, "Mesh Deform Modifier"),
            ModifierKind::Array { curve, offset } => {
                push(curve, deform, "Array Modifier");
                push(offset, reference, "Array Modifier");
            }
            ModifierKind::Hook(ob) => push(ob, reference, "Hook Modifier"),
            ModifierKind::Mirror(ob) => push(ob, reference, "Mirror Modifier"),
            ModifierKind::Displace(ob) => push(ob, reference, "Displace Modifier"),
            ModifierKind::Cast(ob) => push(ob, reference, "Cast Modifier"),
            ModifierKind::Wave(ob) => push(ob, reference, "Wave Modifier"),
            ModifierKind::UvProject(projectors) => {
                for p in projectors {
                    push(&Some(*p), reference, "UV Project Modifier");
                }
            }
            ModifierKind::Softbody | ModifierKind::Cloth | ModifierKind::Subsurf => {}
        }
    }
}

/// Kind of force field an object emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForceField {
    /// Radial force.
    Force,
    /// Directional wind.
    Wind,
    /// Swirl around the object's Z axis.
    Vortex,
    /// Magnetic.
    Magnetic,
    /// Spring towards the object.
    Harmonic,
    /// Guides particles along a curve.
    Guide,
}

/// A particle system and the objects it couples to.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParticleSystem {
    /// Disabled systems only keep their self relation.
    pub enabled: bool,
    /// Object whose particles this system is keyed to.
    pub keyed_object: Option<ObjectId>,
    /// Object instanced at every particle.
    pub dupli_object: Option<ObjectId>,
    /// Group instanced at every particle.
    pub dupli_group: Option<GroupId>,
    /// Group effectors are collected from; all layer-sharing objects when
    /// absent.
    pub effector_group: Option<GroupId>,
    /// Object whose particles react to this system.
    pub reactor_target: Option<ObjectId>,
    /// Whether the particles themselves emit a force field.
    pub emits_field: bool,
}

impl ParticleSystem {
    /// Creates an enabled system with no couplings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }
}

/// Where a driver reads its value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DriverSource {
    /// A channel of another object.
    Object {
        /// The object read.
        object: ObjectId,
        /// Whether the channel is a bone of an armature.
        bone: bool,
    },
    /// A script expression; the objects it reads come from the
    /// [`ScriptHost`](crate::provider::ScriptHost).
    Script(String),
}

/// A property driver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Driver {
    /// Value source.
    pub source: DriverSource,
    /// Whether the driven property belongs to the data block (shape keys,
    /// materials) rather than the transform.
    pub drives_data: bool,
}
