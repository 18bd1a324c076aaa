// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene objects.

use alloc::string::String;
use alloc::vec::Vec;

use glam::{DMat4, DVec3};

use super::id::{ActionId, CurveId, DataId, GroupId, ObjectId};
use super::modifier::{Driver, ForceField, Modifier, ParticleSystem};
use super::pose::Pose;
use crate::constraint::Constraint;
use crate::recalc::{LayerMask, RecalcFlags};
use crate::transform::loc_euler_size;

/// What an object is; decides which relations and parent modes apply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// A bare transform.
    #[default]
    Empty,
    /// Polygon mesh.
    Mesh,
    /// Curve (optionally a path).
    Curve,
    /// NURBS surface.
    Surface,
    /// Text object laid out from a font.
    Font,
    /// Metaball.
    MetaBall,
    /// Lattice deformer.
    Lattice,
    /// Armature with a pose.
    Armature,
    /// Camera.
    Camera,
    /// Lamp.
    Lamp,
}

impl ObjectKind {
    /// Whether objects of this kind carry deformable geometry.
    #[must_use]
    pub const fn has_geometry(self) -> bool {
        matches!(
            self,
            Self::Mesh | Self::Curve | Self::Surface | Self::Font | Self::MetaBall | Self::Lattice
        )
    }
}

/// How a child inherits its parent's transform.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ParentKind {
    /// Plain object parent. A path-enabled curve parent moves the child
    /// along the path.
    #[default]
    Object,
    /// Armature deform parent; transform-only relation.
    Skeletal,
    /// Follows a single vertex of the parent's geometry.
    Vertex(u32),
    /// Follows the triangle spanned by three vertices.
    Vertex3([u32; 3]),
    /// Follows the tail of the named bone.
    Bone(String),
}

/// Parent link of an object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parent {
    /// The parent object.
    pub object: ObjectId,
    /// How the parent's transform is applied.
    pub kind: ParentKind,
}

/// Curve-specific settings, meaningful for [`ObjectKind::Curve`] and
/// [`ObjectKind::Font`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CurveSettings {
    /// Whether the curve is a path children and constraints can follow.
    pub is_path: bool,
    /// Whether path followers are oriented along the path.
    pub follow: bool,
    /// Animation curve that maps time to a path parameter in `0..=1`.
    pub speed_curve: Option<CurveId>,
    /// Object whose curve is swept as the bevel profile.
    pub bevel_object: Option<ObjectId>,
    /// Object whose curve scales the bevel along the path.
    pub taper_object: Option<ObjectId>,
    /// Curve the text of a font object is laid out on.
    pub text_on_curve: Option<ObjectId>,
}

/// A transformable entity in a [`Scene`](super::Scene).
#[derive(Clone, Debug)]
pub struct Object {
    /// Display name; unique names are not enforced.
    pub name: String,
    /// Object kind.
    pub kind: ObjectKind,
    /// Shared data block, if any.
    pub data: Option<DataId>,
    /// Layers the object lives on.
    pub layer: LayerMask,
    /// Parent link.
    pub parent: Option<Parent>,
    /// Inverse of the parent's matrix at parenting time.
    pub parent_inverse: DMat4,
    /// Legacy track target; the object is rotated to look at it.
    pub track: Option<ObjectId>,
    /// Proxy object this object drives.
    pub proxy: Option<ObjectId>,
    /// Group instanced at this object.
    pub dupli_group: Option<GroupId>,
    /// Whether this object instances children on its vertices.
    pub dupli_verts: bool,
    /// Location.
    pub location: DVec3,
    /// XYZ Euler rotation in radians.
    pub rotation: DVec3,
    /// Per-axis scale.
    pub scale: DVec3,
    /// Evaluated world matrix.
    pub world: DMat4,
    /// Inverse of the change the last constraint solve applied.
    pub constraint_inverse: DMat4,
    /// Object-level constraint stack, evaluated in order.
    pub constraints: Vec<Constraint>,
    /// Geometry modifier stack.
    pub modifiers: Vec<Modifier>,
    /// Particle systems.
    pub particle_systems: Vec<ParticleSystem>,
    /// Property drivers.
    pub drivers: Vec<Driver>,
    /// Force field emitted by this object.
    pub field: Option<ForceField>,
    /// Whether particles and soft bodies collide with this object.
    pub deflect: bool,
    /// Pose of an armature.
    pub pose: Option<Pose>,
    /// Curve settings.
    pub curve: CurveSettings,
    /// Camera depth-of-field focus object.
    pub dof_object: Option<ObjectId>,
    /// Whether the geometry has shape keys.
    pub shape_keys: bool,
    /// Whether the active shape key is pinned.
    pub shape_lock: bool,
    /// Action driving the object or its pose.
    pub action: Option<ActionId>,
    /// Which parts of the object are keyframed.
    pub animated: RecalcFlags,
    /// Frame offset subtracted from scene time for this object.
    pub time_offset: f32,
    /// Pending recomputation.
    pub recalc: RecalcFlags,
    /// Whether derived geometry is cached and valid.
    pub derived_valid: bool,
}

impl Object {
    /// Creates an object on layer 0 with an identity transform.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            name: name.into(),
            kind,
            data: None,
            layer: LayerMask::layer(0),
            parent: None,
            parent_inverse: DMat4::IDENTITY,
            track: None,
            proxy: None,
            dupli_group: None,
            dupli_verts: false,
            location: DVec3::ZERO,
            rotation: DVec3::ZERO,
            scale: DVec3::ONE,
            world: DMat4::IDENTITY,
            constraint_inverse: DMat4::IDENTITY,
            constraints: Vec::new(),
            modifiers: Vec::new(),
            particle_systems: Vec::new(),
            drivers: Vec::new(),
            field: None,
            deflect: false,
            pose: None,
            curve: CurveSettings::default(),
            dof_object: None,
            shape_keys: false,
            shape_lock: false,
            action: None,
            animated: RecalcFlags::NONE,
            time_offset: 0.0,
            recalc: RecalcFlags::NONE,
            derived_valid: false,
        }
    }

    /// Sets the location and returns `self`.
    #[must_use]
    pub fn with_location(mut self, location: DVec3) -> Self {
        self.location = location;
        self
    }

    /// Sets the data block and returns `self`.
    #[must_use]
    pub fn with_data(mut self, data: DataId) -> Self {
        self.data = Some(data);
        self
    }

    /// Sets the layer mask and returns `self`.
    #[must_use]
    pub fn with_layer(mut self, layer: LayerMask) -> Self {
        self.layer = layer;
        self
    }

    /// Sets the pose and returns `self`.
    #[must_use]
    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = Some(pose);
        self
    }

    /// `T(location) * R(rotation) * S(scale)`.
    #[must_use]
    pub fn local_matrix(&self) -> DMat4 {
        loc_euler_size(self.location, self.rotation, self.scale)
    }

    /// Whether this is a curve that children and constraints can follow.
    #[must_use]
    pub fn is_path(&self) -> bool {
        self.kind == ObjectKind::Curve && self.curve.is_path
    }

    /// Time in this object's frame of reference.
    #[must_use]
    pub fn local_time(&self, time: f32) -> f32 {
        time - self.time_offset
    }

    /// Whether any enabled modifier simulates a soft body or cloth.
    #[must_use]
    pub fn has_soft_body(&self) -> bool {
        self.modifiers.iter().any(|m| m.enabled && m.kind.is_simulation())
    }

    /// Metaball family name: the part of the name before the first `.`.
    #[must_use]
    pub fn family_name(&self) -> &str {
        self.name.split('.').next().unwrap_or(&self.name)
    }
}
