// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Seams to the systems this crate does not own.
//!
//! Keyframe evaluation, geometry queries, scripting, and IK solving are
//! supplied by the embedding application through these traits. Every method
//! has a neutral default (`None`, no-op, empty), so an implementation only
//! overrides what it actually provides. [`NoProvider`] implements all of them
//! with the defaults.

use alloc::vec::Vec;
use core::fmt;

use glam::{DMat4, DVec3};

use crate::constraint::{ConstraintTarget, PropertyBag};
use crate::scene::{ActionId, CurveId, ObjectId, ScriptId};

/// A sample along a path curve, in the curve object's local space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathPoint {
    /// Position on the path.
    pub position: DVec3,
    /// Tangent direction at the position.
    pub direction: DVec3,
    /// Tilt about the tangent, in radians.
    pub tilt: f64,
}

/// Summary of a vertex group, in the owning object's local space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexGroupSample {
    /// Weighted centre of the group.
    pub center: DVec3,
    /// Average normal; meshes only.
    pub normal: Option<DVec3>,
}

/// Evaluates animation curves and actions.
pub trait AnimEvaluator {
    /// Value of `curve` at `time`, or `None` if the curve is unknown.
    fn evaluate(&self, curve: CurveId, time: f32) -> Option<f32> {
        _ = (curve, time);
        None
    }

    /// Local transform keyed by `action` at `time`. `channel` names the pose
    /// channel for bone owners and is `None` for objects.
    fn sample_action(&self, action: ActionId, channel: Option<&str>, time: f32) -> Option<DMat4> {
        _ = (action, channel, time);
        None
    }
}

/// Answers geometry queries about objects.
pub trait GeometryProvider {
    /// Position of vertex `index` in object space.
    fn vertex_position(&self, object: ObjectId, index: u32) -> Option<DVec3> {
        _ = (object, index);
        None
    }

    /// Centre and normal of the named vertex group.
    fn vertex_group(&self, object: ObjectId, group: &str) -> Option<VertexGroupSample> {
        _ = (object, group);
        None
    }

    /// Sample of the path curve at parameter `t` in `0..=1`.
    fn where_on_path(&self, object: ObjectId, t: f64) -> Option<PathPoint> {
        _ = (object, t);
        None
    }

    /// Length of the path in evaluation frames; `None` if no path exists.
    fn path_length(&self, object: ObjectId) -> Option<f64> {
        _ = object;
        None
    }

    /// Asks the provider to build the path of a curve if it is missing.
    fn ensure_path(&self, object: ObjectId) {
        _ = object;
    }

    /// Object-space bounding box as `(min, max)`.
    fn bounds(&self, object: ObjectId) -> Option<(DVec3, DVec3)> {
        _ = object;
        None
    }
}

/// Runs user scripts for scripted constraints and drivers.
pub trait ScriptHost {
    /// Lets the script override a target matrix. `target.matrix` holds the
    /// default matrix on entry.
    fn target_matrix(
        &self,
        script: ScriptId,
        props: &PropertyBag,
        target: &ConstraintTarget,
    ) -> Option<DMat4> {
        _ = (script, props, target);
        None
    }

    /// Computes the owner matrix from the owner and target matrices.
    /// Returning `None` reports a script error.
    fn compute(
        &self,
        script: ScriptId,
        props: &PropertyBag,
        owner: &DMat4,
        targets: &[DMat4],
    ) -> Option<DMat4> {
        _ = (script, props, owner, targets);
        None
    }

    /// Objects a driver expression reads.
    fn driver_objects(&self, expression: &str) -> Vec<ObjectId> {
        _ = expression;
        Vec::new()
    }
}

/// An IK chain handed to an [`IkSolver`], ordered root first.
#[derive(Debug)]
pub struct IkChain<'a> {
    /// The armature object.
    pub armature: ObjectId,
    /// Channel indices, root first.
    pub channels: &'a [u32],
    /// Pose matrices (armature space) of the channels, updated in place.
    pub pose: &'a mut [DMat4],
    /// Bone lengths of the channels.
    pub lengths: &'a [f64],
    /// Position weight.
    pub weight: f32,
    /// Rotation weight.
    pub orient_weight: f32,
    /// Iteration cap.
    pub iterations: u16,
    /// Convergence tolerance.
    pub tolerance: f32,
    /// Whether the goal rotation is matched too.
    pub use_rotation: bool,
    /// Whether bones may stretch.
    pub use_stretch: bool,
}

/// Solves IK chains. Scheduling is done by
/// [`where_is_pose`](crate::eval::where_is_pose); the numerics are external.
pub trait IkSolver {
    /// Moves the chain's pose matrices towards `goal` (armature space),
    /// optionally bending towards `pole`.
    fn solve_chain(&mut self, chain: &mut IkChain<'_>, goal: &DMat4, pole: Option<&DMat4>) {
        _ = (chain, goal, pole);
    }
}

/// Implements every provider trait with its defaults.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProvider;

impl AnimEvaluator for NoProvider {}
impl GeometryProvider for NoProvider {}
impl ScriptHost for NoProvider {}
impl IkSolver for NoProvider {}

/// The lookups evaluation needs, bundled.
#[derive(Clone, Copy)]
pub struct Providers<'a> {
    /// Curve and action evaluation.
    pub anim: &'a dyn AnimEvaluator,
    /// Geometry queries.
    pub geometry: &'a dyn GeometryProvider,
    /// Script execution.
    pub scripts: &'a dyn ScriptHost,
}

impl fmt::Debug for Providers<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Providers").finish_non_exhaustive()
    }
}

impl Default for Providers<'static> {
    fn default() -> Self {
        Self::none()
    }
}

impl Providers<'static> {
    /// Providers that answer nothing.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            anim: &NoProvider,
            geometry: &NoProvider,
            scripts: &NoProvider,
        }
    }
}

impl<'a> Providers<'a> {
    /// Replaces the animation evaluator.
    #[must_use]
    pub fn with_anim<'b>(self, anim: &'b dyn AnimEvaluator) -> Providers<'b>
    where
        'a: 'b,
    {
        Providers {
            anim,
            geometry: self.geometry,
            scripts: self.scripts,
        }
    }

    /// Replaces the geometry provider.
    #[must_use]
    pub fn with_geometry<'b>(self, geometry: &'b dyn GeometryProvider) -> Providers<'b>
    where
        'a: 'b,
    {
        Providers {
            anim: self.anim,
            geometry,
            scripts: self.scripts,
        }
    }

    /// Replaces the script host.
    #[must_use]
    pub fn with_scripts<'b>(self, scripts: &'b dyn ScriptHost) -> Providers<'b>
    where
        'a: 'b,
    {
        Providers {
            anim: self.anim,
            geometry: self.geometry,
            scripts,
        }
    }
}
