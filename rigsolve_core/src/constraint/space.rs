// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversion of matrices between constraint spaces.
//!
//! Bone owners go through armature (pose) space:
//!
//! | space        | to pose space                 |
//! |--------------|-------------------------------|
//! | world        | `obmat⁻¹ * m`                 |
//! | local        | `parent_frame * m`            |
//! | parent-local | `arm_mat * m`                 |
//!
//! so any conversion is at most two hops. Object owners only distinguish
//! world from local, where local is relative to `parent.obmat * parentinv`;
//! pose and parent-local are treated as world.

use glam::DMat4;

use super::{ConstraintSpace, OwnerRef};
use crate::scene::{Object, Pose, Scene};

/// Converts `matrix` from space `from` to space `to` for `owner`.
///
/// Returns the matrix unchanged if the spaces are equal or the owner no
/// longer exists. A bone owner whose channel is missing is converted as its
/// armature object.
#[must_use]
pub fn convert_space(
    scene: &Scene,
    owner: OwnerRef,
    matrix: &DMat4,
    from: ConstraintSpace,
    to: ConstraintSpace,
) -> DMat4 {
    if from == to {
        return *matrix;
    }
    let Some(ob) = scene.object(owner.object()) else {
        return *matrix;
    };
    if let OwnerRef::Bone(_, idx) = owner
        && let Some(pose) = ob.pose.as_ref()
        && pose.channel(idx).is_some()
    {
        let pose_space = bone_to_pose(ob, pose, idx, matrix, from);
        return bone_from_pose(ob, pose, idx, &pose_space, to);
    }
    let world = object_to_world(scene, ob, matrix, from);
    object_from_world(scene, ob, &world, to)
}

fn bone_to_pose(ob: &Object, pose: &Pose, idx: u32, m: &DMat4, from: ConstraintSpace) -> DMat4 {
    match from {
        ConstraintSpace::World => ob.world.inverse() * *m,
        ConstraintSpace::Pose => *m,
        ConstraintSpace::Local => pose.parent_frame(idx) * *m,
        ConstraintSpace::ParentLocal => arm_mat(pose, idx) * *m,
    }
}

fn bone_from_pose(ob: &Object, pose: &Pose, idx: u32, m: &DMat4, to: ConstraintSpace) -> DMat4 {
    match to {
        ConstraintSpace::World => ob.world * *m,
        ConstraintSpace::Pose => *m,
        ConstraintSpace::Local => pose.parent_frame(idx).inverse() * *m,
        ConstraintSpace::ParentLocal => arm_mat(pose, idx).inverse() * *m,
    }
}

fn arm_mat(pose: &Pose, idx: u32) -> DMat4 {
    pose.channel(idx)
        .map_or(DMat4::IDENTITY, |ch| ch.bone.arm_mat)
}

/// `parent.obmat * parentinv`, or identity for unparented objects.
pub(crate) fn parent_matrix(scene: &Scene, ob: &Object) -> DMat4 {
    ob.parent
        .as_ref()
        .and_then(|p| scene.object(p.object))
        .map_or(DMat4::IDENTITY, |par| par.world * ob.parent_inverse)
}

fn object_to_world(scene: &Scene, ob: &Object, m: &DMat4, from: ConstraintSpace) -> DMat4 {
    match from {
        ConstraintSpace::Local => parent_matrix(scene, ob) * *m,
        _ => *m,
    }
}

fn object_from_world(scene: &Scene, ob: &Object, m: &DMat4, to: ConstraintSpace) -> DMat4 {
    match to {
        ConstraintSpace::Local => parent_matrix(scene, ob).inverse() * *m,
        _ => *m,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Bone, ObjectKind, ParentKind};
    use crate::transform::{MatrixExt, approx_eq, loc_euler_size};
    use glam::{DMat3, DQuat, DVec3};

    fn sample() -> DMat4 {
        loc_euler_size(
            DVec3::new(0.3, -1.2, 2.0),
            DVec3::new(0.4, 0.1, -0.7),
            DVec3::new(1.0, 2.0, 0.5),
        )
    }

    fn rig(hinge: bool) -> (Scene, OwnerRef) {
        let mut pose = Pose::new();
        let root = pose.add_channel(
            "root",
            None,
            Bone::new(DVec3::new(0.0, 0.0, 1.0), 2.0)
                .with_rest(DMat3::from_rotation_x(0.3)),
        );
        let child = pose.add_channel(
            "child",
            Some(root),
            Bone::new(DVec3::ZERO, 1.5)
                .with_rest(DMat3::from_rotation_z(0.5))
                .with_hinge(hinge),
        );
        {
            let ch = pose.channel_mut(root).unwrap();
            ch.rotation = DQuat::from_rotation_y(0.8);
            ch.update_chan_mat();
            ch.pose_mat = ch.bone.arm_mat * ch.chan_mat;
        }
        let frame = pose.parent_frame(child);
        {
            let ch = pose.channel_mut(child).unwrap();
            ch.location = DVec3::new(0.1, 0.0, 0.2);
            ch.update_chan_mat();
            ch.pose_mat = frame * ch.chan_mat;
        }
        let mut arm = Object::new("Armature", ObjectKind::Armature).with_pose(pose);
        arm.world = loc_euler_size(DVec3::new(4.0, 0.0, 0.0), DVec3::new(0.0, 0.0, 1.0), DVec3::ONE);
        let mut scene = Scene::new();
        let id = scene.add_object(arm);
        (scene, OwnerRef::Bone(id, child))
    }

    fn round_trips(scene: &Scene, owner: OwnerRef) {
        let m = sample();
        for from in ConstraintSpace::ALL {
            for to in ConstraintSpace::ALL {
                let there = convert_space(scene, owner, &m, from, to);
                let back = convert_space(scene, owner, &there, to, from);
                assert!(approx_eq(&back, &m, 1e-9), "{from:?} -> {to:?}");
            }
        }
    }

    #[test]
    fn same_space_is_identity() {
        let (scene, owner) = rig(false);
        let m = sample();
        for s in ConstraintSpace::ALL {
            assert_eq!(convert_space(&scene, owner, &m, s, s), m);
        }
    }

    #[test]
    fn bone_round_trips() {
        let (scene, owner) = rig(false);
        round_trips(&scene, owner);
    }

    #[test]
    fn hinge_bone_round_trips() {
        let (scene, owner) = rig(true);
        round_trips(&scene, owner);
    }

    #[test]
    fn local_identity_is_pose_matrix_for_bone() {
        let (scene, owner) = rig(false);
        let OwnerRef::Bone(id, idx) = owner else { unreachable!() };
        let ob = scene.object(id).unwrap();
        let ch = ob.pose.as_ref().unwrap().channel(idx).unwrap();
        let world = convert_space(
            &scene,
            owner,
            &ch.chan_mat,
            ConstraintSpace::Local,
            ConstraintSpace::World,
        );
        assert!(approx_eq(&world, &(ob.world * ch.pose_mat), 1e-9));
    }

    #[test]
    fn object_round_trips() {
        let mut scene = Scene::new();
        let parent = scene.add_object(Object::new("P", ObjectKind::Empty));
        let child = scene.add_object(Object::new("C", ObjectKind::Empty));
        scene.set_parent(child, parent, ParentKind::Object).unwrap();
        scene.object_mut(parent).unwrap().world = sample();
        scene.object_mut(child).unwrap().parent_inverse =
            DMat4::from_translation(DVec3::new(0.0, 1.0, 0.0));
        round_trips(&scene, OwnerRef::Object(child));
        round_trips(&scene, OwnerRef::Object(parent));
    }

    #[test]
    fn object_local_is_relative_to_parent() {
        let mut scene = Scene::new();
        let parent = scene.add_object(Object::new("P", ObjectKind::Empty));
        let child = scene.add_object(Object::new("C", ObjectKind::Empty));
        scene.set_parent(child, parent, ParentKind::Object).unwrap();
        scene.object_mut(parent).unwrap().world = DMat4::from_translation(DVec3::new(1.0, 2.0, 3.0));
        let world = DMat4::from_translation(DVec3::new(1.0, 2.0, 4.0));
        let local = convert_space(
            &scene,
            OwnerRef::Object(child),
            &world,
            ConstraintSpace::World,
            ConstraintSpace::Local,
        );
        assert!((local.translation() - DVec3::new(0.0, 0.0, 1.0)).length() < 1e-12);
    }

    #[test]
    fn stale_owner_is_unchanged() {
        let mut scene = Scene::new();
        let id = scene.add_object(Object::new("A", ObjectKind::Empty));
        scene.remove_object(id).unwrap();
        let m = sample();
        let out = convert_space(
            &scene,
            OwnerRef::Object(id),
            &m,
            ConstraintSpace::World,
            ConstraintSpace::Local,
        );
        assert_eq!(out, m);
    }
}
