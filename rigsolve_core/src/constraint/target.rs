// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Target resolution shared by most constraint types.

use alloc::vec::Vec;

use glam::{DMat3, DMat4, DVec3};

use super::registry::ConstraintTypeInfo;
use super::space::convert_space;
use super::stack::IdRemap;
use super::{
    Constraint, ConstraintOb, ConstraintSpace, ConstraintTarget, ConstraintType, EvalContext,
    OwnerRef, TargetKind,
};
use crate::provider::Providers;
use crate::scene::{Object, ObjectId, ObjectKind, Scene};
use crate::transform::{MatrixExt, mat4_from_mat3};

/// How a target with this object and sub-target is resolved.
#[must_use]
pub fn target_kind(scene: &Scene, object: Option<ObjectId>, subtarget: &str) -> TargetKind {
    if subtarget.is_empty() {
        return TargetKind::Object;
    }
    match object.and_then(|id| scene.object(id)).map(|ob| ob.kind) {
        Some(ObjectKind::Armature) => TargetKind::Bone,
        Some(ObjectKind::Mesh | ObjectKind::Lattice) => TargetKind::VertexGroup,
        _ => TargetKind::Object,
    }
}

/// The matrix of `object` (or of its bone or vertex group named
/// `subtarget`) expressed in `space`.
///
/// - no sub-target: the world matrix;
/// - bone: `obmat * pose_mat`, moved `head_tail` of the way to the tail;
/// - vertex group: placed at the group centre, and for meshes oriented
///   along the average normal.
///
/// Unknown bones and groups fall back to the object matrix. A stale object
/// yields identity.
#[must_use]
pub fn target_to_matrix(
    scene: &Scene,
    providers: &Providers<'_>,
    object: ObjectId,
    subtarget: &str,
    space: ConstraintSpace,
    head_tail: f32,
) -> DMat4 {
    let Some(ob) = scene.object(object) else {
        return DMat4::IDENTITY;
    };
    if subtarget.is_empty() {
        return convert_space(scene, OwnerRef::Object(object), &ob.world, ConstraintSpace::World, space);
    }
    match ob.kind {
        ObjectKind::Armature => {
            let channel = ob.pose.as_ref().and_then(|p| p.find(subtarget));
            match channel {
                Some(idx) => {
                    let world = bone_matrix(ob, idx, head_tail);
                    convert_space(scene, OwnerRef::Bone(object, idx), &world, ConstraintSpace::World, space)
                }
                None => convert_space(scene, OwnerRef::Object(object), &ob.world, ConstraintSpace::World, space),
            }
        }
        ObjectKind::Mesh | ObjectKind::Lattice => {
            let world = vertex_group_matrix(providers, object, ob, subtarget);
            convert_space(scene, OwnerRef::Object(object), &world, ConstraintSpace::World, space)
        }
        _ => convert_space(scene, OwnerRef::Object(object), &ob.world, ConstraintSpace::World, space),
    }
}

fn bone_matrix(ob: &Object, idx: u32, head_tail: f32) -> DMat4 {
    let Some(ch) = ob.pose.as_ref().and_then(|p| p.channel(idx)) else {
        return ob.world;
    };
    if head_tail < 1.0e-6 {
        return ob.world * ch.pose_mat;
    }
    let mut m = ch.pose_mat;
    m.set_translation(ch.pose_head.lerp(ch.pose_tail, f64::from(head_tail)));
    ob.world * m
}

fn vertex_group_matrix(providers: &Providers<'_>, id: ObjectId, ob: &Object, group: &str) -> DMat4 {
    let Some(sample) = providers.geometry.vertex_group(id, group) else {
        return ob.world;
    };
    let obmat3 = DMat3::from_mat4(ob.world);
    let mut m = ob.world;
    if ob.kind == ObjectKind::Mesh
        && let Some(n) = sample.normal
    {
        let normal = (obmat3.inverse().transpose() * n).normalize_or_zero();
        if normal != DVec3::ZERO {
            let mut x = normal.cross(obmat3.y_axis);
            if x.length() < 1.0e-3 {
                x = normal.cross(obmat3.x_axis);
            }
            let y = normal.cross(x);
            let rot = DMat3::from_cols(
                x.normalize_or_zero(),
                y.normalize_or_zero(),
                normal,
            );
            m = mat4_from_mat3(&rot);
        }
    }
    m.set_translation(ob.world.transform_point3(sample.center));
    m
}

/// Stored target of a single-target type as a one-element list.
pub(crate) fn single_get_targets(
    con: &Constraint,
    scene: &Scene,
    out: &mut Vec<ConstraintTarget>,
) -> usize {
    let Some(t) = con.data.target() else {
        return 0;
    };
    let kind = target_kind(scene, t.object, &t.subtarget);
    out.push(ConstraintTarget::new(t, con.target_space, kind));
    1
}

/// Writes the first target back into a single-target type.
pub(crate) fn single_flush_targets(
    con: &mut Constraint,
    list: &mut Vec<ConstraintTarget>,
    discard: bool,
) {
    if !discard
        && let Some(ct) = list.first()
    {
        con.target_space = ct.space;
        if let Some(t) = con.data.target_mut() {
            t.object = ct.object;
            t.subtarget.clone_from(&ct.subtarget);
        }
    }
    list.clear();
}

/// Resolves `ct` with [`target_to_matrix`]; identity if it has no object or
/// the object was removed.
pub(crate) fn default_target_matrix(
    con: &Constraint,
    _cob: &ConstraintOb,
    ct: &mut ConstraintTarget,
    ctx: &EvalContext<'_>,
) {
    mark_stale(ct, ctx.scene);
    ct.matrix = match ct.object {
        Some(ob) if !ct.stale => {
            target_to_matrix(ctx.scene, &ctx.providers, ob, &ct.subtarget, ct.space, con.head_tail)
        }
        _ => DMat4::IDENTITY,
    };
}

/// Flags `ct` as stale when its object handle no longer resolves.
pub(crate) fn mark_stale(ct: &mut ConstraintTarget, scene: &Scene) {
    ct.stale = ct.object.is_some_and(|id| !scene.contains(id));
}

/// Rewrites every stored target that the remap knows about.
pub(crate) fn relink_targets(con: &mut Constraint, remap: &dyn IdRemap) {
    for t in con.data.targets_mut() {
        if let Some(old) = t.object
            && let Some(new) = remap.remap(old)
        {
            t.object = Some(new);
        }
    }
}

/// Whether a resolved target refers to a live object.
pub(crate) fn is_valid(ct: &ConstraintTarget) -> bool {
    ct.object.is_some() && !ct.stale
}

/// The first resolved target, if it refers to something.
pub(crate) fn first_valid(targets: &[ConstraintTarget]) -> Option<&ConstraintTarget> {
    targets.first().filter(|ct| is_valid(ct))
}

/// Entry for a type with one stored target and the default target matrix.
pub(crate) const fn single_target_info(
    ty: ConstraintType,
    struct_name: &'static str,
) -> ConstraintTypeInfo {
    let mut info = ConstraintTypeInfo::empty(ty, struct_name);
    info.relink_data = Some(relink_targets);
    info.get_targets = Some(single_get_targets);
    info.flush_targets = Some(single_flush_targets);
    info.get_target_matrix = Some(default_target_matrix);
    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{ConstraintData, LocLikeData, TargetRef};
    use crate::provider::{GeometryProvider, VertexGroupSample};
    use crate::scene::{Bone, Pose};
    use alloc::string::String;
    use alloc::vec;

    struct Groups;

    impl GeometryProvider for Groups {
        fn vertex_group(&self, _object: ObjectId, group: &str) -> Option<VertexGroupSample> {
            (group == "top").then_some(VertexGroupSample {
                center: DVec3::new(0.0, 0.0, 1.0),
                normal: Some(DVec3::X),
            })
        }
    }

    fn armature_scene() -> (Scene, ObjectId) {
        let mut pose = Pose::new();
        let idx = pose.add_channel("arm", None, Bone::new(DVec3::ZERO, 2.0));
        let ch = pose.channel_mut(idx).unwrap();
        ch.pose_mat = ch.bone.arm_mat;
        ch.update_head_tail();
        let mut ob = Object::new("Rig", ObjectKind::Armature).with_pose(pose);
        ob.world = DMat4::from_translation(DVec3::new(1.0, 0.0, 0.0));
        let mut scene = Scene::new();
        let id = scene.add_object(ob);
        (scene, id)
    }

    #[test]
    fn kind_follows_object_and_subtarget() {
        let (mut scene, rig) = armature_scene();
        let mesh = scene.add_object(Object::new("M", ObjectKind::Mesh));
        assert_eq!(target_kind(&scene, Some(rig), ""), TargetKind::Object);
        assert_eq!(target_kind(&scene, Some(rig), "arm"), TargetKind::Bone);
        assert_eq!(target_kind(&scene, Some(mesh), "grp"), TargetKind::VertexGroup);
        assert_eq!(target_kind(&scene, None, "grp"), TargetKind::Object);
    }

    #[test]
    fn bone_head_tail_lerps() {
        let (scene, rig) = armature_scene();
        let p = Providers::none();
        let head = target_to_matrix(&scene, &p, rig, "arm", ConstraintSpace::World, 0.0);
        let mid = target_to_matrix(&scene, &p, rig, "arm", ConstraintSpace::World, 0.5);
        assert!((head.translation() - DVec3::new(1.0, 0.0, 0.0)).length() < 1e-12);
        assert!((mid.translation() - DVec3::new(1.0, 1.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn unknown_bone_uses_object() {
        let (scene, rig) = armature_scene();
        let m = target_to_matrix(&scene, &Providers::none(), rig, "nope", ConstraintSpace::World, 0.0);
        assert_eq!(m, scene.object(rig).unwrap().world);
    }

    #[test]
    fn mesh_group_is_placed_and_oriented() {
        let mut scene = Scene::new();
        let mut ob = Object::new("M", ObjectKind::Mesh);
        ob.world = DMat4::from_translation(DVec3::new(0.0, 2.0, 0.0));
        let id = scene.add_object(ob);
        let groups = Groups;
        let p = Providers::none().with_geometry(&groups);
        let m = target_to_matrix(&scene, &p, id, "top", ConstraintSpace::World, 0.0);
        assert!((m.translation() - DVec3::new(0.0, 2.0, 1.0)).length() < 1e-12);
        assert!((m.axis(2) - DVec3::X).length() < 1e-12);
        let fallback = target_to_matrix(&scene, &p, id, "other", ConstraintSpace::World, 0.0);
        assert_eq!(fallback, scene.object(id).unwrap().world);
    }

    #[test]
    fn stale_target_is_identity() {
        let mut scene = Scene::new();
        let id = scene.add_object(Object::new("A", ObjectKind::Empty));
        scene.remove_object(id).unwrap();
        let m = target_to_matrix(&scene, &Providers::none(), id, "", ConstraintSpace::World, 0.0);
        assert_eq!(m, DMat4::IDENTITY);
    }

    #[test]
    fn removed_target_is_not_valid() {
        let mut scene = Scene::new();
        let id = scene.add_object(Object::new("A", ObjectKind::Empty));
        let con = Constraint::new(ConstraintData::LocLike(LocLikeData::new(TargetRef::object(id))));
        let mut list = Vec::new();
        single_get_targets(&con, &scene, &mut list);
        mark_stale(&mut list[0], &scene);
        assert!(first_valid(&list).is_some());

        scene.remove_object(id).unwrap();
        mark_stale(&mut list[0], &scene);
        assert!(list[0].stale);
        assert!(first_valid(&list).is_none());
    }

    #[test]
    fn single_flush_writes_back_unless_discarding() {
        let scene = Scene::new();
        let mut con = Constraint::new(ConstraintData::LocLike(LocLikeData::default()));
        let mut list = Vec::new();
        assert_eq!(single_get_targets(&con, &scene, &mut list), 1);
        list[0].subtarget = String::from("edited");
        list[0].space = ConstraintSpace::Local;
        let mut copy = list.clone();
        single_flush_targets(&mut con, &mut list, true);
        assert!(list.is_empty());
        assert_eq!(con.data.target(), Some(&TargetRef::default()));
        single_flush_targets(&mut con, &mut copy, false);
        assert_eq!(con.data.target().unwrap().subtarget, "edited");
        assert_eq!(con.target_space, ConstraintSpace::Local);
    }

    #[test]
    fn relink_updates_known_ids() {
        let a = ObjectId { idx: 1, generation: 0 };
        let b = ObjectId { idx: 2, generation: 0 };
        let mut con = Constraint::new(ConstraintData::LocLike(LocLikeData {
            target: TargetRef::object(a),
            ..LocLikeData::default()
        }));
        let map = |id: ObjectId| (id == a).then_some(b);
        relink_targets(&mut con, &map);
        assert_eq!(con.data.target().unwrap().object, Some(b));
        let targets = vec![ConstraintTarget::new(&TargetRef::default(), ConstraintSpace::World, TargetKind::Object)];
        assert!(first_valid(&targets).is_none());
    }
}
