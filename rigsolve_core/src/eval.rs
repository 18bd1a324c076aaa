// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame evaluation of world matrices and poses.
//!
//! [`update_scene`] walks the bases in their sorted order and re-evaluates
//! every object with pending recalc flags: the parent chain first, then the
//! object's constraint stack, then the pose of an armature. The base order
//! must come from [`topologically_sort_scene`] so that parents and targets
//! are evaluated before the objects reading them.
//!
//! IK is scheduled here but solved elsewhere. When the walk of a pose reaches
//! the root of a chain ending in a Kinematic constraint, every channel of
//! the chain is posed, the goal (and optional pole) is resolved in armature
//! space, and the chain is handed to an [`IkSolver`] once. Solved channels
//! are not posed again later in the walk.
//!
//! [`topologically_sort_scene`]: crate::graph::topologically_sort_scene

use alloc::vec::Vec;

use glam::{DMat3, DMat4, DVec3};

use crate::constraint::{
    ConstraintData, ConstraintRegistry, ConstraintSpace, OwnerRef, animate_influences,
    constraint_target_matrix, convert_space, evaluate_owner_constraints, path_parameter,
    path_rotation,
};
use crate::provider::{IkChain, IkSolver, Providers};
use crate::recalc::RecalcFlags;
use crate::scene::{ObjectId, ObjectKind, Parent, ParentKind, Pose, Scene};
use crate::trace::{PassBeginEvent, PassEndEvent, PassKind, Tracer};
use crate::transform::{MatrixExt, TrackAxis, UpAxis, loc_quat_size, track_quat};

/// Re-evaluates every base with pending recalc flags, in base order, and
/// clears the flags. Returns how many objects were evaluated.
///
/// Objects are re-parented and constrained through [`where_is_object`];
/// armatures with a pose additionally go through [`where_is_pose`].
pub fn update_scene(
    scene: &mut Scene,
    registry: &ConstraintRegistry,
    providers: Providers<'_>,
    ik: &mut dyn IkSolver,
    time: f32,
    tracer: &mut Tracer<'_>,
) -> usize {
    tracer.pass_begin(&PassBeginEvent {
        pass: PassKind::Solve,
        stamp: 0,
    });
    let mut evaluated = 0;
    for id in scene.bases().to_vec() {
        let Some(ob) = scene.object(id) else {
            continue;
        };
        let recalc = ob.recalc;
        if recalc.is_empty() {
            continue;
        }
        let has_pose = ob.kind == ObjectKind::Armature && ob.pose.is_some();
        where_is_object(scene, id, registry, providers, time, tracer);
        if has_pose {
            where_is_pose(scene, id, registry, providers, ik, time, tracer);
        }
        if let Some(ob) = scene.object_mut(id) {
            if recalc.contains(RecalcFlags::DATA) {
                ob.derived_valid = true;
            }
            ob.recalc = RecalcFlags::NONE;
        }
        evaluated += 1;
    }
    log::debug!("evaluated {evaluated} objects at frame {time}");
    tracer.pass_end(&PassEndEvent {
        pass: PassKind::Solve,
        stamp: 0,
    });
    evaluated
}

/// Computes the world matrix of `id` from its local transform and parent,
/// applies the legacy track target, and solves its constraint stack.
///
/// The parent must already be evaluated. Does nothing for a stale handle.
pub fn where_is_object(
    scene: &mut Scene,
    id: ObjectId,
    registry: &ConstraintRegistry,
    providers: Providers<'_>,
    time: f32,
    tracer: &mut Tracer<'_>,
) {
    let Some(ob) = scene.object(id) else {
        return;
    };
    let ob_time = ob.local_time(time);
    let local = ob.local_matrix();
    let mut world = match &ob.parent {
        Some(parent) => parent_frame(scene, &providers, parent, ob_time) * ob.parent_inverse * local,
        None => local,
    };
    if let Some(track) = ob.track
        && track != id
        && let Some(target) = scene.object(track)
    {
        world = track_towards(&world, target.world.translation());
    }

    let Some(ob) = scene.object_mut(id) else {
        return;
    };
    ob.world = world;
    animate_influences(&mut ob.constraints, providers.anim, ob_time);
    evaluate_owner_constraints(scene, registry, OwnerRef::Object(id), providers, time, tracer);
}

/// The matrix a child is placed in: `parent_frame * parent_inverse * local`.
fn parent_frame(scene: &Scene, providers: &Providers<'_>, parent: &Parent, time: f32) -> DMat4 {
    let Some(par) = scene.object(parent.object) else {
        return DMat4::IDENTITY;
    };
    match &parent.kind {
        ParentKind::Object if par.is_path() => {
            path_frame(scene, providers, parent.object, time).map_or(par.world, |m| par.world * m)
        }
        ParentKind::Object | ParentKind::Skeletal => par.world,
        ParentKind::Bone(name) => {
            let Some(ch) = par.pose.as_ref().and_then(|p| p.find(name).and_then(|i| p.channel(i)))
            else {
                log::warn!("{} has no bone named {name}", par.name);
                return par.world;
            };
            let mut m = ch.pose_mat;
            m.set_translation(m.translation() + m.axis(1) * ch.bone.length);
            par.world * m
        }
        ParentKind::Vertex(index) => providers
            .geometry
            .vertex_position(parent.object, *index)
            .map_or(par.world, |v| {
                DMat4::from_translation(par.world.transform_point3(v))
            }),
        ParentKind::Vertex3(indices) => {
            let mut points = [DVec3::ZERO; 3];
            for (point, &index) in points.iter_mut().zip(indices) {
                let Some(v) = providers.geometry.vertex_position(parent.object, index) else {
                    return par.world;
                };
                *point = par.world.transform_point3(v);
            }
            triangle_frame(points)
        }
    }
}

/// Placement along a path parent at `time` (the child's time), in the
/// curve's local space.
fn path_frame(scene: &Scene, providers: &Providers<'_>, path: ObjectId, time: f32) -> Option<DMat4> {
    let curve = scene.object(path)?;
    let t = path_parameter(scene, providers, path, curve.local_time(time))?;
    let point = providers.geometry.where_on_path(path, t)?;
    let mut m = if curve.curve.follow {
        DMat4::from_quat(path_rotation(&point, TrackAxis::Y, UpAxis::Z))
    } else {
        DMat4::IDENTITY
    };
    m.set_translation(point.position);
    Some(m)
}

/// Frame at the centroid of a triangle: X along the first edge, Z along the
/// normal. Translation only for a degenerate triangle.
fn triangle_frame([a, b, c]: [DVec3; 3]) -> DMat4 {
    let center = (a + b + c) / 3.0;
    let x = (b - a).normalize_or_zero();
    let z = (b - a).cross(c - a).normalize_or_zero();
    if x == DVec3::ZERO || z == DVec3::ZERO {
        return DMat4::from_translation(center);
    }
    let y = z.cross(x);
    let mut m = DMat4::from_mat3(DMat3::from_cols(x, y, z));
    m.set_translation(center);
    m
}

/// Rotates `world` so its Y axis points at `target`, keeping location and
/// scale.
fn track_towards(world: &DMat4, target: DVec3) -> DMat4 {
    let location = world.translation();
    let dir = target - location;
    if dir.length_squared() == 0.0 {
        return *world;
    }
    loc_quat_size(location, track_quat(dir, TrackAxis::Y, UpAxis::Z), world.size())
}

/// An IK chain found on a pose, root first.
#[derive(Debug)]
struct IkPlan {
    tip: u32,
    constraint: usize,
    chain: Vec<u32>,
    solved: bool,
}

fn ik_plans(pose: &Pose) -> Vec<IkPlan> {
    let mut plans = Vec::new();
    for (tip, ch) in (0_u32..).zip(pose.channels()) {
        for (constraint, con) in ch.constraints.iter().enumerate() {
            let ConstraintData::Kinematic(data) = &con.data else {
                continue;
            };
            if con.is_disabled() || con.influence <= 0.0 {
                continue;
            }
            if data.target.object.is_none() && !data.auto_ik {
                continue;
            }
            let start = if data.use_tip { Some(tip) } else { ch.parent };
            let Some(start) = start else {
                continue;
            };
            let chain = pose.chain(start, data.chain_len);
            if !chain.is_empty() {
                plans.push(IkPlan {
                    tip,
                    constraint,
                    chain,
                    solved: false,
                });
            }
        }
    }
    plans
}

/// Poses every channel of `armature` in its evaluation order.
///
/// Each channel gets `pose_mat = parent_frame * chan_mat`, then its
/// constraint stack, then its head and tail. IK chains are posed as a unit
/// when the walk reaches their root and passed to `ik`. Does nothing if the
/// object has no pose.
pub fn where_is_pose(
    scene: &mut Scene,
    armature: ObjectId,
    registry: &ConstraintRegistry,
    providers: Providers<'_>,
    ik: &mut dyn IkSolver,
    time: f32,
    tracer: &mut Tracer<'_>,
) {
    let Some(pose) = scene.object(armature).and_then(|ob| ob.pose.as_ref()) else {
        return;
    };
    let order = pose.order();
    let mut plans = ik_plans(pose);
    let mut done = alloc::vec![false; pose.len()];

    for idx in order {
        for plan in plans.iter_mut().filter(|p| !p.solved && p.chain[0] == idx) {
            solve_ik_chain(scene, armature, registry, providers, ik, plan, time, tracer);
            for &member in &plan.chain {
                done[member as usize] = true;
            }
            plan.solved = true;
        }
        if !done[idx as usize] {
            where_is_pose_channel(scene, armature, idx, registry, providers, time, tracer);
            done[idx as usize] = true;
        }
    }
}

/// Poses one channel from its parent and solves its constraints.
fn where_is_pose_channel(
    scene: &mut Scene,
    armature: ObjectId,
    idx: u32,
    registry: &ConstraintRegistry,
    providers: Providers<'_>,
    time: f32,
    tracer: &mut Tracer<'_>,
) {
    let Some(pose) = scene.object_mut(armature).and_then(|ob| ob.pose.as_mut()) else {
        return;
    };
    let frame = pose.parent_frame(idx);
    let Some(ch) = pose.channel_mut(idx) else {
        return;
    };
    ch.update_chan_mat();
    ch.pose_mat = frame * ch.chan_mat;
    animate_influences(&mut ch.constraints, providers.anim, time);

    evaluate_owner_constraints(scene, registry, OwnerRef::Bone(armature, idx), providers, time, tracer);

    if let Some(ch) = scene
        .object_mut(armature)
        .and_then(|ob| ob.pose.as_mut())
        .and_then(|p| p.channel_mut(idx))
    {
        ch.update_head_tail();
    }
}

fn solve_ik_chain(
    scene: &mut Scene,
    armature: ObjectId,
    registry: &ConstraintRegistry,
    providers: Providers<'_>,
    ik: &mut dyn IkSolver,
    plan: &IkPlan,
    time: f32,
    tracer: &mut Tracer<'_>,
) {
    for &member in &plan.chain {
        where_is_pose_channel(scene, armature, member, registry, providers, time, tracer);
    }

    let owner = OwnerRef::Bone(armature, plan.tip);
    let Some(ob) = scene.object(armature) else {
        return;
    };
    let Some(pose) = ob.pose.as_ref() else {
        return;
    };
    let Some(con) = pose
        .channel(plan.tip)
        .and_then(|ch| ch.constraints.get(plan.constraint))
    else {
        return;
    };
    let ConstraintData::Kinematic(data) = &con.data else {
        return;
    };
    let to_pose = |m: DMat4| convert_space(scene, owner, &m, con.target_space, ConstraintSpace::Pose);
    let goal = match constraint_target_matrix(registry, scene, providers, con, owner, 0, time) {
        Some(m) => to_pose(m),
        None => return,
    };
    let pole = if data.pole.object.is_some() {
        constraint_target_matrix(registry, scene, providers, con, owner, 1, time).map(to_pose)
    } else {
        None
    };
    let lengths: Vec<f64> = plan
        .chain
        .iter()
        .map(|&c| pose.channel(c).map_or(0.0, |ch| ch.bone.length))
        .collect();
    let mut mats: Vec<DMat4> = plan
        .chain
        .iter()
        .map(|&c| pose.channel(c).map_or(DMat4::IDENTITY, |ch| ch.pose_mat))
        .collect();
    let (weight, orient_weight, iterations, tolerance) =
        (data.weight, data.orient_weight, data.iterations, data.tolerance);
    let (use_rotation, use_stretch) = (data.use_rotation, data.use_stretch);

    let mut chain = IkChain {
        armature,
        channels: &plan.chain,
        pose: &mut mats,
        lengths: &lengths,
        weight,
        orient_weight,
        iterations,
        tolerance,
        use_rotation,
        use_stretch,
    };
    ik.solve_chain(&mut chain, &goal, pole.as_ref());

    let Some(pose) = scene.object_mut(armature).and_then(|ob| ob.pose.as_mut()) else {
        return;
    };
    for (&member, mat) in plan.chain.iter().zip(mats) {
        if let Some(ch) = pose.channel_mut(member) {
            ch.pose_mat = mat;
            ch.update_head_tail();
        }
    }
}
