// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reordering of scene bases and pose channels into evaluation order.

use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};

use super::build::{build_dependency_graph, build_pose_graph};
use super::node::EntityRef;
use super::traverse::sort_nodes;
use crate::config::BuildConfig;
use crate::constraint::ConstraintRegistry;
use crate::provider::Providers;
use crate::scene::{ObjectId, Scene};
use crate::trace::Tracer;

/// Outcome of [`topologically_sort_scene`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SortReport {
    /// The new base order.
    pub order: Vec<ObjectId>,
    /// Edges closing a dependency cycle, as `(from, to)`.
    pub cycles: Vec<(EntityRef, EntityRef)>,
    /// Bases the sort could not reach from the root; they lead the order.
    pub unreached: Vec<ObjectId>,
}

/// Reorders `scene`'s bases so that every object follows the objects it
/// depends on.
///
/// Bases the sort does not reach from the root, which happens for objects
/// caught in a dependency cycle, are placed first in their previous
/// relative order and logged. Groups whose members are all bases are
/// reordered to match.
pub fn topologically_sort_scene(
    scene: &mut Scene,
    registry: &ConstraintRegistry,
    providers: Providers<'_>,
    tracer: &mut Tracer<'_>,
) -> SortReport {
    let mut graph = build_dependency_graph(scene, registry, providers, BuildConfig::sorting(), tracer);
    let (order, dfs) = sort_nodes(&mut graph, tracer);

    let bases: HashSet<ObjectId> = scene.bases().iter().copied().collect();
    let unreachable: HashSet<ObjectId> = dfs
        .unreachable
        .iter()
        .filter_map(|&n| graph.entity(n).object())
        .collect();

    let mut report = SortReport {
        cycles: dfs
            .back_edges
            .iter()
            .map(|&(from, to)| (graph.entity(from), graph.entity(to)))
            .collect(),
        ..SortReport::default()
    };
    for &id in scene.bases() {
        if unreachable.contains(&id) || graph.find_node(EntityRef::Object(id)).is_none() {
            let name = scene.object(id).map_or("", |ob| ob.name.as_str());
            log::warn!("{name} was not reached while sorting; evaluating it first");
            report.unreached.push(id);
        }
    }
    report.order.clone_from(&report.unreached);
    for node in order {
        if let EntityRef::Object(id) = graph.entity(node)
            && bases.contains(&id)
            && !unreachable.contains(&id)
        {
            report.order.push(id);
        }
    }

    let position: HashMap<ObjectId, usize> =
        report.order.iter().enumerate().map(|(i, &id)| (id, i)).collect();
    for group in scene.groups_mut() {
        if group.objects.iter().all(|id| position.contains_key(id)) {
            group.objects.sort_by_key(|id| position.get(id).copied().unwrap_or(usize::MAX));
        }
    }
    scene.set_bases(report.order.clone());
    report
}

/// Reorders the channels of `armature` so that parents, constraint
/// subtargets, and IK targets come before the channels depending on them,
/// and returns the new order.
///
/// Channels the sort does not reach are placed first by index and logged.
/// Returns an empty order if `armature` has no pose.
pub fn sort_pose(scene: &mut Scene, armature: ObjectId, registry: &ConstraintRegistry) -> Vec<u32> {
    let mut graph = build_pose_graph(scene, armature, registry);
    let (order, dfs) = sort_nodes(&mut graph, &mut Tracer::none());
    let Some(pose) = scene.object_mut(armature).and_then(|ob| ob.pose.as_mut()) else {
        return Vec::new();
    };

    let unreachable: HashSet<u32> = dfs
        .unreachable
        .iter()
        .filter_map(|&n| match graph.entity(n) {
            EntityRef::PoseChannel(_, idx) => Some(idx),
            _ => None,
        })
        .collect();
    let mut sorted: Vec<u32> = (0..pose.len())
        .filter_map(|i| u32::try_from(i).ok())
        .filter(|idx| unreachable.contains(idx))
        .collect();
    for &idx in &sorted {
        let name = pose.channel(idx).map_or("", |ch| ch.name.as_str());
        log::warn!("channel {name} was not reached while sorting the pose; evaluating it first");
    }
    for node in order {
        if let EntityRef::PoseChannel(_, idx) = graph.entity(node)
            && !unreachable.contains(&idx)
        {
            sorted.push(idx);
        }
    }
    pose.set_order(sorted.clone());
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{Constraint, ConstraintData, LocLikeData, TargetRef};
    use crate::scene::{Bone, Object, ObjectKind, ParentKind, Pose};
    use glam::DVec3;

    fn sort(scene: &mut Scene) -> SortReport {
        topologically_sort_scene(
            scene,
            ConstraintRegistry::builtin(),
            Providers::none(),
            &mut Tracer::none(),
        )
    }

    fn copy_location(target: ObjectId) -> Constraint {
        Constraint::new(ConstraintData::LocLike(LocLikeData {
            target: TargetRef::object(target),
            ..LocLikeData::default()
        }))
    }

    #[test]
    fn children_follow_parents() {
        let mut scene = Scene::new();
        let grandchild = scene.add_object(Object::new("Grandchild", ObjectKind::Empty));
        let child = scene.add_object(Object::new("Child", ObjectKind::Empty));
        let root = scene.add_object(Object::new("Root", ObjectKind::Empty));
        scene.set_parent(child, root, ParentKind::Object).unwrap();
        scene.set_parent(grandchild, child, ParentKind::Object).unwrap();

        let report = sort(&mut scene);
        assert_eq!(scene.bases(), &[root, child, grandchild]);
        assert_eq!(report.order, [root, child, grandchild]);
        assert!(report.cycles.is_empty() && report.unreached.is_empty());
    }

    #[test]
    fn constraint_targets_come_first() {
        let mut scene = Scene::new();
        let mut owner = Object::new("Owner", ObjectKind::Empty);
        let target = scene.add_object_unlinked(Object::new("Target", ObjectKind::Empty));
        owner.constraints.push(copy_location(target));
        let owner = scene.add_object(owner);
        scene.link_base(target).unwrap();

        sort(&mut scene);
        assert_eq!(scene.bases(), &[target, owner]);
    }

    #[test]
    fn cycle_members_lead_in_base_order() {
        let mut scene = Scene::new();
        let free = scene.add_object(Object::new("Free", ObjectKind::Empty));
        let a = scene.add_object(Object::new("A", ObjectKind::Empty));
        let b = scene.add_object(Object::new("B", ObjectKind::Empty));
        scene.object_mut(a).unwrap().constraints.push(copy_location(b));
        scene.object_mut(b).unwrap().constraints.push(copy_location(a));

        let report = sort(&mut scene);
        assert_eq!(report.unreached, [a, b]);
        assert_eq!(scene.bases(), &[a, b, free]);
        assert_eq!(report.cycles.len(), 1);
    }

    #[test]
    fn complete_groups_follow_base_order() {
        let mut scene = Scene::new();
        let child = scene.add_object(Object::new("Child", ObjectKind::Empty));
        let parent = scene.add_object(Object::new("Parent", ObjectKind::Empty));
        let outside = scene.add_object_unlinked(Object::new("Outside", ObjectKind::Empty));
        scene.set_parent(child, parent, ParentKind::Object).unwrap();
        let complete = scene.add_group("Complete");
        scene.add_to_group(complete, child).unwrap();
        scene.add_to_group(complete, parent).unwrap();
        let partial = scene.add_group("Partial");
        scene.add_to_group(partial, child).unwrap();
        scene.add_to_group(partial, outside).unwrap();
        scene.add_to_group(partial, parent).unwrap();

        sort(&mut scene);
        assert_eq!(scene.group(complete).unwrap().objects, [parent, child]);
        assert_eq!(scene.group(partial).unwrap().objects, [child, outside, parent]);
    }

    #[test]
    fn pose_channels_follow_parents_and_targets() {
        let mut pose = Pose::new();
        let tip = pose.add_channel("tip", None, Bone::new(DVec3::ZERO, 1.0));
        let root = pose.add_channel("root", None, Bone::new(DVec3::ZERO, 1.0));
        let mid = pose.add_channel("mid", Some(root), Bone::new(DVec3::ZERO, 1.0));
        let mut scene = Scene::new();
        let arm = scene.add_object(Object::new("Rig", ObjectKind::Armature));
        pose.channel_mut(tip)
            .unwrap()
            .constraints
            .push(Constraint::new(ConstraintData::LocLike(LocLikeData {
                target: TargetRef::sub(arm, "mid"),
                ..LocLikeData::default()
            })));
        scene.object_mut(arm).unwrap().pose = Some(pose);

        let order = sort_pose(&mut scene, arm, ConstraintRegistry::builtin());
        let pos = |c| order.iter().position(|&x| x == c).unwrap();
        assert_eq!(order.len(), 3);
        assert!(pos(root) < pos(mid) && pos(mid) < pos(tip));
        let stored = scene.object(arm).unwrap().pose.as_ref().unwrap().order();
        assert_eq!(stored, order);
    }

    #[test]
    fn sort_pose_without_pose_is_empty() {
        let mut scene = Scene::new();
        let id = scene.add_object(Object::new("Empty", ObjectKind::Empty));
        assert!(sort_pose(&mut scene, id, ConstraintRegistry::builtin()).is_empty());
    }
}
