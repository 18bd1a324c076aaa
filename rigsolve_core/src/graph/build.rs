// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Construction of dependency graphs from a scene.
//!
//! Every coupling an object has with another one becomes an edge from the
//! object that must be evaluated first to the one that depends on it. The
//! relation mask on the edge says what changes on the child when the parent
//! changes; see [`RelationMask`].

use alloc::vec::Vec;

use hashbrown::HashSet;

use super::node::{EntityRef, NodeIndex};
use super::store::Graph;
use crate::config::BuildConfig;
use crate::constraint::{
    Constraint, ConstraintData, ConstraintRegistry, ConstraintTarget, ConstraintType,
};
use crate::provider::Providers;
use crate::recalc::RelationMask;
use crate::scene::{
    DriverSource, ForceField, ModifierDependency, Object, ObjectId, ObjectKind, ParentKind, Scene,
};
use crate::trace::{GraphBuiltEvent, PassBeginEvent, PassEndEvent, PassKind, Tracer};

const DEFORM: RelationMask = RelationMask::DATA_DATA.union(RelationMask::OB_DATA);
const DATA_AND_OB: RelationMask = RelationMask::DATA_OB.union(RelationMask::OB_OB);

/// Builds the dependency graph of `scene`.
///
/// Bases are visited in order, then the members of every group instanced by
/// a base, each object once. After the per-object edges are recorded the
/// optional post-passes of `config` run: incoming object relations are
/// unified, and nodes without parents are linked to the root.
pub fn build_dependency_graph(
    scene: &Scene,
    registry: &ConstraintRegistry,
    providers: Providers<'_>,
    config: BuildConfig,
    tracer: &mut Tracer<'_>,
) -> Graph {
    let mut graph = Graph::new();
    tracer.pass_begin(&PassBeginEvent {
        pass: PassKind::Build,
        stamp: graph.time,
    });

    let mut builder = Builder {
        scene,
        registry,
        providers,
        config,
        graph: &mut graph,
        deps: Vec::new(),
        targets: Vec::new(),
    };
    let mut visited: HashSet<ObjectId> = HashSet::new();
    for &id in scene.bases() {
        if visited.insert(id) {
            builder.object(id);
        }
    }
    for &id in scene.bases() {
        let Some(group) = scene.object(id).and_then(|ob| ob.dupli_group) else {
            continue;
        };
        for &member in scene.group(group).map(|g| g.objects.as_slice()).unwrap_or(&[]) {
            if visited.insert(member) {
                builder.object(member);
            }
        }
    }

    if config.unify_incoming {
        unify_incoming(&mut graph);
    }
    if config.link_orphans {
        link_orphans(&mut graph);
    }

    tracer.graph_built(&GraphBuiltEvent {
        nodes: u32::try_from(graph.node_count()).unwrap_or(u32::MAX),
        edges: u32::try_from(graph.edge_count()).unwrap_or(u32::MAX),
        relations: config.relations,
    });
    tracer.pass_end(&PassEndEvent {
        pass: PassKind::Build,
        stamp: graph.time,
    });
    graph
}

struct Builder<'a, 'g> {
    scene: &'a Scene,
    registry: &'a ConstraintRegistry,
    providers: Providers<'a>,
    config: BuildConfig,
    graph: &'g mut Graph,
    deps: Vec<ModifierDependency>,
    targets: Vec<ConstraintTarget>,
}

impl Builder<'_, '_> {
    fn node(&mut self, entity: EntityRef) -> Option<NodeIndex> {
        self.graph.get_or_create_node(self.scene, entity)
    }

    /// Records `to` depending on `from`, restricted to the configured
    /// relations.
    fn relate(&mut self, from: EntityRef, to: EntityRef, relation: RelationMask, name: &'static str) {
        let relation = relation.intersection(self.config.relations);
        if relation.is_empty() {
            return;
        }
        let (Some(a), Some(b)) = (self.node(from), self.node(to)) else {
            return;
        };
        self.graph.add_relation(a, b, relation, name);
    }

    fn relate_objects(&mut self, from: ObjectId, to: ObjectId, relation: RelationMask, name: &'static str) {
        self.relate(EntityRef::Object(from), EntityRef::Object(to), relation, name);
    }

    /// Collects `(object, has_subtarget, type)` for every target of `stack`.
    fn constraint_targets(&mut self, stack: &[Constraint]) -> Vec<(ObjectId, bool, ConstraintType)> {
        let mut out = Vec::new();
        for con in stack {
            let Some(get_targets) = self.registry.type_info(con.ty).and_then(|info| info.get_targets)
            else {
                continue;
            };
            self.targets.clear();
            get_targets(con, self.scene, &mut self.targets);
            for ct in &self.targets {
                if let Some(tar) = ct.object
                    && self.scene.contains(tar)
                {
                    out.push((tar, !ct.subtarget.is_empty(), con.ty));
                }
            }
        }
        self.targets.clear();
        out
    }

    fn object(&mut self, id: ObjectId) {
        let scene = self.scene;
        let Some(ob) = scene.object(id) else {
            return;
        };
        let me = EntityRef::Object(id);
        if self.node(me).is_none() {
            return;
        }
        let mut add_to_root = true;

        if self.config.relations.contains(RelationMask::DATA)
            && let Some(data) = ob.data
        {
            self.relate(me, EntityRef::Data(data), RelationMask::DATA, "Object Data");
        }

        if ob.kind == ObjectKind::Armature
            && let Some(pose) = ob.pose.as_ref()
        {
            for ch in pose.channels() {
                for (tar, sub, ty) in self.constraint_targets(&ch.constraints) {
                    if tar == id {
                        continue;
                    }
                    let relation = if matches!(ty, ConstraintType::FollowPath | ConstraintType::ClampTo)
                        || sub
                    {
                        DEFORM
                    } else {
                        RelationMask::OB_DATA
                    };
                    self.relate_objects(tar, id, relation, "Pose Constraint");
                }
            }
        }

        self.drivers(id, ob);

        for m in &ob.modifiers {
            self.deps.clear();
            m.dependencies(&mut self.deps);
            for i in 0..self.deps.len() {
                let (dep, relation, name) = self.deps[i];
                if dep != id {
                    self.relate_objects(dep, id, relation, name);
                }
            }
        }
        self.deps.clear();

        if let Some(parent) = ob.parent.as_ref()
            && let Some(par) = scene.object(parent.object)
        {
            let relation = match parent.kind {
                ParentKind::Skeletal => RelationMask::OB_OB,
                ParentKind::Vertex(_) | ParentKind::Vertex3(_) | ParentKind::Bone(_) => DATA_AND_OB,
                ParentKind::Object if par.kind == ObjectKind::Lattice || par.is_path() => DATA_AND_OB,
                ParentKind::Object => RelationMask::OB_OB,
            };
            self.relate_objects(parent.object, id, relation, "Parent");
            if ob.kind == ObjectKind::MetaBall && par.dupli_verts {
                self.relate_objects(
                    id,
                    parent.object,
                    RelationMask::DATA_DATA | RelationMask::OB_OB,
                    "Dupliverts",
                );
            }
            add_to_root = false;
        }

        if let Some(track) = ob.track
            && scene.contains(track)
        {
            self.relate_objects(track, id, RelationMask::OB_OB, "Track To");
            add_to_root = false;
        }
        if let Some(proxy) = ob.proxy
            && scene.contains(proxy)
        {
            self.relate_objects(id, proxy, RelationMask::DATA_DATA | RelationMask::OB_OB, "Proxy");
        }
        if ob.kind == ObjectKind::Camera
            && let Some(dof) = ob.dof_object
            && scene.contains(dof)
        {
            self.relate_objects(dof, id, RelationMask::OB_OB, "Camera DoF");
        }

        if let Some(group) = ob.dupli_group.and_then(|g| scene.group(g)) {
            for &member in &group.objects {
                if member != id {
                    self.relate_objects(member, id, RelationMask::OB_OB, "Dupligroup");
                }
            }
        }

        if matches!(ob.kind, ObjectKind::Mesh | ObjectKind::Curve | ObjectKind::Lattice)
            && ob.has_soft_body()
        {
            for &other in scene.bases() {
                if other != id
                    && let Some(o) = scene.object(other)
                    && o.deflect
                    && o.layer.intersects(ob.layer)
                {
                    self.relate_objects(other, id, DEFORM, "Softbody Collision");
                }
            }
        }

        if ob.kind == ObjectKind::MetaBall
            && ob.family_name() != ob.name
            && let Some(basis) = self.metaball_basis(ob)
        {
            self.relate_objects(id, basis, DEFORM, "MetaBall");
        }

        self.curves(id, ob);
        self.particles(id, ob);

        for (tar, sub, ty) in self.constraint_targets(&ob.constraints) {
            if tar == id {
                continue;
            }
            let tar_kind = scene.object(tar).map(|o| o.kind);
            let relation = if matches!(ty, ConstraintType::FollowPath | ConstraintType::ClampTo)
                || (sub
                    && matches!(
                        tar_kind,
                        Some(ObjectKind::Armature | ObjectKind::Mesh | ObjectKind::Lattice)
                    ))
            {
                DATA_AND_OB
            } else {
                RelationMask::OB_OB
            };
            self.relate_objects(tar, id, relation, "Constraint");
            add_to_root = false;
        }

        if add_to_root {
            self.relate(EntityRef::Scene, me, RelationMask::SCENE, "Scene Relation");
        }
    }

    fn drivers(&mut self, id: ObjectId, ob: &Object) {
        for driver in &ob.drivers {
            match &driver.source {
                DriverSource::Object { object, bone } => {
                    self.driver_edge(id, *object, *bone, driver.drives_data);
                }
                DriverSource::Script(expression) => {
                    for object in self.providers.scripts.driver_objects(expression) {
                        self.driver_edge(id, object, false, driver.drives_data);
                    }
                }
            }
        }
    }

    fn driver_edge(&mut self, id: ObjectId, source: ObjectId, bone: bool, drives_data: bool) {
        if source == id || !self.scene.contains(source) {
            return;
        }
        let reads_bone = bone
            && self
                .scene
                .object(source)
                .is_some_and(|o| o.kind == ObjectKind::Armature);
        let relation = match (reads_bone, drives_data) {
            (true, true) => RelationMask::DATA_DATA,
            (true, false) => RelationMask::DATA_OB,
            (false, true) => RelationMask::OB_DATA,
            (false, false) => RelationMask::OB_OB,
        };
        self.relate_objects(source, id, relation, "Driver");
    }

    fn metaball_basis(&self, ob: &Object) -> Option<ObjectId> {
        let family = ob.family_name();
        self.scene.bases().iter().copied().find(|&b| {
            self.scene
                .object(b)
                .is_some_and(|o| o.kind == ObjectKind::MetaBall && o.name == family)
        })
    }

    fn curves(&mut self, id: ObjectId, ob: &Object) {
        let curve = &ob.curve;
        if matches!(ob.kind, ObjectKind::Curve | ObjectKind::Font) {
            for (source, name) in [
                (curve.bevel_object, "Curve Bevel"),
                (curve.taper_object, "Curve Taper"),
            ] {
                if let Some(source) = source
                    && source != id
                    && self.scene.contains(source)
                {
                    self.relate_objects(source, id, DEFORM, name);
                }
            }
        }
        if ob.kind == ObjectKind::Font
            && let Some(text) = curve.text_on_curve
            && text != id
            && self.scene.contains(text)
        {
            self.relate_objects(text, id, DEFORM, "Texts");
        }
    }

    fn particles(&mut self, id: ObjectId, ob: &Object) {
        let scene = self.scene;
        for psys in &ob.particle_systems {
            self.relate_objects(id, id, RelationMask::OB_DATA, "Particle System");
            if !psys.enabled {
                continue;
            }
            if let Some(keyed) = psys.keyed_object
                && keyed != id
                && scene.contains(keyed)
            {
                self.relate_objects(keyed, id, RelationMask::DATA_DATA, "Particle Keyed Physics");
            }
            if let Some(dupli) = psys.dupli_object
                && dupli != id
                && let Some(d) = scene.object(dupli)
            {
                let relation = if d.kind == ObjectKind::MetaBall {
                    RelationMask::DATA_DATA | RelationMask::OB_OB
                } else {
                    RelationMask::OB_OB
                };
                self.relate_objects(id, dupli, relation, "Particle Object Visualisation");
            }
            if let Some(group) = psys.dupli_group.and_then(|g| scene.group(g)) {
                for &member in &group.objects {
                    if member != id {
                        self.relate_objects(id, member, RelationMask::OB_OB, "Particle Group Visualisation");
                    }
                }
            }

            let effectors: Vec<ObjectId> = match psys.effector_group.and_then(|g| scene.group(g)) {
                Some(group) => group.objects.clone(),
                None => scene
                    .bases()
                    .iter()
                    .copied()
                    .filter(|&b| scene.object(b).is_some_and(|o| o.layer.intersects(ob.layer)))
                    .collect(),
            };
            for eff in effectors {
                if eff == id {
                    continue;
                }
                let Some(e) = scene.object(eff) else {
                    continue;
                };
                match e.field {
                    Some(ForceField::Guide) => self.relate_objects(eff, id, DEFORM, "Particle Field"),
                    Some(_) => self.relate_objects(eff, id, RelationMask::OB_DATA, "Particle Field"),
                    None => {}
                }
                if e.deflect {
                    self.relate_objects(eff, id, DEFORM, "Particle Collision");
                }
                if e.particle_systems.iter().any(|p| p.enabled && p.emits_field) {
                    self.relate_objects(eff, id, RelationMask::DATA_DATA, "Particle Field");
                }
            }

            if let Some(reactor) = psys.reactor_target
                && reactor != id
                && scene.contains(reactor)
            {
                self.relate_objects(id, reactor, RelationMask::DATA_DATA, "Particle Reactor");
            }
        }
    }
}

/// ORs, for every object node, the union of its incoming object→object
/// relations into each of those edges.
pub(crate) fn unify_incoming(graph: &mut Graph) {
    let n = graph.node_count();
    let mut incoming = alloc::vec![RelationMask::NONE; n];
    for from in 0..n {
        if !graph.entity[from].is_object() {
            continue;
        }
        for edge in &graph.children[from] {
            if graph.entity[edge.target.slot()].is_object() {
                incoming[edge.target.slot()] |= edge.relation;
            }
        }
    }
    for from in 0..n {
        if !graph.entity[from].is_object() {
            continue;
        }
        let entity = &graph.entity;
        for edge in &mut graph.children[from] {
            if entity[edge.target.slot()].is_object() {
                edge.relation |= incoming[edge.target.slot()];
            }
        }
    }
}

/// Links every non-root node without incoming edges to the root.
pub(crate) fn link_orphans(graph: &mut Graph) {
    let orphans: Vec<NodeIndex> = graph
        .nodes()
        .skip(1)
        .filter(|&n| graph.ancestor_count(n) == 0)
        .collect();
    for n in orphans {
        graph.add_relation(NodeIndex::ROOT, n, RelationMask::SCENE, "Scene Relation");
    }
}

/// Builds the channel graph of `armature`'s pose.
///
/// Parent channels come before their children, constraint subtargets
/// within the same armature before the constrained channel, and the
/// subtargets of an IK constraint before every channel of its chain.
/// Returns a graph holding only the root if `armature` has no pose.
pub fn build_pose_graph(scene: &Scene, armature: ObjectId, registry: &ConstraintRegistry) -> Graph {
    let mut graph = Graph::new();
    let Some(pose) = scene.object(armature).and_then(|ob| ob.pose.as_ref()) else {
        return graph;
    };
    let node = |graph: &mut Graph, idx: u32| graph.get_or_create_node(scene, EntityRef::PoseChannel(armature, idx));

    let mut targets = Vec::new();
    for (i, ch) in pose.channels().iter().enumerate() {
        let Ok(idx) = u32::try_from(i) else {
            break;
        };
        let Some(me) = node(&mut graph, idx) else {
            continue;
        };
        if let Some(parent) = ch.parent
            && let Some(p) = node(&mut graph, parent)
        {
            graph.add_relation(p, me, RelationMask::OB_OB, "Parent");
            graph.add_parent_relation(p, me, RelationMask::OB_OB, "Parent");
        }

        for con in &ch.constraints {
            let Some(get_targets) = registry.type_info(con.ty).and_then(|info| info.get_targets) else {
                continue;
            };
            targets.clear();
            get_targets(con, scene, &mut targets);
            let chain = match &con.data {
                ConstraintData::Kinematic(ik) => {
                    let start = if ik.use_tip { Some(idx) } else { ch.parent };
                    start.map(|s| pose.chain(s, ik.chain_len)).unwrap_or_default()
                }
                _ => alloc::vec![idx],
            };
            for ct in &targets {
                if ct.object != Some(armature) || ct.subtarget.is_empty() {
                    continue;
                }
                let Some(sub) = pose.find(&ct.subtarget) else {
                    continue;
                };
                let Some(from) = node(&mut graph, sub) else {
                    continue;
                };
                for &member in &chain {
                    if member == sub {
                        continue;
                    }
                    if let Some(to) = node(&mut graph, member) {
                        graph.add_relation(from, to, RelationMask::OB_OB, "Constraint");
                    }
                }
            }
        }
    }
    link_orphans(&mut graph);
    graph
}
