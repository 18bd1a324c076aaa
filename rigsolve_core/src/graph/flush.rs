// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Propagation of recalc flags along dependency edges.
//!
//! Flushing runs in two passes over a graph built with
//! [`BuildConfig::complete`](crate::config::BuildConfig::complete):
//!
//! 1. **Layers.** Every node aggregates its object's layers with the layers
//!    of everything depending on it, bottom-up. Each edge keeps the layers
//!    reachable through it.
//! 2. **Flags.** Starting from the objects linked to the root, then from
//!    any object those walks missed (members of a dependency cycle), a changed
//!    object passes flags to its children according to the edge relation:
//!
//!    | parent flag | edge relation | child flag |
//!    |-------------|---------------|------------|
//!    | `OBJECT`    | `OB_OB`       | `OBJECT`   |
//!    | `OBJECT`    | `OB_DATA`     | `DATA`     |
//!    | `DATA`      | `DATA_OB`     | `OBJECT`   |
//!    | `DATA`      | `DATA_DATA`   | `DATA`     |
//!
//!    Only edges leading to a visible layer take part. An object whose own
//!    layers and edges miss the visible layers drops its flags instead.

use alloc::vec::Vec;

use super::node::{EntityRef, NodeIndex};
use super::store::Graph;
use crate::constraint::{Constraint, ConstraintType};
use crate::recalc::{LayerMask, RecalcFlags, RelationMask};
use crate::scene::{ObjectId, ObjectKind, Scene};
use crate::trace::{FlushEvent, PassBeginEvent, PassEndEvent, PassKind, Tracer};

/// Outcome of a flush.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Objects carrying a recalc flag after the flush, in node order.
    pub flagged: Vec<ObjectId>,
    /// Invisible objects whose data flag was dropped; their derived data
    /// has been marked invalid.
    pub released: Vec<ObjectId>,
}

/// Propagates the recalc flags set on scene objects through `graph`.
pub fn flush_recalc_flags(
    scene: &mut Scene,
    graph: &mut Graph,
    visible_layers: LayerMask,
    tracer: &mut Tracer<'_>,
) -> FlushReport {
    tracer.pass_begin(&PassBeginEvent {
        pass: PassKind::LayerFlush,
        stamp: graph.time,
    });
    let stamp = graph.tick();
    let mut root_layer = LayerMask::NONE;
    for i in 0..graph.children[0].len() {
        let child = graph.children[0][i].target;
        if !graph.entity(child).is_object() {
            continue;
        }
        let layer = if graph.last_visited[child.slot()] == stamp {
            graph.layer[child.slot()]
        } else {
            flush_layers(scene, graph, child, stamp)
        };
        graph.children[0][i].layer = layer;
        root_layer |= layer;
    }
    // Cycles where every member has an incoming edge hang off no root edge.
    for node in graph.nodes().skip(1).collect::<Vec<_>>() {
        if graph.entity(node).is_object() && graph.last_visited[node.slot()] != stamp {
            root_layer |= flush_layers(scene, graph, node, stamp);
        }
    }
    graph.layer[0] = root_layer;
    tracer.pass_end(&PassEndEvent {
        pass: PassKind::LayerFlush,
        stamp: graph.time,
    });

    tracer.pass_begin(&PassBeginEvent {
        pass: PassKind::RecalcFlush,
        stamp: graph.time,
    });
    let stamp = graph.tick();
    let mut report = FlushReport::default();
    for i in 0..graph.children[0].len() {
        let child = graph.children[0][i].target;
        if graph.entity(child).is_object() && graph.last_visited[child.slot()] != stamp {
            flush_node(scene, graph, child, visible_layers, stamp, &mut report);
        }
    }
    for node in graph.nodes().skip(1).collect::<Vec<_>>() {
        if graph.entity(node).is_object() && graph.last_visited[node.slot()] != stamp {
            flush_node(scene, graph, node, visible_layers, stamp, &mut report);
        }
    }
    for node in graph.nodes() {
        if let EntityRef::Object(id) = graph.entity(node)
            && scene.object(id).is_some_and(|ob| !ob.recalc.is_empty())
        {
            report.flagged.push(id);
        }
    }
    tracer.flush(&FlushEvent {
        visible_layers,
        flagged: u32::try_from(report.flagged.len()).unwrap_or(u32::MAX),
        released: u32::try_from(report.released.len()).unwrap_or(u32::MAX),
    });
    tracer.pass_end(&PassEndEvent {
        pass: PassKind::RecalcFlush,
        stamp: graph.time,
    });
    report
}

/// Sets `node.layer` to its object's layers plus those of every edge to an
/// object child, recursing into children not yet visited at `stamp`.
fn flush_layers(scene: &Scene, graph: &mut Graph, node: NodeIndex, stamp: u32) -> LayerMask {
    graph.last_visited[node.slot()] = stamp;
    let mut layer = match graph.entity(node) {
        EntityRef::Object(id) => scene.object(id).map_or(LayerMask::NONE, |ob| ob.layer),
        _ => LayerMask::NONE,
    };
    for i in 0..graph.children[node.slot()].len() {
        let child = graph.children[node.slot()][i].target;
        if !graph.entity(child).is_object() {
            continue;
        }
        let edge_layer = if graph.last_visited[child.slot()] == stamp {
            graph.layer[child.slot()]
        } else {
            flush_layers(scene, graph, child, stamp)
        };
        graph.children[node.slot()][i].layer = edge_layer;
        layer |= edge_layer;
    }
    graph.layer[node.slot()] = layer;
    layer
}

fn flush_node(
    scene: &mut Scene,
    graph: &mut Graph,
    node: NodeIndex,
    visible: LayerMask,
    stamp: u32,
    report: &mut FlushReport,
) {
    graph.last_visited[node.slot()] = stamp;
    let EntityRef::Object(id) = graph.entity(node) else {
        return;
    };
    let (flags, own_layer) = match scene.object(id) {
        Some(ob) => (ob.recalc, ob.layer),
        None => return,
    };
    let mut changed = false;

    if flags.intersects(RecalcFlags::ALL) {
        let mut all_layer = own_layer;
        for edge in &graph.children[node.slot()] {
            all_layer |= edge.layer;
            if !edge.layer.intersects(visible) {
                continue;
            }
            let EntityRef::Object(child_id) = graph.entity(edge.target) else {
                continue;
            };
            let Some(child) = scene.object_mut(child_id) else {
                continue;
            };
            let before = child.recalc;
            if flags.contains(RecalcFlags::OBJECT) {
                if edge.relation.contains(RelationMask::OB_OB) {
                    child.recalc.insert(RecalcFlags::OBJECT);
                }
                if edge.relation.contains(RelationMask::OB_DATA) {
                    child.recalc.insert(RecalcFlags::DATA);
                }
            }
            if flags.contains(RecalcFlags::DATA) {
                if edge.relation.contains(RelationMask::DATA_OB) {
                    child.recalc.insert(RecalcFlags::OBJECT);
                }
                if edge.relation.contains(RelationMask::DATA_DATA) {
                    child.recalc.insert(RecalcFlags::DATA);
                }
            }
            changed |= before != child.recalc;
        }

        if !all_layer.intersects(visible)
            && let Some(ob) = scene.object_mut(id)
        {
            if ob.recalc.contains(RecalcFlags::DATA) {
                ob.derived_valid = false;
                report.released.push(id);
            }
            ob.recalc.remove(RecalcFlags::ALL);
        }
    }

    // A child that only moves still rebuilds its data when this object
    // deforms it.
    for edge in &graph.children[node.slot()] {
        if !edge.layer.intersects(visible)
            || !edge.relation.intersects(RelationMask::OB_DATA | RelationMask::DATA_DATA)
        {
            continue;
        }
        if let EntityRef::Object(child_id) = graph.entity(edge.target)
            && let Some(child) = scene.object_mut(child_id)
            && child.recalc.contains(RecalcFlags::OBJECT)
            && !child.recalc.contains(RecalcFlags::DATA)
        {
            child.recalc.insert(RecalcFlags::DATA);
        }
    }

    for i in 0..graph.children[node.slot()].len() {
        let child = graph.children[node.slot()][i].target;
        if changed || graph.last_visited[child.slot()] != stamp {
            flush_node(scene, graph, child, visible, stamp, report);
        }
    }
}

/// Sets `flags` on `object` and flushes.
///
/// A data change also marks every other base sharing the object's data
/// block, except for curves, whose derived data is not shared, and for
/// objects with locked shape keys.
pub fn mark_object_dirty_and_flush(
    scene: &mut Scene,
    graph: &mut Graph,
    object: ObjectId,
    flags: RecalcFlags,
    visible_layers: LayerMask,
    tracer: &mut Tracer<'_>,
) -> FlushReport {
    let Some(ob) = scene.object_mut(object) else {
        return FlushReport::default();
    };
    ob.recalc.insert(flags);
    let shares_data = flags.contains(RecalcFlags::DATA)
        && !matches!(ob.kind, ObjectKind::Curve | ObjectKind::Surface)
        && !(ob.shape_keys && ob.shape_lock);
    if shares_data && let Some(data) = ob.data {
        for user in scene.data_users(data) {
            if user == object {
                continue;
            }
            if let Some(other) = scene.object_mut(user) {
                other.recalc.insert(RecalcFlags::DATA);
            }
        }
    }
    flush_recalc_flags(scene, graph, visible_layers, tracer)
}

fn time_dependent(con: &Constraint) -> bool {
    con.influence_curve.is_some() || con.ty == ConstraintType::FollowPath
}

/// Marks every base object whose state changes over time, then flushes.
///
/// - keyed transform or data: the animated flags;
/// - constraints driven by an influence curve, and Follow Path
///   constraints: `OBJECT`;
/// - a parent that is a path curve: `OBJECT`;
/// - drivers: `DATA` if they drive data, otherwise `OBJECT`;
/// - armatures whose channels carry animated constraints: `DATA`;
/// - enabled particle systems and simulations: `DATA`.
pub fn mark_time_dependent(
    scene: &mut Scene,
    graph: &mut Graph,
    visible_layers: LayerMask,
    tracer: &mut Tracer<'_>,
) -> FlushReport {
    let bases = scene.bases().to_vec();
    for id in bases {
        let path_parent = scene
            .object(id)
            .and_then(|ob| ob.parent.as_ref())
            .and_then(|p| scene.object(p.object))
            .is_some_and(|par| par.is_path());
        let Some(ob) = scene.object_mut(id) else {
            continue;
        };
        let mut flags = ob.animated;
        if ob.constraints.iter().any(time_dependent) || path_parent {
            flags.insert(RecalcFlags::OBJECT);
        }
        for driver in &ob.drivers {
            flags.insert(if driver.drives_data {
                RecalcFlags::DATA
            } else {
                RecalcFlags::OBJECT
            });
        }
        if let Some(pose) = ob.pose.as_ref()
            && pose
                .channels()
                .iter()
                .flat_map(|ch| &ch.constraints)
                .any(time_dependent)
        {
            flags.insert(RecalcFlags::DATA);
        }
        if ob.particle_systems.iter().any(|p| p.enabled) || ob.has_soft_body() {
            flags.insert(RecalcFlags::DATA);
        }
        ob.recalc.insert(flags);
    }
    flush_recalc_flags(scene, graph, visible_layers, tracer)
}
