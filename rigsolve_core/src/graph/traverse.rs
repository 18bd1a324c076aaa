// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Depth-first and breadth-first traversal, topological order, and
//! ancestor queries.

use alloc::collections::VecDeque;
use alloc::vec;
use alloc::vec::Vec;

use hashbrown::HashSet;
use kurbo::Point;

use super::node::{Color, EntityRef, GraphEdge, NodeIndex};
use super::store::Graph;
use crate::config::LayoutConfig;
use crate::scene::{DataId, ObjectId};
use crate::trace::{CycleEvent, PassBeginEvent, PassEndEvent, PassKind, Tracer, UnreachableEvent};

/// Classification of an edge met during a depth-first search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeClass {
    /// Leads to a node discovered through it.
    Tree,
    /// Leads to a node still on the stack: the edge closes a cycle.
    Back,
    /// Leads to an already finished descendant.
    Forward,
    /// Leads to a finished node in another branch.
    Cross,
}

/// Callbacks of [`depth_first`]. Every method defaults to a no-op.
pub trait DfsVisitor {
    /// `node` was discovered.
    fn discover(&mut self, graph: &Graph, node: NodeIndex) {
        _ = (graph, node);
    }

    /// The edge `from → edge.target` was examined.
    fn edge(&mut self, graph: &Graph, from: NodeIndex, edge: &GraphEdge, class: EdgeClass) {
        _ = (graph, from, edge, class);
    }

    /// Every child of `node` has been explored.
    fn finish(&mut self, graph: &Graph, node: NodeIndex) {
        _ = (graph, node);
    }
}

impl DfsVisitor for () {}

/// What a depth-first search found.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DfsReport {
    /// Edges closing a cycle, as `(from, to)`.
    pub back_edges: Vec<(NodeIndex, NodeIndex)>,
    /// Nodes not reachable from the root, in discovery order.
    pub unreachable: Vec<NodeIndex>,
    /// Every node in finish order.
    pub finish_order: Vec<NodeIndex>,
}

/// Iterative depth-first search from the root.
///
/// Afterwards every node white at the end of the root search starts a search
/// of its own; those starts are logged since a fully built graph reaches
/// every node from the root. Discovery and finish stamps come from the
/// graph clock, so they increase across passes.
pub fn depth_first<V: DfsVisitor + ?Sized>(graph: &mut Graph, visitor: &mut V) -> DfsReport {
    graph.reset_colors();
    let mut report = DfsReport::default();
    let mut stack: Vec<(NodeIndex, usize)> = Vec::new();

    search(graph, visitor, NodeIndex::ROOT, &mut stack, &mut report);
    let reached = report.finish_order.len();
    for i in 0..graph.node_count() {
        let Ok(raw) = u32::try_from(i) else {
            break;
        };
        let node = NodeIndex(raw);
        if graph.color[i] == Color::White {
            log::warn!("{} is not reachable from the scene root", graph.label(node));
            search(graph, visitor, node, &mut stack, &mut report);
        }
    }
    report.unreachable = {
        let mut late = report.finish_order[reached..].to_vec();
        late.sort_by_key(|n| graph.discovered[n.slot()]);
        late
    };

    graph.stamps_valid = true;
    graph.ancestor_cache.clear();
    report
}

fn search<V: DfsVisitor + ?Sized>(
    graph: &mut Graph,
    visitor: &mut V,
    start: NodeIndex,
    stack: &mut Vec<(NodeIndex, usize)>,
    report: &mut DfsReport,
) {
    discover(graph, visitor, start, 0);
    stack.push((start, 0));
    while let Some(top) = stack.last_mut() {
        let node = top.0;
        let next = graph.children[node.slot()].get(top.1).copied();
        top.1 += 1;
        let Some(edge) = next else {
            stack.pop();
            let stamp = graph.tick();
            graph.color[node.slot()] = Color::Black;
            graph.finished[node.slot()] = stamp;
            report.finish_order.push(node);
            visitor.finish(graph, node);
            continue;
        };
        let child = edge.target;
        let class = match graph.color[child.slot()] {
            Color::White => EdgeClass::Tree,
            Color::Gray => EdgeClass::Back,
            Color::Black if graph.discovered[node.slot()] < graph.discovered[child.slot()] => {
                EdgeClass::Forward
            }
            Color::Black => EdgeClass::Cross,
        };
        visitor.edge(graph, node, &edge, class);
        match class {
            EdgeClass::Tree => {
                let depth = graph.depth[node.slot()] + 1;
                discover(graph, visitor, child, depth);
                stack.push((child, 0));
            }
            EdgeClass::Back => report.back_edges.push((node, child)),
            EdgeClass::Forward | EdgeClass::Cross => {}
        }
    }
}

fn discover<V: DfsVisitor + ?Sized>(graph: &mut Graph, visitor: &mut V, node: NodeIndex, depth: u32) {
    let stamp = graph.tick();
    graph.color[node.slot()] = Color::Gray;
    graph.discovered[node.slot()] = stamp;
    graph.depth[node.slot()] = depth;
    visitor.discover(graph, node);
}

/// Orders the nodes so that every node comes after the nodes it depends on,
/// the root first.
///
/// Cycles do not stop the sort: each edge closing one is logged and
/// reported to `tracer`, and the order is the best effort of a reverse
/// post-order. Self-edges are not cycles.
pub fn topological_sort(graph: &mut Graph, tracer: &mut Tracer<'_>) -> Vec<NodeIndex> {
    sort_nodes(graph, tracer).0
}

pub(crate) fn sort_nodes(graph: &mut Graph, tracer: &mut Tracer<'_>) -> (Vec<NodeIndex>, DfsReport) {
    tracer.pass_begin(&PassBeginEvent {
        pass: PassKind::Sort,
        stamp: graph.time,
    });
    let mut report = depth_first(graph, &mut ());
    report.back_edges.retain(|&(from, to)| from != to);

    for &(from, to) in &report.back_edges {
        let Some(edge) = graph.edge(from, to) else {
            continue;
        };
        log::warn!(
            "dependency cycle: {} depends on {} ({:?}, {})",
            graph.label(from),
            graph.label(to),
            edge.relation,
            edge.name,
        );
        tracer.cycle(&CycleEvent {
            from: graph.entity(from),
            to: graph.entity(to),
            relation: edge.relation,
            name: edge.name,
        });
    }
    for &node in &report.unreachable {
        tracer.unreachable(&UnreachableEvent {
            entity: graph.entity(node),
        });
    }
    graph.is_acyclic = report.back_edges.is_empty();

    let order = report.finish_order.iter().rev().copied().collect();
    tracer.pass_end(&PassEndEvent {
        pass: PassKind::Sort,
        stamp: graph.time,
    });
    (order, report)
}

/// Breadth-first search from the root that records each node's distance
/// and lays the graph out in columns, one per distance.
///
/// Returns the number of columns. Nodes not reachable from the root keep
/// the origin.
pub fn breadth_first_layered(graph: &mut Graph, layout: &LayoutConfig) -> u32 {
    graph.reset_colors();
    let stamp = graph.tick();
    graph.bfs_dist.fill(0);
    graph.position.fill(Point::ZERO);

    let mut slots: Vec<u32> = vec![1];
    let mut queue = VecDeque::from([NodeIndex::ROOT]);
    graph.color[0] = Color::Gray;
    graph.last_visited[0] = stamp;

    while let Some(node) = queue.pop_front() {
        let dist = graph.bfs_dist[node.slot()] + 1;
        for i in 0..graph.children[node.slot()].len() {
            let child = graph.children[node.slot()][i].target;
            if graph.color[child.slot()] != Color::White {
                log::debug!(
                    "{} already placed when reached from {}",
                    graph.label(child),
                    graph.label(node)
                );
                continue;
            }
            let level = dist as usize;
            if slots.len() <= level {
                slots.resize(level + 1, 0);
            }
            let slot = slots[level];
            slots[level] += 1;
            graph.color[child.slot()] = Color::Gray;
            graph.last_visited[child.slot()] = stamp;
            graph.bfs_dist[child.slot()] = dist;
            graph.position[child.slot()] = Point::new(
                f64::from(dist) * layout.horizontal_spacing,
                f64::from(slot) * layout.vertical_spacing,
            );
            queue.push_back(child);
        }
        graph.color[node.slot()] = Color::Black;
    }
    u32::try_from(slots.len()).unwrap_or(u32::MAX)
}

/// Parents of `node` found by scanning every node for an edge into it,
/// stopping after its ancestor count. With `by_finish`, only nodes that
/// finished after `node` in the last DFS qualify.
fn scan_parents(graph: &Graph, node: NodeIndex, by_finish: bool) -> Vec<NodeIndex> {
    let wanted = graph.ancestor_count(node) as usize;
    let finished = graph.finished[node.slot()];
    let mut out = Vec::with_capacity(wanted);
    for candidate in graph.nodes() {
        if out.len() >= wanted {
            break;
        }
        if by_finish && graph.finished[candidate.slot()] <= finished {
            continue;
        }
        if graph.edge(candidate, node).is_some() {
            out.push(candidate);
        }
    }
    out
}

fn cached_parents(graph: &mut Graph, node: NodeIndex) -> Vec<NodeIndex> {
    if !graph.stamps_valid {
        depth_first(graph, &mut ());
    }
    if let Some(hit) = graph.ancestor_cache.get(&node) {
        return hit.clone();
    }
    let parents = scan_parents(graph, node, true);
    graph.ancestor_cache.insert(node, parents.clone());
    parents
}

/// Every node `entity` depends on, directly or transitively, nearest first.
///
/// Parents are found from the stamps of the last depth-first search, which
/// is rerun if the graph changed since; results are cached until then.
/// Returns nothing for an entity without a node.
pub fn ancestors_of(graph: &mut Graph, entity: EntityRef) -> Vec<NodeIndex> {
    let Some(node) = graph.find_node(entity) else {
        return Vec::new();
    };
    let mut seen: HashSet<NodeIndex> = HashSet::new();
    seen.insert(node);
    let mut out = Vec::new();
    let mut queue = VecDeque::from([node]);
    while let Some(n) = queue.pop_front() {
        for parent in cached_parents(graph, n) {
            if seen.insert(parent) {
                out.push(parent);
                queue.push_back(parent);
            }
        }
    }
    out
}

/// The nodes `entity` depends on directly.
pub fn direct_ancestors(graph: &mut Graph, entity: EntityRef) -> Vec<NodeIndex> {
    match graph.find_node(entity) {
        Some(node) => cached_parents(graph, node),
        None => Vec::new(),
    }
}

/// Every node depending on `entity`, in finish order of a depth-first
/// search from it; `entity`'s own node is not included.
#[must_use]
pub fn descendants_of(graph: &Graph, entity: EntityRef) -> Vec<NodeIndex> {
    let Some(start) = graph.find_node(entity) else {
        return Vec::new();
    };
    let mut seen = vec![false; graph.node_count()];
    seen[start.slot()] = true;
    let mut out = Vec::new();
    let mut stack = vec![(start, 0_usize)];
    while let Some(top) = stack.last_mut() {
        let node = top.0;
        let next = graph.children(node).get(top.1).map(|e| e.target);
        top.1 += 1;
        match next {
            Some(child) if !seen[child.slot()] => {
                seen[child.slot()] = true;
                stack.push((child, 0));
            }
            Some(_) => {}
            None => {
                stack.pop();
                if node != start {
                    out.push(node);
                }
            }
        }
    }
    out
}

/// Objects using the data block `data`, in node order.
#[must_use]
pub fn data_owners(graph: &Graph, data: DataId) -> Vec<ObjectId> {
    let Some(node) = graph.find_node(EntityRef::Data(data)) else {
        return Vec::new();
    };
    scan_parents(graph, node, false)
        .into_iter()
        .filter_map(|n| match graph.entity(n) {
            EntityRef::Object(id) => Some(id),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recalc::RelationMask;
    use crate::scene::{Object, ObjectKind, Scene};

    /// Root → a → b → c, plus a → c.
    fn chain() -> (Scene, Graph, [NodeIndex; 3]) {
        let mut scene = Scene::new();
        let mut graph = Graph::new();
        let mut nodes = [NodeIndex::ROOT; 3];
        for (i, name) in ["a", "b", "c"].into_iter().enumerate() {
            let id = scene.add_object(Object::new(name, ObjectKind::Empty));
            nodes[i] = graph.get_or_create_node(&scene, EntityRef::Object(id)).unwrap();
        }
        let [a, b, c] = nodes;
        graph.add_relation(NodeIndex::ROOT, a, RelationMask::SCENE, "Scene Relation");
        graph.add_relation(a, b, RelationMask::OB_OB, "Parent");
        graph.add_relation(b, c, RelationMask::OB_OB, "Parent");
        graph.add_relation(a, c, RelationMask::OB_OB, "Constraint");
        (scene, graph, nodes)
    }

    #[derive(Default)]
    struct Classes(Vec<EdgeClass>);

    impl DfsVisitor for Classes {
        fn edge(&mut self, _graph: &Graph, _from: NodeIndex, _edge: &GraphEdge, class: EdgeClass) {
            self.0.push(class);
        }
    }

    #[test]
    fn classifies_forward_edge() {
        let (_, mut graph, _) = chain();
        let mut classes = Classes::default();
        let report = depth_first(&mut graph, &mut classes);
        assert!(report.back_edges.is_empty());
        assert!(report.unreachable.is_empty());
        assert_eq!(
            classes.0,
            [EdgeClass::Tree, EdgeClass::Tree, EdgeClass::Tree, EdgeClass::Forward]
        );
    }

    #[test]
    fn stamps_nest() {
        let (_, mut graph, [a, b, c]) = chain();
        depth_first(&mut graph, &mut ());
        let (da, fa) = graph.dfs_stamps(a);
        let (dc, fc) = graph.dfs_stamps(c);
        assert!(da < dc && fc < fa);
        assert_eq!(graph.dfs_depth(b), 2);
        assert_eq!(graph.dfs_depth(c), 3);
    }

    #[test]
    fn sort_respects_edges() {
        let (_, mut graph, [a, b, c]) = chain();
        let order = topological_sort(&mut graph, &mut Tracer::none());
        let pos = |n| order.iter().position(|&x| x == n).unwrap();
        assert_eq!(order[0], NodeIndex::ROOT);
        assert!(pos(a) < pos(b) && pos(b) < pos(c));
        assert!(graph.is_acyclic());
    }

    #[test]
    fn cycle_is_reported_not_fatal() {
        let (_, mut graph, [a, _, c]) = chain();
        graph.add_relation(c, a, RelationMask::OB_OB, "Constraint");
        let (order, report) = sort_nodes(&mut graph, &mut Tracer::none());
        assert_eq!(order.len(), 4);
        assert_eq!(report.back_edges, [(c, a)]);
        assert!(!graph.is_acyclic());
    }

    #[test]
    fn self_edge_is_not_a_cycle() {
        let (_, mut graph, [a, ..]) = chain();
        graph.add_relation(a, a, RelationMask::OB_DATA, "Particle System");
        topological_sort(&mut graph, &mut Tracer::none());
        assert!(graph.is_acyclic());
    }

    #[test]
    fn unreachable_nodes_are_still_visited() {
        let (mut scene, mut graph, _) = chain();
        let id = scene.add_object(Object::new("island", ObjectKind::Empty));
        let island = graph.get_or_create_node(&scene, EntityRef::Object(id)).unwrap();
        let report = depth_first(&mut graph, &mut ());
        assert_eq!(report.unreachable, [island]);
        assert_eq!(report.finish_order.len(), graph.node_count());
    }

    #[test]
    fn layered_layout_places_by_distance() {
        let (_, mut graph, [a, b, c]) = chain();
        let levels = breadth_first_layered(&mut graph, &LayoutConfig::unit());
        assert_eq!(levels, 3);
        assert_eq!(graph.bfs_distance(a), 1);
        assert_eq!(graph.bfs_distance(b), 2);
        // c is reached from a before b is expanded.
        assert_eq!(graph.bfs_distance(c), 2);
        assert_eq!(graph.position(b), Point::new(2.0, 0.0));
        assert_eq!(graph.position(c), Point::new(2.0, 1.0));
    }

    #[test]
    fn ancestors_are_transitive() {
        let (_, mut graph, [a, b, c]) = chain();
        let entity = graph.entity(c);
        let mut found = ancestors_of(&mut graph, entity);
        found.sort();
        assert_eq!(found, [NodeIndex::ROOT, a, b]);

        let mut direct = direct_ancestors(&mut graph, entity);
        direct.sort();
        assert_eq!(direct, [a, b]);
        assert!(graph.ancestor_cache.contains_key(&c));
    }

    #[test]
    fn new_edge_invalidates_ancestor_cache() {
        let (mut scene, mut graph, [_, _, c]) = chain();
        let entity = graph.entity(c);
        assert_eq!(direct_ancestors(&mut graph, entity).len(), 2);
        let id = scene.add_object(Object::new("d", ObjectKind::Empty));
        let d = graph.get_or_create_node(&scene, EntityRef::Object(id)).unwrap();
        graph.add_relation(NodeIndex::ROOT, d, RelationMask::SCENE, "Scene Relation");
        graph.add_relation(d, c, RelationMask::OB_OB, "Constraint");
        assert_eq!(direct_ancestors(&mut graph, entity).len(), 3);
    }

    #[test]
    fn descendants_in_finish_order() {
        let (_, graph, [a, b, c]) = chain();
        assert_eq!(descendants_of(&graph, graph.entity(a)), [c, b]);
        assert!(descendants_of(&graph, graph.entity(c)).is_empty());
    }

    #[test]
    fn data_owners_scan_parents() {
        let (scene, mut graph, [a, b, _]) = chain();
        let data = graph.get_or_create_node(&scene, EntityRef::Data(DataId(3))).unwrap();
        graph.add_relation(a, data, RelationMask::DATA, "Object Data");
        let EntityRef::Object(owner) = graph.entity(a) else { unreachable!() };
        assert_eq!(data_owners(&graph, DataId(3)), [owner]);
        graph.add_relation(b, data, RelationMask::DATA, "Object Data");
        assert_eq!(data_owners(&graph, DataId(3)).len(), 2);
        assert!(data_owners(&graph, DataId(4)).is_empty());
    }
}
