// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node and edge storage.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::Point;

use super::node::{Color, EntityRef, GraphEdge, NodeIndex};
use crate::recalc::{LayerMask, RelationMask};
use crate::scene::Scene;

/// A dependency graph over scene entities.
///
/// Nodes are stored in parallel arrays indexed by [`NodeIndex`]; the scene
/// root sentinel is always node 0. Each node keeps an ordered child edge list
/// (the nodes depending on it) and a parent edge list. At most one edge
/// exists per ordered node pair; recording the same pair again ORs the
/// relation mask and bumps the edge count.
///
/// Traversal bookkeeping (colors, discovery and finish stamps, BFS distance,
/// DFS depth, last-visited stamp) lives alongside the topology and is
/// overwritten by each pass.
#[derive(Debug)]
pub struct Graph {
    pub(crate) entity: Vec<EntityRef>,
    pub(crate) label: Vec<String>,
    pub(crate) color: Vec<Color>,
    pub(crate) discovered: Vec<u32>,
    pub(crate) finished: Vec<u32>,
    pub(crate) bfs_dist: Vec<u32>,
    pub(crate) depth: Vec<u32>,
    pub(crate) last_visited: Vec<u32>,
    pub(crate) ancestor_count: Vec<u32>,
    pub(crate) layer: Vec<LayerMask>,
    pub(crate) position: Vec<Point>,
    pub(crate) children: Vec<Vec<GraphEdge>>,
    pub(crate) parents: Vec<Vec<GraphEdge>>,
    lookup: HashMap<EntityRef, NodeIndex>,
    /// Logical clock shared by every pass.
    pub(crate) time: u32,
    pub(crate) is_acyclic: bool,
    /// Whether discovery/finish stamps match the current topology.
    pub(crate) stamps_valid: bool,
    pub(crate) ancestor_cache: HashMap<NodeIndex, Vec<NodeIndex>>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// Creates a graph holding only the scene root.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = Self {
            entity: Vec::new(),
            label: Vec::new(),
            color: Vec::new(),
            discovered: Vec::new(),
            finished: Vec::new(),
            bfs_dist: Vec::new(),
            depth: Vec::new(),
            last_visited: Vec::new(),
            ancestor_count: Vec::new(),
            layer: Vec::new(),
            position: Vec::new(),
            children: Vec::new(),
            parents: Vec::new(),
            lookup: HashMap::new(),
            time: 0,
            is_acyclic: true,
            stamps_valid: false,
            ancestor_cache: HashMap::new(),
        };
        graph.push_node(EntityRef::Scene, String::from("Scene"));
        graph
    }

    fn push_node(&mut self, entity: EntityRef, label: String) -> NodeIndex {
        let idx = NodeIndex(u32::try_from(self.entity.len()).unwrap_or(u32::MAX));
        self.entity.push(entity);
        self.label.push(label);
        self.color.push(Color::White);
        self.discovered.push(0);
        self.finished.push(0);
        self.bfs_dist.push(0);
        self.depth.push(0);
        self.last_visited.push(0);
        self.ancestor_count.push(0);
        self.layer.push(LayerMask::NONE);
        self.position.push(Point::ZERO);
        self.children.push(Vec::new());
        self.parents.push(Vec::new());
        self.lookup.insert(entity, idx);
        self.invalidate();
        idx
    }

    fn invalidate(&mut self) {
        self.stamps_valid = false;
        self.ancestor_cache.clear();
    }

    /// Returns the node for `entity`, creating it on first use.
    ///
    /// Returns `None` when the entity refers to a removed object or an
    /// unknown pose channel; no node is created in that case.
    pub fn get_or_create_node(&mut self, scene: &Scene, entity: EntityRef) -> Option<NodeIndex> {
        if let Some(&idx) = self.lookup.get(&entity) {
            return Some(idx);
        }
        let label = match entity {
            EntityRef::Scene => return Some(NodeIndex::ROOT),
            EntityRef::Object(id) => scene.object(id)?.name.clone(),
            EntityRef::Data(data) => format!("Data {}", data.0),
            EntityRef::PoseChannel(id, channel) => {
                let ob = scene.object(id)?;
                let ch = ob.pose.as_ref()?.channel(channel)?;
                format!("{}:{}", ob.name, ch.name)
            }
        };
        Some(self.push_node(entity, label))
    }

    /// The node for `entity`, if one exists.
    #[must_use]
    pub fn find_node(&self, entity: EntityRef) -> Option<NodeIndex> {
        self.lookup.get(&entity).copied()
    }

    /// The entity behind `node`.
    #[must_use]
    pub fn entity(&self, node: NodeIndex) -> EntityRef {
        self.entity.get(node.slot()).copied().unwrap_or(EntityRef::Scene)
    }

    /// Display label of `node`.
    #[must_use]
    pub fn label(&self, node: NodeIndex) -> &str {
        self.label.get(node.slot()).map_or("", String::as_str)
    }

    /// Records that `to` depends on `from`.
    ///
    /// Idempotent per ordered pair: a repeated call ORs `relation` into the
    /// existing edge and bumps its count. A new edge increments `to`'s
    /// ancestor count.
    pub fn add_relation(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        relation: RelationMask,
        name: &'static str,
    ) {
        if from.slot() >= self.entity.len() || to.slot() >= self.entity.len() {
            return;
        }
        if let Some(edge) = self.children[from.slot()].iter_mut().find(|e| e.target == to) {
            edge.relation |= relation;
            edge.count += 1;
            return;
        }
        self.children[from.slot()].push(GraphEdge {
            target: to,
            relation,
            count: 1,
            layer: LayerMask::NONE,
            name,
        });
        self.ancestor_count[to.slot()] += 1;
        self.invalidate();
    }

    /// Records `from` in `to`'s parent list, with the same idempotent
    /// semantics as [`add_relation`](Self::add_relation).
    pub fn add_parent_relation(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        relation: RelationMask,
        name: &'static str,
    ) {
        if from.slot() >= self.entity.len() || to.slot() >= self.entity.len() {
            return;
        }
        if let Some(edge) = self.parents[to.slot()].iter_mut().find(|e| e.target == from) {
            edge.relation |= relation;
            edge.count += 1;
            return;
        }
        self.parents[to.slot()].push(GraphEdge {
            target: from,
            relation,
            count: 1,
            layer: LayerMask::NONE,
            name,
        });
    }

    /// Releases every node and edge and re-seeds the root.
    pub fn free_all(&mut self) {
        *self = Self::new();
    }

    /// Child edges of `node`, in insertion order.
    #[must_use]
    pub fn children(&self, node: NodeIndex) -> &[GraphEdge] {
        self.children.get(node.slot()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parent edges recorded for `node`.
    #[must_use]
    pub fn parents(&self, node: NodeIndex) -> &[GraphEdge] {
        self.parents.get(node.slot()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The edge from `from` to `to`.
    #[must_use]
    pub fn edge(&self, from: NodeIndex, to: NodeIndex) -> Option<&GraphEdge> {
        self.children(from).iter().find(|e| e.target == to)
    }

    pub(crate) fn edge_mut(&mut self, from: NodeIndex, to: NodeIndex) -> Option<&mut GraphEdge> {
        self.children
            .get_mut(from.slot())?
            .iter_mut()
            .find(|e| e.target == to)
    }

    /// Number of nodes, including the root.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.entity.len()
    }

    /// Number of child edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.children.iter().map(Vec::len).sum()
    }

    /// Every node index in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        (0..self.entity.len()).filter_map(|i| u32::try_from(i).ok().map(NodeIndex))
    }

    /// Bumps the logical clock and returns the new stamp.
    pub fn tick(&mut self) -> u32 {
        self.time = self.time.wrapping_add(1);
        self.time
    }

    /// Resets every node to white.
    pub fn reset_colors(&mut self) {
        self.color.fill(Color::White);
    }

    /// Number of distinct incoming edges of `node`.
    #[must_use]
    pub fn ancestor_count(&self, node: NodeIndex) -> u32 {
        self.ancestor_count.get(node.slot()).copied().unwrap_or(0)
    }

    /// Aggregated layer mask from the last layer flush.
    #[must_use]
    pub fn layer(&self, node: NodeIndex) -> LayerMask {
        self.layer.get(node.slot()).copied().unwrap_or(LayerMask::NONE)
    }

    /// Layout position from the last layered BFS.
    #[must_use]
    pub fn position(&self, node: NodeIndex) -> Point {
        self.position.get(node.slot()).copied().unwrap_or(Point::ZERO)
    }

    /// BFS distance from the root from the last layered BFS.
    #[must_use]
    pub fn bfs_distance(&self, node: NodeIndex) -> u32 {
        self.bfs_dist.get(node.slot()).copied().unwrap_or(0)
    }

    /// Discovery and finish stamps from the last DFS.
    #[must_use]
    pub fn dfs_stamps(&self, node: NodeIndex) -> (u32, u32) {
        let i = node.slot();
        (
            self.discovered.get(i).copied().unwrap_or(0),
            self.finished.get(i).copied().unwrap_or(0),
        )
    }

    /// DFS depth from the last DFS.
    #[must_use]
    pub fn dfs_depth(&self, node: NodeIndex) -> u32 {
        self.depth.get(node.slot()).copied().unwrap_or(0)
    }

    /// Whether the last topological sort found no cycle.
    #[must_use]
    pub fn is_acyclic(&self) -> bool {
        self.is_acyclic
    }
}
