// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dependency-graph JSON export.
//!
//! [`export`] lays a [`Graph`] out with
//! [`breadth_first_layered`] and writes it as one JSON object:
//!
//! ```text
//! { "levels": 3,
//!   "nodes": [ { "index", "label", "kind", "entity", "x", "y",
//!                "distance", "ancestors", "layer" }, ... ],
//!   "edges": [ { "from", "to", "relation", "relation_bits", "count",
//!                "layer", "name" }, ... ] }
//! ```
//!
//! Node positions are in layout units; the root sits at the origin.

use std::io::{self, Write};

use serde_json::{Value, json};

use rigsolve_core::config::LayoutConfig;
use rigsolve_core::graph::{EntityRef, Graph, breadth_first_layered};

use crate::pretty::entity_name;

fn entity_kind(entity: EntityRef) -> &'static str {
    match entity {
        EntityRef::Scene => "scene",
        EntityRef::Object(_) => "object",
        EntityRef::Data(_) => "data",
        EntityRef::PoseChannel(..) => "pose_channel",
    }
}

/// Lays out `graph` and returns it as a JSON value.
pub fn to_value(graph: &mut Graph, layout: &LayoutConfig) -> Value {
    let levels = breadth_first_layered(graph, layout);
    let mut nodes: Vec<Value> = Vec::with_capacity(graph.node_count());
    let mut edges: Vec<Value> = Vec::with_capacity(graph.edge_count());

    for node in graph.nodes() {
        let entity = graph.entity(node);
        let pos = graph.position(node);
        nodes.push(json!({
            "index": node.0,
            "label": graph.label(node),
            "kind": entity_kind(entity),
            "entity": entity_name(entity),
            "x": pos.x,
            "y": pos.y,
            "distance": graph.bfs_distance(node),
            "ancestors": graph.ancestor_count(node),
            "layer": graph.layer(node).0,
        }));
        for edge in graph.children(node) {
            edges.push(json!({
                "from": node.0,
                "to": edge.target.0,
                "relation": format!("{:?}", edge.relation),
                "relation_bits": edge.relation.0,
                "count": edge.count,
                "layer": edge.layer.0,
                "name": edge.name,
            }));
        }
    }

    json!({
        "levels": levels,
        "nodes": nodes,
        "edges": edges,
    })
}

/// Lays out `graph` and writes it as pretty-printed JSON.
pub fn export(graph: &mut Graph, layout: &LayoutConfig, writer: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer_pretty(writer, &to_value(graph, layout))?;
    Ok(())
}
