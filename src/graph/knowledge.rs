//! The per-call merged knowledge graph.
//!
//! [`KnowledgeGraph`] is an arena of nodes indexed by integer handle with a
//! side `id -> handle` map; adjacency is stored as edge-handle lists per node
//! (outgoing and incoming, for symmetric traversal). String ids remain the
//! external identity — handles never leave this module's API except as opaque
//! [`NodeHandle`] values.
//!
//! A merged graph exists for exactly one recall call and must never be cached
//! across calls: the underlying scoped data can change between turns.

use std::collections::HashMap;

use tracing::debug;

use crate::graph::types::{Edge, Graph, Node};
use crate::scope::ScopeAddress;

/// Opaque index of a node within one [`KnowledgeGraph`]. Not meaningful
/// across graphs.
pub type NodeHandle = usize;

#[derive(Debug, Default)]
pub struct KnowledgeGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    node_handles: HashMap<String, NodeHandle>,
    edge_handles: HashMap<String, usize>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union several scoped graphs into one merged view.
    ///
    /// All nodes are inserted first, then all edges, so cross-scope edges
    /// resolve regardless of load order. On id collision the first-seen node
    /// (or edge) wins and is never overwritten — collisions are rare because
    /// the ingestion pipeline scope-qualifies ids.
    pub fn merge_from(sources: Vec<(ScopeAddress, Graph)>) -> Self {
        let mut merged = Self::new();

        for (scope, graph) in &sources {
            let mut added = 0usize;
            for node in &graph.nodes {
                if merged.add_node(node.clone()) {
                    added += 1;
                }
            }
            debug!(scope = %scope, nodes = added, "merged scope nodes");
        }

        let mut skipped = 0usize;
        for (_, graph) in &sources {
            for edge in &graph.edges {
                if !merged.add_edge(edge.clone()) {
                    skipped += 1;
                }
            }
        }
        if skipped > 0 {
            debug!(skipped, "dropped duplicate or dangling edges during merge");
        }

        merged
    }

    /// Insert a node unless its id is already present. Returns whether the
    /// node was added.
    pub fn add_node(&mut self, node: Node) -> bool {
        if self.node_handles.contains_key(&node.id) {
            return false;
        }
        let handle = self.nodes.len();
        self.node_handles.insert(node.id.clone(), handle);
        self.nodes.push(node);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        true
    }

    /// Insert an edge. No-op (returns `false`) when the edge id is already
    /// present or either endpoint is missing — dangling edges would corrupt
    /// downstream traversal.
    pub fn add_edge(&mut self, edge: Edge) -> bool {
        if self.edge_handles.contains_key(&edge.id) {
            return false;
        }
        let (Some(&src), Some(&dst)) = (
            self.node_handles.get(&edge.source),
            self.node_handles.get(&edge.target),
        ) else {
            return false;
        };
        let idx = self.edges.len();
        self.edge_handles.insert(edge.id.clone(), idx);
        self.edges.push(edge);
        self.outgoing[src].push(idx);
        self.incoming[dst].push(idx);
        true
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.node_handles.contains_key(id)
    }

    pub fn has_edge(&self, id: &str) -> bool {
        self.edge_handles.contains_key(id)
    }

    pub fn handle_of(&self, id: &str) -> Option<NodeHandle> {
        self.node_handles.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.handle_of(id).map(|h| &self.nodes[h])
    }

    pub fn node_at(&self, handle: NodeHandle) -> &Node {
        &self.nodes[handle]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Iterate over all edges incident to `handle`, yielding `(edge, far)`
    /// where `far` is the handle at the other end. Outgoing edges first, then
    /// incoming — activation treats both directions symmetrically.
    pub fn neighbors(&self, handle: NodeHandle) -> impl Iterator<Item = (&Edge, NodeHandle)> {
        let out = self.outgoing[handle].iter().map(move |&i| {
            let edge = &self.edges[i];
            (edge, self.node_handles[&edge.target])
        });
        let inc = self.incoming[handle].iter().map(move |&i| {
            let edge = &self.edges[i];
            (edge, self.node_handles[&edge.source])
        });
        out.chain(inc)
    }
}
