//! Spreading activation — the ranking core.
//!
//! [`spread`] propagates decaying activation outward from seed nodes across a
//! merged [`KnowledgeGraph`], producing per-node relevance scores.
//! [`extract_subgraph`] then cuts the induced subgraph over the activated
//! nodes for injection into downstream text generation.
//!
//! Semantics are "strongest single evocation": a node reachable via multiple
//! paths takes the **maximum** candidate value, never the sum, which prevents
//! inflation at densely connected hubs.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::knowledge::{KnowledgeGraph, NodeHandle};
use crate::graph::types::Graph;

/// Per-call activation parameters, derived from the request intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationConfig {
    /// Nodes whose final activation falls below this are neither expanded
    /// nor returned.
    pub output_threshold: f64,
    /// Per-hop attenuation, `< 1.0`. Guarantees termination and prefers
    /// nearer nodes.
    pub decay: f64,
    /// Replaces `decay` for hops whose edge (or far node) was authored under
    /// the current chapter — recent-chapter memories feel more vivid.
    pub chapter_boost: f64,
    pub current_chapter_id: Option<String>,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            output_threshold: 0.25,
            decay: 0.7,
            chapter_boost: 0.95,
            current_chapter_id: None,
        }
    }
}

/// Frontier entry ordered by activation value (max-heap).
struct Candidate {
    value: f64,
    handle: NodeHandle,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.handle == other.handle
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .total_cmp(&other.value)
            .then_with(|| self.handle.cmp(&other.handle))
    }
}

/// Spread activation from `seed_ids` across `graph`.
///
/// Seeds start at 1.0. Best-first expansion: a node whose value later
/// improves via a stronger path is re-queued and re-expanded, so this is not
/// plain visited-once BFS. Seed ids absent from the graph must be dropped by
/// the caller before this call; they are ignored here.
///
/// Returns every node whose final activation is at least
/// `config.output_threshold`, seeds always included at 1.0.
pub fn spread(
    graph: &KnowledgeGraph,
    seed_ids: &[String],
    config: &ActivationConfig,
) -> HashMap<String, f64> {
    let mut best: HashMap<NodeHandle, f64> = HashMap::new();
    let mut frontier = BinaryHeap::new();

    for id in seed_ids {
        if let Some(handle) = graph.handle_of(id) {
            best.insert(handle, 1.0);
            frontier.push(Candidate { value: 1.0, handle });
        }
    }

    while let Some(Candidate { value, handle }) = frontier.pop() {
        // Stale entry — a stronger path already updated this node.
        if value < best.get(&handle).copied().unwrap_or(0.0) {
            continue;
        }
        // Below the threshold a node stops being expanded, though it may be
        // re-reached and re-queued at a higher value later.
        if value < config.output_threshold {
            continue;
        }

        for (edge, far) in graph.neighbors(handle) {
            let multiplier = if hop_in_chapter(graph, edge.chapter.as_deref(), far, config) {
                config.chapter_boost
            } else {
                config.decay
            };
            // An amplifying factor would let a cycle grow without bound; cap
            // at 1.0 so strict-improvement re-queueing still terminates.
            let candidate = value * edge.weight * multiplier.min(1.0);
            if candidate <= 0.0 {
                continue;
            }
            let current = best.get(&far).copied().unwrap_or(0.0);
            if candidate > current {
                best.insert(far, candidate);
                frontier.push(Candidate {
                    value: candidate,
                    handle: far,
                });
            }
        }
    }

    let activated: HashMap<String, f64> = best
        .into_iter()
        .filter(|(_, v)| *v >= config.output_threshold)
        .map(|(h, v)| (graph.node_at(h).id.clone(), v))
        .collect();

    debug!(
        seeds = seed_ids.len(),
        activated = activated.len(),
        threshold = config.output_threshold,
        "activation spread complete"
    );
    activated
}

fn hop_in_chapter(
    graph: &KnowledgeGraph,
    edge_chapter: Option<&str>,
    far: NodeHandle,
    config: &ActivationConfig,
) -> bool {
    let Some(current) = config.current_chapter_id.as_deref() else {
        return false;
    };
    if edge_chapter == Some(current) {
        return true;
    }
    graph.node_at(far).chapter.as_deref() == Some(current)
}

/// Extract the induced subgraph over the activated nodes.
///
/// Keeps nodes present in `activated`, dropping placeholder stubs, and keeps
/// edges whose endpoints both survive.
pub fn extract_subgraph(graph: &KnowledgeGraph, activated: &HashMap<String, f64>) -> Graph {
    let mut result = Graph::new();

    for node in graph.nodes() {
        if activated.contains_key(&node.id) && !node.is_placeholder() {
            result.nodes.push(node.clone());
        }
    }

    let retained: std::collections::HashSet<&str> =
        result.nodes.iter().map(|n| n.id.as_str()).collect();

    for edge in graph.edges() {
        if retained.contains(edge.source.as_str()) && retained.contains(edge.target.as_str()) {
            result.edges.push(edge.clone());
        }
    }

    result
}
