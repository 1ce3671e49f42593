//! The recall façade — scope selection, concurrent loading, merging,
//! disposition injection, seed expansion, and activation.
//!
//! [`RecallOrchestrator::recall`] is the full pipeline; [`recall_lean`]
//! trades coverage for latency by loading only the area and acting-character
//! scopes. Per-scope load failures degrade coverage but never fail the call;
//! an unresolvable seed set is a defined empty result, not an error. The
//! merged graph lives for exactly one call — scoped data can change between
//! turns, so caching it would silently serve stale memory.

pub mod intent;

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::RecallConfig;
use crate::disposition::{DispositionDeltas, DispositionRecord};
use crate::error::{RecallError, StorageError};
use crate::graph::{extract_subgraph, spread, Edge, Graph, KnowledgeGraph, RelationKind};
use crate::scope::{ScopeAddress, ScopeType};
use crate::storage::GraphStorage;

pub use intent::{activation_config_for, RecallIntent};

/// Entity-id prefixes the ingestion pipeline writes. Seed matching is
/// prefix-tolerant: a caller may hand us `marcus`, `person_marcus`, or
/// `character_marcus` for the same entity.
const ENTITY_PREFIXES: [&str; 4] = ["person_", "character_", "location_", "area_"];

/// One recall invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecallRequest {
    pub world_id: String,
    pub character_id: String,
    /// Semantic seed concepts activation starts from.
    pub seeds: Vec<String>,
    pub intent: Option<RecallIntent>,
    pub chapter_id: Option<String>,
    pub area_id: Option<String>,
}

impl RecallRequest {
    pub fn new(
        world_id: impl Into<String>,
        character_id: impl Into<String>,
        seeds: Vec<String>,
    ) -> Self {
        Self {
            world_id: world_id.into(),
            character_id: character_id.into(),
            seeds,
            intent: None,
            chapter_id: None,
            area_id: None,
        }
    }

    pub fn with_intent(mut self, intent: RecallIntent) -> Self {
        self.intent = Some(intent);
        self
    }

    pub fn with_chapter(mut self, chapter_id: impl Into<String>) -> Self {
        self.chapter_id = Some(chapter_id.into());
        self
    }

    pub fn with_area(mut self, area_id: impl Into<String>) -> Self {
        self.area_id = Some(area_id.into());
        self
    }
}

/// Ranked result of one recall call. Transient — never cached across calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecallResult {
    /// Seed ids that resolved to nodes in the merged graph.
    pub seed_nodes: Vec<String>,
    /// Final activation per node id, every value ≥ the intent's threshold.
    pub activated_nodes: HashMap<String, f64>,
    /// Induced subgraph over the activated nodes, placeholder-free.
    pub subgraph: Option<Graph>,
    /// `false` means no seed resolved and activation never ran — a valid
    /// empty outcome, not an error.
    pub used_subgraph: bool,
}

impl RecallResult {
    fn empty() -> Self {
        Self {
            seed_nodes: Vec::new(),
            activated_nodes: HashMap::new(),
            subgraph: None,
            used_subgraph: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ScopeMode {
    Full,
    Lean,
}

/// Façade over storage + merge + activation, consumed in-process by the
/// dialogue, teammate, and NPC-reaction services.
pub struct RecallOrchestrator {
    storage: Arc<dyn GraphStorage>,
    config: RecallConfig,
}

impl RecallOrchestrator {
    pub fn new(storage: Arc<dyn GraphStorage>, config: RecallConfig) -> Self {
        Self { storage, config }
    }

    /// Full-mode recall: character + camp + world scopes, plus chapter and
    /// area when known, plus extra character scopes implied by the seeds.
    pub async fn recall(&self, req: &RecallRequest) -> Result<RecallResult, RecallError> {
        self.run(req, ScopeMode::Full).await
    }

    /// Lean-mode recall: only the area (when known) and acting-character
    /// scopes — trades completeness for latency.
    pub async fn recall_lean(&self, req: &RecallRequest) -> Result<RecallResult, RecallError> {
        self.run(req, ScopeMode::Lean).await
    }

    /// Apply gameplay deltas to one disposition pair. Unlike scope loads,
    /// failures here are user-visible mutations and propagate.
    pub async fn update_disposition(
        &self,
        world_id: &str,
        character_id: &str,
        target_id: &str,
        deltas: &DispositionDeltas,
        reason: &str,
        game_day: Option<u32>,
    ) -> Result<DispositionRecord, StorageError> {
        self.storage
            .update_disposition(world_id, character_id, target_id, deltas, reason, game_day)
            .await
    }

    pub async fn get_all_dispositions(
        &self,
        world_id: &str,
        character_id: &str,
    ) -> Result<HashMap<String, DispositionRecord>, StorageError> {
        self.storage.get_all_dispositions(world_id, character_id).await
    }

    async fn run(&self, req: &RecallRequest, mode: ScopeMode) -> Result<RecallResult, RecallError> {
        let activation = activation_config_for(req.intent, &self.config, req.chapter_id.clone());

        let mut scopes = self.select_scopes(req, mode);
        self.add_seed_character_scopes(req, &mut scopes).await;

        let mut loaded = self.load_scopes(&req.world_id, scopes).await?;
        self.apply_area_fallback(req, &mut loaded).await;

        let mut merged = KnowledgeGraph::merge_from(loaded);
        debug!(
            nodes = merged.node_count(),
            edges = merged.edge_count(),
            "merged recall graph"
        );

        self.inject_dispositions(req, &mut merged).await;

        let seed_nodes = expand_seeds(&req.seeds, &merged);
        if seed_nodes.is_empty() {
            info!(
                character = %req.character_id,
                seeds = ?req.seeds,
                "no seed resolved to a known node, returning empty recall"
            );
            return Ok(RecallResult::empty());
        }

        let activated_nodes = spread(&merged, &seed_nodes, &activation);
        let subgraph = extract_subgraph(&merged, &activated_nodes);

        Ok(RecallResult {
            seed_nodes,
            activated_nodes,
            subgraph: Some(subgraph),
            used_subgraph: true,
        })
    }

    fn select_scopes(&self, req: &RecallRequest, mode: ScopeMode) -> Vec<ScopeAddress> {
        let mut scopes = match mode {
            ScopeMode::Full => {
                let mut s = vec![
                    ScopeAddress::character(&req.character_id),
                    ScopeAddress::camp(),
                    ScopeAddress::world(),
                ];
                if let Some(chapter) = &req.chapter_id {
                    s.push(ScopeAddress::chapter(chapter));
                }
                s
            }
            ScopeMode::Lean => vec![ScopeAddress::character(&req.character_id)],
        };
        if let (Some(chapter), Some(area)) = (&req.chapter_id, &req.area_id) {
            scopes.push(ScopeAddress::area(chapter, area));
        }
        scopes
    }

    /// "What do I know about NPC X" should pull X's own private graph: any
    /// seed whose prefix-stripped id names a known character (other than the
    /// acting one) adds that character's scope to the load set.
    async fn add_seed_character_scopes(&self, req: &RecallRequest, scopes: &mut Vec<ScopeAddress>) {
        let known = match self.storage.known_characters(&req.world_id).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "character index unavailable, skipping extra scopes");
                return;
            }
        };

        for seed in &req.seeds {
            for candidate in strip_prefixes(seed) {
                if candidate == req.character_id || !known.iter().any(|id| id == &candidate) {
                    continue;
                }
                let scope = ScopeAddress::character(&candidate);
                if !scopes.contains(&scope) {
                    debug!(character = %candidate, %seed, "adding seed-implied character scope");
                    scopes.push(scope);
                }
            }
        }
    }

    /// Fan out all scope loads concurrently and join. An individual scope
    /// failure is logged and excluded — degraded coverage, never a failed
    /// call. Invalid scope addresses are programming errors and do fail it.
    async fn load_scopes(
        &self,
        world_id: &str,
        scopes: Vec<ScopeAddress>,
    ) -> Result<Vec<(ScopeAddress, Graph)>, RecallError> {
        let futures = scopes.into_iter().map(|scope| {
            let storage = &self.storage;
            async move {
                let result = storage.load_graph(world_id, &scope).await;
                (scope, result)
            }
        });

        let mut loaded = Vec::new();
        for (scope, result) in join_all(futures).await {
            match result {
                Ok(graph) => loaded.push((scope, graph)),
                Err(err @ RecallError::InvalidScope(_)) => return Err(err),
                Err(RecallError::Storage(e)) => {
                    warn!(scope = %scope, error = %e, "scope load failed, excluding from recall");
                }
            }
        }
        Ok(loaded)
    }

    /// Content is sometimes authored under one chapter but referenced from
    /// another. When the requested area loads empty, retry under the chapter
    /// the area was originally authored in and substitute a non-empty result.
    async fn apply_area_fallback(
        &self,
        req: &RecallRequest,
        loaded: &mut Vec<(ScopeAddress, Graph)>,
    ) {
        let Some(area_id) = &req.area_id else { return };
        let Some(entry) = loaded
            .iter_mut()
            .find(|(scope, _)| scope.scope_type == ScopeType::Area)
        else {
            return;
        };
        if !entry.1.is_empty() {
            return;
        }

        let origin = match self.storage.find_area_origin(&req.world_id, area_id).await {
            Ok(Some(chapter)) => chapter,
            Ok(None) => return,
            Err(e) => {
                warn!(area = %area_id, error = %e, "area origin lookup failed");
                return;
            }
        };
        if Some(&origin) == req.chapter_id.as_ref() {
            return;
        }

        let fallback = ScopeAddress::area(&origin, area_id);
        match self.storage.load_graph(&req.world_id, &fallback).await {
            Ok(graph) if !graph.is_empty() => {
                info!(area = %area_id, origin_chapter = %origin, "using area graph from authoring chapter");
                *entry = (fallback, graph);
            }
            Ok(_) => {}
            Err(e) => {
                warn!(scope = %fallback, error = %e, "area fallback load failed");
            }
        }
    }

    /// Project live disposition records into the merged graph as synthetic
    /// `approves` edges. Idempotent on edge id; skipped when an endpoint is
    /// missing; failures never abort recall.
    async fn inject_dispositions(&self, req: &RecallRequest, merged: &mut KnowledgeGraph) {
        let dispositions = match self
            .storage
            .get_all_dispositions(&req.world_id, &req.character_id)
            .await
        {
            Ok(map) => map,
            Err(e) => {
                warn!(error = %e, "disposition load failed, recalling without them");
                return;
            }
        };

        let Some(source) = resolve_node_id(merged, &req.character_id) else {
            return;
        };

        let mut injected = 0usize;
        for (target_id, record) in &dispositions {
            let Some(target) = resolve_node_id(merged, target_id) else {
                continue;
            };
            let edge_id = format!(
                "disposition_{}_{}_approves",
                req.character_id, target_id
            );
            if merged.has_edge(&edge_id) {
                continue;
            }
            let added = merged.add_edge(Edge {
                id: edge_id,
                source: source.clone(),
                target,
                relation: RelationKind::Approves,
                weight: record.approves_weight(),
                chapter: None,
                properties: Some(serde_json::json!({
                    "approval": record.approval,
                    "trust": record.trust,
                })),
            });
            if added {
                injected += 1;
            }
        }
        debug!(injected, "disposition edges injected");
    }
}

/// All prefix-stripped forms of a seed id, the raw id included.
fn strip_prefixes(seed: &str) -> Vec<String> {
    let mut out = vec![seed.to_string()];
    for prefix in ENTITY_PREFIXES {
        if let Some(stripped) = seed.strip_prefix(prefix) {
            out.push(stripped.to_string());
        }
    }
    out
}

/// Prefix-tolerant lookup: resolve a raw id to the node id actually present
/// in the merged graph, trying the id as-is, stripped, and prefixed.
fn resolve_node_id(graph: &KnowledgeGraph, raw: &str) -> Option<String> {
    for candidate in seed_variants(raw) {
        if graph.has_node(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// The raw seed plus every with-/without-prefix variant, in stable order.
fn seed_variants(seed: &str) -> Vec<String> {
    let mut variants = vec![seed.to_string()];
    for prefix in ENTITY_PREFIXES {
        if let Some(stripped) = seed.strip_prefix(prefix) {
            variants.push(stripped.to_string());
        }
    }
    for prefix in ENTITY_PREFIXES {
        variants.push(format!("{prefix}{seed}"));
    }
    variants
}

/// Expand raw seeds against the merged graph, keeping every variant that
/// resolves to a node. Order-preserving and deduplicated.
fn expand_seeds(seeds: &[String], graph: &KnowledgeGraph) -> Vec<String> {
    let mut resolved: Vec<String> = Vec::new();
    for seed in seeds {
        for variant in seed_variants(seed) {
            if graph.has_node(&variant) && !resolved.contains(&variant) {
                resolved.push(variant);
            }
        }
    }
    resolved
}
