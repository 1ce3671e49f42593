mod helpers;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use helpers::{orchestrator, seed_velden, storage};
use reverie::disposition::{DispositionDeltas, DispositionRecord};
use reverie::error::{RecallError, StorageError};
use reverie::graph::{Graph, RelationKind};
use reverie::recall::{RecallIntent, RecallRequest};
use reverie::scope::{ScopeAddress, ScopeType};
use reverie::storage::{GraphStorage, SqliteStorage};

fn request(seeds: &[&str]) -> RecallRequest {
    RecallRequest::new("velden", "gorn", seeds.iter().map(|s| s.to_string()).collect())
}

fn approve(n: i32) -> DispositionDeltas {
    DispositionDeltas {
        approval: Some(n),
        ..Default::default()
    }
}

#[tokio::test]
async fn full_recall_spreads_from_seeds() {
    let storage = storage();
    seed_velden(&storage).await;
    let orchestrator = orchestrator(storage);

    let result = orchestrator.recall(&request(&["gorn"])).await.unwrap();

    assert!(result.used_subgraph);
    assert_eq!(result.seed_nodes, vec!["gorn".to_string()]);
    assert_eq!(result.activated_nodes["gorn"], 1.0);
    // One hop across knows_about(0.9) at decay 0.7.
    assert!((result.activated_nodes["gorn_oath"] - 0.63).abs() < 1e-9);
    let subgraph = result.subgraph.unwrap();
    assert!(subgraph.nodes.iter().any(|n| n.id == "gorn_oath"));
}

#[tokio::test]
async fn disposition_projects_as_approves_edge() {
    let storage = storage();
    seed_velden(&storage).await;
    let orchestrator = orchestrator(storage);

    orchestrator
        .update_disposition("velden", "gorn", "elena", &approve(50), "saved her life", Some(3))
        .await
        .unwrap();

    let result = orchestrator.recall(&request(&["gorn"])).await.unwrap();
    let subgraph = result.subgraph.unwrap();

    let edge = subgraph
        .edges
        .iter()
        .find(|e| e.id == "disposition_gorn_elena_approves")
        .expect("synthetic approves edge must be present");
    assert_eq!(edge.relation, RelationKind::Approves);
    assert!((edge.weight - 0.75).abs() < 1e-9);
    assert_eq!(edge.properties.as_ref().unwrap()["approval"], 50);
    // Elena is reachable through the injected edge: 1.0 * 0.75 * 0.7.
    assert!((result.activated_nodes["elena"] - 0.525).abs() < 1e-9);
}

#[tokio::test]
async fn disposition_injection_is_idempotent() {
    let storage = storage();
    seed_velden(&storage).await;
    let orchestrator = orchestrator(storage);

    orchestrator
        .update_disposition("velden", "gorn", "elena", &approve(30), "first", None)
        .await
        .unwrap();
    orchestrator
        .update_disposition("velden", "gorn", "elena", &approve(20), "second", None)
        .await
        .unwrap();

    // Two recalls over the same state: each merged view carries exactly one
    // approves edge per pair.
    for _ in 0..2 {
        let result = orchestrator.recall(&request(&["gorn"])).await.unwrap();
        let subgraph = result.subgraph.unwrap();
        let count = subgraph
            .edges
            .iter()
            .filter(|e| e.id.starts_with("disposition_gorn_elena"))
            .count();
        assert_eq!(count, 1);
    }
}

#[tokio::test]
async fn seed_naming_a_known_character_pulls_their_scope() {
    let storage = storage();
    seed_velden(&storage).await;
    let orchestrator = orchestrator(storage);

    // marcus is a known character distinct from acting gorn; his private
    // graph is not part of gorn's normal scope set.
    let result = orchestrator
        .recall(&request(&["person_marcus"]))
        .await
        .unwrap();

    assert!(result.used_subgraph);
    assert_eq!(result.activated_nodes["person_marcus"], 1.0);
    assert!(result.activated_nodes.contains_key("marcus_secret"));
}

#[tokio::test]
async fn empty_area_falls_back_to_authoring_chapter() {
    let storage = storage();
    seed_velden(&storage).await;
    let orchestrator = orchestrator(storage);

    // The mill was authored under ch1; the request arrives from ch2.
    let req = request(&["mill"]).with_chapter("ch2").with_area("mill");
    let result = orchestrator.recall(&req).await.unwrap();

    assert!(result.used_subgraph);
    assert!(result.activated_nodes.contains_key("miller_ghost"));
}

#[tokio::test]
async fn placeholder_nodes_never_surface() {
    let storage = storage();
    seed_velden(&storage).await;
    let orchestrator = orchestrator(storage);

    let req = request(&["mill"]).with_chapter("ch1").with_area("mill");
    let result = orchestrator.recall(&req).await.unwrap();

    // The stub is activated (it participates in traversal)...
    assert!(result.activated_nodes.contains_key("stub_bandit"));
    // ...but must not appear in the extracted subgraph.
    let subgraph = result.subgraph.unwrap();
    assert!(subgraph.nodes.iter().all(|n| n.id != "stub_bandit"));
    assert!(subgraph.edges.iter().all(|e| e.target != "stub_bandit"));
}

#[tokio::test]
async fn unresolvable_seeds_short_circuit() {
    let storage = storage();
    seed_velden(&storage).await;
    let orchestrator = orchestrator(storage);

    let result = orchestrator.recall(&request(&["dragon"])).await.unwrap();

    assert!(!result.used_subgraph);
    assert!(result.seed_nodes.is_empty());
    assert!(result.activated_nodes.is_empty());
    assert!(result.subgraph.is_none());
}

#[tokio::test]
async fn lean_mode_skips_world_and_camp() {
    let storage = storage();
    seed_velden(&storage).await;
    let orchestrator = orchestrator(storage);

    // World lore resolves in full mode...
    let full = orchestrator.recall(&request(&["war_of_ash"])).await.unwrap();
    assert!(full.used_subgraph);

    // ...but lean mode never loads the world scope.
    let lean = orchestrator
        .recall_lean(&request(&["war_of_ash"]))
        .await
        .unwrap();
    assert!(!lean.used_subgraph);

    // Lean still covers the area and acting character.
    let req = request(&["mill"]).with_chapter("ch1").with_area("mill");
    let lean_area = orchestrator.recall_lean(&req).await.unwrap();
    assert!(lean_area.used_subgraph);
    assert!(lean_area.activated_nodes.contains_key("miller_ghost"));
    assert!(!lean_area.activated_nodes.contains_key("war_of_ash"));
}

#[tokio::test]
async fn broad_intents_reach_deeper_than_tactical() {
    let storage = storage();
    seed_velden(&storage).await;
    let orchestrator = orchestrator(storage);

    // war_of_ash -> velden_lore (0.56) -> old_prophecy (0.196): visible to
    // lore (threshold 0.1), pruned for combat (0.35).
    let lore = orchestrator
        .recall(&request(&["war_of_ash"]).with_intent(RecallIntent::Lore))
        .await
        .unwrap();
    let combat = orchestrator
        .recall(&request(&["war_of_ash"]).with_intent(RecallIntent::Combat))
        .await
        .unwrap();

    assert!(lore.activated_nodes.contains_key("old_prophecy"));
    assert!(!combat.activated_nodes.contains_key("old_prophecy"));
    for id in combat.activated_nodes.keys() {
        assert!(lore.activated_nodes.contains_key(id));
    }
}

#[tokio::test]
async fn repeated_recall_is_deterministic() {
    let storage = storage();
    seed_velden(&storage).await;
    let orchestrator = orchestrator(storage);

    let req = request(&["gorn", "war_of_ash"]).with_intent(RecallIntent::Recall);
    let first = orchestrator.recall(&req).await.unwrap();
    for _ in 0..5 {
        let next = orchestrator.recall(&req).await.unwrap();
        assert_eq!(next.activated_nodes, first.activated_nodes);
        assert_eq!(next.seed_nodes, first.seed_nodes);
    }
}

// ── Partial-failure tolerance ─────────────────────────────────────────────────

/// Wraps real storage but fails every camp-scope load.
struct FlakyStorage {
    inner: Arc<SqliteStorage>,
}

#[async_trait]
impl GraphStorage for FlakyStorage {
    async fn load_graph(
        &self,
        world_id: &str,
        scope: &ScopeAddress,
    ) -> Result<Graph, RecallError> {
        if scope.scope_type == ScopeType::Camp {
            return Err(RecallError::Storage(StorageError::Task(
                "camp shard offline".into(),
            )));
        }
        self.inner.load_graph(world_id, scope).await
    }

    async fn save_graph(
        &self,
        world_id: &str,
        scope: &ScopeAddress,
        graph: &Graph,
    ) -> Result<(), RecallError> {
        self.inner.save_graph(world_id, scope, graph).await
    }

    async fn get_all_dispositions(
        &self,
        world_id: &str,
        character_id: &str,
    ) -> Result<HashMap<String, DispositionRecord>, StorageError> {
        self.inner.get_all_dispositions(world_id, character_id).await
    }

    async fn update_disposition(
        &self,
        world_id: &str,
        character_id: &str,
        target_id: &str,
        deltas: &DispositionDeltas,
        reason: &str,
        game_day: Option<u32>,
    ) -> Result<DispositionRecord, StorageError> {
        self.inner
            .update_disposition(world_id, character_id, target_id, deltas, reason, game_day)
            .await
    }

    async fn find_area_origin(
        &self,
        world_id: &str,
        area_id: &str,
    ) -> Result<Option<String>, StorageError> {
        self.inner.find_area_origin(world_id, area_id).await
    }

    async fn known_characters(&self, world_id: &str) -> Result<Vec<String>, StorageError> {
        self.inner.known_characters(world_id).await
    }
}

#[tokio::test]
async fn scope_load_failure_degrades_but_does_not_fail() {
    let inner = storage();
    seed_velden(&inner).await;
    let flaky = Arc::new(FlakyStorage { inner }) as Arc<dyn GraphStorage>;
    let orchestrator =
        reverie::recall::RecallOrchestrator::new(flaky, reverie::config::RecallConfig::default());

    let result = orchestrator.recall(&request(&["gorn"])).await.unwrap();

    // Camp contribution (elena) is missing, the rest of the recall works.
    assert!(result.used_subgraph);
    assert!(result.activated_nodes.contains_key("gorn_oath"));
    assert!(!result.activated_nodes.contains_key("elena"));
}
