#![allow(dead_code)]

use std::sync::Arc;

use reverie::config::RecallConfig;
use reverie::graph::{Edge, Graph, Node, NodeType, RelationKind};
use reverie::recall::RecallOrchestrator;
use reverie::scope::ScopeAddress;
use reverie::storage::{GraphStorage, SqliteStorage};

/// Route tracing through the test harness; enable with `RUST_LOG`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Fresh in-memory storage with schema applied.
pub fn storage() -> Arc<SqliteStorage> {
    init_tracing();
    Arc::new(SqliteStorage::open_in_memory().unwrap())
}

pub fn orchestrator(storage: Arc<SqliteStorage>) -> RecallOrchestrator {
    RecallOrchestrator::new(storage as Arc<dyn GraphStorage>, RecallConfig::default())
}

pub fn node(id: &str, node_type: NodeType) -> Node {
    Node {
        id: id.into(),
        node_type,
        name: id.replace('_', " "),
        importance: 0.5,
        chapter: None,
        properties: None,
    }
}

pub fn placeholder(id: &str, node_type: NodeType) -> Node {
    Node {
        properties: Some(serde_json::json!({"placeholder": true})),
        ..node(id, node_type)
    }
}

pub fn edge(id: &str, source: &str, target: &str, relation: RelationKind, weight: f64) -> Edge {
    Edge {
        id: id.into(),
        source: source.into(),
        target: target.into(),
        relation,
        weight,
        chapter: None,
        properties: None,
    }
}

pub async fn save(
    storage: &Arc<SqliteStorage>,
    world: &str,
    scope: ScopeAddress,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
) {
    let graph = Graph { nodes, edges };
    storage.save_graph(world, &scope, &graph).await.unwrap();
}

/// Seed the fixture world `velden`:
///
/// - `world`: the War of Ash and general lore
/// - `camp`: companion Elena
/// - `character/gorn` and `character/marcus`: private graphs
/// - `chapter/ch1/area/mill`: the mill, its ghost, and a placeholder stub
pub async fn seed_velden(storage: &Arc<SqliteStorage>) {
    save(
        storage,
        "velden",
        ScopeAddress::world(),
        vec![
            node("war_of_ash", NodeType::Event),
            node("velden_lore", NodeType::Concept),
            node("old_prophecy", NodeType::Concept),
        ],
        vec![
            edge(
                "war_lore",
                "war_of_ash",
                "velden_lore",
                RelationKind::RelatedTo,
                0.8,
            ),
            edge(
                "lore_prophecy",
                "velden_lore",
                "old_prophecy",
                RelationKind::RelatedTo,
                0.5,
            ),
        ],
    )
    .await;

    save(
        storage,
        "velden",
        ScopeAddress::camp(),
        vec![node("elena", NodeType::Character)],
        vec![],
    )
    .await;

    save(
        storage,
        "velden",
        ScopeAddress::character("gorn"),
        vec![
            node("gorn", NodeType::Character),
            node("gorn_oath", NodeType::Concept),
        ],
        vec![edge(
            "gorn_knows_oath",
            "gorn",
            "gorn_oath",
            RelationKind::KnowsAbout,
            0.9,
        )],
    )
    .await;

    save(
        storage,
        "velden",
        ScopeAddress::character("marcus"),
        vec![
            node("person_marcus", NodeType::Character),
            node("marcus_secret", NodeType::Concept),
        ],
        vec![edge(
            "marcus_knows_secret",
            "person_marcus",
            "marcus_secret",
            RelationKind::KnowsAbout,
            0.9,
        )],
    )
    .await;

    // The mill was authored under chapter 1; later chapters reference it.
    save(
        storage,
        "velden",
        ScopeAddress::area("ch1", "mill"),
        vec![
            node("mill", NodeType::Location),
            node("miller_ghost", NodeType::Character),
            placeholder("stub_bandit", NodeType::Character),
        ],
        vec![
            edge(
                "mill_ghost",
                "mill",
                "miller_ghost",
                RelationKind::LocatedIn,
                0.9,
            ),
            edge(
                "mill_stub",
                "mill",
                "stub_bandit",
                RelationKind::LocatedIn,
                0.9,
            ),
        ],
    )
    .await;
}
