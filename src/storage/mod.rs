//! The persistence contract and its SQLite implementation.
//!
//! [`GraphStorage`] is the storage-technology-agnostic boundary: scoped
//! node/edge collections keyed by hierarchical scope path, plus disposition
//! records keyed per (world, character, target). The orchestrator only ever
//! talks to `Arc<dyn GraphStorage>`.

pub mod schema;
pub mod sqlite;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::disposition::{DispositionDeltas, DispositionRecord};
use crate::error::{RecallError, StorageError};
use crate::graph::Graph;
use crate::scope::ScopeAddress;

/// Persistence interface for scoped graphs and disposition records.
///
/// Loads are pure reads and may be issued concurrently and abandoned on
/// caller timeout. `update_disposition` is the only durable mutation this
/// subsystem performs; concurrent updates to the same (character, target)
/// pair are last-write-wins.
#[async_trait]
pub trait GraphStorage: Send + Sync {
    /// Load one scope's nodes and edges. Absent scopes yield an empty
    /// [`Graph`], never an error; only I/O failures propagate.
    async fn load_graph(&self, world_id: &str, scope: &ScopeAddress)
        -> Result<Graph, RecallError>;

    /// Replace one scope's contents wholesale — the write path used by the
    /// ingestion collaborator (and tests). Runs in a single transaction.
    async fn save_graph(
        &self,
        world_id: &str,
        scope: &ScopeAddress,
        graph: &Graph,
    ) -> Result<(), RecallError>;

    /// All disposition records where `character_id` is the source, keyed by
    /// target id.
    async fn get_all_dispositions(
        &self,
        world_id: &str,
        character_id: &str,
    ) -> Result<HashMap<String, DispositionRecord>, StorageError>;

    /// Read-or-create the (character, target) record, apply deltas with
    /// clamp-on-write, append a history entry, write back, and return the
    /// new state.
    async fn update_disposition(
        &self,
        world_id: &str,
        character_id: &str,
        target_id: &str,
        deltas: &DispositionDeltas,
        reason: &str,
        game_day: Option<u32>,
    ) -> Result<DispositionRecord, StorageError>;

    /// World-level area→chapter index: the chapter an area's content was
    /// originally authored under, if any. Backs the area-fallback path when
    /// an area is referenced from a chapter it was not authored in.
    async fn find_area_origin(
        &self,
        world_id: &str,
        area_id: &str,
    ) -> Result<Option<String>, StorageError>;

    /// Ids of every character with a persisted character scope in this
    /// world. Backs extra-character-scope detection from seeds.
    async fn known_characters(&self, world_id: &str) -> Result<Vec<String>, StorageError>;
}

pub use sqlite::SqliteStorage;
