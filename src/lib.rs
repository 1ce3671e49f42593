//! Scoped knowledge-graph memory for AI game masters.
//!
//! Reverie is the recall subsystem of a game-master backend: given an acting
//! character and a set of semantic seed concepts, it loads the relevant
//! scoped partitions of a world's knowledge graph, merges them into one
//! per-call view, injects live disposition edges, and ranks nodes by
//! decay-weighted spreading activation from the seeds.
//!
//! # Architecture
//!
//! - **Storage**: SQLite behind the [`storage::GraphStorage`] trait; nodes
//!   and edges keyed by hierarchical scope path
//!   (`world`, `chapter/{c}/area/{a}`, `character/{id}`, ...)
//! - **Merging**: per-call [`graph::KnowledgeGraph`] arena with first-seen-id
//!   precedence and dangling-edge rejection
//! - **Ranking**: max-over-paths spreading activation with per-hop decay and
//!   a current-chapter boost
//! - **Dispositions**: clamped `[-100, 100]` affinity records projected as
//!   synthetic `approves` edges at recall time
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`scope`] — Scoped addressing of world-graph partitions
//! - [`graph`] — Graph types, the merged arena, and the activation core
//! - [`disposition`] — Affinity records with clamp-on-write semantics
//! - [`storage`] — The persistence contract and its SQLite implementation
//! - [`recall`] — The orchestrator façade consumed by dialogue and NPC services

pub mod config;
pub mod disposition;
pub mod error;
pub mod graph;
pub mod recall;
pub mod scope;
pub mod storage;

pub use config::RecallConfig;
pub use error::{RecallError, StorageError};
pub use recall::{RecallIntent, RecallOrchestrator, RecallRequest, RecallResult};
