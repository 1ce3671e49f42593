//! SQLite-backed [`GraphStorage`].
//!
//! Synchronous `rusqlite` behind an `Arc<Mutex<Connection>>`, bridged to
//! async with `tokio::task::spawn_blocking`. Rows that fail to parse (an
//! unknown node type or relation from an inconsistent ingestion run) are
//! skipped with a warning rather than failing the load — robustness against
//! partial data belongs here, not in exception handling at the boundary.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, warn};

use crate::disposition::{DispositionDeltas, DispositionRecord};
use crate::error::{RecallError, StorageError};
use crate::graph::{Edge, Graph, Node, RelationKind};
use crate::scope::ScopeAddress;
use crate::storage::{schema, GraphStorage};

const DEFAULT_HISTORY_CAP: usize = 50;

pub struct SqliteStorage {
    db: Arc<Mutex<Connection>>,
    history_cap: usize,
}

impl SqliteStorage {
    /// Open (or create) the database at `path` with schema initialized.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::Task(format!("failed to create {}: {e}", parent.display())))?;
        }

        let conn = Connection::open(path)?;
        // WAL for better concurrent read performance
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::init_schema(&conn)?;

        info!(path = %path.display(), "graph storage initialized");
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
            history_cap: DEFAULT_HISTORY_CAP,
        })
    }

    /// Open an in-memory database — used by tests and ephemeral worlds.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::init_schema(&conn)?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
            history_cap: DEFAULT_HISTORY_CAP,
        })
    }

    /// Override the per-record disposition history bound.
    pub fn with_history_cap(mut self, cap: usize) -> Self {
        self.history_cap = cap;
        self
    }

    /// Run a closure against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut conn = db
                .lock()
                .map_err(|e| StorageError::Task(format!("db lock poisoned: {e}")))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StorageError::Task(format!("blocking task failed: {e}")))?
    }
}

#[async_trait]
impl GraphStorage for SqliteStorage {
    async fn load_graph(
        &self,
        world_id: &str,
        scope: &ScopeAddress,
    ) -> Result<Graph, RecallError> {
        let key = scope.storage_key()?;
        let world = world_id.to_string();
        let graph = self
            .with_conn(move |conn| load_scope(conn, &world, &key))
            .await?;
        Ok(graph)
    }

    async fn save_graph(
        &self,
        world_id: &str,
        scope: &ScopeAddress,
        graph: &Graph,
    ) -> Result<(), RecallError> {
        let key = scope.storage_key()?;
        let world = world_id.to_string();
        let graph = graph.clone();
        self.with_conn(move |conn| save_scope(conn, &world, &key, &graph))
            .await?;
        Ok(())
    }

    async fn get_all_dispositions(
        &self,
        world_id: &str,
        character_id: &str,
    ) -> Result<HashMap<String, DispositionRecord>, StorageError> {
        let world = world_id.to_string();
        let character = character_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT target_id, approval, trust, fear, romance, history \
                 FROM dispositions WHERE world_id = ?1 AND character_id = ?2",
            )?;
            let rows = stmt
                .query_map(params![world, character], |row| {
                    let history_str: String = row.get(5)?;
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i32>(1)?,
                        row.get::<_, i32>(2)?,
                        row.get::<_, i32>(3)?,
                        row.get::<_, i32>(4)?,
                        history_str,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let mut map = HashMap::new();
            for (target, approval, trust, fear, romance, history_str) in rows {
                let history = serde_json::from_str(&history_str).unwrap_or_else(|e| {
                    warn!(%target, error = %e, "unparseable disposition history, dropping");
                    Vec::new()
                });
                map.insert(
                    target.clone(),
                    DispositionRecord {
                        character_id: character.clone(),
                        target_id: target,
                        approval,
                        trust,
                        fear,
                        romance,
                        history,
                    },
                );
            }
            Ok(map)
        })
        .await
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
        let world = world_id.to_string();
        let character = character_id.to_string();
        let target = target_id.to_string();
        let deltas = deltas.clone();
        let reason = reason.to_string();
        let cap = self.history_cap;

        self.with_conn(move |conn| {
            let existing = conn
                .query_row(
                    "SELECT approval, trust, fear, romance, history FROM dispositions \
                     WHERE world_id = ?1 AND character_id = ?2 AND target_id = ?3",
                    params![world, character, target],
                    |row| {
                        let history_str: String = row.get(4)?;
                        Ok((
                            row.get::<_, i32>(0)?,
                            row.get::<_, i32>(1)?,
                            row.get::<_, i32>(2)?,
                            row.get::<_, i32>(3)?,
                            history_str,
                        ))
                    },
                )
                .optional()?;

            // Created lazily on first delta application.
            let mut record = match existing {
                Some((approval, trust, fear, romance, history_str)) => DispositionRecord {
                    character_id: character.clone(),
                    target_id: target.clone(),
                    approval,
                    trust,
                    fear,
                    romance,
                    history: serde_json::from_str(&history_str).unwrap_or_else(|e| {
                        warn!(%target, error = %e, "unparseable disposition history, dropping");
                        Vec::new()
                    }),
                },
                None => DispositionRecord::neutral(character.clone(), target.clone()),
            };

            record.apply(&deltas, &reason, game_day, cap);

            let history_json = serde_json::to_string(&record.history)?;
            let now = chrono::Utc::now().to_rfc3339();
            conn.execute(
                "INSERT OR REPLACE INTO dispositions \
                 (world_id, character_id, target_id, approval, trust, fear, romance, history, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    world,
                    character,
                    target,
                    record.approval,
                    record.trust,
                    record.fear,
                    record.romance,
                    history_json,
                    now
                ],
            )?;

            Ok(record)
        })
        .await
    }

    async fn find_area_origin(
        &self,
        world_id: &str,
        area_id: &str,
    ) -> Result<Option<String>, StorageError> {
        let world = world_id.to_string();
        // Ids routinely contain underscores, which LIKE treats as a
        // single-character wildcard — escape so the area id matches literally.
        let pattern = format!("chapter/%/area/{}", escape_like(area_id));
        self.with_conn(move |conn| {
            let path: Option<String> = conn
                .query_row(
                    "SELECT scope_path FROM nodes \
                     WHERE world_id = ?1 AND scope_path LIKE ?2 ESCAPE '\\' \
                     ORDER BY scope_path LIMIT 1",
                    params![world, pattern],
                    |row| row.get(0),
                )
                .optional()?;

            // scope_path is "chapter/{c}/area/{a}" — the chapter id is the
            // second segment.
            Ok(path.and_then(|p| p.split('/').nth(1).map(str::to_string)))
        })
        .await
    }

    async fn known_characters(&self, world_id: &str) -> Result<Vec<String>, StorageError> {
        let world = world_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT scope_path FROM nodes \
                 WHERE world_id = ?1 AND scope_path LIKE 'character/%'",
            )?;
            let rows = stmt
                .query_map(params![world], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows
                .into_iter()
                .filter_map(|p| p.strip_prefix("character/").map(str::to_string))
                .collect())
        })
        .await
    }
}

/// Escape LIKE metacharacters so an id matches literally under `ESCAPE '\'`.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// ── Sync row plumbing ─────────────────────────────────────────────────────────

fn load_scope(conn: &Connection, world_id: &str, key: &str) -> Result<Graph, StorageError> {
    let mut graph = Graph::new();

    let mut stmt = conn.prepare(
        "SELECT id, type, name, importance, chapter, properties \
         FROM nodes WHERE world_id = ?1 AND scope_path = ?2",
    )?;
    let node_rows = stmt
        .query_map(params![world_id, key], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    for (id, type_str, name, importance, chapter, properties) in node_rows {
        let node_type = match type_str.parse() {
            Ok(t) => t,
            Err(e) => {
                warn!(%id, error = %e, "skipping node with unknown type");
                continue;
            }
        };
        graph.nodes.push(Node {
            id,
            node_type,
            name,
            importance,
            chapter,
            properties: properties.and_then(|s| serde_json::from_str(&s).ok()),
        });
    }

    let mut stmt = conn.prepare(
        "SELECT id, source, target, relation, weight, chapter, properties \
         FROM edges WHERE world_id = ?1 AND scope_path = ?2",
    )?;
    let edge_rows = stmt
        .query_map(params![world_id, key], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<String>>(6)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    for (id, source, target, relation_str, weight, chapter, properties) in edge_rows {
        let relation = match relation_str.parse() {
            Ok(r) => r,
            Err(e) => {
                warn!(%id, error = %e, "skipping edge with unknown relation");
                continue;
            }
        };
        graph.edges.push(Edge {
            id,
            source,
            target,
            relation,
            weight,
            chapter,
            properties: properties.and_then(|s| serde_json::from_str(&s).ok()),
        });
    }

    Ok(graph)
}

fn save_scope(
    conn: &mut Connection,
    world_id: &str,
    key: &str,
    graph: &Graph,
) -> Result<(), StorageError> {
    let tx = conn.transaction()?;

    tx.execute(
        "DELETE FROM nodes WHERE world_id = ?1 AND scope_path = ?2",
        params![world_id, key],
    )?;
    tx.execute(
        "DELETE FROM edges WHERE world_id = ?1 AND scope_path = ?2",
        params![world_id, key],
    )?;

    for node in &graph.nodes {
        let properties = node
            .properties
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        tx.execute(
            "INSERT INTO nodes (world_id, scope_path, id, type, name, importance, chapter, properties) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                world_id,
                key,
                node.id,
                node.node_type.as_str(),
                node.name,
                node.importance.clamp(0.0, 1.0),
                node.chapter,
                properties
            ],
        )?;
    }

    for edge in &graph.edges {
        // Synthesized at recall time, never persisted.
        if edge.relation == RelationKind::Approves {
            warn!(id = %edge.id, "refusing to persist synthetic approves edge");
            continue;
        }
        let properties = edge
            .properties
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        tx.execute(
            "INSERT INTO edges (world_id, scope_path, id, source, target, relation, weight, chapter, properties) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                world_id,
                key,
                edge.id,
                edge.source,
                edge.target,
                edge.relation.as_str(),
                edge.weight.clamp(0.0, 1.0),
                edge.chapter,
                properties
            ],
        )?;
    }

    tx.commit()?;
    Ok(())
}
