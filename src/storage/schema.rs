//! SQL DDL for the scoped graph tables.
//!
//! Defines the `nodes`, `edges`, and `dispositions` tables. Nodes and edges
//! are keyed by `(world_id, scope_path, id)` — the hierarchical scope path is
//! the storage key a [`crate::scope::ScopeAddress`] resolves to. All DDL uses
//! `IF NOT EXISTS` for idempotent initialization.
//!
//! The `approves` relation is deliberately absent from the edge CHECK: those
//! edges are synthesized from disposition records at recall time and must
//! never be persisted.

use rusqlite::Connection;

const SCHEMA_SQL: &str = r#"
-- Scoped graph nodes
CREATE TABLE IF NOT EXISTS nodes (
    world_id TEXT NOT NULL,
    scope_path TEXT NOT NULL,
    id TEXT NOT NULL,
    type TEXT NOT NULL CHECK(type IN ('character','location','area','item','event','faction','concept')),
    name TEXT NOT NULL,
    importance REAL NOT NULL DEFAULT 0.5 CHECK(importance >= 0.0 AND importance <= 1.0),
    chapter TEXT,
    properties TEXT,
    PRIMARY KEY (world_id, scope_path, id)
);

CREATE INDEX IF NOT EXISTS idx_nodes_scope ON nodes(world_id, scope_path);
CREATE INDEX IF NOT EXISTS idx_nodes_type ON nodes(type);

-- Scoped graph edges
CREATE TABLE IF NOT EXISTS edges (
    world_id TEXT NOT NULL,
    scope_path TEXT NOT NULL,
    id TEXT NOT NULL,
    source TEXT NOT NULL,
    target TEXT NOT NULL,
    relation TEXT NOT NULL CHECK(relation IN ('knows_about','located_in','member_of','owns','participated_in','caused','related_to')),
    weight REAL NOT NULL DEFAULT 0.5 CHECK(weight >= 0.0 AND weight <= 1.0),
    chapter TEXT,
    properties TEXT,
    PRIMARY KEY (world_id, scope_path, id)
);

CREATE INDEX IF NOT EXISTS idx_edges_scope ON edges(world_id, scope_path);
CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source);
CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target);

-- Disposition records with embedded bounded history
CREATE TABLE IF NOT EXISTS dispositions (
    world_id TEXT NOT NULL,
    character_id TEXT NOT NULL,
    target_id TEXT NOT NULL,
    approval INTEGER NOT NULL DEFAULT 0 CHECK(approval BETWEEN -100 AND 100),
    trust INTEGER NOT NULL DEFAULT 0 CHECK(trust BETWEEN -100 AND 100),
    fear INTEGER NOT NULL DEFAULT 0 CHECK(fear BETWEEN -100 AND 100),
    romance INTEGER NOT NULL DEFAULT 0 CHECK(romance BETWEEN -100 AND 100),
    history TEXT NOT NULL DEFAULT '[]',
    updated_at TEXT NOT NULL,
    PRIMARY KEY (world_id, character_id, target_id)
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_initializes_and_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' \
                 AND name IN ('nodes','edges','dispositions')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn approves_relation_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO edges (world_id, scope_path, id, source, target, relation, weight) \
             VALUES ('w', 'world', 'e1', 'a', 'b', 'approves', 0.5)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn out_of_range_disposition_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO dispositions (world_id, character_id, target_id, approval, updated_at) \
             VALUES ('w', 'gorn', 'elena', 150, '2026-01-01T00:00:00Z')",
            [],
        );
        assert!(result.is_err());
    }
}
