//! Property-graph store backed by SQLite.
//!
//! Node labels map to tables (`lexeme`, `morph`) and relationship types to
//! edge tables (`component`, `derivation`). Writes go through the
//! [`GraphStore`] seam so the loader does not depend on the backend.
use rusqlite::{Connection, ToSql};
use serde_json::Value;
use std::path::Path;
use tracing::info;

use crate::config::StoreConfig;
use crate::error::StoreError;

pub mod models;
pub mod queries;
pub mod read;

pub use queries::WriteOperation;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS lexeme (
    id TEXT PRIMARY KEY NOT NULL,
    lemma TEXT NOT NULL,
    pos TEXT NOT NULL,
    lang TEXT NOT NULL,
    is_root INTEGER NOT NULL DEFAULT 1,
    corpus_count REAL NOT NULL DEFAULT 0,
    corpus_log_count REAL NOT NULL DEFAULT 0,
    features TEXT NOT NULL DEFAULT '{}',
    misc TEXT NOT NULL DEFAULT '{}',
    morphology TEXT,
    corpus_stats TEXT
);

CREATE TABLE IF NOT EXISTS morph (
    id TEXT PRIMARY KEY NOT NULL,
    text TEXT NOT NULL,
    type TEXT NOT NULL,
    lang TEXT NOT NULL,
    corpus_count REAL NOT NULL DEFAULT 0,
    corpus_log_count REAL NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS component (
    morph_id TEXT NOT NULL,
    lexeme_id TEXT NOT NULL,
    "order" INTEGER NOT NULL,
    type TEXT NOT NULL,
    PRIMARY KEY (lexeme_id, "order"),
    FOREIGN KEY (morph_id) REFERENCES morph(id),
    FOREIGN KEY (lexeme_id) REFERENCES lexeme(id)
);

CREATE INDEX IF NOT EXISTS idx_component_morph ON component(morph_id);

CREATE TABLE IF NOT EXISTS derivation (
    parent_id TEXT NOT NULL,
    child_id TEXT NOT NULL,
    type TEXT NOT NULL,
    PRIMARY KEY (parent_id, child_id, type),
    FOREIGN KEY (parent_id) REFERENCES lexeme(id),
    FOREIGN KEY (child_id) REFERENCES lexeme(id)
);

CREATE INDEX IF NOT EXISTS idx_derivation_child ON derivation(child_id);
"#;

/// The store collaborator the batch loader writes through.
pub trait GraphStore {
    /// Round-trip a trivial request to prove the store is reachable.
    fn verify_connectivity(&self) -> Result<(), StoreError>;

    /// Run one schema constraint statement.
    fn run_constraint(&mut self, statement: &str) -> Result<(), StoreError>;

    /// Execute `operation` for one chunk as a single atomic transaction.
    fn execute_write(
        &mut self,
        operation: &WriteOperation,
        batch: &[Value],
    ) -> Result<(), StoreError>;
}

/// A SQLite connection initialized with the graph schema.
///
/// The connection is closed when the value is dropped.
pub struct GraphDb {
    pub(crate) conn: Connection,
}

impl GraphDb {
    /// Open the store described by `config` and verify it answers.
    pub fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let db = match config.database_path() {
            Some(path) => Self::open(path)?,
            None => Self::open_in_memory()?,
        };
        db.verify_connectivity()?;
        match &config.user {
            Some(user) => info!("Connection to graph store established at {} as {user}", config.uri),
            None => info!("Connection to graph store established at {}", config.uri),
        }
        Ok(db)
    }

    /// Open a database file at the given path and initialize the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        info!("Initializing graph store: {}", path.display());
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory store (useful for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }
}

impl GraphStore for GraphDb {
    fn verify_connectivity(&self) -> Result<(), StoreError> {
        let one: i64 = self.conn.query_row("SELECT 1", [], |row| row.get(0))?;
        if one != 1 {
            return Err(StoreError::Backend(format!(
                "connectivity probe returned {one}"
            )));
        }
        Ok(())
    }

    fn run_constraint(&mut self, statement: &str) -> Result<(), StoreError> {
        self.conn.execute_batch(statement)?;
        Ok(())
    }

    fn execute_write(
        &mut self,
        operation: &WriteOperation,
        batch: &[Value],
    ) -> Result<(), StoreError> {
        let payload = serde_json::to_string(batch)?;
        let name = format!(":{}", operation.param);
        let params: &[(&str, &dyn ToSql)] = &[(name.as_str(), &payload as &dyn ToSql)];

        let tx = self.conn.transaction()?;
        for statement in operation.statements {
            tx.execute(statement, params)?;
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::queries::{DERIVATION_UPSERT, NODE_CONSTRAINTS};
    use serde_json::json;

    #[test]
    fn test_db_init() {
        let db = GraphDb::open_in_memory().expect("Failed to open in-memory store");

        let tables: usize = db
            .conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name IN ('lexeme', 'morph', 'component', 'derivation');",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 4);
        assert!(db.verify_connectivity().is_ok());
    }

    #[test]
    fn test_constraint_rerun_fails() {
        let mut db = GraphDb::open_in_memory().unwrap();
        for stmt in NODE_CONSTRAINTS {
            db.run_constraint(stmt).unwrap();
        }
        let err = db.run_constraint(NODE_CONSTRAINTS[0]).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_failed_statement_rolls_back_chunk() {
        let mut db = GraphDb::open_in_memory().unwrap();
        // Second statement references a missing table, so the first must not commit.
        let op = WriteOperation {
            name: "broken",
            param: "batch",
            statements: &[
                "INSERT INTO lexeme (id, lemma, pos, lang) SELECT json_extract(value, '$.id'), 'x', 'X', 'cs' FROM json_each(:batch)",
                "INSERT INTO nowhere SELECT value FROM json_each(:batch)",
            ],
            fields: &[],
        };
        assert!(db.execute_write(&op, &[json!({"id": "a"})]).is_err());
        assert_eq!(db.counts().unwrap().lexemes, 0);
    }

    #[test]
    fn test_derivation_requires_both_endpoints() {
        let mut db = GraphDb::open_in_memory().unwrap();
        let batch = [json!({"child_id": "a", "parent_id": "b", "type": "Derivation"})];
        db.execute_write(&DERIVATION_UPSERT, &batch).unwrap();
        assert_eq!(db.counts().unwrap().derivations, 0);
    }
}
