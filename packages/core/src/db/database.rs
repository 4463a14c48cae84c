//! Database Connection Management
//!
//! This module provides the libsql/Turso connection, schema initialization,
//! and the raw SQL behind `LibsqlStore`.
//!
//! # Architecture
//!
//! - **Path-agnostic**: Accepts any valid PathBuf
//! - **Flat node table**: One row per node, hierarchy only through `parent_id`
//! - **WAL mode**: Write-Ahead Logging for better concurrency
//! - **No parent foreign key**: Dangling `parent_id` values are legal data
//! - **JSON attributes**: Predicates use SQLite's native `json_extract`/`json_type`
//!
//! # Database Connection Patterns
//!
//! **Use `connect_with_timeout()` in async functions.** The 5-second busy
//! timeout lets concurrent shard reads wait instead of failing immediately
//! with `SQLITE_BUSY`.
//!
//! ```no_run
//! # use lineage_core::db::DatabaseService;
//! # use std::path::PathBuf;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db_service = DatabaseService::new(PathBuf::from("./data/lineage.db")).await?;
//! let conn = db_service.connect_with_timeout().await?;
//! # Ok(())
//! # }
//! ```

use crate::db::error::DatabaseError;
use crate::models::{Node, NodePredicate};
use libsql::{Builder, Database, Value};
use std::path::PathBuf;
use std::sync::Arc;

/// Columns selected for every node query, in the order `row_to_node` expects.
pub(crate) const NODE_COLUMNS: &str = "id, parent_id, attributes, created_at, modified_at";

/// Database service for managing the libsql connection and schema
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,
}

/// A SQL `WHERE` fragment with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SqlFilter {
    pub clause: String,
    pub params: Vec<Value>,
}

/// JSON path addressing a single top-level attribute, quoted so that field
/// names containing dots or spaces are not interpreted as nested paths.
///
/// SQLite path labels have no escape syntax, so a field containing `"` or
/// `\` cannot be addressed and yields `None`.
fn attribute_path(field: &str) -> Option<String> {
    if field.contains(['"', '\\']) {
        return None;
    }
    Some(format!("$.\"{}\"", field))
}

/// Matches every row; `LibsqlStore` narrows the result with `NodePredicate::matches`.
fn unfiltered() -> SqlFilter {
    SqlFilter {
        clause: "1 = 1".to_string(),
        params: Vec::new(),
    }
}

/// Translate a predicate into a `WHERE` fragment over the `nodes` table.
///
/// Attribute equality checks the JSON type as well as the value, so the
/// string `"3"` never matches the number `3` (mirroring `NodePredicate::matches`).
///
/// The filter may select a superset: unaddressable field names and numbers
/// outside the `i64` range only narrow by type. Callers re-check each row
/// with `NodePredicate::matches`.
pub(crate) fn predicate_to_sql(predicate: &NodePredicate) -> SqlFilter {
    match predicate {
        NodePredicate::IdEquals { id } => SqlFilter {
            clause: "id = ?".to_string(),
            params: vec![Value::Text(id.clone())],
        },
        NodePredicate::AttributeEquals { field, value } => {
            let Some(path) = attribute_path(field) else {
                return unfiltered();
            };
            let type_check = "json_type(attributes, ?) = ?";
            let value_check = "json_extract(attributes, ?) = ?";
            let typed = |json_type: &str| {
                vec![Value::Text(path.clone()), Value::Text(json_type.to_string())]
            };

            match value {
                serde_json::Value::Null => SqlFilter {
                    clause: type_check.to_string(),
                    params: typed("null"),
                },
                serde_json::Value::Bool(b) => SqlFilter {
                    clause: type_check.to_string(),
                    params: typed(if *b { "true" } else { "false" }),
                },
                serde_json::Value::Number(n) => match n.as_i64() {
                    Some(i) => {
                        let mut params = typed("integer");
                        params.push(Value::Text(path.clone()));
                        params.push(Value::Integer(i));
                        SqlFilter {
                            clause: format!("({} AND {})", type_check, value_check),
                            params,
                        }
                    }
                    // Large unsigned and fractional values lose precision in SQLite
                    None => SqlFilter {
                        clause: "json_type(attributes, ?) IN ('integer', 'real')".to_string(),
                        params: vec![Value::Text(path.clone())],
                    },
                },
                serde_json::Value::String(s) => {
                    let mut params = typed("text");
                    params.push(Value::Text(path.clone()));
                    params.push(Value::Text(s.clone()));
                    SqlFilter {
                        clause: format!("({} AND {})", type_check, value_check),
                        params,
                    }
                }
                serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                    let json_type = if value.is_array() { "array" } else { "object" };
                    let mut params = typed(json_type);
                    params.push(Value::Text(path.clone()));
                    params.push(Value::Text(value.to_string()));
                    SqlFilter {
                        clause: format!("({} AND json_extract(attributes, ?) = json(?))", type_check),
                        params,
                    }
                }
            }
        }
        NodePredicate::All { predicates } => {
            if predicates.is_empty() {
                return unfiltered();
            }
            let parts: Vec<SqlFilter> = predicates.iter().map(predicate_to_sql).collect();
            SqlFilter {
                clause: format!(
                    "({})",
                    parts
                        .iter()
                        .map(|p| p.clause.as_str())
                        .collect::<Vec<_>>()
                        .join(" AND ")
                ),
                params: parts.into_iter().flat_map(|p| p.params).collect(),
            }
        }
    }
}

/// `?, ?, ?` with one placeholder per id.
fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

impl DatabaseService {
    /// Create a new DatabaseService with the specified database path
    ///
    /// This will:
    /// 1. Ensure the parent directory exists (create if needed)
    /// 2. Open/create the database file
    /// 3. Initialize the schema (CREATE TABLE IF NOT EXISTS)
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if:
    /// - Parent directory cannot be created
    /// - Database connection fails
    /// - Schema initialization fails
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };

        service.initialize_schema().await?;
        tracing::debug!(path = %service.db_path.display(), "node database ready");

        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so they go through query() rather than execute().
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Initialize database schema and configuration
    ///
    /// Idempotent: every statement uses `IF NOT EXISTS`.
    async fn initialize_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS nodes (
                id TEXT PRIMARY KEY,
                parent_id TEXT,
                attributes JSON NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL,
                modified_at TEXT NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create nodes table: {}", e))
        })?;

        // Index on parent_id (children lookups during descendant expansion)
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_nodes_parent ON nodes(parent_id)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!(
                "Failed to create index 'idx_nodes_parent': {}",
                e
            ))
        })?;

        Ok(())
    }

    /// Get a synchronous connection handle.
    ///
    /// Prefer `connect_with_timeout()` anywhere the connection crosses an await point.
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get an async connection with busy timeout configured
    ///
    /// Sets a 5-second busy timeout so concurrent operations wait and retry
    /// instead of failing immediately when the database is locked.
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;

        Ok(conn)
    }

    //
    // WRITE OPERATIONS (used by hosts to load data; the traversal engine never writes)
    //

    /// Insert or replace a single node
    pub async fn db_insert_node(&self, node: &Node) -> Result<(), DatabaseError> {
        self.db_insert_nodes(std::slice::from_ref(node)).await
    }

    /// Insert or replace many nodes in one transaction
    ///
    /// All nodes are validated before the transaction starts; any failure
    /// rolls the whole batch back.
    pub async fn db_insert_nodes(&self, nodes: &[Node]) -> Result<(), DatabaseError> {
        if nodes.is_empty() {
            return Ok(());
        }
        for node in nodes {
            node.validate()?;
        }

        let conn = self.connect_with_timeout().await?;

        conn.execute("BEGIN TRANSACTION", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to begin transaction: {}", e))
        })?;

        for node in nodes {
            let attributes = match serde_json::to_string(&node.attributes) {
                Ok(json) => json,
                Err(e) => {
                    let _rollback = conn.execute("ROLLBACK", ()).await;
                    return Err(DatabaseError::SerializationFailed(e));
                }
            };

            let result = conn
                .execute(
                    "INSERT INTO nodes (id, parent_id, attributes, created_at, modified_at)
                     VALUES (?, ?, ?, ?, ?)
                     ON CONFLICT(id) DO UPDATE SET
                       parent_id = excluded.parent_id,
                       attributes = excluded.attributes,
                       modified_at = excluded.modified_at",
                    vec![
                        Value::Text(node.id.clone()),
                        node.parent_id.clone().map_or(Value::Null, Value::Text),
                        Value::Text(attributes),
                        Value::Text(node.created_at.to_rfc3339()),
                        Value::Text(node.modified_at.to_rfc3339()),
                    ],
                )
                .await;

            if let Err(e) = result {
                let _rollback = conn.execute("ROLLBACK", ()).await;
                return Err(DatabaseError::sql_execution(format!(
                    "Failed to insert node {}: {}",
                    node.id, e
                )));
            }
        }

        if let Err(e) = conn.execute("COMMIT", ()).await {
            let _rollback = conn.execute("ROLLBACK", ()).await;
            return Err(DatabaseError::sql_execution(format!(
                "Failed to commit transaction: {}",
                e
            )));
        }

        Ok(())
    }

    /// Re-point a node's parent reference without any integrity checks
    ///
    /// # Returns
    ///
    /// Number of rows updated (0 when the node does not exist)
    pub async fn db_set_parent(
        &self,
        id: &str,
        parent_id: Option<&str>,
    ) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "UPDATE nodes SET parent_id = ?, modified_at = ? WHERE id = ?",
            vec![
                parent_id.map_or(Value::Null, |p| Value::Text(p.to_string())),
                Value::Text(chrono::Utc::now().to_rfc3339()),
                Value::Text(id.to_string()),
            ],
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to update parent: {}", e)))
    }

    /// Delete a node; its children keep a now-dangling `parent_id`
    pub async fn db_delete_node(&self, id: &str) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute("DELETE FROM nodes WHERE id = ?", [id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to delete node: {}", e)))
    }

    /// Count stored nodes
    pub async fn db_count_nodes(&self) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut rows = conn
            .query("SELECT COUNT(*) FROM nodes", ())
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to count nodes: {}", e)))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            Some(row) => {
                let count: i64 = row.get(0)?;
                Ok(count.max(0) as u64)
            }
            None => Ok(0),
        }
    }

    //
    // READ OPERATIONS (wrapped by LibsqlStore's NodeStore implementation)
    //

    /// Select nodes matching a predicate, ordered by id
    ///
    /// Returns raw rows; `LibsqlStore` converts them to `Node`.
    pub async fn db_find_by_predicate(
        &self,
        predicate: &NodePredicate,
    ) -> Result<libsql::Rows, DatabaseError> {
        let filter = predicate_to_sql(predicate);
        let sql = format!(
            "SELECT {} FROM nodes WHERE {} ORDER BY id ASC",
            NODE_COLUMNS, filter.clause
        );
        self.query_rows(&sql, filter.params, "find_by_predicate")
            .await
    }

    /// Select every node whose `parent_id` is in `parent_ids`, ordered by id
    pub async fn db_find_by_parent_in(
        &self,
        parent_ids: &[String],
    ) -> Result<libsql::Rows, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM nodes WHERE parent_id IN ({}) ORDER BY id ASC",
            NODE_COLUMNS,
            placeholders(parent_ids.len())
        );
        let params = parent_ids.iter().cloned().map(Value::Text).collect();
        self.query_rows(&sql, params, "find_by_parent_in").await
    }

    /// Select every node whose id is in `ids`, ordered by id
    pub async fn db_find_by_id_in(&self, ids: &[String]) -> Result<libsql::Rows, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM nodes WHERE id IN ({}) ORDER BY id ASC",
            NODE_COLUMNS,
            placeholders(ids.len())
        );
        let params = ids.iter().cloned().map(Value::Text).collect();
        self.query_rows(&sql, params, "find_by_id_in").await
    }

    async fn query_rows(
        &self,
        sql: &str,
        params: Vec<Value>,
        label: &str,
    ) -> Result<libsql::Rows, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn.prepare(sql).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to prepare {} query: {}", label, e))
        })?;

        stmt.query(params).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute {} query: {}", label, e))
        })
    }
}
