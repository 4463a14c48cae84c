//! LibsqlStore - NodeStore Implementation for the Turso/libsql Backend
//!
//! LibsqlStore wraps `DatabaseService` and delegates all SQL to its `db_*`
//! methods. Its own job is row conversion (`libsql::Row` -> `Node`).
//!
//! # Examples
//!
//! ```rust,no_run
//! use lineage_core::db::{DatabaseService, LibsqlStore, NodeStore};
//! use lineage_core::models::NodePredicate;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/lineage.db")).await?);
//!     let store: Arc<dyn NodeStore> = Arc::new(LibsqlStore::new(db));
//!
//!     let seeds = store
//!         .find_by_predicate(&NodePredicate::attribute("knownAs", "Death"))
//!         .await?;
//!     println!("{} seed(s)", seeds.len());
//!     Ok(())
//! }
//! ```

use crate::db::node_store::NodeStore;
use crate::db::DatabaseService;
use crate::models::{Node, NodePredicate};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use libsql::Row;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;

/// LibsqlStore implements the NodeStore trait for the libsql backend
#[derive(Debug, Clone)]
pub struct LibsqlStore {
    /// Underlying database service (raw SQL operations)
    db: Arc<DatabaseService>,
}

impl LibsqlStore {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    /// Open (or create) a database file and wrap it.
    pub async fn open(db_path: PathBuf) -> Result<Self> {
        let db = DatabaseService::new(db_path)
            .await
            .context("Failed to open node database")?;
        Ok(Self::new(Arc::new(db)))
    }

    /// Access the underlying database service (writes, counts).
    pub fn database(&self) -> &Arc<DatabaseService> {
        &self.db
    }

    /// Parse timestamp from database - handles both SQLite and RFC3339 formats
    ///
    /// SQLite CURRENT_TIMESTAMP returns: "YYYY-MM-DD HH:MM:SS"
    /// Rows written by this crate use RFC3339: "YYYY-MM-DDTHH:MM:SS+00:00"
    fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }

        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Ok(naive.and_utc());
        }

        Err(anyhow::anyhow!(
            "Unable to parse timestamp '{}' as RFC3339 or SQLite format",
            s
        ))
    }

    /// Convert libsql::Row to Node model
    ///
    /// # Row Format
    ///
    /// Expected columns (in order, see `NODE_COLUMNS`):
    /// - id (TEXT)
    /// - parent_id (TEXT, nullable)
    /// - attributes (TEXT, JSON object)
    /// - created_at (TEXT)
    /// - modified_at (TEXT)
    fn row_to_node(row: &Row) -> Result<Node> {
        let id: String = row.get(0).context("Failed to get id")?;
        let parent_id: Option<String> = row.get(1).context("Failed to get parent_id")?;
        let attributes_json: String = row.get(2).context("Failed to get attributes")?;
        let created_at_str: String = row.get(3).context("Failed to get created_at")?;
        let modified_at_str: String = row.get(4).context("Failed to get modified_at")?;

        let attributes: Map<String, Value> = serde_json::from_str(&attributes_json)
            .with_context(|| format!("Failed to parse attributes JSON for node {}", id))?;

        Ok(Node {
            parent_id,
            attributes,
            created_at: Self::parse_timestamp(&created_at_str)
                .context("Failed to parse created_at")?,
            modified_at: Self::parse_timestamp(&modified_at_str)
                .context("Failed to parse modified_at")?,
            id,
        })
    }

    async fn collect_nodes(mut rows: libsql::Rows) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        while let Some(row) = rows.next().await.context("Failed to read node row")? {
            nodes.push(Self::row_to_node(&row)?);
        }
        Ok(nodes)
    }
}

#[async_trait]
impl NodeStore for LibsqlStore {
    async fn find_by_predicate(&self, predicate: &NodePredicate) -> Result<Vec<Node>> {
        let rows = self
            .db
            .db_find_by_predicate(predicate)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to resolve predicate {}: {}", predicate, e))?;
        let mut nodes = Self::collect_nodes(rows).await?;
        // The SQL filter can over-select; the in-memory check is authoritative
        nodes.retain(|node| predicate.matches(node));
        Ok(nodes)
    }

    async fn find_by_parent_in(&self, parent_ids: &[String]) -> Result<Vec<Node>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .db
            .db_find_by_parent_in(parent_ids)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to fetch children: {}", e))?;
        Self::collect_nodes(rows).await
    }

    async fn find_by_id_in(&self, ids: &[String]) -> Result<Vec<Node>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .db
            .db_find_by_id_in(ids)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to fetch nodes by id: {}", e))?;
        Self::collect_nodes(rows).await
    }
}
