//! NodeStore Trait - Read Interface Consumed by the Traversal Engine
//!
//! This module defines the `NodeStore` trait that abstracts the three reads a
//! traversal needs. The trait enables multiple backend implementations
//! (in-memory, libsql) without changing the traversal logic.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async so that embedded and networked
//!    backends share one interface
//! 2. **Batched Reads**: Parent and child lookups take a whole id set so a
//!    traversal issues one read per depth level, not one per node
//! 3. **Deterministic Order**: Every method returns nodes ordered by id
//! 4. **Error Handling**: Uses `anyhow::Result`; "not found" is an empty vector,
//!    never an error
//! 5. **Read Only**: Writes are inherent methods on each backend, because the
//!    engine never mutates the store
//!
//! # Examples
//!
//! ```rust,no_run
//! use lineage_core::db::{MemoryStore, NodeStore};
//! use lineage_core::models::{Node, NodePredicate};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let memory = MemoryStore::new();
//!     memory
//!         .insert_node(Node::new_with_id("chaos", None, json!({ "name": "Chaos" })))
//!         .await?;
//!
//!     let store: Arc<dyn NodeStore> = Arc::new(memory);
//!     let seeds = store
//!         .find_by_predicate(&NodePredicate::attribute("name", "Chaos"))
//!         .await?;
//!     assert_eq!(seeds.len(), 1);
//!     Ok(())
//! }
//! ```

use crate::models::{Node, NodePredicate};
use anyhow::Result;
use async_trait::async_trait;

/// Abstraction over the document store holding parent-referenced nodes.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the traversal engine issues sharded
/// reads concurrently within one depth level.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Resolve seed nodes by equality match.
    ///
    /// # Returns
    ///
    /// Matching nodes ordered by id (empty when nothing matches)
    async fn find_by_predicate(&self, predicate: &NodePredicate) -> Result<Vec<Node>>;

    /// Batched children lookup: every node whose `parent_id` is in `parent_ids`.
    ///
    /// # Returns
    ///
    /// Matching nodes ordered by id (empty for an empty input)
    async fn find_by_parent_in(&self, parent_ids: &[String]) -> Result<Vec<Node>>;

    /// Batched point lookup by id, used to resolve `parent_id` references.
    ///
    /// Ids that do not exist are skipped silently; dangling references are
    /// legal data.
    ///
    /// # Returns
    ///
    /// Existing nodes ordered by id
    async fn find_by_id_in(&self, ids: &[String]) -> Result<Vec<Node>>;
}
