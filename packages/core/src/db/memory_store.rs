//! MemoryStore - In-Process NodeStore Implementation
//!
//! Keeps nodes in a `BTreeMap` keyed by id, so every read naturally returns
//! nodes in id order. Used by tests, benchmarks, and hosts that load a tree
//! from elsewhere.
//!
//! Unlike the libsql backend, `set_parent` performs no validation at all; it
//! models an external writer and can therefore introduce cycles.

use crate::db::node_store::NodeStore;
use crate::models::{Node, NodePredicate};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::RwLock;

/// Node store backed by an ordered in-memory map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: RwLock<BTreeMap<String, Node>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from an existing set of nodes.
    pub async fn with_nodes(nodes: Vec<Node>) -> Result<Self> {
        let store = Self::new();
        store.insert_nodes(nodes).await?;
        Ok(store)
    }

    /// Insert or replace a single node.
    pub async fn insert_node(&self, node: Node) -> Result<()> {
        node.validate()?;
        self.nodes.write().await.insert(node.id.clone(), node);
        Ok(())
    }

    /// Insert or replace many nodes. Nothing is written if any node is invalid.
    pub async fn insert_nodes(&self, nodes: Vec<Node>) -> Result<()> {
        for node in &nodes {
            node.validate()?;
        }
        let mut guard = self.nodes.write().await;
        for node in nodes {
            guard.insert(node.id.clone(), node);
        }
        Ok(())
    }

    /// Re-point a node's parent reference without any checks.
    ///
    /// Returns `false` when the node does not exist.
    pub async fn set_parent(&self, id: &str, parent_id: Option<&str>) -> bool {
        let mut guard = self.nodes.write().await;
        match guard.get_mut(id) {
            Some(node) => {
                node.parent_id = parent_id.map(str::to_string);
                node.modified_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Remove a node, leaving any children with a dangling reference.
    pub async fn remove_node(&self, id: &str) -> Option<Node> {
        self.nodes.write().await.remove(id)
    }

    pub async fn get_node(&self, id: &str) -> Option<Node> {
        self.nodes.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.nodes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.nodes.read().await.is_empty()
    }
}

#[async_trait]
impl NodeStore for MemoryStore {
    async fn find_by_predicate(&self, predicate: &NodePredicate) -> Result<Vec<Node>> {
        let guard = self.nodes.read().await;

        // Id lookups skip the full scan
        if let NodePredicate::IdEquals { id } = predicate {
            return Ok(guard.get(id).cloned().into_iter().collect());
        }

        Ok(guard
            .values()
            .filter(|node| predicate.matches(node))
            .cloned()
            .collect())
    }

    async fn find_by_parent_in(&self, parent_ids: &[String]) -> Result<Vec<Node>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }
        let wanted: HashSet<&str> = parent_ids.iter().map(String::as_str).collect();
        let guard = self.nodes.read().await;

        Ok(guard
            .values()
            .filter(|node| {
                node.parent_id
                    .as_deref()
                    .is_some_and(|parent| wanted.contains(parent))
            })
            .cloned()
            .collect())
    }

    async fn find_by_id_in(&self, ids: &[String]) -> Result<Vec<Node>> {
        let guard = self.nodes.read().await;
        let mut found: Vec<Node> = ids.iter().filter_map(|id| guard.get(id).cloned()).collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        found.dedup_by(|a, b| a.id == b.id);
        Ok(found)
    }
}
