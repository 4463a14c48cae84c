//! Lookup Service - One-Call Ancestor/Descendant Lookup
//!
//! Composes the three traversal stages behind a single call:
//!
//! 1. `TraversalEngine::traverse` resolves seeds and computes the closure
//! 2. `build_paths` derives per-seed paths
//! 3. `assemble` shapes everything into a `TraversalResult`
//!
//! # Examples
//!
//! ```rust
//! use lineage_core::db::MemoryStore;
//! use lineage_core::fixtures::greek_gods;
//! use lineage_core::models::{NodePredicate, Shape};
//! use lineage_core::services::LookupService;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let store = Arc::new(MemoryStore::with_nodes(greek_gods()).await?);
//! let lookup = LookupService::new(store);
//!
//! let result = lookup
//!     .ancestors(NodePredicate::attribute("knownAs", "Death"), None, Shape::Flat)
//!     .await?;
//! assert_eq!(result.paths[0].paths[0].len(), 3);
//! # Ok(())
//! # }
//! ```

use crate::db::NodeStore;
use crate::models::{Direction, NodePredicate, Shape, TraversalRequest, TraversalResult};
use crate::services::cancellation::CancellationSignal;
use crate::services::config::TraversalConfig;
use crate::services::error::TraversalError;
use crate::services::path_builder::build_paths;
use crate::services::result_assembler::assemble;
use crate::services::traversal_engine::TraversalEngine;
use std::sync::Arc;

#[derive(Clone)]
pub struct LookupService {
    engine: TraversalEngine,
}

impl LookupService {
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self::with_config(store, TraversalConfig::default())
    }

    pub fn with_config(store: Arc<dyn NodeStore>, config: TraversalConfig) -> Self {
        Self {
            engine: TraversalEngine::with_config(store, config),
        }
    }

    pub fn engine(&self) -> &TraversalEngine {
        &self.engine
    }

    /// Run a full lookup for an explicit request.
    pub async fn lookup(
        &self,
        request: &TraversalRequest,
        shape: Shape,
        signal: &CancellationSignal,
    ) -> Result<TraversalResult, TraversalError> {
        let closure = self.engine.traverse(request, signal).await?;
        let paths = build_paths(&closure);
        Ok(assemble(&closure, paths, shape))
    }

    /// All ancestors of the nodes matching `predicate`.
    ///
    /// `max_depth` falls back to `TraversalConfig::default_max_depth`.
    pub async fn ancestors(
        &self,
        predicate: NodePredicate,
        max_depth: Option<u32>,
        shape: Shape,
    ) -> Result<TraversalResult, TraversalError> {
        self.run(predicate, Direction::Ancestors, max_depth, shape)
            .await
    }

    /// All descendants of the nodes matching `predicate`.
    ///
    /// `max_depth` falls back to `TraversalConfig::default_max_depth`.
    pub async fn descendants(
        &self,
        predicate: NodePredicate,
        max_depth: Option<u32>,
        shape: Shape,
    ) -> Result<TraversalResult, TraversalError> {
        self.run(predicate, Direction::Descendants, max_depth, shape)
            .await
    }

    async fn run(
        &self,
        predicate: NodePredicate,
        direction: Direction,
        max_depth: Option<u32>,
        shape: Shape,
    ) -> Result<TraversalResult, TraversalError> {
        let max_depth = max_depth.unwrap_or(self.engine.config().default_max_depth);
        let request = TraversalRequest::new(predicate, direction, max_depth);
        self.lookup(&request, shape, &CancellationSignal::new())
            .await
    }
}
