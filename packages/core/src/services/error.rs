//! Service Layer Error Types
//!
//! This module defines the error taxonomy of a traversal call. Every variant
//! leaves the caller with no partial result: the engine never mutates state,
//! so there is nothing to roll back.

use crate::models::UnknownVariant;
use thiserror::Error;

/// Traversal errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraversalError {
    /// No node matched the seed predicate (recoverable, caller decides)
    #[error("No node matches predicate: {predicate}")]
    NotFound { predicate: String },

    /// The parent relation loops back on itself (data integrity violation)
    #[error("Cycle detected at node {node_id}: {}", chain.join(" -> "))]
    CycleDetected {
        node_id: String,
        /// Discovery chain from the seed to the re-encountered node
        chain: Vec<String>,
    },

    /// A node store read failed; not retried here
    #[error("Node store unavailable: {0}")]
    StoreUnavailable(String),

    /// Rejected before any store access
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The caller's cancellation flag was raised
    #[error("Traversal cancelled at depth {depth}")]
    Cancelled { depth: u32 },

    /// The traversal deadline passed
    #[error("Traversal deadline exceeded at depth {depth}")]
    DeadlineExceeded { depth: u32 },
}

impl TraversalError {
    /// Create a not found error
    pub fn not_found(predicate: impl ToString) -> Self {
        Self::NotFound {
            predicate: predicate.to_string(),
        }
    }

    /// Create a cycle detected error
    pub fn cycle_detected(node_id: impl Into<String>, chain: Vec<String>) -> Self {
        Self::CycleDetected {
            node_id: node_id.into(),
            chain,
        }
    }

    /// Create a store unavailable error, keeping the full context chain
    pub fn store_unavailable(err: anyhow::Error) -> Self {
        Self::StoreUnavailable(format!("{:#}", err))
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

impl From<UnknownVariant> for TraversalError {
    fn from(err: UnknownVariant) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}
