//! Lineage Core Tree Resolution Layer
//!
//! This crate resolves ancestors and descendants over a flat collection of
//! nodes that each hold a parent reference, without the caller writing
//! recursive queries.
//!
//! # Architecture
//!
//! - **Parent references only**: nodes store `parent_id`; children are never embedded
//! - **Batched reads**: one store read per depth level, sharded for large frontiers
//! - **Cycle safety**: loops in the parent relation are reported, never followed
//! - **libsql**: Embedded SQLite-compatible backend next to an in-memory store
//!
//! # Modules
//!
//! - [`models`] - Data structures (Node, NodePredicate, closure and result types)
//! - [`services`] - Traversal engine, path builder, result assembler, lookup service
//! - [`db`] - Node store trait and its memory/libsql backends
//! - [`fixtures`] - Sample Greek gods tree

pub mod db;
pub mod fixtures;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use models::*;
pub use services::*;
