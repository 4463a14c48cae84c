//! Database Layer
//!
//! This module holds the node store: the external collaborator the traversal
//! engine reads from.
//!
//! - `NodeStore` - the narrow, batched read interface the engine depends on
//! - `MemoryStore` - ordered in-memory backend
//! - `DatabaseService` / `LibsqlStore` - embedded libsql (SQLite-compatible) backend
//!
//! Both backends return nodes ordered by id, so traversals over equal data
//! produce identical output regardless of backend.

mod database;
mod error;
mod libsql_store;
mod memory_store;
mod node_store;

pub use database::DatabaseService;
pub use error::DatabaseError;
pub use libsql_store::LibsqlStore;
pub use memory_store::MemoryStore;
pub use node_store::NodeStore;
