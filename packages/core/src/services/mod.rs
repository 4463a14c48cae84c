//! Traversal Services
//!
//! This module contains the tree resolution logic layered on top of a
//! `NodeStore`:
//!
//! - `TraversalEngine` - Bounded breadth-first expansion into a closure set
//! - `path_builder` - Seed-to-root and seed-to-leaf paths from a closure
//! - `result_assembler` - Flat or nested caller-facing results
//! - `LookupService` - All three stages behind one call
//!
//! Services never write to the store and keep no state between calls.

pub mod cancellation;
pub mod config;
pub mod error;
pub mod lookup_service;
pub mod path_builder;
pub mod result_assembler;
pub mod traversal_engine;

pub use cancellation::{CancellationSignal, SignalState};
pub use config::TraversalConfig;
pub use error::TraversalError;
pub use lookup_service::LookupService;
pub use path_builder::build_paths;
pub use result_assembler::assemble;
pub use traversal_engine::TraversalEngine;
