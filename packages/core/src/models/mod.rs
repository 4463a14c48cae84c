//! Data Models
//!
//! This module contains the core data structures used throughout Lineage:
//!
//! - `Node` - Flat parent-reference record
//! - `NodePredicate` - Equality predicate selecting traversal seeds
//! - Traversal request, closure and result types
//!
//! Nodes never embed their children; hierarchy exists only through `parent_id`.

mod node;
mod predicate;
mod traversal;

pub use node::{Node, ValidationError};
pub use predicate::NodePredicate;
pub use traversal::{
    ClosureEntry, ClosureSet, Direction, FlatEntry, SeedPaths, Shape, TraversalBody,
    TraversalRequest, TraversalResult, TraversalStats, TreeNode, UnknownVariant,
};
