//! Traversal request and result types
//!
//! These types flow through the three traversal stages:
//!
//! 1. [`TraversalRequest`] goes into the traversal engine, which produces a [`ClosureSet`]
//! 2. The path builder turns the closure into per-seed [`SeedPaths`]
//! 3. The result assembler combines both into a caller-facing [`TraversalResult`]

use crate::models::{Node, NodePredicate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A textual enum value that did not name any known variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind}: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Which way the parent relation is followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Follow `parent_id` towards the root
    Ancestors,
    /// Follow children (nodes whose `parent_id` is in the frontier)
    Descendants,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ancestors => "ancestors",
            Self::Descendants => "descendants",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ancestors" | "ancestor" | "up" => Ok(Self::Ancestors),
            "descendants" | "descendant" | "down" => Ok(Self::Descendants),
            _ => Err(UnknownVariant {
                kind: "direction",
                value: s.to_string(),
            }),
        }
    }
}

/// How the result assembler renders a closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// One annotated entry per closure node
    #[default]
    Flat,
    /// A forest grouped by `parent_id`
    Nested,
}

impl FromStr for Shape {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flat" => Ok(Self::Flat),
            "nested" | "tree" => Ok(Self::Nested),
            _ => Err(UnknownVariant {
                kind: "shape",
                value: s.to_string(),
            }),
        }
    }
}

/// Input to a single traversal call.
///
/// `max_depth` is optional only so that hosts can deserialize requests that
/// omit it; the engine rejects `None` and `Some(0)` before touching the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraversalRequest {
    pub predicate: NodePredicate,
    pub direction: Direction,
    #[serde(default)]
    pub max_depth: Option<u32>,
}

impl TraversalRequest {
    pub fn new(predicate: NodePredicate, direction: Direction, max_depth: u32) -> Self {
        Self {
            predicate,
            direction,
            max_depth: Some(max_depth),
        }
    }

    pub fn ancestors(predicate: NodePredicate, max_depth: u32) -> Self {
        Self::new(predicate, Direction::Ancestors, max_depth)
    }

    pub fn descendants(predicate: NodePredicate, max_depth: u32) -> Self {
        Self::new(predicate, Direction::Descendants, max_depth)
    }
}

/// One node of a closure set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosureEntry {
    pub node: Node,
    /// Distance from the seed that first reached this node (seeds are 0)
    pub depth: u32,
    /// Id of the node whose expansion discovered this one (`None` for seeds)
    pub via: Option<String>,
    /// Index into `ClosureSet::seeds` of the originating seed
    pub seed_index: usize,
}

impl ClosureEntry {
    pub fn id(&self) -> &str {
        &self.node.id
    }

    pub fn is_seed(&self) -> bool {
        self.via.is_none()
    }
}

/// Store access counters for one traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraversalStats {
    /// Number of individual store calls, counting every shard
    pub store_reads: usize,
    /// Number of depth levels that produced at least one new node
    pub levels_expanded: u32,
}

/// Deduplicated set of nodes reached from the seeds.
///
/// Entries are ordered by ascending depth, then seed order, then id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosureSet {
    pub direction: Direction,
    /// Seed ids in the order the store matched them
    pub seeds: Vec<String>,
    pub entries: Vec<ClosureEntry>,
    /// True when expansion stopped at `max_depth` while more nodes existed
    pub truncated: bool,
    pub stats: TraversalStats,
}

impl ClosureSet {
    pub fn get(&self, id: &str) -> Option<&ClosureEntry> {
        self.entries.iter().find(|entry| entry.node.id == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.node.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest depth present in the closure.
    pub fn max_depth(&self) -> u32 {
        self.entries.iter().map(|entry| entry.depth).max().unwrap_or(0)
    }
}

/// Ordered paths originating at one seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedPaths {
    pub seed_id: String,
    /// Ancestors: exactly one seed -> root path.
    /// Descendants: one seed -> leaf path per leaf.
    pub paths: Vec<Vec<String>>,
}

/// Flat rendering of a closure entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatEntry {
    pub node: Node,
    pub depth: u32,
    /// Discovery chain from the originating seed to this node
    pub path: Vec<String>,
}

/// Nested rendering of a closure entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub node: Node,
    pub depth: u32,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Number of nodes in this subtree, including itself.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }
}

/// Shape-dependent part of a traversal result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "items", rename_all = "lowercase")]
pub enum TraversalBody {
    Flat(Vec<FlatEntry>),
    Nested(Vec<TreeNode>),
}

/// Caller-facing traversal result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraversalResult {
    pub direction: Direction,
    pub seeds: Vec<String>,
    pub truncated: bool,
    pub paths: Vec<SeedPaths>,
    pub body: TraversalBody,
    pub stats: TraversalStats,
}
