//! Seed predicates
//!
//! A `NodePredicate` selects the seed nodes a traversal starts from. Only
//! equality matching is supported: on the node id, on a single attribute, or a
//! conjunction of both.

use crate::models::Node;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Equality predicate evaluated against a node store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NodePredicate {
    /// `node.id == id`
    IdEquals { id: String },

    /// `node.attributes[field] == value`
    AttributeEquals { field: String, value: Value },

    /// Every inner predicate must match
    All { predicates: Vec<NodePredicate> },
}

impl NodePredicate {
    /// Match a node by id.
    pub fn id(id: impl Into<String>) -> Self {
        Self::IdEquals { id: id.into() }
    }

    /// Match a node by a single attribute value.
    ///
    /// ```rust
    /// # use lineage_core::models::NodePredicate;
    /// let death = NodePredicate::attribute("knownAs", "Death");
    /// assert_eq!(death.to_string(), "knownAs = \"Death\"");
    /// ```
    pub fn attribute(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::AttributeEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Conjunction of predicates.
    pub fn all(predicates: Vec<NodePredicate>) -> Self {
        Self::All { predicates }
    }

    /// Evaluate the predicate against an in-memory node.
    pub fn matches(&self, node: &Node) -> bool {
        match self {
            Self::IdEquals { id } => &node.id == id,
            Self::AttributeEquals { field, value } => node.attribute(field) == Some(value),
            Self::All { predicates } => predicates.iter().all(|p| p.matches(node)),
        }
    }

    /// True when the predicate cannot select anything meaningful: an empty
    /// id, an empty field name, or a conjunction with no usable terms.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::IdEquals { id } => id.is_empty(),
            Self::AttributeEquals { field, .. } => field.is_empty(),
            Self::All { predicates } => {
                predicates.is_empty() || predicates.iter().any(NodePredicate::is_empty)
            }
        }
    }
}

impl fmt::Display for NodePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdEquals { id } => write!(f, "id = {:?}", id),
            Self::AttributeEquals { field, value } => write!(f, "{} = {}", field, value),
            Self::All { predicates } => {
                let parts: Vec<String> = predicates.iter().map(ToString::to_string).collect();
                write!(f, "({})", parts.join(" AND "))
            }
        }
    }
}
