//! Node Data Structures
//!
//! This module defines the `Node` record stored in a parent-reference tree.
//!
//! # Architecture
//!
//! - **Flat records**: Every node is stored on its own, never nested inside its parent
//! - **Parent references**: Hierarchy is encoded by `parent_id` pointing at another node
//! - **Free-form attributes**: All descriptive data lives in the `attributes` JSON object
//! - **Dangling references**: `parent_id` may point at an id that no longer exists
//!
//! # Examples
//!
//! ```rust
//! use lineage_core::models::Node;
//! use serde_json::json;
//!
//! let chaos = Node::new(None, json!({ "name": "Chaos", "knownAs": "The Void" }));
//! let nyx = Node::new(
//!     Some(chaos.id.clone()),
//!     json!({ "name": "Nyx", "knownAs": "The Night" }),
//! );
//! assert!(chaos.is_root());
//! assert_eq!(nyx.parent_id.as_deref(), Some(chaos.id.as_str()));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for Node operations
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid parent reference: {0}")]
    InvalidParent(String),

    #[error("Attributes must be a JSON object, got: {0}")]
    InvalidAttributes(String),
}

/// A single record in a parent-reference tree.
///
/// # Fields
///
/// - `id`: Unique identifier (UUID unless supplied explicitly)
/// - `parent_id`: Reference to the parent node, `None` for roots
/// - `attributes`: Field -> value mapping used by predicates
/// - `created_at` / `modified_at`: Store bookkeeping timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier
    pub id: String,

    /// Parent node ID (absent for roots, possibly dangling)
    #[serde(default)]
    pub parent_id: Option<String>,

    /// All descriptive fields of the node
    #[serde(default)]
    pub attributes: Map<String, Value>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub modified_at: DateTime<Utc>,
}

impl Node {
    /// Create a new Node with an auto-generated UUID.
    ///
    /// Non-object `attributes` values are stored under a single `"value"` key
    /// so the attribute map is always well formed.
    pub fn new(parent_id: Option<String>, attributes: Value) -> Self {
        Self::new_with_id(Uuid::new_v4().to_string(), parent_id, attributes)
    }

    /// Create a new Node with an explicit ID.
    ///
    /// ```rust
    /// # use lineage_core::models::Node;
    /// # use serde_json::json;
    /// let node = Node::new_with_id("thanatos", Some("nyx".into()), json!({ "knownAs": "Death" }));
    /// assert_eq!(node.attribute("knownAs"), Some(&json!("Death")));
    /// ```
    pub fn new_with_id(
        id: impl Into<String>,
        parent_id: Option<String>,
        attributes: Value,
    ) -> Self {
        let now = Utc::now();
        let attributes = match attributes {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };

        Self {
            id: id.into(),
            parent_id,
            attributes,
            created_at: now,
            modified_at: now,
        }
    }

    /// True when the node has no parent reference.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Look up a single attribute by field name.
    pub fn attribute(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }

    /// Validate node structure before it is written to a store.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if:
    /// - `id` is empty
    /// - `parent_id` is present but empty
    /// - the node references itself as parent
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::MissingField("id".to_string()));
        }

        if let Some(parent_id) = &self.parent_id {
            if parent_id.is_empty() {
                return Err(ValidationError::InvalidParent(
                    "parent_id must not be empty".to_string(),
                ));
            }
            if parent_id == &self.id {
                return Err(ValidationError::InvalidParent(
                    "Node cannot be its own parent".to_string(),
                ));
            }
        }

        Ok(())
    }
}
