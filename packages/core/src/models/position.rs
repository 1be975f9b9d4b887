//! Position Data Structures
//!
//! A position is a node in the organizational hierarchy. The hierarchy is
//! stored as an adjacency list: every row carries an optional `parent_id`,
//! and both `children` and assigned `users` are derived by query rather than
//! stored on the record.
//!
//! # Examples
//!
//! ```rust
//! use orgchart_core::models::{NewPosition, PositionUpdate};
//!
//! // A root position
//! let ceo = NewPosition::new("CEO", "Chief Executive Officer");
//! assert!(ceo.parent_id.is_none());
//!
//! // A position reporting to an existing one
//! let cto = NewPosition::new("CTO", "Chief Technology Officer").with_parent("ceo-id");
//! assert_eq!(cto.parent_id.as_deref(), Some("ceo-id"));
//!
//! // Detach a position so it becomes a root
//! let update = PositionUpdate::new().with_parent(None);
//! assert!(!update.is_empty());
//! ```

use super::validation::{deserialize_optional_field, require_text};
use super::{User, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored position record.
///
/// # Fields
///
/// - `id`: UUID v4 string, generated by the store on insert
/// - `name` / `description`: non-empty text
/// - `parent_id`: the position this one reports to (`None` for roots)
/// - `created_at` / `modified_at`: maintained by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Unique identifier
    pub id: String,

    /// Display name (e.g. "CTO")
    pub name: String,

    /// Free-form description of the role
    pub description: String,

    /// Parent position ID (`None` means this is a root position)
    pub parent_id: Option<String>,

    /// Timestamp when the position was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the position was last modified
    pub modified_at: DateTime<Utc>,
}

impl Position {
    /// Whether this position has no parent
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Apply a partial update in place
    ///
    /// Only supplied fields are overwritten. Reference validation (parent
    /// existence, cycles) is the service's job and must happen before this.
    pub fn apply_update(&mut self, update: PositionUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(parent_id) = update.parent_id {
            self.parent_id = parent_id;
        }
    }
}

/// Input for creating a position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPosition {
    pub name: String,
    pub description: String,
    /// Optional parent; must reference an existing position
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl NewPosition {
    /// Create input for a root position
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parent_id: None,
        }
    }

    /// Place the new position under `parent_id`
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Validate field shapes (does not check that the parent exists)
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("description", &self.description)?;
        Ok(())
    }
}

/// Partial position update
///
/// `parent_id` uses the double-Option pattern:
/// - `None`: don't change the parent
/// - `Some(None)`: detach, the position becomes a root
/// - `Some(Some(id))`: re-parent under `id`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub parent_id: Option<Option<String>>,
}

impl PositionUpdate {
    /// Create an empty update
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the new parent (`None` detaches the position to the root level)
    pub fn with_parent(mut self, parent_id: Option<String>) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Check if the update contains any changes
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.parent_id.is_none()
    }

    /// Validate supplied text fields
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(description) = &self.description {
            require_text("description", description)?;
        }
        Ok(())
    }
}

/// Lightweight projection used by hierarchy materialization
///
/// Carries no parent back-reference and no user list, so a tree can be
/// serialized without cycles and stays small.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionTreeNode {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Always present, empty for leaves
    pub children: Vec<PositionTreeNode>,
}

impl PositionTreeNode {
    /// Total number of nodes in this subtree, including `self`
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(PositionTreeNode::size).sum::<usize>()
    }
}

/// A position loaded together with its direct relations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionDetails {
    #[serde(flatten)]
    pub position: Position,
    pub parent: Option<Position>,
    pub children: Vec<Position>,
    pub users: Vec<User>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_position() -> Position {
        let now = Utc::now();
        Position {
            id: "pos-1".to_string(),
            name: "CTO".to_string(),
            description: "Chief Technology Officer".to_string(),
            parent_id: Some("ceo".to_string()),
            created_at: now,
            modified_at: now,
        }
    }

    #[test]
    fn test_new_position_validation() {
        assert!(NewPosition::new("CTO", "Technology").validate().is_ok());
        assert_eq!(
            NewPosition::new(" ", "Technology").validate(),
            Err(ValidationError::MissingField("name".to_string()))
        );
        assert_eq!(
            NewPosition::new("CTO", "").validate(),
            Err(ValidationError::MissingField("description".to_string()))
        );
    }

    #[test]
    fn test_apply_update_only_touches_supplied_fields() {
        let mut position = sample_position();
        position.apply_update(PositionUpdate::new().with_name("VP Engineering"));

        assert_eq!(position.name, "VP Engineering");
        assert_eq!(position.description, "Chief Technology Officer");
        assert_eq!(position.parent_id.as_deref(), Some("ceo"));
    }

    #[test]
    fn test_apply_update_can_detach_parent() {
        let mut position = sample_position();
        position.apply_update(PositionUpdate::new().with_parent(None));
        assert!(position.is_root());
    }

    #[test]
    fn test_update_deserialization_distinguishes_null_from_missing() {
        let missing: PositionUpdate = serde_json::from_value(json!({"name": "X"})).unwrap();
        assert_eq!(missing.parent_id, None);

        let null: PositionUpdate = serde_json::from_value(json!({"parentId": null})).unwrap();
        assert_eq!(null.parent_id, Some(None));

        let set: PositionUpdate = serde_json::from_value(json!({"parentId": "abc"})).unwrap();
        assert_eq!(set.parent_id, Some(Some("abc".to_string())));
    }

    #[test]
    fn test_empty_update() {
        assert!(PositionUpdate::new().is_empty());
        assert!(PositionUpdate::new().validate().is_ok());
        assert!(PositionUpdate::new().with_description("  ").validate().is_err());
    }

    #[test]
    fn test_tree_node_serializes_children_array() {
        let leaf = PositionTreeNode {
            id: "a".to_string(),
            name: "A".to_string(),
            description: "a".to_string(),
            children: Vec::new(),
        };
        let value = serde_json::to_value(&leaf).unwrap();
        assert_eq!(value["children"], json!([]));
        assert!(value.get("parentId").is_none());
        assert_eq!(leaf.size(), 1);
    }
}
