//! Tag model.

use serde::{Deserialize, Serialize};

/// A reusable label attached to notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub label: String,
}

impl Tag {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Request body for creating a new tag.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTagRequest {
    /// Caller-generated id; a fresh one is assigned when absent
    #[serde(default)]
    pub id: Option<String>,
    pub label: String,
}

/// Request body for renaming a tag.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTagRequest {
    pub label: String,
}
