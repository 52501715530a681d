//! Note models: the persisted shape and the view joined with tags.

use serde::{Deserialize, Serialize};

use super::Tag;

/// A note as persisted, referencing tags by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredNote {
    pub id: String,
    pub title: String,
    pub body: String,
    /// Ids in the order tags were attached; may reference deleted tags
    pub tag_ids: Vec<String>,
}

/// A note joined with the tag records it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewNote {
    pub id: String,
    pub title: String,
    pub body: String,
    pub tags: Vec<Tag>,
}

/// Editable fields of a note, used for both create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NoteData {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl NoteData {
    /// Ids of the attached tags, in attachment order.
    pub fn tag_ids(&self) -> Vec<String> {
        self.tags.iter().map(|tag| tag.id.clone()).collect()
    }
}
