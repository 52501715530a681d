//! Note list filtering by title and tags.

use crate::models::ViewNote;

/// Criteria for narrowing the derived note list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    /// Case-insensitive substring of the title
    pub title: Option<String>,
    /// Tags that must all be attached to a matching note
    pub tag_ids: Vec<String>,
}

impl NoteFilter {
    pub fn is_empty(&self) -> bool {
        self.title.as_deref().map_or(true, str::is_empty) && self.tag_ids.is_empty()
    }

    pub fn matches(&self, note: &ViewNote) -> bool {
        self.matches_title(note) && self.matches_tags(note)
    }

    fn matches_title(&self, note: &ViewNote) -> bool {
        match self.title.as_deref() {
            None | Some("") => true,
            Some(needle) => note
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        }
    }

    // Checked against resolved tags, so a dangling id never matches
    fn matches_tags(&self, note: &ViewNote) -> bool {
        self.tag_ids
            .iter()
            .all(|wanted| note.tags.iter().any(|tag| &tag.id == wanted))
    }

    /// Keep matching notes, preserving order.
    pub fn apply<'a>(&self, notes: impl IntoIterator<Item = &'a ViewNote>) -> Vec<ViewNote> {
        notes
            .into_iter()
            .filter(|note| self.matches(note))
            .cloned()
            .collect()
    }
}
