//! Note and tag store.
//!
//! Owns the canonical notes and tags collections, each persisted through its
//! own [`PersistentCell`]. Every mutation replaces the whole collection via a
//! functional update and commits it before returning.

mod filter;
mod notification;

pub use filter::*;
pub use notification::*;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::errors::AppError;
use crate::models::{NoteData, StoredNote, Tag, ViewNote};
use crate::storage::{PersistentCell, Storage};

/// Storage slot holding the notes collection.
pub const NOTES_KEY: &str = "Notes";
/// Storage slot holding the tags collection.
pub const TAGS_KEY: &str = "Tags";

/// Derived view cached against the revisions it was computed from.
struct DerivedCache {
    notes_revision: u64,
    tags_revision: u64,
    notes: Arc<Vec<ViewNote>>,
}

/// Canonical notes and tags with their derived view.
pub struct NoteStore {
    notes: PersistentCell<Vec<StoredNote>>,
    tags: PersistentCell<Vec<Tag>>,
    derived: Option<DerivedCache>,
    notifier: Notifier,
}

impl NoteStore {
    /// Load both collections from storage, defaulting to empty.
    pub fn open(storage: Arc<dyn Storage>) -> Self {
        let notes = PersistentCell::open_with(storage.clone(), NOTES_KEY, Vec::new);
        let tags = PersistentCell::open(storage, TAGS_KEY, Vec::new());

        tracing::debug!(
            "Opened note store with {} notes and {} tags",
            notes.get().map_or(0, Vec::len),
            tags.get().map_or(0, Vec::len)
        );

        Self {
            notes,
            tags,
            derived: None,
            notifier: Notifier::new(),
        }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }

    /// Combined revision of both collections; changes on every committed write.
    pub fn revision(&self) -> u64 {
        self.notes.revision() + self.tags.revision()
    }

    /// Raw persisted notes.
    pub fn notes(&self) -> &[StoredNote] {
        self.notes.get().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn tags(&self) -> &[Tag] {
        self.tags.get().map(Vec::as_slice).unwrap_or_default()
    }

    // ==================== NOTE OPERATIONS ====================

    /// Append a new note with a fresh id.
    pub fn create_note(&mut self, data: NoteData) -> Result<ViewNote, AppError> {
        let note = StoredNote {
            id: uuid::Uuid::new_v4().to_string(),
            tag_ids: data.tag_ids(),
            title: data.title,
            body: data.body,
        };

        let result = self.notes.update(|prev| {
            let mut next = prev.cloned().unwrap_or_default();
            next.push(note.clone());
            Some(next)
        });
        self.report(result, "Note created", "Note could not be created")?;

        tracing::debug!("Created note {}", note.id);
        Ok(derive_note(&note, &tag_index(self.tags())))
    }

    /// Replace title, body and tags of an existing note in place.
    ///
    /// Returns `None` without touching storage when no note has this id.
    pub fn update_note(&mut self, id: &str, data: NoteData) -> Result<Option<ViewNote>, AppError> {
        if !self.notes().iter().any(|note| note.id == id) {
            tracing::debug!("Update of unknown note {} ignored", id);
            self.notifier.success("Note updated");
            return Ok(None);
        }

        let updated = StoredNote {
            id: id.to_string(),
            tag_ids: data.tag_ids(),
            title: data.title,
            body: data.body,
        };

        let result = self.notes.update(|prev| {
            prev.map(|notes| {
                notes
                    .iter()
                    .map(|note| {
                        if note.id == id {
                            updated.clone()
                        } else {
                            note.clone()
                        }
                    })
                    .collect()
            })
        });
        self.report(result, "Note updated", "Note could not be updated")?;

        Ok(Some(derive_note(&updated, &tag_index(self.tags()))))
    }

    /// Remove a note. Returns whether a note was removed.
    pub fn delete_note(&mut self, id: &str) -> Result<bool, AppError> {
        if !self.notes().iter().any(|note| note.id == id) {
            tracing::debug!("Delete of unknown note {} ignored", id);
            self.notifier.success("Note deleted");
            return Ok(false);
        }

        let result = self.notes.update(|prev| {
            prev.map(|notes| notes.iter().filter(|note| note.id != id).cloned().collect())
        });
        self.report(result, "Note deleted", "Note could not be deleted")?;

        Ok(true)
    }

    /// Look up a single note in the derived view.
    pub fn get_note(&mut self, id: &str) -> Option<ViewNote> {
        self.derived_notes().iter().find(|note| note.id == id).cloned()
    }

    // ==================== TAG OPERATIONS ====================

    /// Append a tag whose id was generated by the caller.
    pub fn create_tag(&mut self, tag: Tag) -> Result<Tag, AppError> {
        let result = self.tags.update(|prev| {
            let mut next = prev.cloned().unwrap_or_default();
            next.push(tag.clone());
            Some(next)
        });
        self.report(result, "Tag created", "Tag could not be created")?;

        tracing::debug!("Created tag {} ({})", tag.id, tag.label);
        Ok(tag)
    }

    /// Rename a tag. Returns `None` when no tag has this id.
    pub fn update_tag(&mut self, id: &str, label: &str) -> Result<Option<Tag>, AppError> {
        if !self.tags().iter().any(|tag| tag.id == id) {
            tracing::debug!("Update of unknown tag {} ignored", id);
            self.notifier.success("Tag updated");
            return Ok(None);
        }

        let result = self.tags.update(|prev| {
            prev.map(|tags| {
                tags.iter()
                    .map(|tag| Tag {
                        id: tag.id.clone(),
                        label: if tag.id == id {
                            label.to_string()
                        } else {
                            tag.label.clone()
                        },
                    })
                    .collect()
            })
        });
        self.report(result, "Tag updated", "Tag could not be updated")?;

        Ok(Some(Tag::new(id, label)))
    }

    /// Remove a tag. Notes keep the id in `tag_ids`; it is dropped from their derived view.
    pub fn delete_tag(&mut self, id: &str) -> Result<bool, AppError> {
        if !self.tags().iter().any(|tag| tag.id == id) {
            tracing::debug!("Delete of unknown tag {} ignored", id);
            self.notifier.success("Tag deleted");
            return Ok(false);
        }

        let result = self.tags.update(|prev| {
            prev.map(|tags| tags.iter().filter(|tag| tag.id != id).cloned().collect())
        });
        self.report(result, "Tag deleted", "Tag could not be deleted")?;

        Ok(true)
    }

    // ==================== DERIVED VIEW ====================

    /// Notes joined with their tags, recomputed only when either collection changed.
    pub fn derived_notes(&mut self) -> Arc<Vec<ViewNote>> {
        let notes_revision = self.notes.revision();
        let tags_revision = self.tags.revision();

        if let Some(cache) = &self.derived {
            if cache.notes_revision == notes_revision && cache.tags_revision == tags_revision {
                return cache.notes.clone();
            }
        }

        let notes = Arc::new(derive_notes(self.notes(), self.tags()));
        self.derived = Some(DerivedCache {
            notes_revision,
            tags_revision,
            notes: notes.clone(),
        });
        notes
    }

    /// Derived notes narrowed by `filter`.
    pub fn filter_notes(&mut self, filter: &NoteFilter) -> Vec<ViewNote> {
        let notes = self.derived_notes();
        filter.apply(notes.iter())
    }

    fn report<T>(
        &self,
        result: Result<T, crate::storage::StorageError>,
        success: &str,
        failure: &str,
    ) -> Result<T, AppError> {
        match result {
            Ok(value) => {
                self.notifier.success(success);
                Ok(value)
            }
            Err(e) => {
                self.notifier.failure(failure);
                Err(e.into())
            }
        }
    }
}

/// Join every note with the tags it references.
pub fn derive_notes(notes: &[StoredNote], tags: &[Tag]) -> Vec<ViewNote> {
    let index = tag_index(tags);
    notes.iter().map(|note| derive_note(note, &index)).collect()
}

fn tag_index(tags: &[Tag]) -> HashMap<&str, &Tag> {
    let mut index = HashMap::with_capacity(tags.len());
    for tag in tags {
        index.entry(tag.id.as_str()).or_insert(tag);
    }
    index
}

// Tags follow tag_ids order; unresolved and repeated ids are skipped
fn derive_note(note: &StoredNote, index: &HashMap<&str, &Tag>) -> ViewNote {
    let mut seen = HashSet::new();
    let tags = note
        .tag_ids
        .iter()
        .map(String::as_str)
        .filter(|id| seen.insert(*id))
        .filter_map(|id| index.get(id).map(|tag| (*tag).clone()))
        .collect();

    ViewNote {
        id: note.id.clone(),
        title: note.title.clone(),
        body: note.body.clone(),
        tags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn open_memory() -> (Arc<MemoryStorage>, NoteStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = NoteStore::open(storage.clone());
        (storage, store)
    }

    fn data(title: &str, tags: &[Tag]) -> NoteData {
        NoteData {
            title: title.to_string(),
            body: format!("{} body", title),
            tags: tags.to_vec(),
        }
    }

    #[test]
    fn test_example_scenario_create_then_delete_tag() {
        let (_, mut store) = open_memory();
        let work = Tag::new("t1", "work");

        store.create_tag(work.clone()).unwrap();
        store
            .create_note(NoteData {
                title: "Plan".to_string(),
                body: "draft".to_string(),
                tags: vec![work.clone()],
            })
            .unwrap();

        assert_eq!(store.notes().len(), 1);
        assert_eq!(store.notes()[0].tag_ids, vec!["t1".to_string()]);

        let derived = store.derived_notes();
        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].title, "Plan");
        assert_eq!(derived[0].body, "draft");
        assert_eq!(derived[0].tags, vec![work]);

        assert!(store.delete_tag("t1").unwrap());
        assert!(store.tags().is_empty());

        let derived = store.derived_notes();
        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].id, store.notes()[0].id);
        assert!(derived[0].tags.is_empty());
        // no cascade into the persisted note
        assert_eq!(store.notes()[0].tag_ids, vec!["t1".to_string()]);
    }

    #[test]
    fn test_create_note_preserves_tag_order() {
        let (_, mut store) = open_memory();
        let a = Tag::new("a", "alpha");
        let b = Tag::new("b", "beta");
        let c = Tag::new("c", "gamma");
        for tag in [&a, &b, &c] {
            store.create_tag(tag.clone()).unwrap();
        }

        let view = store
            .create_note(data("Ordered", &[c.clone(), a.clone(), b.clone()]))
            .unwrap();

        assert_eq!(view.tags, vec![c.clone(), a.clone(), b.clone()]);
        assert_eq!(store.derived_notes()[0].tags, vec![c, a, b]);
    }

    #[test]
    fn test_create_note_drops_unknown_tags_from_view() {
        let (_, mut store) = open_memory();
        let known = Tag::new("known", "known");
        store.create_tag(known.clone()).unwrap();

        let view = store
            .create_note(data("Mixed", &[Tag::new("ghost", "ghost"), known.clone()]))
            .unwrap();

        assert_eq!(view.tags, vec![known]);
        assert_eq!(
            store.notes()[0].tag_ids,
            vec!["ghost".to_string(), "known".to_string()]
        );
    }

    #[test]
    fn test_note_ids_stay_unique() {
        let (_, mut store) = open_memory();

        let mut created = Vec::new();
        for i in 0..20 {
            created.push(store.create_note(data(&format!("n{}", i), &[])).unwrap());
        }
        store.delete_note(&created[3].id).unwrap();
        store.update_note(&created[5].id, data("renamed", &[])).unwrap();
        store.create_note(data("late", &[])).unwrap();

        let ids: HashSet<_> = store.notes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids.len(), store.notes().len());
        assert_eq!(store.notes().len(), 20);
    }

    #[test]
    fn test_update_note_in_place() {
        let (_, mut store) = open_memory();
        let tag = Tag::new("t", "tag");
        store.create_tag(tag.clone()).unwrap();
        let first = store.create_note(data("first", &[])).unwrap();
        let second = store.create_note(data("second", &[])).unwrap();
        let third = store.create_note(data("third", &[])).unwrap();

        let updated = store
            .update_note(
                &second.id,
                NoteData {
                    title: "second v2".to_string(),
                    body: String::new(),
                    tags: vec![tag.clone()],
                },
            )
            .unwrap()
            .expect("note exists");

        assert_eq!(updated.id, second.id);
        assert_eq!(updated.tags, vec![tag]);

        let ids: Vec<_> = store.notes().iter().map(|n| n.id.clone()).collect();
        assert_eq!(ids, vec![first.id, second.id.clone(), third.id]);
        assert_eq!(store.notes()[1].title, "second v2");
        assert_eq!(store.notes()[1].body, "");
        assert_eq!(store.notes()[1].tag_ids, vec!["t".to_string()]);
    }

    #[test]
    fn test_update_unknown_note_is_noop() {
        let (_, mut store) = open_memory();
        for title in ["a", "b", "c"] {
            store.create_note(data(title, &[])).unwrap();
        }
        let before = store.notes().to_vec();
        let revision = store.revision();

        let result = store.update_note("missing", data("x", &[])).unwrap();

        assert!(result.is_none());
        assert_eq!(store.notes(), before.as_slice());
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn test_delete_note() {
        let (_, mut store) = open_memory();
        let keep = store.create_note(data("keep", &[])).unwrap();
        let drop = store.create_note(data("drop", &[])).unwrap();

        assert!(store.delete_note(&drop.id).unwrap());
        assert!(!store.delete_note(&drop.id).unwrap());

        assert_eq!(store.notes().len(), 1);
        assert_eq!(store.notes()[0].id, keep.id);
        assert!(store.get_note(&drop.id).is_none());
        assert_eq!(store.get_note(&keep.id).unwrap().title, "keep");
    }

    #[test]
    fn test_update_tag_label_only() {
        let (_, mut store) = open_memory();
        store.create_tag(Tag::new("t1", "work")).unwrap();
        store.create_tag(Tag::new("t2", "home")).unwrap();
        let note = store
            .create_note(data("n", &[Tag::new("t1", "work")]))
            .unwrap();

        let renamed = store.update_tag("t1", "office").unwrap();

        assert_eq!(renamed, Some(Tag::new("t1", "office")));
        assert_eq!(
            store.tags(),
            &[Tag::new("t1", "office"), Tag::new("t2", "home")]
        );
        assert_eq!(
            store.get_note(&note.id).unwrap().tags,
            vec![Tag::new("t1", "office")]
        );
        assert_eq!(store.update_tag("nope", "x").unwrap(), None);
        assert_eq!(store.tags().len(), 2);
    }

    #[test]
    fn test_delete_unknown_tag_is_noop() {
        let (_, mut store) = open_memory();
        store.create_tag(Tag::new("t1", "work")).unwrap();

        assert!(!store.delete_tag("t2").unwrap());
        assert_eq!(store.tags(), &[Tag::new("t1", "work")]);
    }

    #[test]
    fn test_derived_view_is_memoized() {
        let (_, mut store) = open_memory();
        store.create_note(data("a", &[])).unwrap();

        let first = store.derived_notes();
        let second = store.derived_notes();
        assert!(Arc::ptr_eq(&first, &second));

        store.create_tag(Tag::new("t", "t")).unwrap();
        let third = store.derived_notes();
        assert!(!Arc::ptr_eq(&second, &third));
        assert_eq!(*second, *third);

        // no-op mutation leaves the cache valid
        store.update_note("missing", data("x", &[])).unwrap();
        assert!(Arc::ptr_eq(&third, &store.derived_notes()));
    }

    #[test]
    fn test_filter_notes() {
        let (_, mut store) = open_memory();
        let work = Tag::new("w", "work");
        store.create_tag(work.clone()).unwrap();
        store.create_note(data("Plan sprint", &[work.clone()])).unwrap();
        store.create_note(data("Plan holiday", &[])).unwrap();
        store.create_note(data("Standup", &[work.clone()])).unwrap();

        let by_title = store.filter_notes(&NoteFilter {
            title: Some("plan".to_string()),
            tag_ids: vec![],
        });
        assert_eq!(by_title.len(), 2);

        let by_both = store.filter_notes(&NoteFilter {
            title: Some("plan".to_string()),
            tag_ids: vec!["w".to_string()],
        });
        assert_eq!(by_both.len(), 1);
        assert_eq!(by_both[0].title, "Plan sprint");
    }

    #[test]
    fn test_round_trip_through_storage() {
        let (storage, mut store) = open_memory();
        let tag = Tag::new("t1", "work");
        store.create_tag(tag.clone()).unwrap();
        store.create_note(data("one", &[tag.clone()])).unwrap();
        store.create_note(data("two", &[])).unwrap();

        let reopened = NoteStore::open(storage);

        assert_eq!(reopened.notes(), store.notes());
        assert_eq!(reopened.tags(), store.tags());
    }

    #[test]
    fn test_persisted_layout() {
        let (storage, mut store) = open_memory();
        store.create_tag(Tag::new("t1", "work")).unwrap();
        let note = store
            .create_note(data("Plan", &[Tag::new("t1", "work")]))
            .unwrap();

        let tags: serde_json::Value =
            serde_json::from_str(&storage.get_item(TAGS_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(tags, serde_json::json!([{"id": "t1", "label": "work"}]));

        let notes: serde_json::Value =
            serde_json::from_str(&storage.get_item(NOTES_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(
            notes,
            serde_json::json!([{
                "id": note.id,
                "title": "Plan",
                "body": "Plan body",
                "tagIds": ["t1"],
            }])
        );
    }

    #[test]
    fn test_storage_failure_leaves_state_unchanged() {
        let (storage, mut store) = open_memory();
        store.create_note(data("kept", &[])).unwrap();
        let mut rx = store.subscribe();

        storage.set_fail_writes(true);
        let result = store.create_note(data("lost", &[]));

        assert!(matches!(result, Err(AppError::Storage(_))));
        assert_eq!(store.notes().len(), 1);
        assert_eq!(rx.try_recv().unwrap().kind, NotificationKind::Failure);
    }

    #[test]
    fn test_mutations_notify() {
        let (_, mut store) = open_memory();
        let mut rx = store.subscribe();

        store.create_tag(Tag::new("t", "t")).unwrap();
        let note = store.create_note(data("n", &[])).unwrap();
        store.delete_note(&note.id).unwrap();

        let messages: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|n| n.message)
            .collect();
        assert_eq!(messages, vec!["Tag created", "Note created", "Note deleted"]);
    }

    #[test]
    fn test_derive_skips_repeated_ids() {
        let tags = vec![Tag::new("a", "a"), Tag::new("b", "b")];
        let notes = vec![StoredNote {
            id: "n".to_string(),
            title: "n".to_string(),
            body: String::new(),
            tag_ids: vec!["b".to_string(), "a".to_string(), "b".to_string()],
        }];

        let derived = derive_notes(&notes, &tags);
        assert_eq!(derived[0].tags, vec![Tag::new("b", "b"), Tag::new("a", "a")]);
    }
}
