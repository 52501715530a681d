//! Note API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{committed, error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{NoteData, ViewNote};
use crate::store::NoteFilter;
use crate::AppState;

/// Query parameters for listing notes.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteListQuery {
    /// Case-insensitive title substring.
    #[serde(default)]
    pub title: Option<String>,
    /// Comma-separated tag ids that must all be attached.
    #[serde(default)]
    pub tag_ids: Option<String>,
}

impl From<NoteListQuery> for NoteFilter {
    fn from(query: NoteListQuery) -> Self {
        let tag_ids = query
            .tag_ids
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();

        NoteFilter {
            title: query.title,
            tag_ids,
        }
    }
}

/// Summary of a note; `summary` is null when the provider gave none.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: Option<String>,
}

/// GET /api/notes - List notes joined with their tags.
pub async fn list_notes(
    State(state): State<AppState>,
    Query(query): Query<NoteListQuery>,
) -> ApiResult<Vec<ViewNote>> {
    let mut store = state.store.lock().await;
    let filter = NoteFilter::from(query);

    let notes = if filter.is_empty() {
        (*store.derived_notes()).clone()
    } else {
        store.filter_notes(&filter)
    };

    success(notes, store.revision())
}

/// GET /api/notes/:id - Get a single note.
pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ViewNote> {
    let mut store = state.store.lock().await;
    let revision_id = store.revision();

    match store.get_note(&id) {
        Some(note) => success(note, revision_id),
        None => error(
            AppError::NotFound(format!("Note {} not found", id)),
            revision_id,
        ),
    }
}

/// POST /api/notes - Create a new note.
pub async fn create_note(
    State(state): State<AppState>,
    Json(request): Json<NoteData>,
) -> ApiResult<ViewNote> {
    let mut store = state.store.lock().await;
    let revision_id = store.revision();

    // Validate required fields
    if request.title.trim().is_empty() {
        return error(
            AppError::Validation("Title is required".to_string()),
            revision_id,
        );
    }

    let result = store.create_note(request);
    committed(result, &store, revision_id)
}

/// PUT /api/notes/:id - Update a note. Unknown ids are ignored and yield `null`.
pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<NoteData>,
) -> ApiResult<Option<ViewNote>> {
    let mut store = state.store.lock().await;
    let revision_id = store.revision();

    if request.title.trim().is_empty() {
        return error(
            AppError::Validation("Title is required".to_string()),
            revision_id,
        );
    }

    let result = store.update_note(&id, request);
    committed(result, &store, revision_id)
}

/// DELETE /api/notes/:id - Delete a note. Unknown ids are ignored.
pub async fn delete_note(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let mut store = state.store.lock().await;
    let revision_id = store.revision();

    let result = store.delete_note(&id).map(|_| ());
    committed(result, &store, revision_id)
}

/// POST /api/notes/:id/summary - Summarize the note body.
pub async fn summarize_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<SummaryResponse> {
    // Release the store before the remote call so mutations are not blocked
    let (body, revision_id) = {
        let mut store = state.store.lock().await;
        let revision_id = store.revision();
        match store.get_note(&id) {
            Some(note) => (note.body, revision_id),
            None => {
                return error(
                    AppError::NotFound(format!("Note {} not found", id)),
                    revision_id,
                )
            }
        }
    };

    let summary = state.summarizer.summarize(&body).await;
    success(SummaryResponse { summary }, revision_id)
}
