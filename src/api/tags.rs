//! Tag API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{committed, error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateTagRequest, Tag, UpdateTagRequest};
use crate::AppState;

/// GET /api/tags - List all tags.
pub async fn list_tags(State(state): State<AppState>) -> ApiResult<Vec<Tag>> {
    let store = state.store.lock().await;
    success(store.tags().to_vec(), store.revision())
}

/// POST /api/tags - Create a new tag.
pub async fn create_tag(
    State(state): State<AppState>,
    Json(request): Json<CreateTagRequest>,
) -> ApiResult<Tag> {
    let mut store = state.store.lock().await;
    let revision_id = store.revision();

    // Validate required fields
    if request.label.trim().is_empty() {
        return error(
            AppError::Validation("Tag label is required".to_string()),
            revision_id,
        );
    }

    let id = request
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    if store.tags().iter().any(|tag| tag.id == id) {
        return error(
            AppError::Validation(format!("Tag {} already exists", id)),
            revision_id,
        );
    }

    let result = store.create_tag(Tag::new(id, request.label));
    committed(result, &store, revision_id)
}

/// PUT /api/tags/:id - Rename a tag. Unknown ids are ignored and yield `null`.
pub async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateTagRequest>,
) -> ApiResult<Option<Tag>> {
    let mut store = state.store.lock().await;
    let revision_id = store.revision();

    let result = store.update_tag(&id, &request.label);
    committed(result, &store, revision_id)
}

/// DELETE /api/tags/:id - Delete a tag without touching notes that reference it.
pub async fn delete_tag(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let mut store = state.store.lock().await;
    let revision_id = store.revision();

    let result = store.delete_tag(&id).map(|_| ());
    committed(result, &store, revision_id)
}
