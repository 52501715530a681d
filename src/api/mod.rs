//! REST API module.
//!
//! Contains all API routes and handlers for notes, tags and summaries.

mod notes;
mod tags;

pub use notes::*;
pub use tags::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::{AppError, AppErrorWithRevision};
use crate::store::NoteStore;

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub revision_id: u64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, revision_id: u64) -> Self {
        Self {
            success: true,
            data,
            revision_id,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppErrorWithRevision>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T, revision_id: u64) -> ApiResult<T> {
    Ok(ApiResponse::new(data, revision_id))
}

/// Create an error API response.
pub fn error<T: Serialize>(err: AppError, revision_id: u64) -> ApiResult<T> {
    Err(AppErrorWithRevision {
        error: err,
        revision_id,
    })
}

/// Wrap the outcome of a store mutation.
///
/// Success reports the store's revision after the commit; failure reports
/// `previous`, since a failed commit leaves the store untouched.
pub fn committed<T: Serialize>(
    result: Result<T, AppError>,
    store: &NoteStore,
    previous: u64,
) -> ApiResult<T> {
    match result {
        Ok(data) => success(data, store.revision()),
        Err(e) => error(e, previous),
    }
}
