use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};

use crate::api::{NoteRequest, NoteResponse};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /notes/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<NoteResponse> {
    let note = state.notes.find(user.user_id, &id).await?;
    Ok(ApiResponse::success(note.into()))
}

/// PUT /notes/:id - replace title, content and color. Any `id` in the body is ignored.
pub async fn put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<NoteRequest>, JsonRejection>,
) -> ApiResult<NoteResponse> {
    let Json(body) = payload?;
    let note = state.notes.update(user.user_id, &id, body).await?;
    Ok(ApiResponse::success(note.into()))
}

/// DELETE /notes/:id - 204 whether or not the caller owned the note
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.notes.delete(user.user_id, &id).await?;
    Ok(ApiResponse::no_content())
}
