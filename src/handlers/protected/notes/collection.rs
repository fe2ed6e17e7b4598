use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};

use crate::api::{NoteRequest, NoteResponse};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /notes - all notes owned by the caller
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<NoteResponse>> {
    let notes = state.notes.list(user.user_id).await?;
    Ok(ApiResponse::success(notes.into_iter().map(NoteResponse::from).collect()))
}

/// POST /notes - create a note, or update the caller's note named by `id`
pub async fn post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<NoteRequest>, JsonRejection>,
) -> ApiResult<NoteResponse> {
    let Json(body) = payload?;
    let note = state.notes.save(user.user_id, body).await?;
    Ok(ApiResponse::success(note.into()))
}
