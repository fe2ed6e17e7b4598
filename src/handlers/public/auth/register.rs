use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::api::{RegisterRequest, UserResponse};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /auth/register - create an account
///
/// Body: `{"email": "...", "password": "..."}`. Answers 201 with the new user,
/// 400 with `field_errors` on invalid input, 409 when the email is taken.
pub async fn post(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<UserResponse> {
    let Json(body) = payload?;
    let user = state.auth.register(body).await?;
    Ok(ApiResponse::created(user.into()))
}
