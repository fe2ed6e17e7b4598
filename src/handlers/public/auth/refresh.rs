use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::api::{RefreshRequest, TokenPair};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /auth/refresh - rotate a refresh token into a new pair
pub async fn post(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<TokenPair> {
    let Json(body) = payload?;
    let tokens = state.auth.refresh(&body.refresh_token).await?;
    Ok(ApiResponse::success(tokens))
}
