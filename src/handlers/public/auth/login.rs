use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::api::{LoginRequest, TokenPair};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /auth/login - exchange email and password for a token pair
pub async fn post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<TokenPair> {
    let Json(body) = payload?;
    let tokens = state.auth.login(body).await?;
    Ok(ApiResponse::success(tokens))
}
