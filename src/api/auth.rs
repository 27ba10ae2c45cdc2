use axum::{Json, extract::State, http::HeaderMap};
use std::sync::Arc;

use super::{
    ApiError, ApiResponse, AppState, LoginRequest, MessageResponse, UserIdRequest, UserIdResponse,
    client_origin,
};

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<UserIdResponse>>, ApiError> {
    let origin = client_origin(&headers);

    let user_id = state
        .access
        .login(&payload.email, &payload.password, &origin)
        .await?;

    Ok(Json(ApiResponse::success(UserIdResponse {
        message: "Login realizado com sucesso".to_string(),
        user_id,
    })))
}

/// POST /auth/logout
///
/// There is no session state; logout is recorded as an audit event only.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<UserIdRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let origin = client_origin(&headers);

    state.access.logout(payload.user_id, &origin).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Logout realizado com sucesso".to_string(),
    })))
}
