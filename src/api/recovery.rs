use axum::{Json, extract::State, http::HeaderMap};
use std::sync::Arc;

use super::{
    ApiError, ApiResponse, AppState, ConfirmResetRequest, MessageResponse, ResetRequest,
    client_origin,
};

/// POST /recovery/request
pub async fn request_reset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.access.request_password_reset(&payload.email).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Email de reset enviado com sucesso".to_string(),
    })))
}

/// POST /recovery/confirm
pub async fn confirm_reset(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ConfirmResetRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let origin = client_origin(&headers);

    state
        .access
        .confirm_password_reset(&payload.token, &payload.new_password, &origin)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Senha atualizada com sucesso".to_string(),
    })))
}
