use axum::{Json, extract::State};
use std::sync::Arc;

use super::{
    ApiError, ApiResponse, AppState, MessageResponse, RegisterRequest, UserIdRequest,
    UserIdResponse,
};

/// POST /accounts/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<UserIdResponse>>, ApiError> {
    let user_id = state
        .access
        .register(&payload.name, &payload.email, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(UserIdResponse {
        message: "Usuário cadastrado com sucesso".to_string(),
        user_id,
    })))
}

/// POST /accounts/deactivate
pub async fn deactivate(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UserIdRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.access.request_deactivation(payload.user_id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Solicitação de exclusão realizada com sucesso".to_string(),
    })))
}

/// POST /accounts/anonymize
pub async fn anonymize(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UserIdRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.access.anonymize(payload.user_id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Usuário anonimizado com sucesso".to_string(),
    })))
}
