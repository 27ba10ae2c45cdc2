use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, AssignRoleRequest, AuthorizeRequest, MessageResponse};

#[derive(Debug, Deserialize)]
pub struct AdminAreaQuery {
    pub user_id: i32,
}

/// POST /roles/assign
pub async fn assign(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AssignRoleRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .access
        .assign_role(payload.user_id, &payload.role_name)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("Papel '{}' atribuído com sucesso", payload.role_name),
    })))
}

/// POST /roles/authorize
pub async fn authorize(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AuthorizeRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .access
        .authorize(payload.user_id, &payload.roles)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Acesso autorizado".to_string(),
    })))
}

/// GET /admin/area
///
/// Sample role-gated surface: requires the `admin` role.
pub async fn admin_area(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminAreaQuery>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .access
        .authorize(query.user_id, &["admin".to_string()])
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Bem-vindo à área de administração".to_string(),
    })))
}
