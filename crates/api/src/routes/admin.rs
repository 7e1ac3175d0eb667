use axum::{extract::State, Json};
use infra::models::AdminRow;

use crate::auth::AdminAuth;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::services::admin_service::{
    AdminLoginInput, AdminLoginResponse, MessageResponse, UpdateAdminPasswordInput,
    UpdateAdminProfileInput,
};
use crate::services::AdminService;
use crate::state::AppState;

/// POST /admin/login
pub async fn login(
    State(state): State<AppState>,
    AppJson(input): AppJson<AdminLoginInput>,
) -> Result<Json<AdminLoginResponse>, AppError> {
    Ok(Json(AdminService::new(&state).login(input).await?))
}

/// POST /admin/logout
pub async fn logout(
    State(state): State<AppState>,
    _admin: AdminAuth,
) -> Json<MessageResponse> {
    Json(AdminService::new(&state).logout())
}

/// GET /admin/profile
pub async fn profile(
    State(state): State<AppState>,
    admin: AdminAuth,
) -> Result<Json<AdminRow>, AppError> {
    Ok(Json(AdminService::new(&state).profile(admin.id).await?))
}

/// PATCH /admin/profile
pub async fn update_profile(
    State(state): State<AppState>,
    admin: AdminAuth,
    AppJson(input): AppJson<UpdateAdminProfileInput>,
) -> Result<Json<AdminRow>, AppError> {
    Ok(Json(
        AdminService::new(&state)
            .update_profile(admin.id, input)
            .await?,
    ))
}

/// PATCH /admin/password
pub async fn update_password(
    State(state): State<AppState>,
    admin: AdminAuth,
    AppJson(input): AppJson<UpdateAdminPasswordInput>,
) -> Result<Json<MessageResponse>, AppError> {
    Ok(Json(
        AdminService::new(&state)
            .update_password(admin.id, input)
            .await?,
    ))
}
