use axum::{extract::State, Json};
use infra::models::MemberRow;
use uuid::Uuid;

use crate::auth::AdminAuth;
use crate::error::AppError;
use crate::extract::{AppPath, AppQuery};
use crate::pagination::Paginated;
use crate::services::member_service::MemberListQuery;
use crate::services::MemberService;
use crate::state::AppState;

/// GET /members
pub async fn list(
    State(state): State<AppState>,
    _admin: AdminAuth,
    AppQuery(query): AppQuery<MemberListQuery>,
) -> Result<Json<Paginated<MemberRow>>, AppError> {
    Ok(Json(MemberService::new(&state).list(&query).await?))
}

/// GET /members/{id}
pub async fn detail(
    State(state): State<AppState>,
    _admin: AdminAuth,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<MemberRow>, AppError> {
    Ok(Json(MemberService::new(&state).detail(id).await?))
}

/// PATCH /members/{id}/approve
pub async fn approve(
    State(state): State<AppState>,
    admin: AdminAuth,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<MemberRow>, AppError> {
    tracing::debug!("Admin {} approving member {}", admin.id, id);
    Ok(Json(MemberService::new(&state).approve(id).await?))
}

/// PATCH /members/{id}/reject
pub async fn reject(
    State(state): State<AppState>,
    admin: AdminAuth,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<MemberRow>, AppError> {
    tracing::debug!("Admin {} rejecting member {}", admin.id, id);
    Ok(Json(MemberService::new(&state).reject(id).await?))
}

/// DELETE /members/{id}
pub async fn delete(
    State(state): State<AppState>,
    _admin: AdminAuth,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<MemberRow>, AppError> {
    Ok(Json(MemberService::new(&state).delete(id).await?))
}

/// PATCH /members/{id}/restore
pub async fn restore(
    State(state): State<AppState>,
    _admin: AdminAuth,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<MemberRow>, AppError> {
    Ok(Json(MemberService::new(&state).restore(id).await?))
}
