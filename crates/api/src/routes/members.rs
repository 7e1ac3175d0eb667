use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use infra::models::MemberRow;
use serde::Deserialize;

use crate::auth::MemberAuth;
use crate::error::AppError;
use crate::extract::{AppJson, AppQuery};
use crate::services::member_service::{
    MemberLoginInput, MemberLoginResponse, MemberStatusReport, RegisterMemberInput,
};
use crate::services::MemberService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckStatusQuery {
    pub email: String,
}

/// POST /members/register
pub async fn register(
    State(state): State<AppState>,
    AppJson(input): AppJson<RegisterMemberInput>,
) -> Result<(StatusCode, Json<MemberRow>), AppError> {
    let member = MemberService::new(&state).register(input).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// POST /members/login
pub async fn login(
    State(state): State<AppState>,
    AppJson(input): AppJson<MemberLoginInput>,
) -> Result<Json<MemberLoginResponse>, AppError> {
    Ok(Json(MemberService::new(&state).login(input).await?))
}

/// GET /members/check-status?email=
pub async fn check_status(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CheckStatusQuery>,
) -> Result<Json<MemberStatusReport>, AppError> {
    if query.email.trim().is_empty() {
        return Err(AppError::bad_request("email is required"));
    }
    Ok(Json(
        MemberService::new(&state)
            .check_status(&query.email)
            .await?,
    ))
}

/// GET /members/profile
pub async fn profile(
    State(state): State<AppState>,
    auth: MemberAuth,
) -> Result<Json<MemberRow>, AppError> {
    Ok(Json(MemberService::new(&state).profile(auth.id).await?))
}

/// PATCH /members/cancel-subscription
pub async fn cancel_subscription(
    State(state): State<AppState>,
    auth: MemberAuth,
) -> Result<Json<MemberRow>, AppError> {
    Ok(Json(
        MemberService::new(&state)
            .cancel_subscription(auth.id)
            .await?,
    ))
}
