use axum::{extract::State, Json};
use infra::models::CheckInLogEntryRow;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AdminAuth;
use crate::checkin::{CheckInOutcome, CheckInQuery, CheckOutOutcome};
use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::pagination::Paginated;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeskRequest {
    #[validate(length(min = 1, message = "memberId is required"))]
    pub member_id: String,
}

/// POST /checkin
pub async fn check_in(
    State(state): State<AppState>,
    AppJson(body): AppJson<DeskRequest>,
) -> Result<Json<CheckInOutcome>, AppError> {
    body.validate()?;
    let outcome = state.check_ins().check_in(&body.member_id).await?;
    Ok(Json(outcome))
}

/// POST /checkin/checkout
pub async fn check_out(
    State(state): State<AppState>,
    AppJson(body): AppJson<DeskRequest>,
) -> Result<Json<CheckOutOutcome>, AppError> {
    body.validate()?;
    let outcome = state.check_ins().check_out(&body.member_id).await?;
    Ok(Json(outcome))
}

/// GET /checkins
pub async fn list(
    State(state): State<AppState>,
    _admin: AdminAuth,
    AppQuery(query): AppQuery<CheckInQuery>,
) -> Result<Json<Paginated<CheckInLogEntryRow>>, AppError> {
    Ok(Json(state.check_ins().find_all(&query).await?))
}

/// GET /members/{id}/checkins
pub async fn list_for_member(
    State(state): State<AppState>,
    _admin: AdminAuth,
    AppPath(member_id): AppPath<Uuid>,
    AppQuery(query): AppQuery<CheckInQuery>,
) -> Result<Json<Paginated<CheckInLogEntryRow>>, AppError> {
    Ok(Json(
        state
            .check_ins()
            .find_by_member_id(member_id, &query)
            .await?,
    ))
}
