use axum::{extract::State, Json};
use infra::{models::MembershipPackageRow, repos::MembershipPackageRepo};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{AppPath, AppQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageListQuery {
    pub is_active: Option<bool>,
}

/// GET /membership-packages
pub async fn list(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PackageListQuery>,
) -> Result<Json<Vec<MembershipPackageRow>>, AppError> {
    let packages = MembershipPackageRepo::new(state.db.clone())
        .list(query.is_active)
        .await?;
    Ok(Json(packages))
}

/// GET /membership-packages/{id}
pub async fn detail(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<MembershipPackageRow>, AppError> {
    MembershipPackageRepo::new(state.db.clone())
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Membership package not found"))
}
