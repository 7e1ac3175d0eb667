use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use infra::{
    models::{ImageKind, MemberImageRow},
    repos::{member_images::create_image, CreateMemberImage, MemberImageRepo, MemberRepo},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AdminAuth;
use crate::error::AppError;
use crate::extract::{AppJson, AppPath};
use crate::services::admin_service::MessageResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddImageInput {
    pub kind: ImageKind,
    #[validate(length(min = 1, message = "imageUrl is required"))]
    pub image_url: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateImageInput {
    pub description: Option<String>,
}

/// GET /members/{id}/images
pub async fn list(
    State(state): State<AppState>,
    _admin: AdminAuth,
    AppPath(member_id): AppPath<Uuid>,
) -> Result<Json<Vec<MemberImageRow>>, AppError> {
    MemberRepo::new(state.db.clone())
        .get_by_id(member_id, true)
        .await?
        .ok_or_else(|| AppError::not_found("Member not found"))?;

    let images = MemberImageRepo::new(state.db.clone())
        .list_by_member(member_id)
        .await?;
    Ok(Json(images))
}

/// POST /members/{id}/images
pub async fn add(
    State(state): State<AppState>,
    _admin: AdminAuth,
    AppPath(member_id): AppPath<Uuid>,
    AppJson(input): AppJson<AddImageInput>,
) -> Result<(StatusCode, Json<MemberImageRow>), AppError> {
    input.validate()?;
    MemberRepo::new(state.db.clone())
        .get_by_id(member_id, false)
        .await?
        .ok_or_else(|| AppError::not_found("Member not found"))?;

    // Replacing a profile photo deletes the old reference, so keep it atomic.
    let mut tx = state.db.begin().await?;
    let image = create_image(
        &mut *tx,
        &CreateMemberImage {
            member_id,
            kind: input.kind,
            image_url: input.image_url,
            description: input.description,
        },
    )
    .await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(image)))
}

/// PATCH /images/{id}
pub async fn update(
    State(state): State<AppState>,
    _admin: AdminAuth,
    AppPath(id): AppPath<Uuid>,
    AppJson(input): AppJson<UpdateImageInput>,
) -> Result<Json<MemberImageRow>, AppError> {
    MemberImageRepo::new(state.db.clone())
        .update_description(id, input.description.as_deref())
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Image not found"))
}

/// DELETE /images/{id}
pub async fn delete(
    State(state): State<AppState>,
    _admin: AdminAuth,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    if !MemberImageRepo::new(state.db.clone()).delete(id).await? {
        return Err(AppError::not_found("Image not found"));
    }
    Ok(Json(MessageResponse::new("Image deleted successfully")))
}
