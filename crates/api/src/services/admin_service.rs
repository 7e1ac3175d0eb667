use infra::{
    models::AdminRow,
    repos::{AdminRepo, CreateAdmin, UpdateAdminProfile},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{JwtService, PasswordService, Role};
use crate::config::DefaultAdmin;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct AdminLoginInput {
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLoginResponse {
    pub access_token: String,
    pub admin: AdminRow,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAdminProfileInput {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub phone: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAdminPasswordInput {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 6, message = "New password must be at least 6 characters long"))]
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub struct AdminService {
    admins: AdminRepo,
    passwords: PasswordService,
    jwt: JwtService,
}

impl AdminService {
    pub fn new(state: &AppState) -> Self {
        Self {
            admins: AdminRepo::new(state.db.clone()),
            passwords: state.password_service(),
            jwt: state.jwt_service().clone(),
        }
    }

    pub async fn login(&self, input: AdminLoginInput) -> Result<AdminLoginResponse, AppError> {
        input.validate()?;

        let admin = self
            .admins
            .get_by_email(input.email.trim())
            .await?
            .ok_or_else(|| AppError::not_found("Admin not found"))?;

        if !admin.is_active() {
            return Err(AppError::Unauthorized(
                "Admin account is not active".to_string(),
            ));
        }

        if !self
            .passwords
            .verify(&input.password, &admin.password_hash)
            .await?
        {
            return Err(AppError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        self.admins.touch_last_login(admin.id).await?;
        let access_token = self
            .jwt
            .create_token(admin.id, admin.email.clone(), Role::Admin)?;

        tracing::info!("Admin {} logged in", admin.email);
        Ok(AdminLoginResponse {
            access_token,
            admin,
        })
    }

    /// Tokens are stateless; the client drops its copy.
    pub fn logout(&self) -> MessageResponse {
        MessageResponse::new("Logged out successfully")
    }

    pub async fn profile(&self, id: Uuid) -> Result<AdminRow, AppError> {
        self.admins
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Admin not found"))
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        input: UpdateAdminProfileInput,
    ) -> Result<AdminRow, AppError> {
        input.validate()?;
        self.profile(id).await?;

        self.admins
            .update_profile(
                id,
                &UpdateAdminProfile {
                    name: input.name,
                    phone: input.phone,
                    image: input.image,
                },
            )
            .await?
            .ok_or_else(|| AppError::bad_request("Failed to update admin profile"))
    }

    pub async fn update_password(
        &self,
        id: Uuid,
        input: UpdateAdminPasswordInput,
    ) -> Result<MessageResponse, AppError> {
        input.validate()?;
        let admin = self.profile(id).await?;

        if !self
            .passwords
            .verify(&input.current_password, &admin.password_hash)
            .await?
        {
            return Err(AppError::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }

        let hash = self.passwords.hash(&input.new_password).await?;
        self.admins
            .update_password(id, &hash)
            .await?
            .ok_or_else(|| AppError::bad_request("Failed to update password"))?;

        tracing::info!("Admin {} changed their password", admin.email);
        Ok(MessageResponse::new("Password updated successfully"))
    }

    /// Create the configured bootstrap admin unless that email already exists.
    pub async fn ensure_default_admin(&self, admin: &DefaultAdmin) -> Result<(), AppError> {
        if self.admins.get_by_email(&admin.email).await?.is_some() {
            tracing::debug!("Default admin {} already present", admin.email);
            return Ok(());
        }

        let password_hash = self.passwords.hash(&admin.password).await?;
        self.admins
            .create(&CreateAdmin {
                name: admin.name.clone(),
                email: admin.email.trim().to_lowercase(),
                password_hash,
            })
            .await?;
        tracing::info!("Created default admin {}", admin.email);
        Ok(())
    }
}
