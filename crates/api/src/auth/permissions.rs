use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::auth::{Claims, Role};
use crate::error::AppError;

/// Authenticated admin, taken from the claims the JWT middleware attached.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    pub id: Uuid,
    pub claims: Claims,
}

/// Authenticated member.
#[derive(Debug, Clone)]
pub struct MemberAuth {
    pub id: Uuid,
    pub claims: Claims,
}

impl<S: Send + Sync> FromRequestParts<S> for AdminAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = require_role(parts, Role::Admin)?;
        Ok(Self {
            id: claims.subject_id()?,
            claims,
        })
    }
}

impl<S: Send + Sync> FromRequestParts<S> for MemberAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = require_role(parts, Role::Member)?;
        Ok(Self {
            id: claims.subject_id()?,
            claims,
        })
    }
}

fn require_role(parts: &Parts, required: Role) -> Result<Claims, AppError> {
    let claims = parts
        .extensions
        .get::<Claims>()
        .cloned()
        .ok_or_else(|| {
            AppError::Unauthorized("You must be logged in to perform this action".into())
        })?;

    if claims.role != required {
        return Err(AppError::Forbidden(match required {
            Role::Admin => "Access denied: administrator privileges required".to_string(),
            Role::Member => "Access denied: member account required".to_string(),
        }));
    }

    Ok(claims)
}
