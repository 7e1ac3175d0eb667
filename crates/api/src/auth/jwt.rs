use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthConfig;
use crate::error::AppError;

/// Who a token was issued to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Admin or member UUID
    pub email: String,
    pub role: Role,
    pub iat: i64, // Issued at
    pub exp: i64, // Expiration
}

impl Claims {
    pub fn new(subject: Uuid, email: String, role: Role, expiration_minutes: u64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::minutes(expiration_minutes as i64);

        Self {
            sub: subject.to_string(),
            email,
            role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        }
    }

    pub fn subject_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))
    }
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_minutes: u64,
}

impl JwtService {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            expiration_minutes: config.access_token_expiration_minutes,
        }
    }

    pub fn create_token(
        &self,
        subject: Uuid,
        email: String,
        role: Role,
    ) -> Result<String, AppError> {
        let claims = Claims::new(subject, email, role, self.expiration_minutes);
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new(&AuthConfig {
            jwt_secret: "test-secret".to_string(),
            access_token_expiration_minutes: 60,
            hash_rounds: 4,
        })
    }

    #[test]
    fn issued_token_round_trips_role_and_subject() {
        let jwt = service();
        let id = Uuid::new_v4();
        let token = jwt
            .create_token(id, "desk@gym.test".to_string(), Role::Admin)
            .unwrap();

        let claims = jwt.verify_token(&token).unwrap();
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.subject_id().unwrap(), id);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let jwt = service();
        let token = jwt
            .create_token(Uuid::new_v4(), "m@gym.test".to_string(), Role::Member)
            .unwrap();

        let err = jwt.verify_token(&format!("{token}x")).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
