use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::auth::Claims;
use crate::error::AppError;
use crate::state::AppState;

/// Validates a bearer token when one is present and stores its claims in the
/// request extensions for the `AdminAuth` / `MemberAuth` extractors. Requests
/// without a token pass through; protected handlers reject them.
pub async fn jwt_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(auth_header) = request.headers().get(AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                let claims = state.jwt_service().verify_token(token)?;
                request.extensions_mut().insert::<Claims>(claims);
            }
        }
    }

    Ok(next.run(request).await)
}
