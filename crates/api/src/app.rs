use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{
        header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE},
        Method, StatusCode,
    },
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::GovernorLayer;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::error::AppError;
use crate::middleware::jwt::jwt_middleware;
use crate::routes::{admin, admin_members, checkins, images, members, packages, ws};
use crate::state::AppState;

pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    // Rate limiting: about 10 requests per minute per IP on credential endpoints
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(6)
        .burst_size(10)
        .finish()
        .ok_or_else(|| anyhow::anyhow!("invalid rate limiter configuration"))?;

    let rate_limited_routes = Router::new()
        .route("/admin/login", post(admin::login))
        .route("/members/login", post(members::login))
        .route("/members/register", post(members::register))
        .layer(GovernorLayer::new(Arc::new(governor_conf)));

    let origins: Vec<HeaderValue> = state
        .config()
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    Ok(Router::new()
        .route("/health", get(health))
        // Front desk kiosk
        .route("/checkin", post(checkins::check_in))
        .route("/checkin/checkout", post(checkins::check_out))
        .route("/checkins", get(checkins::list))
        // Admin account
        .route("/admin/logout", post(admin::logout))
        .route(
            "/admin/profile",
            get(admin::profile).patch(admin::update_profile),
        )
        .route("/admin/password", patch(admin::update_password))
        // Member self-service
        .route("/members/check-status", get(members::check_status))
        .route("/members/profile", get(members::profile))
        .route(
            "/members/cancel-subscription",
            patch(members::cancel_subscription),
        )
        // Member management
        .route("/members", get(admin_members::list))
        .route(
            "/members/{id}",
            get(admin_members::detail).delete(admin_members::delete),
        )
        .route("/members/{id}/approve", patch(admin_members::approve))
        .route("/members/{id}/reject", patch(admin_members::reject))
        .route("/members/{id}/restore", patch(admin_members::restore))
        .route("/members/{id}/checkins", get(checkins::list_for_member))
        .route("/members/{id}/images", get(images::list).post(images::add))
        .route("/images/{id}", patch(images::update).delete(images::delete))
        // Catalog
        .route("/membership-packages", get(packages::list))
        .route("/membership-packages/{id}", get(packages::detail))
        // Live member events
        .route("/ws/members", get(ws::member_events))
        .merge(rate_limited_routes)
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(state, jwt_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([CONTENT_TYPE, AUTHORIZATION])
                .allow_credentials(true),
        ))
}

/// Liveness plus a quick DB round trip.
async fn health(State(state): State<AppState>) -> Result<&'static str, AppError> {
    let _one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&state.db).await?;
    Ok("ok")
}
