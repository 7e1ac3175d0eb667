//! Request extractors whose rejections answer with the usual `{ message }`
//! body instead of axum's plain-text errors.

use axum::extract::{
    rejection::{JsonRejection, PathRejection, QueryRejection},
    FromRequest, FromRequestParts,
};

use crate::error::AppError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Request, StatusCode},
        routing::{get, post},
        Router,
    };
    use http_body_util::BodyExt;
    use infra::models::CheckInStatus;
    use serde::Deserialize;
    use tower::ServiceExt;
    use uuid::Uuid;

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Desk {
        member_id: String,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct History {
        member_id: Option<Uuid>,
        status: Option<CheckInStatus>,
    }

    fn router() -> Router {
        Router::new()
            .route(
                "/desk",
                post(|AppJson(body): AppJson<Desk>| async move { body.member_id }),
            )
            .route(
                "/history",
                get(|AppQuery(q): AppQuery<History>| async move {
                    format!("{:?} {:?}", q.member_id, q.status)
                }),
            )
            .route(
                "/members/{id}",
                get(|AppPath(id): AppPath<Uuid>| async move { id.to_string() }),
            )
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    fn json_post(body: &'static str) -> Request<Body> {
        Request::post("/desk")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn missing_member_id_is_a_json_bad_request() {
        let (status, body) = send(json_post("{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    #[tokio::test]
    async fn malformed_json_is_a_json_bad_request() {
        let (status, body) = send(json_post("{\"memberId\":")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn bad_history_filters_are_json_bad_requests() {
        for uri in ["/history?memberId=not-a-uuid", "/history?status=MAYBE"] {
            let request = Request::get(uri).body(Body::empty()).unwrap();
            let (status, body) = send(request).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(body["message"].is_string(), "{uri}");
        }
    }

    #[tokio::test]
    async fn non_uuid_path_is_a_json_bad_request() {
        let request = Request::get("/members/42").body(Body::empty()).unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn valid_requests_pass_through() {
        let request = Request::get("/history?status=ALLOWED")
            .body(Body::empty())
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
