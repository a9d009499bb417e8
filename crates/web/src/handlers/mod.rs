use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{get, post},
};
use pr_sandbox_core::AppError;
use pr_sandbox_github::webhook::MAX_PAYLOAD_BYTES;

use crate::AppState;

mod api;
mod webhook;

pub fn build_router() -> Router<AppState> {
    Router::new()
        .route("/", get(api::index))
        .route("/api/hello", get(api::hello))
        .route(
            "/api/webhooks",
            post(webhook::webhook).layer(DefaultBodyLimit::max(MAX_PAYLOAD_BYTES)),
        )
        .fallback(|| async { AppError::Status(StatusCode::NOT_FOUND) })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, Response},
    };
    use pr_sandbox_core::config::{Config, GitHubConfig};
    use pr_sandbox_github::webhook::{DELIVERY_HEADER, EVENT_HEADER, SIGNATURE_HEADER, sign};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    const SECRET: &str = "webhook-secret";
    const OPENED: &str = r#"{"action":"opened","pull_request":{"number":42,"title":"Fix bug","user":{"login":"alice"}}}"#;

    fn app(secret: &str) -> Router {
        let config = Config {
            github: GitHubConfig { webhook_secret: secret.to_string(), ..Default::default() },
            ..Default::default()
        };
        crate::app(AppState { config: Arc::new(config) })
    }

    fn delivery(
        event: Option<&str>,
        delivery_id: Option<&str>,
        signature: Option<&str>,
        body: &str,
    ) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/webhooks")
            .header("content-type", "application/json");
        if let Some(event) = event {
            builder = builder.header(EVENT_HEADER, event);
        }
        if let Some(delivery_id) = delivery_id {
            builder = builder.header(DELIVERY_HEADER, delivery_id);
        }
        if let Some(signature) = signature {
            builder = builder.header(SIGNATURE_HEADER, signature);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn signed(event: &str, delivery_id: &str, body: &str) -> Request<Body> {
        delivery(Some(event), Some(delivery_id), Some(&sign(SECRET, body.as_bytes())), body)
    }

    async fn body_json(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_index() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app(SECRET).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Hello Hono!");
    }

    #[tokio::test]
    async fn test_hello() {
        let request = Request::builder().uri("/api/hello").body(Body::empty()).unwrap();
        let response = app(SECRET).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "ok": true, "message": "Hello Hono!" }));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let request = Request::builder().uri("/api/nope").body(Body::empty()).unwrap();
        let response = app(SECRET).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({ "error": "Not found" }));
    }

    #[tokio::test]
    async fn test_pull_request_opened() {
        let response = app(SECRET).oneshot(signed("pull_request", "d-42", OPENED)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "ok": true, "event": "pull_request", "deliveryId": "d-42" })
        );
    }

    #[tokio::test]
    async fn test_replay_is_acknowledged_twice() {
        let app = app(SECRET);
        for _ in 0..2 {
            let response =
                app.clone().oneshot(signed("pull_request", "d-replay", OPENED)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                body_json(response).await,
                json!({ "ok": true, "event": "pull_request", "deliveryId": "d-replay" })
            );
        }
    }

    #[tokio::test]
    async fn test_other_events_are_acknowledged() {
        let body = r#"{"zen":"Design for failure.","hook_id":1}"#;
        let response = app(SECRET).oneshot(signed("ping", "d-ping", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "ok": true, "event": "ping", "deliveryId": "d-ping" })
        );
    }

    #[tokio::test]
    async fn test_missing_delivery_id() {
        let signature = sign(SECRET, OPENED.as_bytes());
        let request = delivery(Some("pull_request"), None, Some(&signature), OPENED);
        let response = app(SECRET).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "ok": true, "event": "pull_request", "deliveryId": null })
        );
    }

    #[tokio::test]
    async fn test_empty_delivery_id_is_echoed() {
        let response = app(SECRET).oneshot(signed("pull_request", "", OPENED)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "ok": true, "event": "pull_request", "deliveryId": "" })
        );
    }

    fn pull_request_titled(title: &str) -> String {
        json!({
            "action": "opened",
            "pull_request": { "number": 7, "title": title, "user": { "login": "alice" } }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_large_payload_is_accepted() {
        // Above axum's 2 MB default, below GitHub's 25 MB cap.
        let body = pull_request_titled(&"x".repeat(3 * 1024 * 1024));
        let response = app(SECRET).oneshot(signed("pull_request", "d-big", &body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "ok": true, "event": "pull_request", "deliveryId": "d-big" })
        );
    }

    #[tokio::test]
    async fn test_oversized_payload() {
        let body = pull_request_titled(&"x".repeat(MAX_PAYLOAD_BYTES));
        let response = app(SECRET).oneshot(signed("pull_request", "d-huge", &body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body_json(response).await, json!({ "error": "Payload too large" }));
    }

    #[tokio::test]
    async fn test_wrong_method() {
        let request = Request::builder().uri("/api/webhooks").body(Body::empty()).unwrap();
        let response = app(SECRET).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_json(response).await, json!({ "error": "Method Not Allowed" }));
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let signature = sign(SECRET, OPENED.as_bytes());
        let requests = [
            delivery(None, Some("d1"), Some(&signature), OPENED),
            delivery(Some("pull_request"), Some("d1"), None, OPENED),
            delivery(Some("pull_request"), Some("d1"), Some(&signature), ""),
        ];
        for request in requests {
            let response = app(SECRET).oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                body_json(response).await,
                json!({ "error": "Missing required headers or body" })
            );
        }
    }

    #[tokio::test]
    async fn test_invalid_signature_takes_precedence() {
        let body = r#"{"action":"opened""#;
        let request =
            delivery(Some("pull_request"), Some("d1"), Some(&sign("wrong", body.as_bytes())), body);
        let response = app(SECRET).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await, json!({ "error": "Invalid signature" }));

        let request = delivery(
            Some("pull_request"),
            Some("d1"),
            Some(&sign("wrong", OPENED.as_bytes())),
            OPENED,
        );
        let response = app(SECRET).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let body = r#"{"action":"opened""#;
        let response = app(SECRET).oneshot(signed("pull_request", "d1", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({ "error": "Invalid JSON payload" }));
    }

    #[tokio::test]
    async fn test_empty_secret_rejects_everything() {
        let signature = sign("", OPENED.as_bytes());
        let request = delivery(Some("pull_request"), Some("d1"), Some(&signature), OPENED);
        let response = app("").oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_sha1_signature_rejected() {
        let request = delivery(
            Some("pull_request"),
            Some("d1"),
            Some("sha1=0123456789abcdef0123456789abcdef01234567"),
            OPENED,
        );
        let response = app(SECRET).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await, json!({ "error": "Invalid signature" }));
    }
}
