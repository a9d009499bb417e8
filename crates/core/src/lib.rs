pub mod config;

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// JSON body of every error response: `{"error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
}

pub fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorBody { error: message })).into_response()
}

/// Give bodiless error responses from the HTTP stack itself (405 from method routing, 408
/// from the timeout layer) the same `{"error": ..}` shape as handler errors.
pub async fn json_error_bodies(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error())
        || response.headers().contains_key(header::CONTENT_TYPE)
    {
        return response;
    }
    let (mut parts, _) = response.into_parts();
    let (json_parts, body) =
        error_response(status, status.canonical_reason().unwrap_or("Error")).into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.extend(json_parts.headers);
    Response::from_parts(parts, body)
}

pub enum AppError {
    Status(StatusCode),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Status(status) if status == StatusCode::NOT_FOUND => {
                error_response(status, "Not found")
            }
            Self::Status(status) => {
                error_response(status, status.canonical_reason().unwrap_or("Error"))
            }
            Self::Internal(err) => {
                // Details stay in the log; callers only get a generic message.
                tracing::error!("{:?}", err);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self { Self::Internal(err.into()) }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::{Value, json};

    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_not_found() {
        let response = AppError::Status(StatusCode::NOT_FOUND).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({ "error": "Not found" }));
    }

    #[tokio::test]
    async fn test_other_status() {
        let response = AppError::Status(StatusCode::METHOD_NOT_ALLOWED).into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_json(response).await, json!({ "error": "Method Not Allowed" }));
    }

    #[tokio::test]
    async fn test_empty_error_gets_json_body() {
        let response = json_error_bodies(StatusCode::REQUEST_TIMEOUT.into_response()).await;
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(body_json(response).await, json!({ "error": "Request Timeout" }));

        let response = (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, "POST")]).into_response();
        let response = json_error_bodies(response).await;
        assert_eq!(response.headers()[header::ALLOW], "POST");
        assert_eq!(body_json(response).await, json!({ "error": "Method Not Allowed" }));
    }

    #[tokio::test]
    async fn test_other_responses_pass_through() {
        let response = json_error_bodies(error_response(StatusCode::BAD_REQUEST, "Nope")).await;
        assert_eq!(body_json(response).await, json!({ "error": "Nope" }));

        let response = json_error_bodies(StatusCode::NO_CONTENT.into_response()).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(!response.headers().contains_key(header::CONTENT_TYPE));
    }

    #[tokio::test]
    async fn test_internal_hides_detail() {
        let response = AppError::from(anyhow::anyhow!("token abc123 rejected")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await, json!({ "error": "Internal server error" }));
    }
}
