use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{FromRef, FromRequest, Request},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use hmac::{Hmac, Mac};
use pr_sandbox_core::{config::Config, error_response};
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;

pub const EVENT_HEADER: &str = "x-github-event";
pub const DELIVERY_HEADER: &str = "x-github-delivery";
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

const SIGNATURE_PREFIX: &str = "sha256=";

/// GitHub caps webhook payloads at 25 MB.
pub const MAX_PAYLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("Missing required headers or body")]
    MissingFields,
    #[error("Payload too large")]
    PayloadTooLarge,
    #[error("Failed to read request body")]
    UnreadableBody,
    #[error("Invalid signature")]
    InvalidSignature(#[source] SignatureError),
    #[error("Invalid JSON payload")]
    InvalidJson(#[source] serde_json::Error),
}

impl WebhookError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingFields | Self::UnreadableBody | Self::InvalidJson(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidSignature(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response { error_response(self.status(), &self.to_string()) }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("webhook secret is not configured")]
    NoSecret,
    #[error("unsupported signature algorithm in {0:?}")]
    UnsupportedAlgorithm(String),
    #[error("signature is not valid hex")]
    Malformed,
    #[error("signature mismatch")]
    Mismatch,
}

/// Compute the `X-Hub-Signature-256` header value for `body`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(body);
    format!("{SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
}

/// Check `signature` (`sha256=<hex>`) against the HMAC-SHA256 of the raw `body`.
///
/// The comparison is constant time. Any other algorithm prefix is rejected rather than
/// compared, and an empty secret rejects everything.
pub fn verify_signature(secret: &str, signature: &str, body: &[u8]) -> Result<(), SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::NoSecret);
    }
    let digest = signature.strip_prefix(SIGNATURE_PREFIX).ok_or_else(|| {
        let algorithm = signature.split_once('=').map_or("", |(algorithm, _)| algorithm);
        SignatureError::UnsupportedAlgorithm(algorithm.to_string())
    })?;
    let expected = hex::decode(digest).map_err(|_| SignatureError::Malformed)?;
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(body);
    mac.verify_slice(&expected).map_err(|_| SignatureError::Mismatch)
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).filter(|v| !v.is_empty())
}

/// A webhook delivery whose signature has been checked and whose body parsed as JSON.
#[derive(Debug, Clone)]
#[must_use]
pub struct WebhookDelivery {
    pub event: String,
    pub delivery_id: Option<String>,
    pub payload: Value,
}

impl WebhookDelivery {
    /// Validate a raw delivery: required fields, then the signature over the exact bytes
    /// received, then JSON parsing. Each step gates the next.
    pub fn verify(headers: &HeaderMap, body: &[u8], secret: &str) -> Result<Self, WebhookError> {
        let event = header(headers, EVENT_HEADER);
        let signature = header(headers, SIGNATURE_HEADER);
        // An empty delivery id is still echoed back as sent.
        let delivery_id =
            headers.get(DELIVERY_HEADER).and_then(|v| v.to_str().ok()).map(str::to_string);
        let (Some(event), Some(signature)) = (event, signature) else {
            tracing::debug!(?delivery_id, "Webhook delivery is missing headers");
            return Err(WebhookError::MissingFields);
        };
        if body.is_empty() {
            tracing::debug!(?delivery_id, "Webhook delivery has an empty body");
            return Err(WebhookError::MissingFields);
        }

        if let Err(e) = verify_signature(secret, signature, body) {
            tracing::warn!(event, ?delivery_id, "Rejected webhook delivery: {e}");
            return Err(WebhookError::InvalidSignature(e));
        }

        let payload = serde_json::from_slice(body).map_err(|e| {
            tracing::debug!(event, ?delivery_id, "Webhook payload is not JSON: {e}");
            WebhookError::InvalidJson(e)
        })?;
        Ok(Self { event: event.to_string(), delivery_id, payload })
    }
}

impl<S> FromRequest<S> for WebhookDelivery
where
    Arc<Config>: FromRef<S>,
    S: Send + Sync + Clone,
{
    type Rejection = WebhookError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let config = <Arc<Config>>::from_ref(state);
        let headers = req.headers().clone();
        let body = Bytes::from_request(req, state).await.map_err(|e| {
            tracing::debug!("Failed to read webhook body: {e}");
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                WebhookError::PayloadTooLarge
            } else {
                WebhookError::UnreadableBody
            }
        })?;
        Self::verify(&headers, &body, &config.github.webhook_secret)
    }
}
