use axum::Json;
use pr_sandbox_github::{
    WebhookDelivery,
    events::{PULL_REQUEST_EVENT, PullRequestEvent},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    pub ok: bool,
    pub event: String,
    pub delivery_id: Option<String>,
}

/// Log the delivery and, for pull requests, the lifecycle transition it describes.
/// Every verified delivery is acknowledged; nothing is deduplicated.
pub async fn webhook(
    WebhookDelivery { event, delivery_id, payload }: WebhookDelivery,
) -> Json<WebhookAck> {
    let delivery = delivery_id.as_deref().unwrap_or("[unknown]");
    tracing::info!("Received webhook event {event} (delivery {delivery})");

    if event == PULL_REQUEST_EVENT {
        let transition = PullRequestEvent::from_payload(&payload).transition();
        tracing::info!(delivery, "{transition}");
    }

    Json(WebhookAck { ok: true, event, delivery_id })
}
