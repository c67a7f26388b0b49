use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::errors::ServiceError;
use crate::events::Event;
use crate::gateway::verify_webhook_signature;
use crate::AppState;

const SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
}

/// Webhook-path reconciliation. The raw body is verified against the
/// signature header before any parsing. Once a signed event is accepted,
/// the response is 200 even if recording fails; the gateway must not
/// redeliver an event we cannot ever use.
#[utoipa::path(
    post,
    path = "/webhook",
    request_body(content = String, content_type = "application/json", description = "Raw signed event payload"),
    responses(
        (status = 200, description = "Event acknowledged", body = WebhookAck),
        (status = 400, description = "Missing or invalid signature, or malformed payload", body = crate::errors::ErrorResponse),
        (status = 500, description = "Webhook secret not configured", body = crate::errors::ErrorResponse)
    ),
    tag = "webhooks"
)]
pub async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ServiceError> {
    let secret = state
        .config
        .stripe_webhook_secret
        .as_deref()
        .ok_or_else(|| {
            error!("webhook received but no signing secret is configured");
            ServiceError::InternalError("webhook secret not configured".to_string())
        })?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ServiceError::InvalidSignature("missing signature header".to_string()))?;

    if let Err(err) = verify_webhook_signature(
        &body,
        signature,
        secret,
        state.config.stripe_webhook_tolerance_secs as i64,
        Utc::now().timestamp(),
    ) {
        state
            .event_sender
            .send(Event::WebhookRejected {
                reason: err.to_string(),
            })
            .await;
        return Err(err);
    }

    match state.entitlements.process_webhook_event(&body).await {
        Ok(()) => {}
        // A signed but unparseable body is the sender's fault.
        Err(err @ ServiceError::ValidationError(_)) => return Err(err),
        // Recording failures must not trigger redelivery; acknowledge and
        // leave reconciliation to the confirm path or manual replay.
        Err(err) => {
            warn!(error = %err, "verified webhook event could not be recorded");
        }
    }

    Ok(Json(WebhookAck { received: true }))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/webhook", post(handle_webhook))
}
