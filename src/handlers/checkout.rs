use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::ServiceError;
use crate::services::entitlements::ConfirmOutcome;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub course_id: Uuid,
    /// Display title from the client. Must be present and non-empty; the
    /// stored course title is what actually goes on the session.
    pub title: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckoutResponse {
    /// Gateway-hosted payment page to redirect the buyer to.
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConfirmResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Open a hosted checkout session for the signed-in buyer.
#[utoipa::path(
    post,
    path = "/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Session created", body = CheckoutResponse),
        (status = 400, description = "Missing required fields", body = crate::errors::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::errors::ErrorResponse),
        (status = 404, description = "Course not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "checkout"
)]
pub async fn create_checkout(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ServiceError> {
    if request.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
        return Err(ServiceError::ValidationError(
            "course_id and title are required".to_string(),
        ));
    }
    let session = state
        .checkout
        .create_session(request.course_id, &claims.email)
        .await?;
    Ok(Json(CheckoutResponse { url: session.url }))
}

/// Redirect-path reconciliation: called by the success page with the
/// session id the gateway substituted into the return URL.
#[utoipa::path(
    get,
    path = "/confirm",
    params(("session_id" = String, Query, description = "Gateway checkout session id")),
    responses(
        (status = 200, description = "Paid and recorded, or not paid yet", body = ConfirmResponse),
        (status = 400, description = "Session lacks reconciliation metadata", body = crate::errors::ErrorResponse)
    ),
    tag = "checkout"
)]
pub async fn confirm_checkout(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<ConfirmResponse>, ServiceError> {
    match state.entitlements.confirm_session(&query.session_id).await? {
        ConfirmOutcome::Confirmed { purchase_id } => Ok(Json(ConfirmResponse {
            ok: true,
            id: Some(purchase_id),
            reason: None,
        })),
        ConfirmOutcome::NotPaid => Ok(Json(ConfirmResponse {
            ok: false,
            id: None,
            reason: Some("not_paid".to_string()),
        })),
    }
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/checkout", post(create_checkout))
        .route("/confirm", get(confirm_checkout))
}
