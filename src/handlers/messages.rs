use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::entities::contact_message;
use crate::errors::ServiceError;
use crate::services::messages::{ContactRequest, ReplyRequest};
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ContactMessageResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub is_read: bool,
    pub reply_text: Option<String>,
    pub replied_by: Option<String>,
    pub replied_at: Option<String>,
    pub created_at: String,
}

impl From<contact_message::Model> for ContactMessageResponse {
    fn from(model: contact_message::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            subject: model.subject,
            message: model.message,
            is_read: model.is_read,
            reply_text: model.reply_text,
            replied_by: model.replied_by,
            replied_at: model.replied_at.map(|t| t.to_rfc3339()),
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

#[utoipa::path(
    post,
    path = "/contact",
    request_body = ContactRequest,
    responses(
        (status = 201, description = "Message received", body = ContactMessageResponse),
        (status = 400, description = "Validation failure", body = crate::errors::ErrorResponse)
    ),
    tag = "messages"
)]
pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ContactRequest>,
) -> Result<(StatusCode, Json<ContactMessageResponse>), ServiceError> {
    let message = state.messages.submit(request).await?;
    Ok((StatusCode::CREATED, Json(message.into())))
}

#[utoipa::path(
    get,
    path = "/admin/messages",
    responses(
        (status = 200, description = "All contact messages, newest first", body = [ContactMessageResponse]),
        (status = 403, description = "Admin only", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "messages"
)]
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    AdminUser(_claims): AdminUser,
) -> Result<Json<Vec<ContactMessageResponse>>, ServiceError> {
    let messages = state.messages.list().await?;
    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/admin/messages/{id}/reply",
    params(("id" = Uuid, Path, description = "Message id")),
    request_body = ReplyRequest,
    responses(
        (status = 200, description = "Reply stored and sent", body = ContactMessageResponse),
        (status = 404, description = "Message not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "messages"
)]
pub async fn reply_to_message(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<ReplyRequest>,
) -> Result<Json<ContactMessageResponse>, ServiceError> {
    let message = state.messages.reply(id, &claims.email, request).await?;
    Ok(Json(message.into()))
}

#[utoipa::path(
    post,
    path = "/admin/messages/{id}/read",
    params(("id" = Uuid, Path, description = "Message id")),
    responses(
        (status = 200, description = "Message marked read", body = ContactMessageResponse),
        (status = 404, description = "Message not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "messages"
)]
pub async fn mark_message_read(
    State(state): State<Arc<AppState>>,
    AdminUser(_claims): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ContactMessageResponse>, ServiceError> {
    let message = state.messages.mark_read(id).await?;
    Ok(Json(message.into()))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/contact", post(submit_contact))
        .route("/admin/messages", get(list_messages))
        .route("/admin/messages/{id}/read", post(mark_message_read))
        .route("/admin/messages/{id}/reply", post(reply_to_message))
}
