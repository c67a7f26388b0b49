use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait, QueryOrder};
use serde::Deserialize;
use tracing::{instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::email::{EmailSender, OutboundEmail};
use crate::entities::{contact_message, ContactMessage};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ContactRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub subject: Option<String>,
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReplyRequest {
    #[validate(length(min = 1, message = "Reply text is required"))]
    pub reply: String,
}

/// Contact-form intake and admin replies. Email notifications on both legs
/// are best-effort; the stored row is the source of truth.
#[derive(Clone)]
pub struct MessageService {
    db: DbPool,
    mailer: Arc<dyn EmailSender>,
    event_sender: EventSender,
    support_inbox: Option<String>,
}

impl MessageService {
    pub fn new(
        db: DbPool,
        mailer: Arc<dyn EmailSender>,
        event_sender: EventSender,
        support_inbox: Option<String>,
    ) -> Self {
        Self {
            db,
            mailer,
            event_sender,
            support_inbox,
        }
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn submit(
        &self,
        request: ContactRequest,
    ) -> Result<contact_message::Model, ServiceError> {
        request.validate()?;

        let message = contact_message::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.clone()),
            email: Set(request.email.clone()),
            subject: Set(request.subject.clone()),
            message: Set(request.message.clone()),
            is_read: Set(false),
            reply_text: Set(None),
            replied_by: Set(None),
            replied_at: Set(None),
            created_at: Set(Utc::now()),
        };
        let message = message.insert(&self.db).await?;

        self.event_sender
            .send(Event::ContactMessageReceived {
                message_id: message.id,
            })
            .await;

        if let Some(inbox) = &self.support_inbox {
            let notification = OutboundEmail {
                to: inbox.clone(),
                subject: format!(
                    "New contact message: {}",
                    request.subject.as_deref().unwrap_or("(no subject)")
                ),
                html_body: format!(
                    "<p><strong>{}</strong> ({})</p><p>{}</p>",
                    request.name, request.email, request.message
                ),
            };
            if let Err(e) = self.mailer.send(notification).await {
                warn!(error = %e, "support notification delivery failed");
            }
        }

        Ok(message)
    }

    pub async fn list(&self) -> Result<Vec<contact_message::Model>, ServiceError> {
        let messages = ContactMessage::find()
            .order_by_desc(contact_message::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(messages)
    }

    #[instrument(skip(self), fields(message_id = %id))]
    pub async fn mark_read(&self, id: Uuid) -> Result<contact_message::Model, ServiceError> {
        let existing = ContactMessage::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Message not found".to_string()))?;

        let mut active: contact_message::ActiveModel = existing.into();
        active.is_read = Set(true);
        Ok(active.update(&self.db).await?)
    }

    #[instrument(skip(self, request), fields(message_id = %id, admin = %admin_email))]
    pub async fn reply(
        &self,
        id: Uuid,
        admin_email: &str,
        request: ReplyRequest,
    ) -> Result<contact_message::Model, ServiceError> {
        request.validate()?;

        let existing = ContactMessage::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Message not found".to_string()))?;

        let recipient = existing.email.clone();
        let original = existing.message.clone();

        let mut active: contact_message::ActiveModel = existing.into();
        active.is_read = Set(true);
        active.reply_text = Set(Some(request.reply.clone()));
        active.replied_by = Set(Some(admin_email.to_owned()));
        active.replied_at = Set(Some(Utc::now()));
        let updated = active.update(&self.db).await?;

        let reply_email = OutboundEmail {
            to: recipient,
            subject: "Re: your message to CourseHub".to_string(),
            html_body: format!(
                "<p>{}</p><hr/><p><em>Your original message:</em></p><p>{}</p>",
                request.reply, original
            ),
        };
        if let Err(e) = self.mailer.send(reply_email).await {
            warn!(error = %e, "reply email delivery failed");
        }

        Ok(updated)
    }
}
