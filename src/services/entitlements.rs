use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    SqlErr,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::email::{EmailSender, OutboundEmail};
use crate::entities::{purchase, Purchase};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender, PurchaseSource};
use crate::gateway::{PaymentGateway, PaymentStatus, SessionMetadata};

/// Result of the redirect-path confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The session is paid and a purchase row exists (written now or
    /// earlier by either path).
    Confirmed { purchase_id: Uuid },
    /// The session exists but has not been paid. Not an error.
    NotPaid,
}

#[derive(Debug, Deserialize)]
struct WebhookEnvelope {
    #[serde(rename = "type")]
    event_type: String,
    data: WebhookData,
}

#[derive(Debug, Deserialize)]
struct WebhookData {
    object: WebhookSession,
}

#[derive(Debug, Deserialize)]
struct WebhookSession {
    id: String,
    #[serde(default)]
    metadata: Option<WebhookMetadata>,
    #[serde(default)]
    amount_total: Option<i64>,
    #[serde(default)]
    customer_details: Option<WebhookCustomerDetails>,
}

#[derive(Debug, Deserialize)]
struct WebhookCustomerDetails {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WebhookMetadata {
    #[serde(rename = "courseId")]
    course_id: Option<String>,
    #[serde(rename = "userEmail")]
    user_email: Option<String>,
    #[serde(rename = "finalPriceMinor")]
    final_price_minor: Option<String>,
}

/// Records paid sessions as purchase rows, from either the buyer's redirect
/// (confirm) or the gateway's webhook. Both paths converge on the same
/// insert; the unique index on `session_id` makes whichever arrives second
/// a no-op.
#[derive(Clone)]
pub struct EntitlementService {
    db: DbPool,
    gateway: Arc<dyn PaymentGateway>,
    mailer: Arc<dyn EmailSender>,
    event_sender: EventSender,
}

impl EntitlementService {
    pub fn new(
        db: DbPool,
        gateway: Arc<dyn PaymentGateway>,
        mailer: Arc<dyn EmailSender>,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db,
            gateway,
            mailer,
            event_sender,
        }
    }

    /// Inserts a paid purchase keyed by `session_id`. A duplicate insert is
    /// suppressed and resolves to the already-recorded row.
    #[instrument(skip(self), fields(session_id = %session_id, source = %source))]
    pub async fn record_paid_purchase(
        &self,
        metadata: &SessionMetadata,
        session_id: &str,
        amount_minor: Option<i64>,
        source: PurchaseSource,
    ) -> Result<Uuid, ServiceError> {
        let purchase_id = Uuid::new_v4();
        let row = purchase::ActiveModel {
            id: Set(purchase_id),
            course_id: Set(metadata.course_id),
            user_email: Set(metadata.user_email.clone()),
            status: Set(purchase::PurchaseStatus::Paid),
            session_id: Set(session_id.to_owned()),
            amount_minor: Set(amount_minor),
            created_at: Set(Utc::now()),
        };

        match row.insert(&self.db).await {
            Ok(model) => {
                self.event_sender
                    .send(Event::PurchaseRecorded {
                        purchase_id: model.id,
                        course_id: model.course_id,
                        user_email: model.user_email.clone(),
                        source,
                    })
                    .await;
                self.send_access_email(&model.user_email, metadata.course_id)
                    .await;
                Ok(model.id)
            }
            Err(err) => {
                if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    self.event_sender
                        .send(Event::DuplicatePurchaseSuppressed {
                            session_id: session_id.to_owned(),
                            source,
                        })
                        .await;
                    let existing = Purchase::find()
                        .filter(purchase::Column::SessionId.eq(session_id))
                        .one(&self.db)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::InternalError(
                                "duplicate purchase row disappeared".to_string(),
                            )
                        })?;
                    Ok(existing.id)
                } else {
                    Err(err.into())
                }
            }
        }
    }

    /// Redirect-path reconciliation: re-fetch the session from the gateway
    /// and, if paid, record the purchase.
    #[instrument(skip(self))]
    pub async fn confirm_session(&self, session_id: &str) -> Result<ConfirmOutcome, ServiceError> {
        let session = self.gateway.retrieve_session(session_id).await?;

        // A session we cannot reconcile is an error regardless of whether it
        // was paid.
        let mut metadata = session.metadata.ok_or(ServiceError::MissingMetadata)?;

        if session.payment_status != PaymentStatus::Paid {
            return Ok(ConfirmOutcome::NotPaid);
        }

        // The email the gateway verified during payment beats the snapshot.
        if let Some(email) = session.customer_email {
            metadata.user_email = email;
        }
        let purchase_id = self
            .record_paid_purchase(
                &metadata,
                &session.id,
                session.amount_total_minor,
                PurchaseSource::Confirm,
            )
            .await?;
        Ok(ConfirmOutcome::Confirmed { purchase_id })
    }

    /// Webhook-path reconciliation over an already-verified event body.
    /// Only `checkout.session.completed` is acted on; everything else is
    /// acknowledged and ignored.
    #[instrument(skip(self, payload))]
    pub async fn process_webhook_event(&self, payload: &[u8]) -> Result<(), ServiceError> {
        let envelope: WebhookEnvelope = serde_json::from_slice(payload)
            .map_err(|e| ServiceError::ValidationError(format!("malformed event: {}", e)))?;

        if envelope.event_type != "checkout.session.completed" {
            info!(event_type = %envelope.event_type, "ignoring webhook event");
            return Ok(());
        }

        let session = envelope.data.object;
        let mut metadata = session
            .metadata
            .and_then(|m| {
                let course_id = m.course_id.as_deref().and_then(|s| Uuid::parse_str(s).ok())?;
                let user_email = m.user_email?;
                let mut parsed = SessionMetadata::identity(course_id, user_email);
                parsed.final_price_minor = m.final_price_minor.and_then(|s| s.parse().ok());
                Some(parsed)
            })
            .ok_or(ServiceError::MissingMetadata)?;

        if let Some(email) = session.customer_details.and_then(|d| d.email) {
            metadata.user_email = email;
        }

        // The gateway's own total wins; the metadata snapshot backs it up.
        let amount = session.amount_total.or(metadata.final_price_minor);
        self.record_paid_purchase(&metadata, &session.id, amount, PurchaseSource::Webhook)
            .await?;
        Ok(())
    }

    /// Access check: does a paid purchase exist for this buyer and course.
    pub async fn has_access(&self, user_email: &str, course_id: Uuid) -> Result<bool, ServiceError> {
        let count = Purchase::find()
            .filter(purchase::Column::UserEmail.eq(user_email))
            .filter(purchase::Column::CourseId.eq(course_id))
            .filter(purchase::Column::Status.eq(purchase::PurchaseStatus::Paid))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Best-effort; a delivery failure is logged, never surfaced.
    async fn send_access_email(&self, user_email: &str, course_id: Uuid) {
        let email = OutboundEmail {
            to: user_email.to_owned(),
            subject: "Your course is ready".to_string(),
            html_body: format!(
                "<p>Thanks for your purchase! Your course is now unlocked.</p>\
                 <p>Course reference: {}</p>",
                course_id
            ),
        };
        if let Err(e) = self.mailer.send(email).await {
            warn!(error = %e, "access email delivery failed");
        }
    }
}
