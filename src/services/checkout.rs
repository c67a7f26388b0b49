use std::sync::Arc;

use sea_orm::EntityTrait;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::Course;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::gateway::{CreateSessionRequest, PaymentGateway, SessionMetadata};

use super::pricing::PricingService;

/// Outcome of opening a hosted checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub session_id: String,
    pub url: String,
    pub amount_minor: i64,
}

/// Prices a course at request time and opens a gateway session carrying the
/// buyer and course identity as metadata. The charged amount is locked into
/// the session; later price or quota changes do not affect it.
#[derive(Clone)]
pub struct CheckoutService {
    db: DbPool,
    pricing: PricingService,
    gateway: Arc<dyn PaymentGateway>,
    event_sender: EventSender,
    public_base_url: String,
    currency: String,
}

impl CheckoutService {
    pub fn new(
        db: DbPool,
        pricing: PricingService,
        gateway: Arc<dyn PaymentGateway>,
        event_sender: EventSender,
        public_base_url: String,
        currency: String,
    ) -> Self {
        Self {
            db,
            pricing,
            gateway,
            event_sender,
            public_base_url,
            currency,
        }
    }

    #[instrument(skip(self), fields(course_id = %course_id, user_email = %user_email))]
    pub async fn create_session(
        &self,
        course_id: Uuid,
        user_email: &str,
    ) -> Result<CheckoutSession, ServiceError> {
        let course = Course::find_by_id(course_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Course not found".to_string()))?;

        let quote = self.pricing.quote_course(&course).await?;
        let amount_minor = quote.effective_minor();

        let success_url = format!(
            "{}/courses/allcourses?paid=1&course_id={}&session_id={{CHECKOUT_SESSION_ID}}",
            self.public_base_url, course.id
        );
        let cancel_url = format!("{}/courses/allcourses?canceled=1", self.public_base_url);

        let session = self
            .gateway
            .create_checkout_session(CreateSessionRequest {
                course_title: course.title.clone(),
                amount_minor,
                currency: self.currency.clone(),
                customer_email: user_email.to_owned(),
                success_url,
                cancel_url,
                metadata: SessionMetadata {
                    course_id: course.id,
                    user_email: user_email.to_owned(),
                    course_title: Some(course.title.clone()),
                    base_price_minor: Some(quote.base_minor),
                    final_price_minor: Some(amount_minor),
                    discount_applied: Some(quote.is_discount_active),
                },
            })
            .await?;

        let url = session
            .url
            .ok_or_else(|| ServiceError::GatewayError("session has no redirect URL".to_string()))?;

        info!(session_id = %session.id, amount_minor, "checkout session opened");
        self.event_sender
            .send(Event::CheckoutSessionCreated {
                session_id: session.id.clone(),
                course_id: course.id,
                user_email: user_email.to_owned(),
                amount_minor,
            })
            .await;

        Ok(CheckoutSession {
            session_id: session.id,
            url,
            amount_minor,
        })
    }
}
