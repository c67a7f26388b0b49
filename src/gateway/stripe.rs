//! Stripe Checkout adapter speaking the form-encoded REST API directly.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::ServiceError;

use super::{
    CreateSessionRequest, GatewaySession, PaymentGateway, PaymentStatus, SessionMetadata,
};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeGateway {
    pub fn new(secret_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key,
            api_base: STRIPE_API_BASE.to_string(),
        }
    }

    /// Point the adapter at a mock server in tests.
    pub fn with_api_base(secret_key: String, api_base: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key,
            api_base,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StripeSession {
    id: String,
    url: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    metadata: Option<StripeMetadata>,
    #[serde(default)]
    amount_total: Option<i64>,
    #[serde(default)]
    customer_details: Option<StripeCustomerDetails>,
}

#[derive(Debug, Deserialize)]
struct StripeCustomerDetails {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeMetadata {
    #[serde(rename = "courseId")]
    course_id: Option<String>,
    #[serde(rename = "userEmail")]
    user_email: Option<String>,
    #[serde(rename = "courseTitle")]
    course_title: Option<String>,
    #[serde(rename = "basePriceMinor")]
    base_price_minor: Option<String>,
    #[serde(rename = "finalPriceMinor")]
    final_price_minor: Option<String>,
    #[serde(rename = "discountApplied")]
    discount_applied: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

impl StripeSession {
    fn into_gateway_session(self) -> GatewaySession {
        let metadata = self.metadata.and_then(|m| {
            let course_id = m.course_id.as_deref().and_then(|s| Uuid::parse_str(s).ok())?;
            let user_email = m.user_email?;
            Some(SessionMetadata {
                course_id,
                user_email,
                course_title: m.course_title,
                base_price_minor: m.base_price_minor.and_then(|s| s.parse().ok()),
                final_price_minor: m.final_price_minor.and_then(|s| s.parse().ok()),
                discount_applied: m.discount_applied.map(|s| s == "true"),
            })
        });
        GatewaySession {
            id: self.id,
            url: self.url,
            payment_status: self
                .payment_status
                .as_deref()
                .map(PaymentStatus::from_wire)
                .unwrap_or(PaymentStatus::Unpaid),
            metadata,
            amount_total_minor: self.amount_total,
            customer_email: self.customer_details.and_then(|d| d.email),
        }
    }
}

async fn parse_stripe_response(response: reqwest::Response) -> Result<StripeSession, ServiceError> {
    let status = response.status();
    if !status.is_success() {
        let message = response
            .json::<StripeErrorBody>()
            .await
            .ok()
            .and_then(|b| b.error.message)
            .unwrap_or_else(|| format!("HTTP {}", status));
        return Err(ServiceError::GatewayError(message));
    }
    response
        .json::<StripeSession>()
        .await
        .map_err(|e| ServiceError::GatewayError(format!("malformed response: {}", e)))
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self, request), fields(course_id = %request.metadata.course_id))]
    async fn create_checkout_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<GatewaySession, ServiceError> {
        let mut form: Vec<(&str, String)> = vec![
            ("mode", "payment".to_string()),
            ("payment_method_types[0]", "card".to_string()),
            // Stripe wants lowercase ISO 4217 codes.
            (
                "line_items[0][price_data][currency]",
                request.currency.to_lowercase(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                request.course_title,
            ),
            (
                "line_items[0][price_data][unit_amount]",
                request.amount_minor.to_string(),
            ),
            ("line_items[0][quantity]", "1".to_string()),
            ("customer_email", request.customer_email),
            ("success_url", request.success_url),
            ("cancel_url", request.cancel_url),
            (
                "metadata[courseId]",
                request.metadata.course_id.to_string(),
            ),
            ("metadata[userEmail]", request.metadata.user_email),
        ];
        if let Some(title) = request.metadata.course_title {
            form.push(("metadata[courseTitle]", title));
        }
        if let Some(base) = request.metadata.base_price_minor {
            form.push(("metadata[basePriceMinor]", base.to_string()));
        }
        if let Some(final_price) = request.metadata.final_price_minor {
            form.push(("metadata[finalPriceMinor]", final_price.to_string()));
        }
        if let Some(discounted) = request.metadata.discount_applied {
            form.push(("metadata[discountApplied]", discounted.to_string()));
        }

        let response = self
            .client
            .post(format!("{}/checkout/sessions", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&form)
            .send()
            .await
            .map_err(|e| ServiceError::GatewayError(format!("request failed: {}", e)))?;

        parse_stripe_response(response)
            .await
            .map(StripeSession::into_gateway_session)
    }

    #[instrument(skip(self))]
    async fn retrieve_session(&self, session_id: &str) -> Result<GatewaySession, ServiceError> {
        let response = self
            .client
            .get(format!("{}/checkout/sessions/{}", self.api_base, session_id))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .map_err(|e| ServiceError::GatewayError(format!("request failed: {}", e)))?;

        parse_stripe_response(response)
            .await
            .map(StripeSession::into_gateway_session)
    }
}
