pub mod stripe;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::errors::ServiceError;

pub use stripe::StripeGateway;

type HmacSha256 = Hmac<Sha256>;

/// Metadata pinned onto a checkout session at creation time. This snapshot
/// is the pricing source of truth for reconciliation; the course's current
/// price is never re-read when a purchase is recorded. Only the identity
/// fields are required on the way back in, so sessions created by older
/// deploys still reconcile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionMetadata {
    pub course_id: Uuid,
    pub user_email: String,
    pub course_title: Option<String>,
    pub base_price_minor: Option<i64>,
    pub final_price_minor: Option<i64>,
    pub discount_applied: Option<bool>,
}

impl SessionMetadata {
    pub fn identity(course_id: Uuid, user_email: impl Into<String>) -> Self {
        Self {
            course_id,
            user_email: user_email.into(),
            course_title: None,
            base_price_minor: None,
            final_price_minor: None,
            discount_applied: None,
        }
    }
}

/// Request to open a hosted checkout session.
#[derive(Debug, Clone)]
pub struct CreateSessionRequest {
    pub course_title: String,
    pub amount_minor: i64,
    pub currency: String,
    pub customer_email: String,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: SessionMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Paid,
    Unpaid,
    NoPaymentRequired,
}

impl PaymentStatus {
    pub fn from_wire(s: &str) -> Self {
        match s {
            "paid" => PaymentStatus::Paid,
            "no_payment_required" => PaymentStatus::NoPaymentRequired,
            _ => PaymentStatus::Unpaid,
        }
    }
}

/// A gateway session as seen by the reconciliation paths.
#[derive(Debug, Clone)]
pub struct GatewaySession {
    pub id: String,
    pub url: Option<String>,
    pub payment_status: PaymentStatus,
    pub metadata: Option<SessionMetadata>,
    pub amount_total_minor: Option<i64>,
    /// Buyer email as verified by the gateway during payment. Preferred over
    /// the metadata snapshot when recording the purchase.
    pub customer_email: Option<String>,
}

/// Seam between the checkout flow and the hosted payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<GatewaySession, ServiceError>;

    async fn retrieve_session(&self, session_id: &str) -> Result<GatewaySession, ServiceError>;
}

/// Verifies a `Stripe-Signature` style header against the raw request body.
///
/// The header carries `t=<unix ts>,v1=<hex hmac>` pairs; the signed payload
/// is `"{t}.{body}"`. Comparison is constant-time via [`Mac::verify_slice`],
/// and timestamps older than `tolerance_secs` are rejected to bound replays.
pub fn verify_webhook_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
    tolerance_secs: i64,
    now_unix: i64,
) -> Result<(), ServiceError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<&str> = Vec::new();
    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| ServiceError::InvalidSignature("missing timestamp".to_string()))?;
    if signatures.is_empty() {
        return Err(ServiceError::InvalidSignature(
            "missing v1 signature".to_string(),
        ));
    }
    if (now_unix - timestamp).abs() > tolerance_secs {
        return Err(ServiceError::InvalidSignature(
            "timestamp outside tolerance".to_string(),
        ));
    }

    for candidate in signatures {
        let Ok(candidate_bytes) = hex::decode(candidate) else {
            continue;
        };
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| ServiceError::InternalError(format!("invalid webhook secret: {}", e)))?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        if mac.verify_slice(&candidate_bytes).is_ok() {
            return Ok(());
        }
    }

    Err(ServiceError::InvalidSignature(
        "no matching signature".to_string(),
    ))
}
