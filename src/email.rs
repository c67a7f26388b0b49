//! Outbound transactional email. Delivery is best-effort everywhere it is
//! used; a send failure is logged and never fails the surrounding request.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::errors::ServiceError;

#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<(), ServiceError>;
}

/// Resend HTTP API adapter.
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
    api_base: String,
}

#[derive(Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

impl ResendMailer {
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            from,
            api_base: "https://api.resend.com".to_string(),
        }
    }

    pub fn with_api_base(api_key: String, from: String, api_base: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            from,
            api_base,
        }
    }
}

#[async_trait]
impl EmailSender for ResendMailer {
    #[instrument(skip(self, email), fields(to = %email.to, subject = %email.subject))]
    async fn send(&self, email: OutboundEmail) -> Result<(), ServiceError> {
        let body = ResendRequest {
            from: &self.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html_body,
        };
        let response = self
            .client
            .post(format!("{}/emails", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::InternalError(format!("email send failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %text, "email provider rejected message");
            return Err(ServiceError::InternalError(format!(
                "email provider returned {}",
                status
            )));
        }
        info!("email dispatched");
        Ok(())
    }
}

/// Used when no email provider is configured; logs and succeeds.
pub struct NoopMailer;

#[async_trait]
impl EmailSender for NoopMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), ServiceError> {
        info!(to = %email.to, subject = %email.subject, "email sending disabled, skipping");
        Ok(())
    }
}
