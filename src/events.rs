use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info};
use uuid::Uuid;

/// Domain events emitted by the services. Consumers are best-effort;
/// event delivery never blocks or fails a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    UserRegistered {
        user_id: Uuid,
        email: String,
    },
    CheckoutSessionCreated {
        session_id: String,
        course_id: Uuid,
        user_email: String,
        amount_minor: i64,
    },
    PurchaseRecorded {
        purchase_id: Uuid,
        course_id: Uuid,
        user_email: String,
        source: PurchaseSource,
    },
    DuplicatePurchaseSuppressed {
        session_id: String,
        source: PurchaseSource,
    },
    WebhookRejected {
        reason: String,
    },
    ContactMessageReceived {
        message_id: Uuid,
    },
    ReviewSubmitted {
        review_id: Uuid,
    },
}

/// Which reconciliation path produced a purchase row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseSource {
    Confirm,
    Webhook,
}

impl std::fmt::Display for PurchaseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PurchaseSource::Confirm => write!(f, "confirm"),
            PurchaseSource::Webhook => write!(f, "webhook"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(tx: mpsc::Sender<Event>) -> Self {
        Self { tx }
    }

    /// Fire-and-forget; a full or closed channel is logged and dropped.
    pub async fn send(&self, event: Event) {
        if let Err(e) = self.tx.send(event).await {
            error!("failed to queue event: {}", e);
        }
    }
}

/// Background consumer that logs events as they arrive. Runs for the
/// lifetime of the process.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    while let Some(event) = rx.recv().await {
        match &event {
            Event::PurchaseRecorded {
                purchase_id,
                course_id,
                source,
                ..
            } => {
                info!(
                    purchase_id = %purchase_id,
                    course_id = %course_id,
                    source = %source,
                    "purchase recorded"
                );
            }
            Event::DuplicatePurchaseSuppressed { session_id, source } => {
                info!(
                    session_id = %session_id,
                    source = %source,
                    "duplicate purchase suppressed"
                );
            }
            Event::WebhookRejected { reason } => {
                info!(reason = %reason, "webhook rejected");
            }
            other => {
                info!(event = ?other, "event processed");
            }
        }
    }
}
