//! Shared harness for the integration tests: an in-memory database, a fake
//! payment gateway, a recording mailer and the real router with the real
//! middleware stack.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use sea_orm::ActiveModelTrait;
use sea_orm::ActiveValue::Set;
use serde_json::{json, Value};
use sha2::Sha256;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use coursehub_api::config::AppConfig;
use coursehub_api::db::{establish_connection_with_config, run_migrations, DbConfig, DbPool};
use coursehub_api::email::{EmailSender, OutboundEmail};
use coursehub_api::entities::{course, purchase};
use coursehub_api::errors::ServiceError;
use coursehub_api::events::{process_events, EventSender};
use coursehub_api::gateway::{
    CreateSessionRequest, GatewaySession, PaymentGateway, PaymentStatus, SessionMetadata,
};
use coursehub_api::{app_router, AppState};

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

/// In-memory stand-in for the hosted payment gateway.
#[derive(Default)]
pub struct FakeGateway {
    sessions: Mutex<HashMap<String, GatewaySession>>,
    counter: Mutex<u64>,
    pub fail_create: Mutex<bool>,
}

impl FakeGateway {
    pub fn insert_session(&self, session: GatewaySession) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session);
    }

    pub fn mark_paid(&self, session_id: &str) {
        if let Some(s) = self.sessions.lock().unwrap().get_mut(session_id) {
            s.payment_status = PaymentStatus::Paid;
        }
    }

    pub fn session(&self, session_id: &str) -> Option<GatewaySession> {
        self.sessions.lock().unwrap().get(session_id).cloned()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_checkout_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<GatewaySession, ServiceError> {
        if *self.fail_create.lock().unwrap() {
            return Err(ServiceError::GatewayError("simulated outage".to_string()));
        }
        let mut counter = self.counter.lock().unwrap();
        *counter += 1;
        let session = GatewaySession {
            id: format!("cs_test_{}", counter),
            url: Some(format!("https://checkout.test/session/{}", counter)),
            payment_status: PaymentStatus::Unpaid,
            metadata: Some(request.metadata),
            amount_total_minor: Some(request.amount_minor),
            customer_email: None,
        };
        self.insert_session(session.clone());
        Ok(session)
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<GatewaySession, ServiceError> {
        self.session(session_id)
            .ok_or_else(|| ServiceError::GatewayError("no such session".to_string()))
    }
}

/// Records outbound email instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutboundEmail>>,
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), ServiceError> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: DbPool,
    pub state: Arc<AppState>,
    pub gateway: Arc<FakeGateway>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_config(AppConfig::for_tests()).await
    }

    pub async fn spawn_with_config(config: AppConfig) -> Self {
        // A single connection keeps every query on the same in-memory
        // database.
        let db_config = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..DbConfig::default()
        };
        let db = establish_connection_with_config(&db_config)
            .await
            .expect("in-memory database");
        run_migrations(&db).await.expect("migrations");

        let gateway = Arc::new(FakeGateway::default());
        let mailer = Arc::new(RecordingMailer::default());
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(process_events(rx));

        let state = Arc::new(AppState::new(
            db.clone(),
            config,
            gateway.clone(),
            mailer.clone(),
            EventSender::new(tx),
        ));
        let router = app_router(state.clone());
        Self {
            router,
            db,
            state,
            gateway,
            mailer,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router never fails")
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
    }

    pub async fn get_authed(&self, uri: &str, token: &str) -> Response {
        self.request(
            Request::builder()
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .expect("request"),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> Response {
        self.request(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
    }

    pub async fn post_json_authed(&self, uri: &str, body: Value, token: &str) -> Response {
        self.request(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
    }

    /// Registers a user through the API and returns their bearer token.
    pub async fn register_user(&self, username: &str, email: &str) -> String {
        let response = self
            .post_json(
                "/auth/register",
                json!({
                    "username": username,
                    "email": email,
                    "password": "password123"
                }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = read_json(response).await;
        body["token"].as_str().expect("token in response").to_owned()
    }

    /// Issues a token for an admin without going through registration.
    pub fn admin_token(&self) -> String {
        self.state
            .auth
            .issue_token(Uuid::new_v4(), "admin@coursehub.test", "admin", true)
            .expect("token")
    }

    /// Inserts a course directly, bypassing the admin API.
    pub async fn seed_course(&self, price: Decimal) -> course::Model {
        let row = course::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set("Rust for Backend Engineers".to_string()),
            description: Set("A practical backend course.".to_string()),
            detailed_description: Set(
                "Ownership, async, axum and SeaORM from first principles.".to_string(),
            ),
            price: Set(price),
            thumbnail_link: Set("https://cdn.test/thumb.png".to_string()),
            video_link: Set(None),
            resource_link: Set(None),
            created_at: Set(Utc::now()),
        };
        row.insert(&self.db).await.expect("seed course")
    }

    /// Inserts a paid purchase row directly.
    pub async fn seed_paid_purchase(
        &self,
        course_id: Uuid,
        user_email: &str,
        session_id: &str,
    ) -> purchase::Model {
        let row = purchase::ActiveModel {
            id: Set(Uuid::new_v4()),
            course_id: Set(course_id),
            user_email: Set(user_email.to_string()),
            status: Set(purchase::PurchaseStatus::Paid),
            session_id: Set(session_id.to_string()),
            amount_minor: Set(Some(45000)),
            created_at: Set(Utc::now()),
        };
        row.insert(&self.db).await.expect("seed purchase")
    }

    /// Seeds a gateway session that has already been paid, as the gateway
    /// would report after the buyer completes the hosted flow.
    pub fn seed_paid_session(&self, session_id: &str, course_id: Uuid, user_email: &str) {
        self.gateway.insert_session(GatewaySession {
            id: session_id.to_string(),
            url: None,
            payment_status: PaymentStatus::Paid,
            metadata: Some(SessionMetadata::identity(course_id, user_email)),
            amount_total_minor: Some(45000),
            customer_email: None,
        });
    }

    /// Sends a signed webhook request the way the gateway would.
    pub async fn post_webhook(&self, payload: &Value) -> Response {
        let body = payload.to_string();
        let header_value = sign_webhook(&body, WEBHOOK_SECRET, Utc::now().timestamp());
        self.post_webhook_raw(&body, &header_value).await
    }

    pub async fn post_webhook_raw(&self, body: &str, signature: &str) -> Response {
        self.request(
            Request::builder()
                .method("POST")
                .uri("/webhook")
                .header(header::CONTENT_TYPE, "application/json")
                .header("stripe-signature", signature)
                .body(Body::from(body.to_owned()))
                .expect("request"),
        )
        .await
    }
}

/// Produces a `t=...,v1=...` header over `"{t}.{body}"`.
pub fn sign_webhook(body: &str, secret: &str, timestamp: i64) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(format!("{}.{}", timestamp, body).as_bytes());
    format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    )
}

pub fn completed_session_event(session_id: &str, course_id: Uuid, user_email: &str) -> Value {
    json!({
        "id": format!("evt_{}", session_id),
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": session_id,
                "amount_total": 45000,
                "metadata": {
                    "courseId": course_id.to_string(),
                    "userEmail": user_email
                }
            }
        }
    })
}

pub async fn read_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Counts purchase rows for a session id.
pub async fn purchase_count_for_session(db: &DbPool, session_id: &str) -> u64 {
    use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
    purchase::Entity::find()
        .filter(purchase::Column::SessionId.eq(session_id))
        .count(db)
        .await
        .expect("count")
}
