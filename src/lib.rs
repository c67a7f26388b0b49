pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod entities;
pub mod errors;
pub mod events;
pub mod gateway;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::email::EmailSender;
use crate::events::EventSender;
use crate::gateway::PaymentGateway;
use crate::services::accounts::AccountService;
use crate::services::checkout::CheckoutService;
use crate::services::courses::CourseService;
use crate::services::entitlements::EntitlementService;
use crate::services::messages::MessageService;
use crate::services::pricing::PricingService;
use crate::services::reviews::ReviewService;

/// Everything the handlers need, built once at startup.
pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub auth: Arc<AuthService>,
    pub event_sender: EventSender,
    pub pricing: PricingService,
    pub checkout: CheckoutService,
    pub entitlements: EntitlementService,
    pub courses: CourseService,
    pub accounts: AccountService,
    pub reviews: ReviewService,
    pub messages: MessageService,
}

impl AppState {
    pub fn new(
        db: DbPool,
        config: AppConfig,
        gateway: Arc<dyn PaymentGateway>,
        mailer: Arc<dyn EmailSender>,
        event_sender: EventSender,
    ) -> Self {
        let auth = Arc::new(AuthService::new(
            &config.jwt_secret,
            config.auth_issuer.clone(),
            config.auth_audience.clone(),
            config.jwt_expiration as i64,
        ));
        let pricing = PricingService::new(db.clone(), config.currency.clone());
        let checkout = CheckoutService::new(
            db.clone(),
            pricing.clone(),
            gateway.clone(),
            event_sender.clone(),
            config.public_base_url.clone(),
            config.currency.clone(),
        );
        let entitlements = EntitlementService::new(
            db.clone(),
            gateway,
            mailer.clone(),
            event_sender.clone(),
        );
        let courses = CourseService::new(db.clone());
        let accounts = AccountService::new(db.clone(), auth.clone(), event_sender.clone());
        let reviews = ReviewService::new(db.clone(), event_sender.clone());
        let messages = MessageService::new(
            db.clone(),
            mailer,
            event_sender.clone(),
            config.support_inbox.clone(),
        );
        Self {
            db,
            config,
            auth,
            event_sender,
            pricing,
            checkout,
            entitlements,
            courses,
            accounts,
            reviews,
            messages,
        }
    }
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.should_allow_permissive_cors() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .filter_map(|o| o.trim().parse().ok())
        .collect();
    // Wildcard methods/headers cannot be combined with credentials, so the
    // restricted branch enumerates them.
    let mut layer = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);
    if config.cors_allow_credentials {
        layer = layer.allow_credentials(true);
    }
    layer
}

/// Builds the full application router. Shared by `main` and the
/// integration tests so both exercise identical middleware.
pub fn app_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .merge(handlers::pricing::routes())
        .merge(handlers::checkout::routes())
        .merge(handlers::webhooks::routes())
        .merge(handlers::access::routes())
        .merge(handlers::courses::routes())
        .merge(handlers::auth::routes())
        .merge(handlers::reviews::routes())
        .merge(handlers::messages::routes());

    let cors = cors_layer(&state.config);
    let auth = state.auth.clone();

    Router::new()
        .route("/health", get(health_check))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .merge(api)
        .layer(middleware::from_fn_with_state(auth, auth::auth_middleware))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
