use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{info, warn};

use coursehub_api::config::{init_tracing, load_config};
use coursehub_api::db;
use coursehub_api::email::{EmailSender, NoopMailer, ResendMailer};
use coursehub_api::events::{process_events, EventSender};
use coursehub_api::gateway::{PaymentGateway, StripeGateway};
use coursehub_api::{app_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;
    init_tracing(config.log_level(), config.log_json);

    info!(
        environment = %config.environment,
        port = config.port,
        "starting coursehub-api"
    );

    let pool = db::establish_connection_from_app_config(&config)
        .await
        .context("failed to connect to database")?;
    if config.auto_migrate {
        db::run_migrations(&pool)
            .await
            .context("failed to run migrations")?;
        info!("database migrations applied");
    }

    let gateway: Arc<dyn PaymentGateway> = match &config.stripe_secret_key {
        Some(key) => Arc::new(StripeGateway::new(key.clone())),
        None => {
            anyhow::bail!("STRIPE_SECRET_KEY (app.stripe_secret_key) must be configured")
        }
    };

    let mailer: Arc<dyn EmailSender> = match &config.resend_api_key {
        Some(key) => Arc::new(ResendMailer::new(key.clone(), config.email_from.clone())),
        None => {
            warn!("no email provider configured, outbound email disabled");
            Arc::new(NoopMailer)
        }
    };

    let (event_tx, event_rx) = mpsc::channel(1024);
    tokio::spawn(process_events(event_rx));

    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(
        pool,
        config,
        gateway,
        mailer,
        EventSender::new(event_tx),
    ));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(address = %addr, "listening");

    axum::serve(listener, app_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server exited with error")?;
    info!("shutdown complete");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM so in-flight requests can drain.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install ctrl-c handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
