//! Groupgate service entry point.
//!
//! Wires the adapters together, spawns the reconciliation loop and serves
//! the payment notification endpoint.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use groupgate::adapters::http::payment::{payment_routes, PaymentAppState};
use groupgate::adapters::postgres::PostgresUserStore;
use groupgate::adapters::telegram::{TelegramConfig, TelegramGroupDirectory};
use groupgate::application::handlers::ActivateSubscriptionHandler;
use groupgate::application::reconciler::MembershipReconciler;
use groupgate::config::AppConfig;
use groupgate::domain::foundation::ChatId;
use groupgate::domain::subscription::IpnVerifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    config.validate()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    let store = Arc::new(PostgresUserStore::new(
        pool,
        Duration::from_secs(config.database.statement_timeout_secs),
    ));

    let telegram = Arc::new(TelegramGroupDirectory::new(TelegramConfig::new(
        config.telegram.bot_token.clone(),
        ChatId::new(config.telegram.group_chat_id),
        Duration::from_secs(config.telegram.request_timeout_secs),
    ))?);

    let verifier = Arc::new(IpnVerifier::new(config.billing.ipn_secret.clone()));
    let activation = Arc::new(ActivateSubscriptionHandler::new(
        store.clone(),
        telegram.clone(),
        telegram.clone(),
        config.billing.subscription_days,
    ));

    let reconciler = MembershipReconciler::new(
        store.clone(),
        telegram.clone(),
        config.reconciler.settings(),
    );
    tokio::spawn(async move { reconciler.run().await });

    let app = payment_routes()
        .with_state(PaymentAppState {
            verifier,
            activation,
        })
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)));

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, "groupgate listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
