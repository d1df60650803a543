//! Subscription Relay server
//!
//! Loads configuration, wires the Stripe, user service and ledger adapters,
//! and serves the webhook endpoint.

use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use subscription_relay::adapters::{
    app_router, HttpUserService, HttpUserServiceConfig, InMemorySubscriptionRepository,
    PostgresSubscriptionRepository, StripeConfig, StripePaymentAdapter, WebhookAppState,
};
use subscription_relay::config::{AppConfig, DatabaseConfig, LogFormat, ServerConfig};
use subscription_relay::ports::SubscriptionRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.server);

    tracing::info!(
        "Starting Subscription Relay v{}",
        env!("CARGO_PKG_VERSION")
    );

    config.validate().context("Invalid configuration")?;
    tracing::info!(
        environment = ?config.server.environment,
        test_mode = config.payment.is_test_mode(),
        "Configuration loaded"
    );

    let webhook_secret = config.payment.webhook_secret().cloned();
    if webhook_secret.is_none() {
        tracing::warn!("Stripe webhook secret not configured - every delivery will be rejected");
    }

    let repository = connect_ledger(&config.database).await?;

    let stripe_config = StripeConfig::new(config.payment.stripe_api_key.clone())
        .with_base_url(config.payment.stripe_api_base_url.clone())
        .with_api_version(config.payment.stripe_api_version.clone());
    let payment_provider = Arc::new(StripePaymentAdapter::new(stripe_config));

    let user_service = Arc::new(HttpUserService::new(
        HttpUserServiceConfig::new(config.user_service.base_url.clone())
            .with_premium_usage_bonus(config.user_service.premium_usage_bonus),
    ));

    let state = WebhookAppState::new(payment_provider, user_service, repository, webhook_secret);

    let app = app_router(state)
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match server.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn connect_ledger(
    database: &DatabaseConfig,
) -> anyhow::Result<Arc<dyn SubscriptionRepository>> {
    let Some(url) = database.url() else {
        tracing::warn!("No database configured - subscription ledger is in memory");
        return Ok(Arc::new(InMemorySubscriptionRepository::new()));
    };

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .min_connections(database.min_connections)
        .max_connections(database.max_connections)
        .acquire_timeout(database.acquire_timeout())
        .connect(url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection established");

    if database.run_migrations {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;
    }

    Ok(Arc::new(PostgresSubscriptionRepository::new(pool)))
}
