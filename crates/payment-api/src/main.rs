//! Payment service entry point.

use std::sync::Arc;

use messaging::HttpPublisher;
use metrics_exporter_prometheus::PrometheusHandle;
use payment::{HttpBookingDirectory, InMemoryPaymentStore, PaymentStore, PostgresPaymentStore};
use payment_api::config::Config;
use payment_api::{AppState, BookingLookup, BookingPublisher};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

async fn serve<S: PaymentStore + 'static>(
    store: S,
    config: Config,
    metrics_handle: PrometheusHandle,
) {
    let bookings: BookingLookup = Arc::new(
        HttpBookingDirectory::new(config.booking_service_url.as_str(), config.http_timeout())
            .expect("failed to build booking service client"),
    );
    let publisher: BookingPublisher = Arc::new(
        HttpPublisher::new(config.booking_webhook_url.as_str(), config.http_timeout())
            .expect("failed to build booking webhook client"),
    );

    let state = Arc::new(AppState::new(store, bookings, publisher));
    let app = payment_api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting payment service");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Pick the store and run
    match config.database_url.clone() {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(20)
                .connect(&url)
                .await
                .expect("failed to connect to database");
            let store = PostgresPaymentStore::new(pool);
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using PostgreSQL payment store");
            serve(store, config, metrics_handle).await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory payment store");
            serve(InMemoryPaymentStore::new(), config, metrics_handle).await;
        }
    }
}
