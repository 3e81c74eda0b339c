//! Booking service entry point.

use std::sync::Arc;

use booking::{
    BookingCoordinator, BookingStore, ExpirySweeper, InMemoryBookingStore, PostgresBookingStore,
    seed_demo_catalog,
};
use booking_api::config::Config;
use booking_api::identity::HttpIdentityClient;
use booking_api::{AppState, PaymentPublisher};
use messaging::HttpPublisher;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::signal;
use tokio::sync::watch;
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

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    let registry = tracing_subscriber::registry().with(filter);

    if config.json_logs() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn serve<S: BookingStore + 'static>(
    store: S,
    config: Config,
    metrics_handle: PrometheusHandle,
) {
    if config.seed_demo_data {
        let seeded = seed_demo_catalog(&store)
            .await
            .expect("failed to seed demo catalog");
        tracing::info!(events = seeded, "demo catalog seeded");
    }

    let publisher: PaymentPublisher = Arc::new(
        HttpPublisher::new(config.payment_webhook_url.as_str(), config.http_timeout())
            .expect("failed to build payment webhook client"),
    );
    let identity = Arc::new(
        HttpIdentityClient::new(config.user_service_url.as_str(), config.http_timeout())
            .expect("failed to build identity client"),
    );
    let coordinator = Arc::new(BookingCoordinator::new(store, publisher));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper =
        ExpirySweeper::new(Arc::clone(&coordinator), config.sweep_interval()).spawn(shutdown_rx);

    let state = Arc::new(AppState::new(coordinator, identity));
    let app = booking_api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting booking service");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "expiry sweeper task ended abnormally");
    }

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    init_tracing(&config);

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
            let store = PostgresBookingStore::new(pool);
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using PostgreSQL booking store");
            serve(store, config, metrics_handle).await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory booking store");
            serve(InMemoryBookingStore::new(), config, metrics_handle).await;
        }
    }
}
