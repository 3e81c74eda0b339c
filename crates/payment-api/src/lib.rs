//! HTTP surface of the payment service.
//!
//! Opens payments against bookings, accepts gateway outcomes and booking
//! lifecycle webhooks, and offers an administrative status override.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use messaging::{PaymentNotification, Publisher};
use metrics_exporter_prometheus::PrometheusHandle;
use payment::{BookingDirectory, PaymentCoordinator, PaymentStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Read access to the booking service.
pub type BookingLookup = Arc<dyn BookingDirectory>;

/// Outbound channel to the booking service.
pub type BookingPublisher = Arc<dyn Publisher<PaymentNotification>>;

pub type Coordinator<S> = PaymentCoordinator<S, BookingLookup, BookingPublisher>;

/// Shared application state accessible from all handlers.
pub struct AppState<S: PaymentStore> {
    pub coordinator: Arc<Coordinator<S>>,
}

impl<S: PaymentStore> AppState<S> {
    pub fn new(store: S, bookings: BookingLookup, publisher: BookingPublisher) -> Self {
        Self {
            coordinator: Arc::new(PaymentCoordinator::new(store, bookings, publisher)),
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: PaymentStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::ops::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::ops::health))
        .route(
            "/payments",
            post(routes::payments::create::<S>).get(routes::payments::list::<S>),
        )
        .route("/payments/{id}", get(routes::payments::get::<S>))
        .route(
            "/payments/{id}/status",
            put(routes::payments::update_status::<S>),
        )
        .route(
            "/payments/webhook/payment-gateway",
            post(routes::webhooks::gateway::<S>),
        )
        .route(
            "/payments/webhook/booking",
            post(routes::webhooks::booking::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
