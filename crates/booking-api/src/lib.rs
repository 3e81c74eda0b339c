//! HTTP surface of the booking service.
//!
//! Exposes the event catalog, booking creation and status changes, and the
//! webhook the payment service calls with payment outcomes. Requests are
//! traced with `tracing` and the coordinator's counters are scraped from
//! `/metrics`.

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use booking::{BookingCoordinator, BookingStore};
use messaging::{BookingNotification, Publisher};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use identity::Authenticator;

/// Outbound channel to the payment service.
pub type PaymentPublisher = Arc<dyn Publisher<BookingNotification>>;

/// Shared application state accessible from all handlers.
pub struct AppState<S: BookingStore> {
    pub coordinator: Arc<BookingCoordinator<S, PaymentPublisher>>,
    pub identity: Arc<dyn Authenticator>,
}

impl<S: BookingStore> AppState<S> {
    pub fn new(
        coordinator: Arc<BookingCoordinator<S, PaymentPublisher>>,
        identity: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            coordinator,
            identity,
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: BookingStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::ops::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::ops::health))
        .route("/events", get(routes::catalog::list_events::<S>))
        .route("/events/{id}", get(routes::catalog::get_event::<S>))
        .route("/events/{id}/tickets", get(routes::catalog::list_tickets::<S>))
        .route("/tickets/{id}", get(routes::catalog::get_ticket::<S>))
        .route(
            "/bookings",
            post(routes::bookings::create::<S>).get(routes::bookings::list::<S>),
        )
        .route("/bookings/{id}", get(routes::bookings::get::<S>))
        .route(
            "/bookings/{id}/status",
            put(routes::bookings::update_status::<S>),
        )
        .route(
            "/bookings/webhook/payment",
            post(routes::webhooks::payment::<S>),
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
