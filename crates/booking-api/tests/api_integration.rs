//! Integration tests for the booking service HTTP surface.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use booking::{BookingCoordinator, BookingStore, Event, InMemoryBookingStore, InventoryItem};
use booking_api::identity::StaticAuthenticator;
use booking_api::{AppState, PaymentPublisher};
use chrono::Utc;
use common::{Money, UserId};
use messaging::{BookingEvent, BookingNotification, InMemoryPublisher};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

const TOKEN: &str = "test-token";

struct TestApp {
    app: axum::Router,
    outbox: InMemoryPublisher<BookingNotification>,
    user_id: UserId,
    event: Event,
    item: InventoryItem,
}

impl TestApp {
    async fn new() -> Self {
        let store = InMemoryBookingStore::new();
        let event = Event::new("Rock Concert", "Loud", Utc::now());
        store.insert_event(&event).await.unwrap();
        let item = InventoryItem::new(event.id, "VIP", Money::from_major(150), 10);
        store.insert_ticket(&item).await.unwrap();

        let outbox = InMemoryPublisher::new();
        let publisher: PaymentPublisher = Arc::new(outbox.clone());
        let coordinator = Arc::new(BookingCoordinator::new(store, publisher));
        let user_id = UserId::new();
        let identity = Arc::new(StaticAuthenticator::new(TOKEN, user_id));
        let state = Arc::new(AppState::new(coordinator, identity));

        Self {
            app: booking_api::create_app(state, get_metrics_handle()),
            outbox,
            user_id,
            event,
            item,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }

    async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn send_json(
        &self,
        method: &str,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn book(&self, quantity: i64) -> (StatusCode, serde_json::Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri("/bookings")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {TOKEN}"))
                .body(Body::from(
                    serde_json::json!({
                        "event_id": self.event.id.to_string(),
                        "ticket_id": self.item.id.to_string(),
                        "quantity": quantity,
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
    }

    async fn quota(&self) -> i64 {
        let (_, ticket) = self.get(&format!("/tickets/{}", self.item.id)).await;
        ticket["quota"].as_i64().unwrap()
    }
}

#[tokio::test]
async fn test_health_check() {
    let t = TestApp::new().await;

    let (status, json) = t.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "booking-service");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let t = TestApp::new().await;

    let response = t
        .app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_catalog_reads() {
    let t = TestApp::new().await;

    let (status, events) = t.get("/events").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(events.as_array().unwrap().len(), 1);
    assert_eq!(events[0]["name"], "Rock Concert");

    let (status, event) = t.get(&format!("/events/{}", t.event.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(event["id"], t.event.id.to_string());

    let (status, tickets) = t.get(&format!("/events/{}/tickets", t.event.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tickets[0]["category"], "VIP");
    assert_eq!(tickets[0]["quota"], 10);
}

#[tokio::test]
async fn test_unknown_event_is_not_found() {
    let t = TestApp::new().await;

    let (status, json) = t.get(&format!("/events/{}", uuid::Uuid::new_v4())).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().is_some());
}

#[tokio::test]
async fn test_malformed_id_is_bad_request() {
    let t = TestApp::new().await;

    let (status, json) = t.get("/bookings/not-a-uuid").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("booking ID"));
}

#[tokio::test]
async fn test_create_booking() {
    let t = TestApp::new().await;

    let (status, json) = t.book(2).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["status"], "PENDING");
    assert_eq!(json["quantity"], 2);
    assert_eq!(json["total_amount"], 300.0);
    assert_eq!(json["user_id"], t.user_id.to_string());
    assert!(json["expires_at"].as_str().is_some());
    assert_eq!(t.quota().await, 8);
}

#[tokio::test]
async fn test_create_booking_requires_authorization() {
    let t = TestApp::new().await;

    let (status, json) = t
        .send_json(
            "POST",
            "/bookings",
            serde_json::json!({
                "event_id": t.event.id.to_string(),
                "ticket_id": t.item.id.to_string(),
                "quantity": 1,
            }),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Authorization token is required");
    assert_eq!(t.quota().await, 10);
}

#[tokio::test]
async fn test_create_booking_rejects_wrong_token() {
    let t = TestApp::new().await;

    let (status, _) = t
        .send(
            Request::builder()
                .method("POST")
                .uri("/bookings")
                .header("content-type", "application/json")
                .header("authorization", "Bearer wrong")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_booking_validation() {
    let t = TestApp::new().await;

    let (status, _) = t.book(0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t.book(-3).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = t.book(11).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Insufficient"));

    assert_eq!(t.quota().await, 10);
}

#[tokio::test]
async fn test_get_and_list_bookings() {
    let t = TestApp::new().await;
    let (_, first) = t.book(1).await;
    let (_, second) = t.book(2).await;

    let (status, fetched) = t
        .get(&format!("/bookings/{}", first["id"].as_str().unwrap()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], first["id"]);

    let (status, all) = t.get("/bookings").await;
    assert_eq!(status, StatusCode::OK);
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0]["id"], second["id"]);

    let (_, mine) = t.get(&format!("/bookings?user_id={}", t.user_id)).await;
    assert_eq!(mine.as_array().unwrap().len(), 2);

    let (_, theirs) = t.get(&format!("/bookings?user_id={}", UserId::new())).await;
    assert!(theirs.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cancel_via_status_endpoint_releases_and_notifies() {
    let t = TestApp::new().await;
    let (_, booking) = t.book(4).await;
    let id = booking["id"].as_str().unwrap();

    let (status, json) = t
        .send_json(
            "PUT",
            &format!("/bookings/{id}/status"),
            serde_json::json!({ "status": "CANCELLED" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "CANCELLED");
    assert_eq!(t.quota().await, 10);

    let sent = t.outbox.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].event, BookingEvent::Cancelled);
    assert_eq!(sent[0].booking_id.to_string(), id);
}

#[tokio::test]
async fn test_status_endpoint_rejects_unknown_and_legacy_targets() {
    let t = TestApp::new().await;
    let (_, booking) = t.book(1).await;
    let uri = format!("/bookings/{}/status", booking["id"].as_str().unwrap());

    let (status, _) = t
        .send_json("PUT", &uri, serde_json::json!({ "status": "SHIPPED" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t
        .send_json("PUT", &uri, serde_json::json!({ "status": "PAID" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t.send_json("PUT", &uri, serde_json::json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, fetched) = t.get(&uri.replace("/status", "")).await;
    assert_eq!(fetched["status"], "PENDING");
}

#[tokio::test]
async fn test_payment_webhook_confirms_booking() {
    let t = TestApp::new().await;
    let (_, booking) = t.book(2).await;

    let (status, json) = t
        .send_json(
            "POST",
            "/bookings/webhook/payment",
            serde_json::json!({
                "event": "payment.success",
                "payment_id": uuid::Uuid::new_v4().to_string(),
                "booking_id": booking["id"],
                "status": "PAID",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "CONFIRMED");
    assert_eq!(t.quota().await, 8);
    assert_eq!(t.outbox.sent_count().await, 0);
}

#[tokio::test]
async fn test_payment_webhook_failure_releases() {
    let t = TestApp::new().await;
    let (_, booking) = t.book(3).await;

    let (status, json) = t
        .send_json(
            "POST",
            "/bookings/webhook/payment",
            serde_json::json!({ "event": "payment.failed", "booking_id": booking["id"] }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "CANCELLED");
    assert_eq!(t.quota().await, 10);
}

#[tokio::test]
async fn test_duplicate_payment_webhook_is_rejected() {
    let t = TestApp::new().await;
    let (_, booking) = t.book(2).await;
    let body = serde_json::json!({ "event": "payment.success", "booking_id": booking["id"] });

    let (first, _) = t
        .send_json("POST", "/bookings/webhook/payment", body.clone())
        .await;
    let (second, json) = t.send_json("POST", "/bookings/webhook/payment", body).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("not pending"));
    assert_eq!(t.quota().await, 8);
}

#[tokio::test]
async fn test_payment_webhook_unknown_event() {
    let t = TestApp::new().await;
    let (_, booking) = t.book(1).await;

    let (status, json) = t
        .send_json(
            "POST",
            "/bookings/webhook/payment",
            serde_json::json!({ "event": "payment.refunded", "booking_id": booking["id"] }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Unknown event"));
}

#[tokio::test]
async fn test_payment_webhook_requires_fields() {
    let t = TestApp::new().await;

    let (status, json) = t
        .send_json(
            "POST",
            "/bookings/webhook/payment",
            serde_json::json!({ "event": "payment.success" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "booking_id and event are required");
}
