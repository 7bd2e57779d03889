//! End-to-end gateway tests over real HTTP and WebSocket connections.
//!
//! Boots the full wiring (router, matcher, offer fanout) on an ephemeral
//! port and drives it the way the passenger and driver clients do: REST
//! calls via `reqwest`, the driver socket via `tokio-tungstenite`.

#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_test::assert_ok;
use tokio_tungstenite::tungstenite::Message;

use dispatch_gateway::api;
use dispatch_gateway::app_state::AppState;
use dispatch_gateway::domain::EventBus;
use dispatch_gateway::queue::RideRequestQueue;
use dispatch_gateway::service::{DispatchService, run_matcher};
use dispatch_gateway::store::{AssignmentArbiter, PresenceIndex, RideStore};
use dispatch_gateway::ws::ConnectionRegistry;
use dispatch_gateway::ws::handler::ws_handler;
use dispatch_gateway::ws::router::run_offer_router;

/// Boots a complete gateway on an ephemeral port and returns its address.
async fn start_gateway() -> String {
    let rides = Arc::new(RideStore::new());
    let presence = Arc::new(PresenceIndex::new());
    let arbiter = Arc::new(AssignmentArbiter::new());
    let event_bus = EventBus::new(256);
    let connections = Arc::new(ConnectionRegistry::new());
    let (queue, consumer) = RideRequestQueue::new(64, 3, Duration::from_millis(10));

    let dispatch = Arc::new(DispatchService::new(
        Arc::clone(&rides),
        Arc::clone(&presence),
        arbiter,
        queue.clone(),
        event_bus.clone(),
        60,
    ));

    tokio::spawn(run_matcher(
        consumer,
        queue,
        Arc::clone(&presence),
        event_bus.clone(),
        50.0,
        5,
    ));
    tokio::spawn(run_offer_router(
        event_bus.subscribe(),
        Arc::clone(&connections),
    ));

    let state = AppState {
        dispatch,
        event_bus,
        connections,
    };
    let app = axum::Router::new()
        .merge(api::build_router())
        .route("/ws", axum::routing::get(ws_handler))
        .with_state(state);

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("failed to bind test listener");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("test listener has no local address");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("127.0.0.1:{}", addr.port())
}

fn book_body() -> Value {
    json!({
        "passenger_id": "0xpassenger",
        "src": { "lat": 12.97, "lng": 77.59 },
        "dest": { "lat": 12.93, "lng": 77.62 },
        "vehicle_type": "sedan",
        "price": 180.0
    })
}

async fn book_ride(client: &reqwest::Client, addr: &str) -> String {
    let booked = client
        .post(format!("http://{addr}/api/v1/rides"))
        .json(&book_body())
        .send()
        .await;
    let booked = tokio_test::assert_ok!(booked);
    assert_eq!(booked.status().as_u16(), 201);

    let body: Value = tokio_test::assert_ok!(booked.json().await);
    let Some(ride_id) = body.get("ride_id").and_then(Value::as_str) else {
        panic!("booking response missing ride_id: {body}");
    };
    ride_id.to_string()
}

#[tokio::test]
async fn identified_driver_gets_push_for_booked_ride() {
    let addr = start_gateway().await;
    let client = reqwest::Client::new();

    // Driver connects and identifies over the real socket.
    let ws = tokio_tungstenite::connect_async(format!("ws://{addr}/ws")).await;
    let Ok((mut socket, _)) = ws else {
        panic!("websocket connect failed");
    };
    let identify = json!({ "type": "IDENTIFY", "driverId": "d1" }).to_string();
    tokio_test::assert_ok!(socket.send(Message::text(identify)).await);

    // Let the connection loop process the registration.
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Driver is nearby and dispatchable.
    let location = client
        .put(format!("http://{addr}/api/v1/drivers/d1/location"))
        .json(&json!({ "lat": 12.98, "lng": 77.60 }))
        .send()
        .await;
    let location = tokio_test::assert_ok!(location);
    assert_eq!(location.status().as_u16(), 200);

    let ride_id = book_ride(&client, &addr).await;

    // The matcher consumes the booking and the offer lands on the socket.
    let push = tokio::time::timeout(Duration::from_secs(5), socket.next()).await;
    let Ok(Some(Ok(Message::Text(text)))) = push else {
        panic!("expected websocket push");
    };
    let Ok(push) = serde_json::from_str::<Value>(text.as_str()) else {
        panic!("push is not json: {text}");
    };
    assert_eq!(
        push.get("type").and_then(Value::as_str),
        Some("NEW_RIDE_REQUEST")
    );
    assert_eq!(
        push.get("rideId").and_then(Value::as_str),
        Some(ride_id.as_str())
    );
    let Some(distance) = push.get("distance").and_then(Value::as_str) else {
        panic!("push missing distance: {push}");
    };
    assert!(distance.parse::<f64>().is_ok(), "bad distance: {distance}");
}

#[tokio::test]
async fn accept_race_and_completion_over_rest() {
    let addr = start_gateway().await;
    let client = reqwest::Client::new();
    let ride_id = book_ride(&client, &addr).await;

    // First driver wins the acceptance.
    let won = client
        .post(format!("http://{addr}/api/v1/rides/{ride_id}/accept"))
        .json(&json!({ "driver_id": "d1" }))
        .send()
        .await;
    let won = tokio_test::assert_ok!(won);
    assert_eq!(won.status().as_u16(), 200);

    // Second driver loses with a conflict.
    let lost = client
        .post(format!("http://{addr}/api/v1/rides/{ride_id}/accept"))
        .json(&json!({ "driver_id": "d2" }))
        .send()
        .await;
    let lost = tokio_test::assert_ok!(lost);
    assert_eq!(lost.status().as_u16(), 409);
    let body: Value = tokio_test::assert_ok!(lost.json().await);
    assert_eq!(
        body.pointer("/error/code").and_then(Value::as_u64),
        Some(2002)
    );

    // The losing driver cannot complete either.
    let forbidden = client
        .post(format!("http://{addr}/api/v1/rides/{ride_id}/complete"))
        .json(&json!({ "driver_id": "d2" }))
        .send()
        .await;
    let forbidden = tokio_test::assert_ok!(forbidden);
    assert_eq!(forbidden.status().as_u16(), 403);

    // The assigned driver completes.
    let completed = client
        .post(format!("http://{addr}/api/v1/rides/{ride_id}/complete"))
        .json(&json!({ "driver_id": "d1" }))
        .send()
        .await;
    let completed = tokio_test::assert_ok!(completed);
    assert_eq!(completed.status().as_u16(), 200);

    // Status reflects the final record.
    let status = client
        .get(format!("http://{addr}/api/v1/rides/{ride_id}"))
        .send()
        .await;
    let status = tokio_test::assert_ok!(status);
    assert_eq!(status.status().as_u16(), 200);
    let body: Value = tokio_test::assert_ok!(status.json().await);
    assert_eq!(body.get("status").and_then(Value::as_str), Some("COMPLETED"));
    assert_eq!(
        body.get("driver_id").and_then(Value::as_str),
        Some("driver:d1")
    );
}

#[tokio::test]
async fn unknown_ride_returns_not_found() {
    let addr = start_gateway().await;
    let client = reqwest::Client::new();

    let missing = client
        .get(format!(
            "http://{addr}/api/v1/rides/{}",
            uuid::Uuid::new_v4()
        ))
        .send()
        .await;
    let missing = tokio_test::assert_ok!(missing);
    assert_eq!(missing.status().as_u16(), 404);
    let body: Value = tokio_test::assert_ok!(missing.json().await);
    assert_eq!(
        body.pointer("/error/code").and_then(Value::as_u64),
        Some(2001)
    );
}
