//! HTTP surface tests.
//!
//! Starts an axum server on port 0 and exercises it with reqwest.

use std::sync::Arc;
use std::time::Duration;

use locking_rust::{http, seed, Engine, EngineConfig, FixedDelay, InMemoryRecordStore, NoDelay};
use serde_json::{json, Value};

use crate::support::{engine_with, BarrierDelay};

async fn start_server(engine: Engine<InMemoryRecordStore>) -> String {
    let app = http::router(engine);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn plain_engine() -> Engine<InMemoryRecordStore> {
    engine_with(Arc::new(NoDelay), Duration::from_secs(1))
}

#[tokio::test]
async fn health_and_home() {
    let base = start_server(plain_engine()).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "UP");

    let resp = client.get(format!("{base}/")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["endpoints"].is_object());
    assert!(body["lockingStrategies"]["Optimistic Locking"].is_string());
}

#[tokio::test]
async fn seeded_lists() {
    let engine = Engine::in_memory(EngineConfig::default());
    seed(&engine).unwrap();
    let base = start_server(engine).await;
    let client = reqwest::Client::new();

    let tickets: Value = client
        .get(format!("{base}/api/tickets"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tickets.as_array().unwrap().len(), 3);
    assert_eq!(tickets[2]["name"], "Theater - Hamilton");
    assert_eq!(tickets[2]["booked"], true);

    let items: Value = client
        .get(format!("{base}/api/inventory"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(items.as_array().unwrap().len(), 3);
    assert_eq!(items[0]["quantity"], 25);
}

#[tokio::test]
async fn ticket_lifecycle() {
    let base = start_server(plain_engine()).await;
    let client = reqwest::Client::new();

    let created: Value = client
        .post(format!("{base}/api/tickets"))
        .json(&json!({ "name": "Concert" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(created, json!({ "id": 1, "version": 1, "name": "Concert", "booked": false }));

    let resp = client
        .get(format!("{base}/api/tickets/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .post(format!("{base}/api/tickets/1/book"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["booked"], true);
    assert_eq!(body["version"], 2);

    let resp = client
        .post(format!("{base}/api/tickets/1/book"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Ticket is already booked");

    let resp = client
        .post(format!("{base}/api/tickets/1/cancel"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["booked"], false);
}

#[tokio::test]
async fn missing_records_return_404() {
    let base = start_server(plain_engine()).await;
    let client = reqwest::Client::new();

    for (method, path) in [
        ("GET", "/api/tickets/42"),
        ("POST", "/api/tickets/42/book"),
        ("POST", "/api/tickets/42/cancel"),
        ("GET", "/api/inventory/42"),
        ("PUT", "/api/inventory/42/update-quantity?newQuantity=1"),
        ("POST", "/api/inventory/42/reduce?amount=1"),
    ] {
        let method = reqwest::Method::from_bytes(method.as_bytes()).unwrap();
        let resp = client
            .request(method, format!("{base}{path}"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404, "{path}");
    }
}

#[tokio::test]
async fn inventory_validation_errors_are_400() {
    let base = start_server(plain_engine()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/api/inventory"))
        .json(&json!({ "name": "Book", "quantity": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .put(format!("{base}/api/inventory/1/update-quantity?newQuantity=-1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Quantity cannot be negative");

    let resp = client
        .post(format!("{base}/api/inventory/1/reduce?amount=0"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .post(format!("{base}/api/inventory/1/reduce?amount=100"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Insufficient quantity available. Current: 10, Requested: 100"
    );

    let item: Value = client
        .get(format!("{base}/api/inventory/1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(item["quantity"], 10);
    assert_eq!(item["version"], 1);
}

#[tokio::test]
async fn concurrent_updates_map_to_200_and_409() {
    let engine = engine_with(Arc::new(BarrierDelay::new(2)), Duration::from_secs(1));
    let base = start_server(engine).await;
    let client = reqwest::Client::new();

    client
        .post(format!("{base}/api/inventory"))
        .json(&json!({ "name": "Book", "quantity": 10 }))
        .send()
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        client
            .put(format!("{base}/api/inventory/1/update-quantity?newQuantity=5"))
            .send(),
        client
            .put(format!("{base}/api/inventory/1/update-quantity?newQuantity=8"))
            .send(),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    let mut statuses = vec![a.status().as_u16(), b.status().as_u16()];
    statuses.sort_unstable();
    assert_eq!(statuses, vec![200, 409]);

    let loser = if a.status() == 409 { a } else { b };
    let body: Value = loser.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Another user has modified this item. Please refresh and try again."
    );
}

#[tokio::test]
async fn lock_timeout_maps_to_409() {
    let engine = engine_with(
        Arc::new(FixedDelay(Duration::from_millis(800))),
        Duration::from_millis(100),
    );
    let base = start_server(engine).await;
    let client = reqwest::Client::new();

    client
        .post(format!("{base}/api/tickets"))
        .json(&json!({ "name": "Concert" }))
        .send()
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        client.post(format!("{base}/api/tickets/1/book")).send(),
        client.post(format!("{base}/api/tickets/1/book")).send(),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    let mut statuses = vec![a.status().as_u16(), b.status().as_u16()];
    statuses.sort_unstable();
    assert_eq!(statuses, vec![200, 409]);

    let loser = if a.status() == 409 { a } else { b };
    let body: Value = loser.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Could not acquire lock on the resource. Please try again."
    );
}

#[tokio::test]
async fn malformed_requests_get_json_errors() {
    let base = start_server(plain_engine()).await;
    let client = reqwest::Client::new();

    let requests = [
        client.get(format!("{base}/api/tickets/not-a-number")),
        client.put(format!("{base}/api/inventory/1/update-quantity")),
        client.post(format!("{base}/api/inventory/1/reduce?amount=lots")),
        client
            .post(format!("{base}/api/tickets"))
            .header("content-type", "application/json")
            .body("{\"name\":"),
        client
            .post(format!("{base}/api/inventory"))
            .json(&json!({ "name": "Book" })),
    ];

    for request in requests {
        let resp = request.send().await.unwrap();
        let url = resp.url().to_string();
        assert_eq!(resp.status(), 400, "{url}");
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].is_string(), "{url}: {body}");
    }
}

#[tokio::test]
async fn disconnected_waiter_gives_up_the_lock_wait() {
    let engine = engine_with(
        Arc::new(FixedDelay(Duration::from_millis(1500))),
        Duration::from_secs(5),
    );
    let base = start_server(engine).await;
    let client = reqwest::Client::new();

    client
        .post(format!("{base}/api/tickets"))
        .json(&json!({ "name": "Concert" }))
        .send()
        .await
        .unwrap();

    let holder = {
        let client = client.clone();
        let url = format!("{base}/api/tickets/1/book");
        tokio::spawn(async move { client.post(url).send().await })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;

    // Waits on the lock held by the booking, then hangs up.
    let impatient = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let result = impatient
        .post(format!("{base}/api/tickets/1/cancel"))
        .send()
        .await;
    assert!(result.is_err());

    let booked = holder.await.unwrap().unwrap();
    assert_eq!(booked.status(), 200);
    tokio::time::sleep(Duration::from_millis(200)).await;

    // The abandoned cancel never wrote.
    let ticket: Value = client
        .get(format!("{base}/api/tickets/1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ticket["booked"], true);
    assert_eq!(ticket["version"], 2);

    // And it left the lock free for the next caller.
    let resp = client
        .post(format!("{base}/api/tickets/1/cancel"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["booked"], false);
    assert_eq!(body["version"], 3);
}
