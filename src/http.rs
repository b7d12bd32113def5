//! HTTP surface over the engine.
//!
//! Requires the `http` feature. Uses axum for routing.
//!
//! ## Routes
//!
//! - `GET /api/tickets`, `POST /api/tickets`, `GET /api/tickets/:id`
//! - `POST /api/tickets/:id/book` (pessimistic), `POST /api/tickets/:id/cancel`
//! - `GET /api/inventory`, `POST /api/inventory`, `GET /api/inventory/:id`
//! - `PUT /api/inventory/:id/update-quantity?newQuantity=N` (optimistic)
//! - `POST /api/inventory/:id/reduce?amount=N` (optimistic)
//! - `GET /` endpoint overview, `GET /health`
//!
//! Malformed paths, queries and bodies are answered like any other
//! `InvalidArgument`: status 400 with a JSON `{"error": ...}` body.
//!
//! Engine calls block (lock waits, processing delays), so they run on the
//! blocking pool. Each request carries a `CancelToken` that fires if the
//! client goes away, which stops a pending lock wait.
//!
//! ## Example
//!
//! ```ignore
//! use locking_rust::{http, Engine, EngineConfig};
//!
//! let engine = Engine::in_memory(EngineConfig::default());
//! http::serve(engine, "0.0.0.0:8080").await?;
//! ```

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::domain::{InventoryItem, Ticket};
use crate::engine::Engine;
use crate::error::OperationError;
use crate::lock::CancelToken;
use crate::record::{RecordId, RecordStore, Versioned};

/// Build an axum `Router` serving the ticket and inventory API.
pub fn router<S: RecordStore + 'static>(engine: Engine<S>) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/health", get(health_handler))
        .route(
            "/api/tickets",
            get(list_tickets::<S>).post(create_ticket::<S>),
        )
        .route("/api/tickets/:id", get(get_ticket::<S>))
        .route("/api/tickets/:id/book", post(book_ticket::<S>))
        .route("/api/tickets/:id/cancel", post(cancel_ticket::<S>))
        .route(
            "/api/inventory",
            get(list_items::<S>).post(create_item::<S>),
        )
        .route("/api/inventory/:id", get(get_item::<S>))
        .route(
            "/api/inventory/:id/update-quantity",
            put(update_quantity::<S>),
        )
        .route("/api/inventory/:id/reduce", post(reduce_quantity::<S>))
        .with_state(engine)
}

/// Serve the API over HTTP at the given address (e.g. `"0.0.0.0:8080"`).
pub async fn serve<S: RecordStore + 'static>(
    engine: Engine<S>,
    addr: &str,
) -> Result<(), std::io::Error> {
    let app = router(engine);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app).await
}

/// An `OperationError` on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub OperationError);

impl From<OperationError> for ApiError {
    fn from(err: OperationError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        if err.is_server_error() {
            tracing::error!(error = %err, detail = ?err, "request failed");
        } else {
            tracing::warn!(error = %err, "request rejected");
        }

        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = json!({ "error": err.public_message() });
        (status, Json(body)).into_response()
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError(OperationError::InvalidArgument(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(OperationError::InvalidArgument(rejection.body_text()))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(OperationError::InvalidArgument(rejection.body_text()))
    }
}

/// Run an engine call on the blocking pool.
///
/// If this future is dropped before the call finishes (client disconnect),
/// the token passed to `f` is cancelled.
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&CancelToken) -> Result<T, OperationError> + Send + 'static,
{
    let cancel = CancelToken::new();
    let on_drop = cancel.drop_guard();
    let joined = tokio::task::spawn_blocking(move || f(&cancel)).await;
    on_drop.disarm();

    match joined {
        Ok(result) => result.map_err(ApiError::from),
        Err(e) => Err(ApiError(OperationError::Internal(format!(
            "engine task failed: {}",
            e
        )))),
    }
}

#[derive(Debug, Deserialize)]
struct NewQuantityParams {
    #[serde(rename = "newQuantity")]
    new_quantity: i64,
}

#[derive(Debug, Deserialize)]
struct AmountParams {
    amount: i64,
}

/// `GET /`: what this service demonstrates and where.
async fn home_handler() -> impl IntoResponse {
    Json(json!({
        "message": "Record locking strategy showcase",
        "description": "Demonstrates pessimistic and optimistic locking over a shared record store",
        "endpoints": {
            "GET /api/tickets": "List all tickets",
            "POST /api/tickets": "Create a new ticket",
            "GET /api/tickets/{id}": "Get ticket by ID",
            "POST /api/tickets/{id}/book": "Book a ticket (pessimistic locking)",
            "POST /api/tickets/{id}/cancel": "Cancel ticket booking",
            "GET /api/inventory": "List all inventory items",
            "POST /api/inventory": "Create a new inventory item",
            "GET /api/inventory/{id}": "Get inventory item by ID",
            "PUT /api/inventory/{id}/update-quantity?newQuantity=X": "Update quantity (optimistic locking)",
            "POST /api/inventory/{id}/reduce?amount=X": "Reduce quantity (optimistic locking)",
        },
        "lockingStrategies": {
            "Pessimistic Locking": "Used in ticket booking - prevents concurrent access by acquiring locks",
            "Optimistic Locking": "Used in inventory management - detects conflicts using version numbers",
        },
    }))
}

/// `GET /health`
async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "UP",
        "message": "Record locking demo is running",
    }))
}

async fn list_tickets<S: RecordStore + 'static>(
    State(engine): State<Engine<S>>,
) -> Result<Json<Vec<Versioned<Ticket>>>, ApiError> {
    run_blocking(move |_| engine.tickets().list()).await.map(Json)
}

async fn create_ticket<S: RecordStore + 'static>(
    State(engine): State<Engine<S>>,
    body: Result<Json<Ticket>, JsonRejection>,
) -> Result<Json<Versioned<Ticket>>, ApiError> {
    let Json(ticket) = body?;
    run_blocking(move |_| engine.tickets().create(ticket))
        .await
        .map(Json)
}

async fn get_ticket<S: RecordStore + 'static>(
    State(engine): State<Engine<S>>,
    path: Result<Path<RecordId>, PathRejection>,
) -> Result<Json<Versioned<Ticket>>, ApiError> {
    let Path(id) = path?;
    run_blocking(move |_| engine.tickets().get(id)).await.map(Json)
}

async fn book_ticket<S: RecordStore + 'static>(
    State(engine): State<Engine<S>>,
    path: Result<Path<RecordId>, PathRejection>,
) -> Result<Json<Versioned<Ticket>>, ApiError> {
    let Path(id) = path?;
    run_blocking(move |cancel| engine.tickets().book_with(id, cancel))
        .await
        .map(Json)
}

async fn cancel_ticket<S: RecordStore + 'static>(
    State(engine): State<Engine<S>>,
    path: Result<Path<RecordId>, PathRejection>,
) -> Result<Json<Versioned<Ticket>>, ApiError> {
    let Path(id) = path?;
    run_blocking(move |cancel| engine.tickets().cancel_booking_with(id, cancel))
        .await
        .map(Json)
}

async fn list_items<S: RecordStore + 'static>(
    State(engine): State<Engine<S>>,
) -> Result<Json<Vec<Versioned<InventoryItem>>>, ApiError> {
    run_blocking(move |_| engine.inventory().list())
        .await
        .map(Json)
}

async fn create_item<S: RecordStore + 'static>(
    State(engine): State<Engine<S>>,
    body: Result<Json<InventoryItem>, JsonRejection>,
) -> Result<Json<Versioned<InventoryItem>>, ApiError> {
    let Json(item) = body?;
    run_blocking(move |_| engine.inventory().create(item))
        .await
        .map(Json)
}

async fn get_item<S: RecordStore + 'static>(
    State(engine): State<Engine<S>>,
    path: Result<Path<RecordId>, PathRejection>,
) -> Result<Json<Versioned<InventoryItem>>, ApiError> {
    let Path(id) = path?;
    run_blocking(move |_| engine.inventory().get(id))
        .await
        .map(Json)
}

async fn update_quantity<S: RecordStore + 'static>(
    State(engine): State<Engine<S>>,
    path: Result<Path<RecordId>, PathRejection>,
    query: Result<Query<NewQuantityParams>, QueryRejection>,
) -> Result<Json<Versioned<InventoryItem>>, ApiError> {
    let Path(id) = path?;
    let Query(params) = query?;
    run_blocking(move |_| engine.inventory().update_quantity(id, params.new_quantity))
        .await
        .map(Json)
}

async fn reduce_quantity<S: RecordStore + 'static>(
    State(engine): State<Engine<S>>,
    path: Result<Path<RecordId>, PathRejection>,
    query: Result<Query<AmountParams>, QueryRejection>,
) -> Result<Json<Versioned<InventoryItem>>, ApiError> {
    let Path(id) = path?;
    let Query(params) = query?;
    run_blocking(move |_| engine.inventory().reduce_quantity(id, params.amount))
        .await
        .map(Json)
}

