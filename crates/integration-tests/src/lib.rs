//! Integration tests for the Pick'n'Go cart.
//!
//! The tests drive the real [`RestClient`] and [`CartView`] against an
//! in-process `axum` server that mimics the backend's `carts` and
//! `transactions` collections. No external services are needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pickngo-integration-tests
//! ```
//!
//! # Mock Backend
//!
//! - `GET /api/carts?filters[user_name][$eq]=..&_limit=..` - List rows for a user
//! - `DELETE /api/carts/{id}` - Delete one row
//! - `POST /api/transactions` - Record one purchase
//!
//! Failures can be injected per product name (transactions), per id
//! (deletes) or for every list, and list responses can be delayed to overlap
//! loads. Created transactions can be acknowledged without a numeric id.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{HashMap, HashSet, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use pickngo_cart::{CartConfig, CartView, CurrentUser, RestClient};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Query key the client uses to filter carts by owner.
pub const USER_FILTER: &str = "filters[user_name][$eq]";

/// A cart row as the backend stores it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartRow {
    pub id: i64,
    pub product_name: String,
    pub price: f64,
    pub quantity: u32,
    pub user_name: String,
    pub branch_name: String,
}

impl CartRow {
    pub fn new(id: i64, product_name: &str, price: f64, quantity: u32, user_name: &str) -> Self {
        Self {
            id,
            product_name: product_name.to_string(),
            price,
            quantity,
            user_name: user_name.to_string(),
            branch_name: "Main".to_string(),
        }
    }

    #[must_use]
    pub fn at_branch(mut self, branch_name: &str) -> Self {
        self.branch_name = branch_name.to_string();
        self
    }
}

/// One request the mock received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
}

#[derive(Default)]
struct MockState {
    carts: Vec<CartRow>,
    transactions: Vec<Value>,
    requests: Vec<RecordedRequest>,
    failing_products: HashSet<String>,
    failing_deletes: HashSet<i64>,
    lists_unavailable: bool,
    document_id_replies: bool,
    list_delays: VecDeque<Duration>,
}

/// Shared state of the mock backend; clones see the same data.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    #[must_use]
    pub fn with_carts(rows: Vec<CartRow>) -> Self {
        let backend = Self::default();
        backend.lock().carts = rows;
        backend
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rows currently stored.
    #[must_use]
    pub fn carts(&self) -> Vec<CartRow> {
        self.lock().carts.clone()
    }

    pub fn insert_cart(&self, row: CartRow) {
        self.lock().carts.push(row);
    }

    /// Transaction bodies received, as posted (the `data` payload).
    #[must_use]
    pub fn transactions(&self) -> Vec<Value> {
        self.lock().transactions.clone()
    }

    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Reject transactions for `product_name` with a 400.
    pub fn fail_transactions_for(&self, product_name: &str) {
        self.lock().failing_products.insert(product_name.to_string());
    }

    /// Answer deletes of `id` with a 500.
    pub fn fail_delete(&self, id: i64) {
        self.lock().failing_deletes.insert(id);
    }

    /// Acknowledge created transactions with only a string `documentId`.
    pub fn reply_with_document_ids(&self, enabled: bool) {
        self.lock().document_id_replies = enabled;
    }

    /// Answer list requests with a 503 while `unavailable` is set.
    pub fn set_lists_unavailable(&self, unavailable: bool) {
        self.lock().lists_unavailable = unavailable;
    }

    /// Delay the next list response by `delay`.
    pub fn delay_next_list(&self, delay: Duration) {
        self.lock().list_delays.push_back(delay);
    }

    fn record(&self, method: Method, path: String, query: HashMap<String, String>) {
        self.lock().requests.push(RecordedRequest {
            method,
            path,
            query,
        });
    }

    /// Routes served under `/api`.
    pub fn router(&self) -> Router {
        let api = Router::new()
            .route("/carts", get(list_carts))
            .route("/carts/{id}", delete(delete_cart))
            .route("/transactions", post(create_transaction));

        Router::new().nest("/api", api).with_state(self.clone())
    }

    /// Serve on an ephemeral local port.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn spawn(self) -> std::io::Result<TestServer> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = self.router();

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(TestServer {
            addr,
            backend: self,
            handle,
        })
    }
}

/// A running mock backend. The server stops when this is dropped.
pub struct TestServer {
    pub addr: SocketAddr,
    pub backend: MockBackend,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// API root, e.g. `http://127.0.0.1:40000/api`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Client configuration pointing at this server.
    ///
    /// # Panics
    ///
    /// Panics if the generated base URL is rejected.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn config(&self) -> CartConfig {
        CartConfig::for_base_url(&self.base_url()).expect("mock base URL is valid")
    }

    /// Client for this server.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn client(&self) -> RestClient {
        RestClient::new(&self.config()).expect("client builds")
    }

    /// A view for `user`, wired to this server for both resources.
    ///
    /// # Panics
    ///
    /// Panics if `user` is not a valid user name.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn view(&self, user: &str) -> CartView<RestClient, RestClient> {
        let client = self.client();
        CartView::new(
            CurrentUser::from_name(user).expect("valid user name"),
            client.clone(),
            client,
        )
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Base URL of a port nothing listens on; requests fail at the transport.
///
/// # Errors
///
/// Returns an error if a probe listener cannot be bound.
pub async fn unreachable_base_url() -> std::io::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{addr}/api"))
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_carts(
    State(backend): State<MockBackend>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    backend.record(Method::GET, "/api/carts".to_string(), query.clone());

    if backend.lock().lists_unavailable {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable");
    }

    let delay = backend.lock().list_delays.pop_front();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let limit = query
        .get("_limit")
        .and_then(|raw| raw.parse::<usize>().ok())
        .unwrap_or(usize::MAX);

    let rows: Vec<CartRow> = backend
        .lock()
        .carts
        .iter()
        .filter(|row| {
            query
                .get(USER_FILTER)
                .is_none_or(|user| &row.user_name == user)
        })
        .take(limit)
        .cloned()
        .collect();

    Json(json!({ "data": rows })).into_response()
}

async fn delete_cart(State(backend): State<MockBackend>, Path(id): Path<i64>) -> Response {
    backend.record(Method::DELETE, format!("/api/carts/{id}"), HashMap::new());

    let mut state = backend.lock();
    if state.failing_deletes.contains(&id) {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "delete failed");
    }

    match state.carts.iter().position(|row| row.id == id) {
        Some(index) => {
            let row = state.carts.remove(index);
            Json(json!({ "data": row })).into_response()
        }
        None => error_response(StatusCode::NOT_FOUND, "Not Found"),
    }
}

async fn create_transaction(
    State(backend): State<MockBackend>,
    Json(body): Json<Value>,
) -> Response {
    backend.record(Method::POST, "/api/transactions".to_string(), HashMap::new());

    let Some(data) = body.get("data").cloned() else {
        return error_response(StatusCode::BAD_REQUEST, "missing data envelope");
    };

    let product = data
        .get("product_name")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let mut state = backend.lock();
    if state.failing_products.contains(product) {
        return error_response(StatusCode::BAD_REQUEST, "ValidationError");
    }

    state.transactions.push(data.clone());
    let id = state.transactions.len();

    if state.document_id_replies {
        return Json(json!({ "data": { "documentId": format!("doc-{id}") } })).into_response();
    }

    let mut created = data;
    if let Some(fields) = created.as_object_mut() {
        fields.insert("id".to_string(), json!(id));
    }
    Json(json!({ "data": created })).into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({
            "data": null,
            "error": { "status": status.as_u16(), "message": message }
        })),
    )
        .into_response()
}
