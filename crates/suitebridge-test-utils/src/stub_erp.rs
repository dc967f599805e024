//! A stub ERP SQL endpoint (`spec.md` §4.1, §8): scripted responses
//! consumed in request order so integration tests can assert pagination,
//! rate-limit back-pressure, and cache-hit/coalescing behavior without a
//! real ERP account.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::server::TestServerConfig;

/// One scripted answer to the next `/suiteql` POST. Consumed front-to-back;
/// once the script is empty every further request gets an empty page.
#[derive(Debug, Clone)]
pub enum StubResponse {
    Rows { items: Vec<Value>, has_more: bool },
    TooManyRequests,
    ServerError,
    Unauthorized,
}

impl StubResponse {
    /// A single, final page of rows.
    pub fn page(items: Vec<Value>) -> Self {
        Self::Rows { items, has_more: false }
    }
}

struct StubState {
    scripted: Mutex<VecDeque<StubResponse>>,
    request_count: AtomicUsize,
}

/// A running stub ERP server. Dropping this does not stop the listener —
/// the background task lives for the test binary's duration, and each
/// test should bind its own [`TestServerConfig`] port to avoid collisions.
pub struct StubErpServer {
    config: TestServerConfig,
    state: Arc<StubState>,
}

impl StubErpServer {
    /// Bind and start serving. Returns once the listener is bound; callers
    /// needing a strict readiness guarantee should follow with
    /// [`crate::server::wait_for_health`].
    pub async fn spawn(config: TestServerConfig, scripted: Vec<StubResponse>) -> Self {
        let state = Arc::new(StubState {
            scripted: Mutex::new(scripted.into()),
            request_count: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/health", get(health))
            .route("/suiteql", post(suiteql))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind(config.addr())
            .await
            .expect("failed to bind stub ERP listener");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub ERP server crashed");
        });

        Self { config, state }
    }

    pub fn base_url(&self) -> String {
        self.config.base_url()
    }

    /// The URL to hand to `ErpClient::with_query_url`.
    pub fn query_url(&self) -> String {
        format!("{}/suiteql", self.config.base_url())
    }

    pub fn request_count(&self) -> usize {
        self.state.request_count.load(Ordering::SeqCst)
    }

    /// Queue an additional response after construction, e.g. to script a
    /// cache-miss recomputation after an initial batch is exhausted.
    pub async fn push_response(&self, response: StubResponse) {
        self.state.scripted.lock().await.push_back(response);
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn suiteql(State(state): State<Arc<StubState>>) -> impl IntoResponse {
    state.request_count.fetch_add(1, Ordering::SeqCst);
    let next = state.scripted.lock().await.pop_front();
    match next {
        Some(StubResponse::Rows { items, has_more }) => {
            (StatusCode::OK, Json(json!({ "items": items, "hasMore": has_more }))).into_response()
        }
        Some(StubResponse::TooManyRequests) => StatusCode::TOO_MANY_REQUESTS.into_response(),
        Some(StubResponse::ServerError) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        Some(StubResponse::Unauthorized) => StatusCode::UNAUTHORIZED.into_response(),
        None => (StatusCode::OK, Json(json!({ "items": [], "hasMore": false }))).into_response(),
    }
}
