//! Fake Kowalski query API for integration tests.
//!
//! Spins up a minimal `axum` HTTP server on a random TCP port bound to
//! 127.0.0.1. Serves `POST /api/queries`, answering each JSON document with a
//! scripted `(status, body)` after an optional per-document delay, and
//! records the bearer token and body of every request.
//!
//! Production instances speak HTTPS on 443; point an
//! [`Endpoint`](scope::Endpoint) at [`FakeKowalski::endpoint`] instead.
//!
//! # Example
//!
//! ```rust,no_run
//! let api = FakeKowalski::start(|_| (StatusCode::OK, r#"{"status":"success","data":[]}"#.into())).await?;
//! let kowalski = Kowalski::new(vec![api.endpoint("gloria", "token")], Duration::from_secs(5))?;
//! ```

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use scope::Endpoint;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

type Reply = Box<dyn Fn(&Value) -> (StatusCode, String) + Send + Sync>;
type Delay = Box<dyn Fn(&Value) -> Duration + Send + Sync>;

/// One request as the server saw it.
#[derive(Debug, Clone)]
pub struct Received {
    pub authorization: Option<String>,
    pub body: Value,
}

struct ApiState {
    reply: Reply,
    delay: Option<Delay>,
    requests: Mutex<Vec<Received>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Handle to the running fake Kowalski server.
pub struct FakeKowalski {
    addr: SocketAddr,
    state: Arc<ApiState>,
}

impl FakeKowalski {
    /// Start the server on a random port. Returns once it is listening.
    pub async fn start(
        reply: impl Fn(&Value) -> (StatusCode, String) + Send + Sync + 'static,
    ) -> std::io::Result<Self> {
        Self::start_with_delay(reply, None).await
    }

    pub async fn start_delayed(
        reply: impl Fn(&Value) -> (StatusCode, String) + Send + Sync + 'static,
        delay: impl Fn(&Value) -> Duration + Send + Sync + 'static,
    ) -> std::io::Result<Self> {
        Self::start_with_delay(reply, Some(Box::new(delay))).await
    }

    async fn start_with_delay(
        reply: impl Fn(&Value) -> (StatusCode, String) + Send + Sync + 'static,
        delay: Option<Delay>,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(ApiState {
            reply: Box::new(reply),
            delay,
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/api/queries", post(handle_query))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the task a moment to register.
        tokio::time::sleep(Duration::from_millis(5)).await;

        Ok(Self { addr, state })
    }

    /// Plain-HTTP endpoint pointing at this server.
    pub fn endpoint(&self, name: &str, token: &str) -> Endpoint {
        Endpoint {
            name: name.to_string(),
            protocol: "http".to_string(),
            host: self.addr.ip().to_string(),
            port: self.addr.port(),
            token: token.to_string(),
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub async fn requests(&self) -> Vec<Received> {
        self.state.requests.lock().await.clone()
    }

    /// Highest number of requests that were being served at once.
    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }
}

/// `(200, body)` for a JSON envelope.
pub fn ok_json(body: Value) -> (StatusCode, String) {
    (StatusCode::OK, body.to_string())
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

async fn handle_query(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.max_in_flight.fetch_max(now, Ordering::SeqCst);

    let authorization = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.requests.lock().await.push(Received {
        authorization,
        body: body.clone(),
    });

    if let Some(delay) = &state.delay {
        tokio::time::sleep(delay(&body)).await;
    }
    let reply = (state.reply)(&body);

    state.in_flight.fetch_sub(1, Ordering::SeqCst);
    reply
}
