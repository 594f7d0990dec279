//! In-process stand-in for the HQ collector.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::post;

/// One request as seen by [`MockHq`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// Value of the `Authorization` header, if any.
    pub authorization: Option<String>,
    /// Value of the `Content-Type` header, if any.
    pub content_type: Option<String>,
    /// Raw request body.
    pub body: String,
}

#[derive(Debug, Clone, Default)]
struct MockHqState {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    statuses: Arc<Mutex<VecDeque<StatusCode>>>,
}

/// An HTTP server on `127.0.0.1` that accepts `POST /stock`, records each
/// request, and answers with scripted statuses (200 once the script runs
/// out).
#[derive(Debug)]
pub struct MockHq {
    addr: SocketAddr,
    state: MockHqState,
}

impl MockHq {
    /// Start a server that answers every request with 200.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        Self::with_statuses(&[]).await
    }

    /// Start a server that answers the first requests with `statuses`, in
    /// order, and every later request with 200.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound or a status code is invalid.
    pub async fn with_statuses(statuses: &[u16]) -> Self {
        let state = MockHqState {
            requests: Arc::default(),
            statuses: Arc::new(Mutex::new(
                statuses
                    .iter()
                    .map(|code| StatusCode::from_u16(*code).expect("valid status code"))
                    .collect(),
            )),
        };

        let app = Router::new()
            .route("/stock", post(record))
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock HQ listener");
        let addr = listener.local_addr().expect("mock HQ local address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    /// URL of the stock endpoint.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("http://{}/stock", self.addr)
    }

    /// Returns a snapshot of every request received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

async fn record(State(state): State<MockHqState>, headers: HeaderMap, body: String) -> StatusCode {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    };
    state.requests.lock().unwrap().push(CapturedRequest {
        authorization: header_value(header::AUTHORIZATION),
        content_type: header_value(header::CONTENT_TYPE),
        body,
    });
    state
        .statuses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or(StatusCode::OK)
}
