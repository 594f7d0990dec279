//! Shared test helpers for service integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use stockrelay_change_listener::StockListener;
use stockrelay_forwarding::ForwardingService;
use stockrelay_hq_client::{HqClient, HqSettings};
use stockrelay_test_support::{ChannelChangeSource, MockHq};
use tower::ServiceExt;

/// Authorization value the pipeline is configured with.
pub const AUTH: &str = "Basic dXNlcjpwYXNz";

/// Upper bound for anything a test waits on.
pub const WAIT: Duration = Duration::from_secs(2);

/// Build a forwarding service reading from `source` and posting to `hq`,
/// wired the same way as `app::run`.
pub fn build_pipeline(
    source: ChannelChangeSource,
    hq: &MockHq,
) -> (Arc<StockListener<ChannelChangeSource>>, ForwardingService) {
    let listener = Arc::new(StockListener::new(source));
    let client = Arc::new(HqClient::new(HqSettings {
        endpoint: hq.endpoint(),
        authorization: AUTH.to_owned(),
    }));
    let service = ForwardingService::new(listener.clone(), client);
    (listener, service)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
