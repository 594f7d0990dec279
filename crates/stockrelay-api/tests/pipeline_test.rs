//! End-to-end tests: change source → listener → forwarder → HQ client →
//! mock HQ.

mod common;

use std::time::Duration;

use stockrelay_core::stock::StockChangeEvent;
use stockrelay_forwarding::ForwardingError;
use stockrelay_test_support::{ChannelChangeSource, MockHq, sample_event};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

const REFERENCE_PAYLOAD: &str = r#"{"id":"abc","product_id":1,"branch_id":1,"quantity":10,"reserved":0,"created_at":"2025-07-29T05:17:55.443242","updated_at":"2025-07-29T05:17:55.443242"}"#;

fn encoded(event: &StockChangeEvent) -> String {
    String::from_utf8(event.encode().unwrap()).unwrap()
}

/// Polls until HQ has seen `count` requests.
async fn wait_for_requests(hq: &MockHq, count: usize) {
    timeout(common::WAIT, async {
        while hq.requests().len() < count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("HQ did not receive the expected requests");
}

#[tokio::test]
async fn test_reference_payload_reaches_hq_unchanged() {
    let hq = MockHq::start().await;
    let (source, handle) = ChannelChangeSource::new();
    let (_listener, service) = common::build_pipeline(source, &hq);

    handle.send(REFERENCE_PAYLOAD);
    drop(handle);
    timeout(common::WAIT, service.run(CancellationToken::new()))
        .await
        .unwrap()
        .unwrap();

    let requests = hq.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].body, REFERENCE_PAYLOAD);
    assert_eq!(requests[0].authorization.as_deref(), Some(common::AUTH));
    assert_eq!(requests[0].content_type.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn test_hq_failure_does_not_block_later_events() {
    let hq = MockHq::with_statuses(&[200, 500, 200]).await;
    let (source, handle) = ChannelChangeSource::new();
    let (_listener, service) = common::build_pipeline(source, &hq);
    let events: Vec<_> = (1..=3).map(|i| sample_event(i, 4)).collect();

    for event in &events {
        handle.send(&encoded(event));
    }
    drop(handle);
    timeout(common::WAIT, service.run(CancellationToken::new()))
        .await
        .unwrap()
        .unwrap();

    let attempted: Vec<StockChangeEvent> = hq
        .requests()
        .iter()
        .map(|r| StockChangeEvent::decode(&r.body).unwrap())
        .collect();
    assert_eq!(attempted, events);
}

#[tokio::test]
async fn test_bad_and_empty_payloads_never_reach_hq() {
    let hq = MockHq::start().await;
    let (source, handle) = ChannelChangeSource::new();
    let (_listener, service) = common::build_pipeline(source, &hq);

    handle.send("invalid json");
    handle.send_empty();
    handle.send(r#"{"id":"abc","created_at":"soon","updated_at":"soon"}"#);
    handle.send("null");
    handle.send(&encoded(&sample_event(7, 2)));
    drop(handle);
    timeout(common::WAIT, service.run(CancellationToken::new()))
        .await
        .unwrap()
        .unwrap();

    let requests = hq.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        StockChangeEvent::decode(&requests[0].body).unwrap().product_id,
        7
    );
}

#[tokio::test]
async fn test_cancellation_stops_the_pipeline_cleanly() {
    let hq = MockHq::start().await;
    let (source, handle) = ChannelChangeSource::new();
    let (listener, service) = common::build_pipeline(source, &hq);
    let cancel = CancellationToken::new();

    let task = tokio::spawn({
        let cancel = cancel.clone();
        async move { service.run(cancel).await }
    });
    handle.send(&encoded(&sample_event(1, 1)));
    wait_for_requests(&hq, 1).await;

    cancel.cancel();
    let outcome = timeout(common::WAIT, task).await.unwrap().unwrap();
    assert!(outcome.is_ok());

    handle.send(&encoded(&sample_event(2, 1)));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(hq.requests().len(), 1);

    timeout(common::WAIT, listener.close())
        .await
        .unwrap()
        .unwrap();
    assert!(handle.was_closed());
}

#[tokio::test]
async fn test_subscription_failure_stops_before_any_send() {
    let hq = MockHq::start().await;
    let (source, handle) = ChannelChangeSource::new();
    let (_listener, service) =
        common::build_pipeline(source.with_subscribe_error("connection refused"), &hq);

    handle.send(REFERENCE_PAYLOAD);
    let err = service.run(CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, ForwardingError::Listen(_)));
    assert!(hq.requests().is_empty());
}
