//! HTTP implementation of the `StockSink` trait.

use std::fmt;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use stockrelay_core::error::SendError;
use stockrelay_core::sink::StockSink;
use stockrelay_core::stock::StockChangeEvent;
use tracing::info;

/// Where and how to reach HQ.
#[derive(Clone)]
pub struct HqSettings {
    /// Full URL of the stock collector endpoint.
    pub endpoint: String,
    /// Static `Authorization` header value, e.g. `Basic dXNlcjpwYXNz`.
    pub authorization: String,
}

impl fmt::Debug for HqSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HqSettings")
            .field("endpoint", &self.endpoint)
            .field("authorization", &"<redacted>")
            .finish()
    }
}

/// Posts stock change events to the HQ endpoint.
///
/// The underlying `reqwest::Client` is reused across sends. No request
/// timeout is configured.
#[derive(Clone)]
pub struct HqClient {
    settings: HqSettings,
    http: reqwest::Client,
}

impl HqClient {
    /// Creates a client with a default `reqwest::Client`.
    #[must_use]
    pub fn new(settings: HqSettings) -> Self {
        Self::with_client(settings, reqwest::Client::new())
    }

    /// Creates a client over an existing `reqwest::Client`.
    #[must_use]
    pub fn with_client(settings: HqSettings, http: reqwest::Client) -> Self {
        Self { settings, http }
    }

    /// The configured endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.settings.endpoint
    }
}

impl fmt::Debug for HqClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HqClient")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl StockSink for HqClient {
    async fn send(&self, event: &StockChangeEvent) -> Result<(), SendError> {
        let body = event.encode()?;

        info!(
            endpoint = %self.settings.endpoint,
            product_id = event.product_id,
            branch_id = event.branch_id,
            "Sending stock update to HQ"
        );

        let response = self
            .http
            .post(&self.settings.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, &self.settings.authorization)
            .body(body)
            .send()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(SendError::HttpStatus(status));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use stockrelay_core::error::SendError;
    use stockrelay_core::sink::StockSink;
    use stockrelay_core::stock::StockChangeEvent;
    use stockrelay_test_support::{MockHq, sample_event};

    use super::{HqClient, HqSettings};

    const AUTH: &str = "Basic dXNlcjpwYXNz";

    fn client_for(endpoint: String) -> HqClient {
        HqClient::new(HqSettings {
            endpoint,
            authorization: AUTH.to_owned(),
        })
    }

    #[tokio::test]
    async fn test_send_posts_canonical_json_with_headers() {
        let hq = MockHq::start().await;
        let client = client_for(hq.endpoint());
        let event = sample_event(1, 1);

        client.send(&event).await.unwrap();

        let requests = hq.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.authorization.as_deref(), Some(AUTH));
        assert_eq!(request.content_type.as_deref(), Some("application/json"));
        assert_eq!(
            request.body,
            r#"{"id":"stock-1-1","product_id":1,"branch_id":1,"quantity":10,"reserved":0,"created_at":"2025-07-29T05:17:55.443242","updated_at":"2025-07-29T05:17:55.443242"}"#
        );
        assert_eq!(StockChangeEvent::decode(&request.body).unwrap(), event);
    }

    #[tokio::test]
    async fn test_server_error_is_http_status_error() {
        let hq = MockHq::with_statuses(&[500]).await;
        let client = client_for(hq.endpoint());

        let err = client.send(&sample_event(1, 1)).await.unwrap_err();

        assert!(matches!(err, SendError::HttpStatus(500)));
        assert_eq!(hq.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_client_error_is_http_status_error() {
        let hq = MockHq::with_statuses(&[401]).await;
        let client = client_for(hq.endpoint());

        let err = client.send(&sample_event(1, 1)).await.unwrap_err();

        assert!(matches!(err, SendError::HttpStatus(401)));
    }

    #[tokio::test]
    async fn test_non_error_statuses_are_success() {
        let hq = MockHq::with_statuses(&[201, 204, 304]).await;
        let client = client_for(hq.endpoint());

        for product_id in 1..=3 {
            client.send(&sample_event(product_id, 1)).await.unwrap();
        }

        assert_eq!(hq.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = client_for(format!("http://{addr}/stock"));

        let err = client.send(&sample_event(1, 1)).await.unwrap_err();

        assert!(matches!(err, SendError::Transport(_)));
    }

    #[tokio::test]
    async fn test_failed_send_is_not_retried() {
        let hq = MockHq::with_statuses(&[503]).await;
        let client = client_for(hq.endpoint());

        let _ = client.send(&sample_event(1, 1)).await;

        assert_eq!(hq.requests().len(), 1);
    }

    #[test]
    fn test_debug_output_redacts_authorization() {
        let client = client_for("http://hq.example/stock".to_owned());

        let rendered = format!("{client:?}");

        assert!(rendered.contains("hq.example"));
        assert!(!rendered.contains(AUTH));
        assert_eq!(client.endpoint(), "http://hq.example/stock");
    }
}
