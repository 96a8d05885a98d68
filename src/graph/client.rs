//! Graph API client: URL building, status checks and JSON decoding.

use serde_json::Value;
use tracing::{debug, error};

use super::transport::Transport;
use super::types::{ApiPage, RequestParams, DEFAULT_API_URL};
use crate::error::{FeedError, Result};
use crate::TARGET_WEB_REQUEST;

pub struct GraphClient<T> {
    transport: T,
    base_url: String,
}

impl<T: Transport> GraphClient<T> {
    pub fn new(transport: T) -> Self {
        Self::with_base_url(transport, DEFAULT_API_URL)
    }

    pub fn with_base_url(transport: T, base_url: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Absolute URL for an endpoint path such as `/v17.0/me/feed`.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Issue one GET and decode the body as JSON.
    ///
    /// Transport failures and non-2xx statuses both end up as
    /// `FeedError::Request`; a body that is not JSON is a malformed response.
    pub async fn make_request(&self, endpoint: &str, params: &RequestParams) -> Result<Value> {
        let url = self.endpoint_url(endpoint);

        let response = match self.transport.get(&url, params).await {
            Ok(response) => response,
            Err(err) => {
                error!(target: TARGET_WEB_REQUEST, "API request to {} failed: {}", endpoint, err);
                return Err(err);
            }
        };

        if !response.is_success() {
            error!(target: TARGET_WEB_REQUEST, "API response ({}): {}", response.status, response.body);
            return Err(FeedError::Request {
                endpoint: endpoint.to_string(),
                reason: format!("HTTP status {}", response.status),
            });
        }

        serde_json::from_str(&response.body).map_err(|e| FeedError::MalformedResponse {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }

    /// Fetch a single page of a paged listing.
    pub async fn fetch_page(&self, endpoint: &str, params: &RequestParams) -> Result<ApiPage> {
        let json = self.make_request(endpoint, params).await?;
        debug!(target: TARGET_WEB_REQUEST, "API response: {}", json);
        let paging = json.get("paging").unwrap_or(&Value::Null);
        debug!(target: TARGET_WEB_REQUEST, "API paging: {}", paging);

        serde_json::from_value(json).map_err(|e| FeedError::MalformedResponse {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::testing::MockTransport;
    use serde_json::json;

    fn params() -> RequestParams {
        RequestParams::from([("access_token".to_string(), "secret".to_string())])
    }

    #[test]
    fn test_endpoint_url_joins_slashes() {
        let client = GraphClient::with_base_url(MockTransport::new(), "https://example.test/");
        assert_eq!(
            client.endpoint_url("/v17.0/page/feed"),
            "https://example.test/v17.0/page/feed"
        );
        assert_eq!(
            client.endpoint_url("v17.0/page"),
            "https://example.test/v17.0/page"
        );
    }

    #[tokio::test]
    async fn test_make_request_rejects_error_status() {
        let transport = MockTransport::new().with_response(400, r#"{"error": {"message": "bad token"}}"#);
        let client = GraphClient::new(transport);

        let err = client.make_request("/v17.0/page", &params()).await.unwrap_err();
        assert!(matches!(err, FeedError::Request { .. }));
    }

    #[tokio::test]
    async fn test_make_request_passes_transport_errors_through() {
        let transport = MockTransport::new().with_failure("connection reset");
        let client = GraphClient::new(transport);

        let err = client.make_request("/v17.0/page", &params()).await.unwrap_err();
        assert!(matches!(err, FeedError::Request { .. }));
    }

    #[tokio::test]
    async fn test_fetch_page_requires_data_array() {
        let transport = MockTransport::new()
            .with_json(json!({"paging": {"cursors": {"after": "abc"}}}))
            .with_response(200, "<html>not json</html>")
            .with_json(json!({"data": "nope"}));
        let client = GraphClient::new(transport);

        for _ in 0..3 {
            let err = client.fetch_page("/v17.0/page/feed", &params()).await.unwrap_err();
            assert!(matches!(err, FeedError::MalformedResponse { .. }));
        }
    }

    #[tokio::test]
    async fn test_fetch_page_reads_cursor() {
        let transport = MockTransport::new().with_json(json!({
            "data": [{"id": "1"}],
            "paging": {"cursors": {"before": "xyz", "after": "abc"}, "next": "https://example.test/next"}
        }));
        let client = GraphClient::new(transport);

        let page = client.fetch_page("/v17.0/page/feed", &params()).await.unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.next_cursor(), Some("abc"));
        assert_eq!(client.transport().requests()[0].0, "https://graph.facebook.com/v17.0/page/feed");
    }
}
