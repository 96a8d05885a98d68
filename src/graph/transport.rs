//! HTTP transport used to talk to the Graph API.

use async_trait::async_trait;
use reqwest::header;
use tracing::debug;

use super::types::{HttpResponse, RequestParams, REQUEST_TIMEOUT, USER_AGENT};
use crate::error::{FeedError, Result};
use crate::TARGET_WEB_REQUEST;

/// Performs a single GET and hands back the status and body untouched.
///
/// Status checks belong to the caller, so a transport only fails when no
/// response could be obtained at all.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, params: &RequestParams) -> Result<HttpResponse>;
}

/// Create the HTTP client used for API requests
pub fn create_http_client() -> Result<reqwest::Client> {
    debug!(target: TARGET_WEB_REQUEST, "Creating Graph API HTTP client");

    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .gzip(true)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| FeedError::Request {
            endpoint: "<client>".to_string(),
            reason: format!("Failed to build HTTP client: {}", e),
        })
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: create_http_client()?,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, params: &RequestParams) -> Result<HttpResponse> {
        let request_failed = |e: reqwest::Error| FeedError::Request {
            endpoint: url.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .query(params)
            .send()
            .await
            .map_err(request_failed)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(request_failed)?;
        debug!(target: TARGET_WEB_REQUEST, "GET {} returned {} ({} bytes)", url, status, body.len());

        Ok(HttpResponse { status, body })
    }
}
