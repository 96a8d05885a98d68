//! In-memory transport replaying canned responses.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::transport::Transport;
use super::types::{HttpResponse, RequestParams};
use crate::error::{FeedError, Result};

#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<HttpResponse>>>,
    requests: Mutex<Vec<(String, RequestParams)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, status: u16, body: &str) -> Self {
        self.responses.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }));
        self
    }

    pub fn with_json(self, body: Value) -> Self {
        self.with_response(200, &body.to_string())
    }

    pub fn with_failure(self, reason: &str) -> Self {
        self.responses.lock().unwrap().push_back(Err(FeedError::Request {
            endpoint: "mock".to_string(),
            reason: reason.to_string(),
        }));
        self
    }

    /// Every (url, params) pair requested so far, in order.
    pub fn requests(&self) -> Vec<(String, RequestParams)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str, params: &RequestParams) -> Result<HttpResponse> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), params.clone()));

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected request to {}", url))
    }
}
