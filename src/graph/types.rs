//! Type definitions for the Graph API module.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tokio::time::Duration;

/// A single feed entry exactly as the API returned it.
pub type RawItem = Map<String, Value>;

/// Query parameters sent with every request, including the access token.
pub type RequestParams = BTreeMap<String, String>;

/// Status and body of a finished HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One page of a paged Graph API listing.
#[derive(Debug, Deserialize)]
pub struct ApiPage {
    pub data: Vec<RawItem>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

impl ApiPage {
    /// Cursor of the next page, if the API announced one.
    pub fn next_cursor(&self) -> Option<&str> {
        self.paging
            .as_ref()
            .and_then(|paging| paging.cursors.as_ref())
            .and_then(|cursors| cursors.after.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub cursors: Option<Cursors>,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Cursors {
    #[serde(default)]
    pub before: Option<String>,
    #[serde(default)]
    pub after: Option<String>,
}

// Constants
pub const DEFAULT_API_URL: &str = "https://graph.facebook.com";
pub const API_VERSION: &str = "v17.0";
pub const USER_AGENT: &str = "graph-feed";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const AFTER_PARAM: &str = "after";
