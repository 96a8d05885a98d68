use std::env;
use tracing::{info, warn};

use crate::error::{FeedError, Result};
use crate::graph::DEFAULT_API_URL;

pub const DEFAULT_PAGE: &str = "FarerskieKadry";
pub const DEFAULT_FEED_ITEMS_LIMIT: usize = 30;

/// Runtime settings read from the process environment (and `.env`, if present).
#[derive(Clone)]
pub struct Config {
    token: Option<String>,
    pub page: String,
    pub instagram_account: Option<String>,
    pub api_url: String,
    pub feed_items_limit: usize,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("token", &self.token.as_deref().map(mask_token))
            .field("page", &self.page)
            .field("instagram_account", &self.instagram_account)
            .field("api_url", &self.api_url)
            .field("feed_items_limit", &self.feed_items_limit)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            info!("Loaded environment from {}", path.display());
        }

        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Builds the configuration from any variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let feed_items_limit = match non_empty("FEED_ITEMS_LIMIT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(
                    "Invalid FEED_ITEMS_LIMIT {:?}, using {}",
                    raw, DEFAULT_FEED_ITEMS_LIMIT
                );
                DEFAULT_FEED_ITEMS_LIMIT
            }),
            None => DEFAULT_FEED_ITEMS_LIMIT,
        };

        Self {
            token: non_empty("FB_TOKEN"),
            page: non_empty("FB_PAGE").unwrap_or_else(|| DEFAULT_PAGE.to_string()),
            instagram_account: non_empty("IG_ACCOUNT_ID"),
            api_url: non_empty("GRAPH_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            feed_items_limit,
        }
    }

    /// The Graph API access token, required by every network command.
    pub fn token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .ok_or(FeedError::MissingConfig("FB_TOKEN"))
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }
}

/// Keeps just enough of a secret to tell tokens apart in the logs.
pub fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    if token.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}
