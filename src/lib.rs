pub mod digest;
pub mod entity;
pub mod environment;
pub mod error;
pub mod export;
pub mod graph;
pub mod logging;
pub mod rss;
pub mod store;

pub use error::{FeedError, Result};

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_RENDER: &str = "render";
pub const TARGET_STORE: &str = "store";
