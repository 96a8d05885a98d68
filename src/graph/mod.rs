//! Graph API access for Facebook pages and Instagram accounts.
//!
//! This module handles the HTTP transport, paged listings and the per-source
//! feed helpers built on top of them.

mod client;
mod pager;
pub mod sources;
#[cfg(test)]
pub(crate) mod testing;
mod transport;
mod types;

pub use self::client::GraphClient;
pub use self::sources::{facebook_feed, instagram_account_for_page, instagram_feed};
pub use self::transport::{create_http_client, ReqwestTransport, Transport};
pub use self::types::*;
