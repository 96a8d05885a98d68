//! RSS output for normalized feed entities.
//!
//! This module handles deriving RSS items from entities and writing them out
//! as an RSS 2.0 document.

mod types;
mod util;
mod writer;

pub use self::types::*;
pub use self::util::*;
pub use self::writer::{write_feed, OpenFeed, RssFeedWriter};
