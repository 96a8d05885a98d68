//! Type definitions for the RSS module.

use chrono::{DateTime, Utc};
use std::fmt;

/// Channel-level metadata written into the feed header.
#[derive(Debug, Clone)]
pub struct ChannelInfo {
    pub title: String,
    pub link: String,
    pub description: Option<String>,
}

/// An item that can be added to the RSS feed
#[derive(Debug, Clone, PartialEq)]
pub struct RssItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub published: Option<DateTime<Utc>>,
}

impl fmt::Display for RssItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.title, self.link)
    }
}

/// Lifecycle of an `RssFeedWriter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    NotStarted,
    HeaderWritten,
    FooterWritten,
}

impl fmt::Display for WriterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl WriterState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriterState::NotStarted => "not started",
            WriterState::HeaderWritten => "open",
            WriterState::FooterWritten => "closed",
        }
    }
}

// Constants
pub const RSS_GENERATOR: &str = "graph-feed";
pub const TITLE_PREVIEW_CHARS: usize = 32;
