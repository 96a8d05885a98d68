use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::graph::RawItem;

/// A Facebook post or Instagram media item in the shape every renderer uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEntity {
    // Empty when the post only re-shares something or the media has no caption
    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub permalink_url: String,

    #[serde(default)]
    pub full_picture: Option<String>,

    #[serde(with = "record_time")]
    pub created_time: DateTime<Utc>,

    // Target of the l.facebook.com redirect of the first attachment
    #[serde(default)]
    pub outgoing_link: Option<String>,

    // Instagram only
    #[serde(default)]
    pub like_count: Option<i64>,
}

impl fmt::Display for NormalizedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview: String = self.message.chars().take(96).collect();
        write!(
            f,
            "{}... ({}) <{}>",
            preview,
            self.created_time.to_rfc3339(),
            self.permalink_url
        )
    }
}

/// Fields of a Facebook page post.
///
/// https://developers.facebook.com/docs/graph-api/reference/v2.0/post
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacebookPost {
    pub message: Option<String>,
    pub permalink_url: Option<String>,
    pub full_picture: Option<String>,
    pub created_time: Option<String>,
    // Kept untyped: the attachment shape varies and a bad one must not fail the post
    pub attachments: Option<Value>,
}

impl FacebookPost {
    pub fn from_raw(raw: &RawItem) -> Self {
        Self {
            message: string_field(raw, "message"),
            permalink_url: string_field(raw, "permalink_url"),
            full_picture: string_field(raw, "full_picture"),
            created_time: string_field(raw, "created_time"),
            attachments: raw.get("attachments").cloned(),
        }
    }
}

/// Fields of an Instagram media object.
///
/// https://developers.facebook.com/docs/instagram-api/reference/ig-media#fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstagramMedia {
    pub caption: Option<String>,
    pub permalink: Option<String>,
    pub media_url: Option<String>,
    pub timestamp: Option<String>,
    pub like_count: Option<i64>,
}

impl InstagramMedia {
    pub fn from_raw(raw: &RawItem) -> Self {
        Self {
            caption: string_field(raw, "caption"),
            permalink: string_field(raw, "permalink"),
            media_url: string_field(raw, "media_url"),
            timestamp: string_field(raw, "timestamp"),
            like_count: raw.get("like_count").and_then(Value::as_i64),
        }
    }
}

/// The upstream record a normalized entity is built from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceVariant {
    Facebook(FacebookPost),
    Instagram(InstagramMedia),
}

fn string_field(raw: &RawItem, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_string)
}

/// `created_time` as stored in NDJSON records, e.g. `2023-02-27 14:31:39`.
pub mod record_time {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&value, FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}
