use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::types::{FacebookPost, InstagramMedia, NormalizedEntity, SourceVariant};
use super::TARGET_ENTITY;
use crate::error::{FeedError, Result};
use crate::graph::RawItem;

/// Timestamps as returned by the Graph API, e.g. `2023-02-27T14:31:39+0000`.
pub const API_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S+0000";

/// Host Facebook routes outgoing attachment links through.
pub const REDIRECT_HOST: &str = "l.facebook.com";

/// Why no outgoing link could be read from a post's attachments.
///
/// Never leaves this module: every variant normalizes to `outgoing_link = None`.
#[derive(Debug, Error, PartialEq)]
enum AttachmentError {
    #[error("no attachment URL")]
    Missing,
    #[error("attachment URL {0:?} does not parse")]
    InvalidUrl(String),
    #[error("attachment URL host {0:?} is not the redirect host")]
    NotRedirect(String),
    #[error("redirect URL carries no target")]
    MissingTarget,
}

/// Normalize a record of either source into the common entity shape.
///
/// Only an unparsable `created_time` fails; missing optional fields and broken
/// attachment structures are absorbed.
pub fn normalize(source: SourceVariant) -> Result<NormalizedEntity> {
    match source {
        SourceVariant::Facebook(post) => {
            let outgoing_link = match extract_outgoing_link(post.attachments.as_ref()) {
                Ok(link) => Some(link),
                Err(err) => {
                    debug!(target: TARGET_ENTITY, "No outgoing link for {:?}: {}", post.permalink_url, err);
                    None
                }
            };

            Ok(NormalizedEntity {
                message: post.message.unwrap_or_default(),
                permalink_url: post.permalink_url.unwrap_or_default(),
                full_picture: post.full_picture,
                created_time: parse_created_time(post.created_time.as_deref())?,
                outgoing_link,
                like_count: None,
            })
        }
        SourceVariant::Instagram(media) => Ok(NormalizedEntity {
            message: media.caption.unwrap_or_default(),
            permalink_url: media.permalink.unwrap_or_default(),
            full_picture: media.media_url,
            created_time: parse_created_time(media.timestamp.as_deref())?,
            outgoing_link: None,
            like_count: media.like_count,
        }),
    }
}

pub fn normalize_facebook_post(raw: &RawItem) -> Result<NormalizedEntity> {
    normalize(SourceVariant::Facebook(FacebookPost::from_raw(raw)))
}

pub fn normalize_instagram_media(raw: &RawItem) -> Result<NormalizedEntity> {
    normalize(SourceVariant::Instagram(InstagramMedia::from_raw(raw)))
}

/// Parse an API timestamp with the literal `+0000` suffix into a UTC instant.
pub fn parse_created_time(value: Option<&str>) -> Result<DateTime<Utc>> {
    let value = value.ok_or_else(|| FeedError::TimeParse {
        value: String::new(),
        reason: "timestamp is missing".to_string(),
    })?;

    NaiveDateTime::parse_from_str(value, API_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| FeedError::TimeParse {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

// 'attachments': {'data': [{'url': 'https://l.facebook.com/l.php?u=https%3A%2F%2F...'}]}
fn extract_outgoing_link(attachments: Option<&Value>) -> std::result::Result<String, AttachmentError> {
    let link = attachments
        .and_then(|attachments| attachments.get("data"))
        .and_then(|data| data.get(0))
        .and_then(|first| first.get("url"))
        .and_then(Value::as_str)
        .ok_or(AttachmentError::Missing)?;

    let parsed = Url::parse(link).map_err(|_| AttachmentError::InvalidUrl(link.to_string()))?;

    match parsed.host_str() {
        Some(REDIRECT_HOST) => {}
        host => return Err(AttachmentError::NotRedirect(host.unwrap_or_default().to_string())),
    }

    parsed
        .query_pairs()
        .find(|(key, _)| key == "u")
        .map(|(_, target)| target.into_owned())
        .ok_or(AttachmentError::MissingTarget)
}
