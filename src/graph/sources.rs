//! Facebook page feeds and Instagram media listings built on the pager.

use futures::stream::{Stream, StreamExt};
use serde_json::Value;
use tracing::info;

use super::client::GraphClient;
use super::transport::Transport;
use super::types::{RequestParams, API_VERSION};
use crate::entity::{normalize_facebook_post, normalize_instagram_media, NormalizedEntity};
use crate::error::Result;
use crate::TARGET_WEB_REQUEST;

const FACEBOOK_POST_FIELDS: &[&str] = &[
    "full_picture",
    "message",
    "created_time",
    "shares",
    "permalink_url",
    "attachments{url}",
];

// https://developers.facebook.com/docs/instagram-api/reference/ig-user/media#reading
const INSTAGRAM_MEDIA_FIELDS: &[&str] = &[
    "caption",
    "media_url",
    "timestamp",
    "thumbnail_url",
    "shortcode",
    "permalink",
    "like_count",
];

// https://developers.facebook.com/docs/instagram-api/reference/ig-user/
const PAGE_ACCOUNT_FIELDS: &[&str] = &[
    "connected_instagram_account{id,name,biography}",
    "instagram_accounts{username,id,followed_by_count,media_count,profile_pic}",
    "name",
    "about",
];

fn request_params(fields: &[&str], token: &str) -> RequestParams {
    RequestParams::from([
        ("fields".to_string(), fields.join(",")),
        ("access_token".to_string(), token.to_string()),
    ])
}

/// All posts of a Facebook page, newest first.
pub fn facebook_feed<'a, T: Transport>(
    client: &'a GraphClient<T>,
    page: &str,
    token: &str,
) -> impl Stream<Item = Result<NormalizedEntity>> + 'a {
    info!(target: TARGET_WEB_REQUEST, "Getting the \"{}\" FB feed ...", page);

    client
        .iterate_api_responses(
            &format!("/{}/{}/feed", API_VERSION, page),
            request_params(FACEBOOK_POST_FIELDS, token),
        )
        .map(|item| item.and_then(|raw| normalize_facebook_post(&raw)))
}

/// All media of an Instagram business account, newest first.
pub fn instagram_feed<'a, T: Transport>(
    client: &'a GraphClient<T>,
    account_id: &str,
    token: &str,
) -> impl Stream<Item = Result<NormalizedEntity>> + 'a {
    info!(target: TARGET_WEB_REQUEST, "Getting the \"{}\" Instagram feed ...", account_id);

    client
        .iterate_api_responses(
            &format!("/{}/{}/media", API_VERSION, account_id),
            request_params(INSTAGRAM_MEDIA_FIELDS, token),
        )
        .map(|item| item.and_then(|raw| normalize_instagram_media(&raw)))
}

/// Id of the Instagram account connected to a Facebook page, if there is one.
///
/// https://developers.facebook.com/docs/instagram-api/getting-started#before-you-start
pub async fn instagram_account_for_page<T: Transport>(
    client: &GraphClient<T>,
    page: &str,
    token: &str,
) -> Result<Option<String>> {
    let response = client
        .make_request(
            &format!("/{}/{}", API_VERSION, page),
            &request_params(PAGE_ACCOUNT_FIELDS, token),
        )
        .await?;

    let accounts = response.get("instagram_accounts").unwrap_or(&Value::Null);
    let connected = response.get("connected_instagram_account").unwrap_or(&Value::Null);
    info!(
        target: TARGET_WEB_REQUEST,
        "Found IG account for {}: {}, connected one: {}",
        page,
        accounts,
        connected
    );

    Ok(response
        .get("connected_instagram_account")
        .and_then(|account| account.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedError;
    use crate::graph::testing::MockTransport;
    use futures::TryStreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_facebook_feed_requests_post_fields() {
        let transport = MockTransport::new().with_json(json!({
            "data": [{
                "message": "Mykines #Mykineshólmur",
                "permalink_url": "https://www.facebook.com/FarerskieKadry/posts/1",
                "created_time": "2023-02-27T14:31:39+0000",
                "attachments": {"data": [{"url": "https://l.facebook.com/l.php?u=https%3A%2F%2Fexample.com%2F"}]}
            }]
        }));
        let client = GraphClient::new(transport);

        let entities: Vec<NormalizedEntity> = facebook_feed(&client, "FarerskieKadry", "secret")
            .try_collect()
            .await
            .unwrap();

        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].outgoing_link.as_deref(), Some("https://example.com/"));

        let requests = client.transport().requests();
        assert_eq!(requests[0].0, "https://graph.facebook.com/v17.0/FarerskieKadry/feed");
        assert_eq!(
            requests[0].1.get("fields").map(String::as_str),
            Some("full_picture,message,created_time,shares,permalink_url,attachments{url}")
        );
        assert_eq!(requests[0].1.get("access_token").map(String::as_str), Some("secret"));
    }

    #[tokio::test]
    async fn test_instagram_feed_surfaces_bad_timestamps() {
        let transport = MockTransport::new().with_json(json!({
            "data": [
                {"caption": "ok", "timestamp": "2023-03-28T21:37:58+0000"},
                {"caption": "broken", "timestamp": "28.03.2023"}
            ]
        }));
        let client = GraphClient::new(transport);

        let results: Vec<Result<NormalizedEntity>> =
            instagram_feed(&client, "17841407952879412", "secret").collect().await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().message, "ok");
        assert!(matches!(results[1], Err(FeedError::TimeParse { .. })));
        assert_eq!(
            client.transport().requests()[0].0,
            "https://graph.facebook.com/v17.0/17841407952879412/media"
        );
    }

    #[tokio::test]
    async fn test_instagram_account_for_page() {
        let transport = MockTransport::new()
            .with_json(json!({
                "name": "Farerskie Kadry",
                "connected_instagram_account": {"id": "17841407952879412", "name": "farerskie.kadry"},
                "id": "123"
            }))
            .with_json(json!({"name": "No Instagram", "id": "456"}));
        let client = GraphClient::new(transport);

        assert_eq!(
            instagram_account_for_page(&client, "FarerskieKadry", "secret").await.unwrap(),
            Some("17841407952879412".to_string())
        );
        assert_eq!(
            instagram_account_for_page(&client, "Other", "secret").await.unwrap(),
            None
        );
    }
}
