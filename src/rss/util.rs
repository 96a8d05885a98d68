//! Text transforms shared by the RSS and HTML renderers.

use html_escape::encode_double_quoted_attribute;
use lazy_static::lazy_static;
use regex::Regex;

use super::types::{RssItem, TITLE_PREVIEW_CHARS};
use crate::entity::NormalizedEntity;

lazy_static! {
    static ref HASHTAG: Regex = Regex::new(r"#(\S+)").unwrap();
}

/// Returns the first hashtag from the text provided (None if none found)
///
/// 'So, #Víkarbyrgi and #Hamrabyrgi' -> Víkarbyrgi
pub fn first_hashtag(text: &str) -> Option<String> {
    let tag = HASHTAG
        .captures(text)?
        .get(1)?
        .as_str()
        .trim_end_matches(|c: char| c == ',' || c == '.');

    if tag.is_empty() {
        None
    } else {
        Some(tag.to_string())
    }
}

/// Wraps blank-line separated paragraphs in `<p>` tags.
///
/// "foo\n\nbar" -> "<p>foo</p>\n<p>bar</p>"
pub fn paragraphize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    format!("<p>{}</p>", text.replace("\n\n", "</p>\n<p>"))
}

/// `#hashtag` when the message has one, otherwise its first characters.
pub fn item_title(message: &str) -> String {
    match first_hashtag(message) {
        Some(tag) => format!("#{}", tag),
        None => {
            let preview: String = message.chars().take(TITLE_PREVIEW_CHARS).collect();
            format!("{}...", preview)
        }
    }
}

/// HTML body of an item: the picture (if any) followed by the paragraphs.
pub fn item_description(entity: &NormalizedEntity) -> String {
    let mut parts = Vec::new();

    if let Some(picture) = &entity.full_picture {
        parts.push(format!(
            "<p><img src=\"{}\" style=\"max-width: 500px; max-height: 500px\" class=\"fb-feed-image\"></p>",
            encode_double_quoted_attribute(picture)
        ));
    }

    let paragraphs = paragraphize(&entity.message);
    if !paragraphs.is_empty() {
        parts.push(paragraphs);
    }

    parts.join("\n")
}

/// Converts and formats the entity from the Facebook feed (FB post / Instagram media)
/// to the item for the RSS feed.
pub fn entity_to_rss_item(entity: &NormalizedEntity) -> RssItem {
    RssItem {
        title: item_title(&entity.message),
        link: entity.permalink_url.clone(),
        description: item_description(entity),
        published: Some(entity.created_time),
    }
}
