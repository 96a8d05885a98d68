//! HTML digest of a travel-diary campaign.
//!
//! Builds a blog-post fragment out of the entries tagged with a marker hashtag
//! during a date range: one `<h2>` per day, the picture floated alternately
//! right and left, the text split into paragraphs and a dated link back to the
//! original post.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use html_escape::{encode_quoted_attribute, encode_text};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::entity::NormalizedEntity;
use crate::TARGET_RENDER;

lazy_static! {
    static ref LINE_BREAKS: Regex = Regex::new(r"\n+").unwrap();
    static ref DAY_HEADER: Regex = anchored(DEFAULT_DAY_HEADER).unwrap();
}

/// Matches the "Dzień N" header opening each diary entry.
pub const DEFAULT_DAY_HEADER: &str = r"Dzień [\d i]+.";
pub const DEFAULT_FALLBACK_HEADER: &str = "Dzień N";
pub const DEFAULT_PLACEHOLDER_IMAGE: &str = "/fb.png";
pub const DEFAULT_IMAGE_ALT: &str = "Dziennik z podróży";
pub const DEFAULT_LINK_LABEL: &str = "Notka z";

/// Which entries make it into the digest.
#[derive(Debug, Clone)]
pub struct DigestFilter {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Hashtag without the leading `#`.
    pub marker: String,
}

impl DigestFilter {
    pub fn matches(&self, entity: &NormalizedEntity) -> bool {
        let day = entity.created_time.date_naive();
        self.from <= day && day <= self.to && entity.message.contains(&self.marker)
    }
}

/// Presentation settings of the digest.
#[derive(Debug, Clone)]
pub struct DigestConfig {
    /// Anchored at the start of the message.
    pub day_header: Regex,
    pub fallback_header: String,
    /// Month number (1-12) to the genitive month name used in dates.
    pub month_names: BTreeMap<u32, String>,
    /// Re-hosted picture URL; `{n}` becomes the two-digit entry position.
    pub image_template: Option<String>,
    /// Pictures whose URL contains this are placeholders and get skipped.
    pub placeholder_image: String,
    pub image_alt: String,
    pub link_label: String,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            day_header: DAY_HEADER.clone(),
            fallback_header: DEFAULT_FALLBACK_HEADER.to_string(),
            month_names: BTreeMap::from([
                (7, "lipca".to_string()),
                (8, "sierpnia".to_string()),
            ]),
            image_template: None,
            placeholder_image: DEFAULT_PLACEHOLDER_IMAGE.to_string(),
            image_alt: DEFAULT_IMAGE_ALT.to_string(),
            link_label: DEFAULT_LINK_LABEL.to_string(),
        }
    }
}

impl DigestConfig {
    pub fn with_day_header(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.day_header = anchored(pattern)?;
        Ok(self)
    }

    pub fn with_month_name(mut self, month: u32, name: &str) -> Self {
        self.month_names.insert(month, name.to_string());
        self
    }

    pub fn with_image_template(mut self, template: &str) -> Self {
        self.image_template = Some(template.to_string());
        self
    }
}

/// Parses a `NUMBER=NAME` month table entry, e.g. `9=września`.
pub fn parse_month_name(spec: &str) -> Result<(u32, String), String> {
    let (number, name) = spec
        .split_once('=')
        .ok_or_else(|| format!("expected NUMBER=NAME, got {:?}", spec))?;

    let month: u32 = number
        .trim()
        .parse()
        .map_err(|_| format!("invalid month number {:?}", number))?;
    if !(1..=12).contains(&month) {
        return Err(format!("month {} is out of range 1-12", month));
    }

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty month name for month {}", month));
    }

    Ok((month, name.to_string()))
}

fn anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})", pattern))
}

/// Keep the entries matching `filter` and put them in chronological order.
///
/// Input is expected newest first, as the API and the NDJSON store list them.
pub fn select_for_digest(
    entities: impl IntoIterator<Item = NormalizedEntity>,
    filter: &DigestFilter,
) -> Vec<NormalizedEntity> {
    let mut selected: Vec<NormalizedEntity> = entities
        .into_iter()
        .filter(|entity| {
            debug!(target: TARGET_RENDER, "Post: {}", entity);
            filter.matches(entity)
        })
        .collect();

    selected.reverse();
    info!(target: TARGET_RENDER, "Selected {} entries for the digest", selected.len());
    selected
}

/// "day month year", e.g. `5 sierpnia 2018`; months missing from the table
/// are written as numbers.
pub fn format_published(created_time: &DateTime<Utc>, month_names: &BTreeMap<u32, String>) -> String {
    let month = created_time.month();
    let month_name = month_names
        .get(&month)
        .cloned()
        .unwrap_or_else(|| format!("{:02}", month));

    format!("{} {} {}", created_time.day(), month_name, created_time.year())
}

/// Splits the leading day header off the message.
///
/// Returns the header (or the fallback) and the remaining body.
pub fn split_day_header<'a>(message: &'a str, config: &DigestConfig) -> (String, &'a str) {
    match config.day_header.find(message) {
        Some(found) => (found.as_str().to_string(), message[found.end()..].trim()),
        None => (config.fallback_header.clone(), message),
    }
}

/// The message with the marker hashtag removed.
pub fn sanitize_message(message: &str, marker: &str) -> String {
    message.replace(&format!("#{}", marker), "").trim().to_string()
}

fn image_url(entity: &NormalizedEntity, position: usize, config: &DigestConfig) -> Option<String> {
    let picture = entity.full_picture.as_deref()?;
    if picture.contains(&config.placeholder_image) {
        return None;
    }

    Some(match &config.image_template {
        Some(template) => template.replace("{n}", &format!("{:02}", position + 1)),
        None => picture.to_string(),
    })
}

/// Render one digest entry at the given (zero-based) position.
pub fn render_entry(
    entity: &NormalizedEntity,
    position: usize,
    marker: &str,
    config: &DigestConfig,
) -> String {
    let message = sanitize_message(&entity.message, marker);
    let (day_header, body) = split_day_header(&message, config);
    let day_header = day_header.trim_end_matches('.');

    let mut html = format!("<h2 style='clear: both'>{}</h2>\n", encode_text(day_header));

    if let Some(image) = image_url(entity, position, config) {
        let align = if position % 2 == 1 { "left" } else { "right" };
        html.push_str(&format!(
            "<div class=\"wp-block\" data-align=\"{}\">\n\
             <figure class=\"wp-block-image is-resized\">\n\
             <img style=\"max-width: 542px; max-height: 360px;\" src=\"{}\" alt=\"{}\">\n\
             </figure>\n\
             </div>\n",
            align,
            encode_quoted_attribute(&image),
            encode_quoted_attribute(&format!("{} - {}", config.image_alt, day_header))
        ));
    }

    let paragraphs = LINE_BREAKS.replace_all(&encode_text(body), "</p><p>").into_owned();
    html.push_str(&format!(
        "<p>{}</p>\n<p><small><a href='{}'>{} {}</a></small></p>\n",
        paragraphs,
        encode_quoted_attribute(&entity.permalink_url),
        encode_text(&config.link_label),
        format_published(&entity.created_time, &config.month_names)
    ));

    html
}

/// Render the digest of entries already selected and ordered chronologically.
pub fn render_digest(entities: &[NormalizedEntity], marker: &str, config: &DigestConfig) -> String {
    entities
        .iter()
        .enumerate()
        .map(|(position, entity)| render_entry(entity, position, marker, config))
        .collect()
}
