//! Draining a feed into the RSS and NDJSON outputs.

use futures::{Stream, StreamExt};
use std::io::Write;
use tracing::info;

use crate::entity::NormalizedEntity;
use crate::error::Result;
use crate::rss::RssFeedWriter;
use crate::store::NdjsonWriter;
use crate::TARGET_RENDER;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub fetched: usize,
    pub rss_items: usize,
    pub stored: usize,
}

/// Writes the first `limit` entries into the RSS feed and every entry into the
/// store.
///
/// Without a store only `limit` entries are pulled from the feed, so no page
/// past the one holding the last of them is requested. With neither output the
/// entries are only logged. The RSS footer is written even when the feed fails.
pub async fn export_feed<S, R, N>(
    feed: S,
    rss: Option<&mut RssFeedWriter<R>>,
    mut store: Option<&mut NdjsonWriter<N>>,
    limit: usize,
) -> Result<ExportSummary>
where
    S: Stream<Item = Result<NormalizedEntity>>,
    R: Write,
    N: Write,
{
    let wanted = if store.is_some() { usize::MAX } else { limit };
    let mut feed = Box::pin(feed.take(wanted));
    let mut summary = ExportSummary::default();

    let preview_only = rss.is_none() && store.is_none();
    let mut open = match rss {
        Some(writer) => Some(writer.scoped()?),
        None => None,
    };

    while let Some(entity) = feed.next().await {
        let entity = entity?;
        summary.fetched += 1;

        if let Some(open) = open.as_mut() {
            if open.items() < limit {
                open.add_entity(&entity)?;
            }
        }
        if let Some(store) = store.as_mut() {
            store.append(&entity)?;
        }
        if preview_only {
            info!(target: TARGET_RENDER, "{}", entity);
        }
    }

    if let Some(open) = open {
        summary.rss_items = open.items();
        open.finish()?;
    }
    if let Some(store) = store {
        summary.stored = store.written();
    }

    Ok(summary)
}
