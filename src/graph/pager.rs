//! Cursor-based pagination over Graph API listings.

use futures::stream::{self, Stream};
use tracing::{debug, info};

use super::client::GraphClient;
use super::transport::Transport;
use super::types::{RawItem, RequestParams, AFTER_PARAM};
use crate::error::Result;
use crate::TARGET_WEB_REQUEST;

/// Pagination progress carried between polls of the stream.
struct PageState {
    endpoint: String,
    items: std::vec::IntoIter<RawItem>,
    // Parameters of the page still to be requested; `None` once the last page
    // has been fetched.
    next: Option<RequestParams>,
    yielded: usize,
}

impl<T: Transport> GraphClient<T> {
    /// Lazily yields every item of a paged listing.
    ///
    /// A page is requested only once the consumer has drained the previous one,
    /// so dropping the stream (or `take(n)`) never triggers a further request.
    /// The stream ends after the first page without `paging.cursors.after`, or
    /// right after yielding an error.
    pub fn iterate_api_responses<'a>(
        &'a self,
        endpoint: &str,
        params: RequestParams,
    ) -> impl Stream<Item = Result<RawItem>> + 'a {
        info!(target: TARGET_WEB_REQUEST, "HTTP request to {}", endpoint);

        let state = PageState {
            endpoint: endpoint.to_string(),
            items: Vec::new().into_iter(),
            next: Some(params),
            yielded: 0,
        };

        stream::try_unfold(state, move |state| next_item(self, state))
    }
}

async fn next_item<T: Transport>(
    client: &GraphClient<T>,
    mut state: PageState,
) -> Result<Option<(RawItem, PageState)>> {
    loop {
        if let Some(item) = state.items.next() {
            state.yielded += 1;
            return Ok(Some((item, state)));
        }

        let Some(mut params) = state.next.take() else {
            info!(target: TARGET_WEB_REQUEST, "API returned {} items", state.yielded);
            return Ok(None);
        };

        let page = client.fetch_page(&state.endpoint, &params).await?;

        if let Some(cursor) = page.next_cursor() {
            debug!(target: TARGET_WEB_REQUEST, "API next page (after) cursor: {:?}", cursor);
            params.insert(AFTER_PARAM.to_string(), cursor.to_string());
            state.next = Some(params);
        }

        state.items = page.data.into_iter();
    }
}
