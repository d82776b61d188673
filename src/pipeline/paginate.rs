//! Pagination fetcher: exhausts one partition's catalog query page by page.

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::debug;

use crate::gateway::{Gateway, PageCursor};

use super::records::RawRecord;

/// Fetch every track for one year, pushing each page item into the channel
/// as soon as it arrives (no whole-partition buffering; channel capacity is
/// the backpressure on the remote fetch).
///
/// Stops when the server signals the last page or `max_pages` is reached. A
/// gateway failure aborts the rest of this partition's fetch; records
/// already sent stay in flight downstream.
pub async fn fetch_partition(
    gateway: &dyn Gateway,
    year: u16,
    page_limit: u32,
    max_pages: Option<u32>,
    tx: &mpsc::Sender<RawRecord>,
) -> Result<()> {
    let query = format!("post.track:apdm.bandwagon.{}.*", year);
    debug!(year, query = %query, "Fetching tracks");

    let mut cursor = PageCursor::first(page_limit);
    let mut pages_fetched: u32 = 0;

    loop {
        let page = gateway
            .fetch_posts(&query, cursor)
            .await
            .with_context(|| format!("fetching tracks for {} failed", year))?;

        for post in page.posts {
            let record = RawRecord { year, track: post };
            if tx.send(record).await.is_err() {
                // Consumer is gone; nothing left to feed.
                return Ok(());
            }
        }

        pages_fetched += 1;
        if page.pagination.last_page {
            break;
        }
        if matches!(max_pages, Some(cap) if pages_fetched >= cap) {
            debug!(year, pages_fetched, "Stopping at page cap");
            break;
        }

        cursor = PageCursor::after(&page.pagination);
    }

    debug!(year, pages_fetched, "Done fetching tracks");
    Ok(())
}
