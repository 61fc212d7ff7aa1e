//! The comic source seam and the fetch loops built on top of it.
//!
//! `WnacgClient` is the real source. The loops only need this trait, so
//! page walking and batched link resolution are tested against an
//! in-memory source.

use std::future::Future;
use std::time::Duration;

use honya_core::models::{Candidate, ComicRecord, DownloadLinks, SearchKind};

use crate::error::ApiError;
use crate::parse::SearchPage;

/// A site that lists search results and download pages.
pub trait ComicSource: Send + Sync {
    /// Fetch one page (1-based) of keyword or tag results.
    fn search_page(
        &self,
        kind: SearchKind,
        query: &str,
        page: u32,
    ) -> impl Future<Output = Result<SearchPage, ApiError>> + Send;

    /// Fetch the download links of one gallery.
    fn download_links(
        &self,
        id: u64,
    ) -> impl Future<Output = Result<DownloadLinks, ApiError>> + Send;
}

/// Walk result pages `1..=max_pages` and gather every candidate.
///
/// Stops at an empty page or at the reported last page. A failing page ends
/// the walk; what was gathered so far is kept.
#[tracing::instrument(name = "collect_pages", skip(source, delay), fields(query = %query, kind = %kind))]
pub async fn collect_pages<S: ComicSource>(
    source: &S,
    kind: SearchKind,
    query: &str,
    max_pages: u32,
    delay: Duration,
) -> Vec<Candidate> {
    let mut all = Vec::new();

    for page in 1..=max_pages {
        let result = match source.search_page(kind, query, page).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(page, error = %e, "Page fetch failed, keeping earlier pages");
                break;
            }
        };

        if result.comics.is_empty() {
            tracing::debug!(page, "Empty page, stopping");
            break;
        }

        tracing::info!(page, count = result.comics.len(), total_page = result.total_page, "Fetched page");
        all.extend(result.comics);

        if page >= result.total_page || page == max_pages {
            break;
        }
        tokio::time::sleep(delay).await;
    }

    tracing::info!(count = all.len(), "Collected candidates");
    all
}

/// Attach download links to every record, `batch_size` requests at a time
/// with `delay` between batches.
///
/// A failed lookup leaves that record with an empty link map. Returns the
/// number of records that ended up with at least one link.
#[tracing::instrument(name = "resolve_links", skip_all, fields(count = comics.len()))]
pub async fn resolve_links<S: ComicSource>(
    source: &S,
    comics: &mut [ComicRecord],
    batch_size: usize,
    delay: Duration,
) -> usize {
    let total = comics.len();
    let batch_size = batch_size.max(1);
    let mut done = 0;

    for batch in comics.chunks_mut(batch_size) {
        let lookups = batch.iter().map(|c| source.download_links(c.id));
        let results = futures::future::join_all(lookups).await;

        for (comic, result) in batch.iter_mut().zip(results) {
            comic.download_links = Some(match result {
                Ok(links) => links,
                Err(e) => {
                    tracing::warn!(id = comic.id, title = %comic.title, error = %e, "Download link lookup failed");
                    DownloadLinks::new()
                }
            });
        }

        done += batch.len();
        tracing::info!(done, total, "Resolved download links");

        if done < total {
            tokio::time::sleep(delay).await;
        }
    }

    comics.iter().filter(|c| c.has_links()).count()
}
