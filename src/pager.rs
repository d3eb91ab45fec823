//! Pager - fetches the pages after the first one
//!
//! One user action, one fetch: the pager follows the listing's opaque cursor,
//! normalizes what comes back and appends it. Failures are logged and leave
//! the listing as it was, ready for another try. There is no retry or
//! prefetching.

use std::future::Future;
use thiserror::Error;

use crate::content::{normalize_all, ContentError, PageResponse, Post, RawRecord};
use crate::listing::{Cursor, ListingError, ListingSession};
use crate::source::FetchError;

/// Fetches the page a cursor points at
pub trait PageFetcher: Send + Sync {
    fn fetch_page(
        &self,
        cursor: &Cursor,
    ) -> impl Future<Output = Result<PageResponse, FetchError>> + Send;
}

/// Why a page could not be added to the listing
#[derive(Error, Debug)]
pub enum PageLoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Listing(#[from] ListingError),
}

/// Result of one load-more action
#[derive(Debug)]
pub enum LoadOutcome {
    /// The page was appended; holds the number of new posts
    Appended(usize),
    /// The listing has no cursor; nothing to load
    Exhausted,
    /// Another load is still in flight
    Busy,
    /// The load failed and the listing is unchanged
    Failed(PageLoadError),
}

/// Next-page loader over a [`PageFetcher`]
#[derive(Debug, Clone)]
pub struct Pager<F> {
    fetcher: F,
    origin: Option<String>,
}

impl<F: PageFetcher> Pager<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            origin: None,
        }
    }

    /// Only follow cursors on the same origin as `base`
    pub fn restrict_to(mut self, base: impl Into<String>) -> Self {
        self.origin = Some(base.into());
        self
    }

    /// Fetch the page behind `cursor`, returning its cursor and raw records
    pub async fn fetch_next_page(
        &self,
        cursor: &Cursor,
    ) -> Result<(Option<Cursor>, Vec<RawRecord>), FetchError> {
        if let Some(origin) = &self.origin {
            if !cursor.same_origin(origin) {
                return Err(FetchError::ForeignCursor(cursor.to_string()));
            }
        }

        let page = self.fetcher.fetch_page(cursor).await?;
        tracing::debug!(
            "Fetched {} records, next page: {:?}",
            page.results.len(),
            page.next_page
        );
        Ok((page.next_page.map(Cursor::new), page.results))
    }

    /// Fetch and normalize the page behind `cursor`
    pub async fn fetch_posts(
        &self,
        cursor: &Cursor,
    ) -> Result<(Option<Cursor>, Vec<Post>), PageLoadError> {
        let (next, records) = self.fetch_next_page(cursor).await?;
        Ok((next, normalize_all(records)?))
    }

    /// Run one load-more cycle against a session
    pub async fn load_more(&self, session: &ListingSession) -> LoadOutcome {
        let cursor = match session.begin_load() {
            Ok(cursor) => cursor,
            Err(ListingError::NoMorePages) => return LoadOutcome::Exhausted,
            Err(ListingError::LoadInFlight) => return LoadOutcome::Busy,
            Err(e) => return LoadOutcome::Failed(e.into()),
        };

        let result = match self.fetch_posts(&cursor).await {
            Ok((next, posts)) => session.append_page(next, posts).map_err(PageLoadError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(appended) => LoadOutcome::Appended(appended),
            Err(e) => {
                tracing::error!("Failed to load page {}: {}", cursor, e);
                session.fail_load();
                LoadOutcome::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{Listing, Phase};
    use crate::test_helpers::{raw_post, FakeSource};
    use std::sync::Arc;

    fn seeded(source: &FakeSource, next: Option<Cursor>) -> ListingSession {
        let first = crate::content::normalize(source.published[0].clone()).unwrap();
        ListingSession::new(Listing::new(vec![first], next), false).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_next_page_returns_raw_records() {
        let source = FakeSource::with_posts(&["a", "b", "c"]);
        let pager = Pager::new(source.clone());

        let (next, records) = pager.fetch_next_page(&source.cursor(2, 1)).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].uid.as_deref(), Some("b"));
        assert_eq!(next, Some(source.cursor(3, 1)));
    }

    #[tokio::test]
    async fn test_load_more_until_exhausted() {
        let source = FakeSource::with_posts(&["a", "b", "c"]);
        let pager = Pager::new(source.clone());
        let session = seeded(&source, Some(source.cursor(2, 1)));

        assert!(matches!(pager.load_more(&session).await, LoadOutcome::Appended(1)));
        assert_eq!(session.phase(), Phase::Loaded);
        assert!(matches!(pager.load_more(&session).await, LoadOutcome::Appended(1)));
        assert_eq!(session.phase(), Phase::Terminal);
        assert!(matches!(pager.load_more(&session).await, LoadOutcome::Exhausted));

        let listing = session.snapshot();
        let uids: Vec<_> = listing.items.iter().map(|p| p.uid.as_str()).collect();
        assert_eq!(uids, ["a", "b", "c"]);
        assert_eq!(listing.next_cursor, None);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_listing_unchanged() {
        let source = FakeSource::with_posts(&["a", "b"]);
        let pager = Pager::new(source.clone());
        let session = seeded(&source, Some(source.cursor(2, 1)));
        let before = session.snapshot();

        source.set_unavailable(true);
        let outcome = pager.load_more(&session).await;
        assert!(matches!(
            outcome,
            LoadOutcome::Failed(PageLoadError::Fetch(FetchError::Status { status: 503, .. }))
        ));
        assert_eq!(session.snapshot(), before);
        assert_eq!(session.phase(), Phase::Error);
        assert!(session.can_load_more());

        // The same control works once the source is back
        source.set_unavailable(false);
        assert!(matches!(pager.load_more(&session).await, LoadOutcome::Appended(1)));
    }

    #[tokio::test]
    async fn test_malformed_record_fails_the_load() {
        let mut broken = raw_post("b", None);
        broken.data = None;
        let source = FakeSource::new(vec![raw_post("a", None), broken], vec![]);
        let pager = Pager::new(source.clone());
        let session = seeded(&source, Some(source.cursor(2, 1)));

        let outcome = pager.load_more(&session).await;
        assert!(matches!(outcome, LoadOutcome::Failed(PageLoadError::Content(_))));
        assert_eq!(session.snapshot().items.len(), 1);
    }

    #[tokio::test]
    async fn test_second_load_while_in_flight_is_rejected() {
        let source = FakeSource::with_posts(&["a", "b"]).gated();
        let pager = Arc::new(Pager::new(source.clone()));
        let session = seeded(&source, Some(source.cursor(2, 1)));

        let first = {
            let pager = Arc::clone(&pager);
            let session = session.clone();
            tokio::spawn(async move { pager.load_more(&session).await })
        };
        tokio::task::yield_now().await;
        assert_eq!(session.phase(), Phase::Loading);

        assert!(matches!(pager.load_more(&session).await, LoadOutcome::Busy));

        source.release();
        assert!(matches!(first.await.unwrap(), LoadOutcome::Appended(1)));
        assert_eq!(session.snapshot().items.len(), 2);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_foreign_cursor_is_refused() {
        let source = FakeSource::with_posts(&["a"]);
        let pager = Pager::new(source.clone()).restrict_to(source.endpoint());

        let err = pager
            .fetch_next_page(&Cursor::new("https://elsewhere.example/steal"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::ForeignCursor(_)));
        assert_eq!(source.calls(), 0);
    }
}
