//! Cursor pagination over the activity feed.
//!
//! [`ActivityPager`] follows server-issued cursors one request at a time:
//!
//! ```text
//! Fetching(None) --page{next_cursor: "c1"}--> Fetching("c1")
//! Fetching("c1") --page{next_cursor: null}--> Done
//! Fetching(_)    --error------------------->  Failed
//! ```
//!
//! `Done` and `Failed` are terminal. Restarting means building a new pager,
//! which begins again from the empty cursor.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut pager = client.activity_pager(range);
//! while let Some(page) = pager.next_page().await? {
//!     println!("{} activities", page.len());
//! }
//! ```

use async_trait::async_trait;
use futures::Stream;
use tracing::{debug, info, warn};

use crate::core::Result;
use crate::types::{ActivityPage, DateRange};

/// Source of activity pages.
///
/// Implemented by the HTTP client; tests substitute scripted fetchers.
#[async_trait]
pub trait ActivityFetcher: Send + Sync {
    /// Fetch the page identified by `cursor` (`None` for the first page).
    async fn fetch_activity_page(
        &self,
        range: &DateRange,
        cursor: Option<&str>,
    ) -> Result<ActivityPage>;
}

#[async_trait]
impl<T> ActivityFetcher for &T
where
    T: ActivityFetcher + ?Sized,
{
    async fn fetch_activity_page(
        &self,
        range: &DateRange,
        cursor: Option<&str>,
    ) -> Result<ActivityPage> {
        (**self).fetch_activity_page(range, cursor).await
    }
}

#[async_trait]
impl<T> ActivityFetcher for std::sync::Arc<T>
where
    T: ActivityFetcher + ?Sized,
{
    async fn fetch_activity_page(
        &self,
        range: &DateRange,
        cursor: Option<&str>,
    ) -> Result<ActivityPage> {
        (**self).fetch_activity_page(range, cursor).await
    }
}

/// Pager state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagerState {
    /// Next request carries this cursor (`None` on the first request)
    Fetching(Option<String>),
    /// The last page has been returned
    Done,
    /// A request failed; no further requests are made
    Failed,
}

impl PagerState {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Sequential cursor-following pager for one date range.
pub struct ActivityPager<F> {
    fetcher: F,
    range: DateRange,
    state: PagerState,
    pages_fetched: usize,
}

impl<F> std::fmt::Debug for ActivityPager<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityPager")
            .field("range", &self.range)
            .field("state", &self.state)
            .field("pages_fetched", &self.pages_fetched)
            .finish_non_exhaustive()
    }
}

impl<F: ActivityFetcher> ActivityPager<F> {
    /// Create a pager positioned at the first page.
    #[must_use]
    pub fn new(fetcher: F, range: DateRange) -> Self {
        Self {
            fetcher,
            range,
            state: PagerState::Fetching(None),
            pages_fetched: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> &PagerState {
        &self.state
    }

    #[must_use]
    pub fn range(&self) -> &DateRange {
        &self.range
    }

    /// Number of pages successfully fetched so far.
    #[must_use]
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Fetch the next page.
    ///
    /// Returns `Ok(None)` once the pager is in a terminal state, without
    /// touching the network.
    ///
    /// # Errors
    ///
    /// Returns the fetch error and moves the pager to [`PagerState::Failed`].
    pub async fn next_page(&mut self) -> Result<Option<ActivityPage>> {
        let cursor = match &self.state {
            PagerState::Fetching(cursor) => cursor.clone(),
            PagerState::Done | PagerState::Failed => return Ok(None),
        };

        debug!(cursor = ?cursor, page = self.pages_fetched + 1, "Fetching activity page");

        match self
            .fetcher
            .fetch_activity_page(&self.range, cursor.as_deref())
            .await
        {
            Ok(page) => {
                self.pages_fetched += 1;
                info!(
                    page = self.pages_fetched,
                    activity_count = page.len(),
                    next_cursor = ?page.next_cursor(),
                    "Activity page received"
                );

                self.state = match page.next_cursor() {
                    Some(next) => PagerState::Fetching(Some(next.to_string())),
                    None => PagerState::Done,
                };
                Ok(Some(page))
            }
            Err(e) => {
                warn!(
                    page = self.pages_fetched + 1,
                    cursor = ?cursor,
                    category = e.category(),
                    error = %e,
                    "Activity page request failed"
                );
                self.state = PagerState::Failed;
                Err(e)
            }
        }
    }

    /// Drive the pager to completion, handing each page to `on_page`.
    ///
    /// Returns the number of pages seen.
    ///
    /// # Errors
    ///
    /// Stops at the first failed request and returns its error.
    pub async fn for_each_page<C>(&mut self, mut on_page: C) -> Result<usize>
    where
        C: FnMut(&ActivityPage),
    {
        let mut seen = 0;
        while let Some(page) = self.next_page().await? {
            seen += 1;
            on_page(&page);
        }
        Ok(seen)
    }

    /// Collect every remaining page.
    ///
    /// # Errors
    ///
    /// Stops at the first failed request; pages already fetched are dropped.
    pub async fn collect_all(mut self) -> Result<Vec<ActivityPage>> {
        let mut pages = Vec::new();
        while let Some(page) = self.next_page().await? {
            pages.push(page);
        }
        Ok(pages)
    }

    /// Turn the pager into a lazy stream of pages.
    ///
    /// The stream yields at most one error, after which it ends.
    pub fn into_stream(self) -> impl Stream<Item = Result<ActivityPage>> {
        futures::stream::unfold(self, |mut pager| async move {
            match pager.next_page().await {
                Ok(Some(page)) => Some((Ok(page), pager)),
                Ok(None) => None,
                Err(e) => Some((Err(e), pager)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AgyliaError;
    use futures::StreamExt;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted responses and records the cursor of every request.
    struct ScriptedFetcher {
        responses: Mutex<VecDeque<Result<ActivityPage>>>,
        cursors: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedFetcher {
        fn new(responses: Vec<Result<ActivityPage>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                cursors: Mutex::new(Vec::new()),
            }
        }

        fn cursors(&self) -> Vec<Option<String>> {
            self.cursors.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ActivityFetcher for ScriptedFetcher {
        async fn fetch_activity_page(
            &self,
            _range: &DateRange,
            cursor: Option<&str>,
        ) -> Result<ActivityPage> {
            self.cursors.lock().unwrap().push(cursor.map(str::to_string));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AgyliaError::api(500, "unexpected extra request")))
        }
    }

    fn range() -> DateRange {
        DateRange::new("2017-01-01T00:00:00.000Z", "2020-01-01T00:00:00.000Z").unwrap()
    }

    fn page(activities: Vec<serde_json::Value>, next: Option<&str>) -> ActivityPage {
        ActivityPage::new(activities, next.map(str::to_string))
    }

    fn three_pages() -> Vec<Result<ActivityPage>> {
        vec![
            Ok(page(vec![json!("a"), json!("b")], Some("c1"))),
            Ok(page(vec![json!("c")], Some("c2"))),
            Ok(page(vec![], None)),
        ]
    }

    #[tokio::test]
    async fn test_follows_cursors_until_exhausted() {
        let fetcher = ScriptedFetcher::new(three_pages());
        let mut pager = ActivityPager::new(&fetcher, range());

        let mut counts = Vec::new();
        let seen = pager
            .for_each_page(|p| counts.push(p.len()))
            .await
            .unwrap();

        assert_eq!(seen, 3);
        assert_eq!(counts, vec![2, 1, 0]);
        assert_eq!(
            fetcher.cursors(),
            vec![None, Some("c1".to_string()), Some("c2".to_string())]
        );
        assert_eq!(pager.state(), &PagerState::Done);

        // Terminal: no fourth request
        assert!(pager.next_page().await.unwrap().is_none());
        assert_eq!(fetcher.cursors().len(), 3);
    }

    #[tokio::test]
    async fn test_single_page_without_cursor() {
        let fetcher = ScriptedFetcher::new(vec![Ok(page(vec![json!({"id": 1})], None))]);
        let pages = ActivityPager::new(&fetcher, range())
            .collect_all()
            .await
            .unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(fetcher.cursors(), vec![None]);
    }

    #[tokio::test]
    async fn test_empty_string_cursor_terminates() {
        let fetcher = ScriptedFetcher::new(vec![Ok(page(vec![], Some("")))]);
        let mut pager = ActivityPager::new(&fetcher, range());

        pager.next_page().await.unwrap();
        assert_eq!(pager.state(), &PagerState::Done);
        assert_eq!(fetcher.cursors().len(), 1);
    }

    #[tokio::test]
    async fn test_error_on_second_page_stops_pager() {
        let fetcher = ScriptedFetcher::new(vec![
            Ok(page(vec![json!("a"), json!("b")], Some("c1"))),
            Err(AgyliaError::network_simple("connection reset")),
            Ok(page(vec![], None)),
        ]);
        let mut pager = ActivityPager::new(&fetcher, range());

        let mut seen = 0;
        let err = pager.for_each_page(|_| seen += 1).await.unwrap_err();

        assert_eq!(err.category(), "network");
        assert_eq!(seen, 1);
        assert_eq!(pager.state(), &PagerState::Failed);
        assert_eq!(pager.pages_fetched(), 1);
        assert_eq!(fetcher.cursors(), vec![None, Some("c1".to_string())]);

        // Failed is terminal
        assert!(pager.next_page().await.unwrap().is_none());
        assert_eq!(fetcher.cursors().len(), 2);
    }

    #[tokio::test]
    async fn test_stream_yields_pages_then_ends() {
        let fetcher = ScriptedFetcher::new(three_pages());
        let pages: Vec<_> = ActivityPager::new(&fetcher, range())
            .into_stream()
            .collect()
            .await;

        assert_eq!(pages.len(), 3);
        assert!(pages.iter().all(|p| p.is_ok()));
        assert_eq!(fetcher.cursors().len(), 3);
    }

    #[tokio::test]
    async fn test_stream_ends_after_error() {
        let fetcher = ScriptedFetcher::new(vec![
            Ok(page(vec![json!("a")], Some("c1"))),
            Err(AgyliaError::api(502, "bad gateway")),
        ]);
        let results: Vec<_> = ActivityPager::new(&fetcher, range())
            .into_stream()
            .collect()
            .await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert_eq!(results[1].as_ref().unwrap_err().status(), Some(502));
        assert_eq!(fetcher.cursors().len(), 2);
    }

    #[tokio::test]
    async fn test_owned_arc_fetcher() {
        let fetcher = std::sync::Arc::new(ScriptedFetcher::new(three_pages()));
        let pages = ActivityPager::new(fetcher.clone(), range())
            .collect_all()
            .await
            .unwrap();

        let total: usize = pages.iter().map(ActivityPage::len).sum();
        assert_eq!(total, 3);
        assert_eq!(fetcher.cursors().len(), 3);
    }

    #[tokio::test]
    async fn test_collect_all_keeps_pages_in_fetch_order() {
        let fetcher = ScriptedFetcher::new(three_pages());
        let pages = ActivityPager::new(&fetcher, range())
            .collect_all()
            .await
            .unwrap();

        let cursors: Vec<_> = pages.iter().map(ActivityPage::next_cursor).collect();
        assert_eq!(cursors, vec![Some("c1"), Some("c2"), None]);
        assert_eq!(pages[0].activities, vec![json!("a"), json!("b")]);
    }
}
