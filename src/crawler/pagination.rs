//! Bounded cursor pagination
//!
//! `PaginatedWalk` drives any "list one page by cursor" call. It counts one
//! unit per fetched page, refuses to fetch past its ceiling, and remembers the
//! cursor of the next unfetched page so a stopped walk can be resumed.

use crate::client::{Page, PageToken, ServiceResult};
use crate::crawler::StopSignal;
use crate::quota::PAGE_COST;
use std::future::Future;

/// A fetched page together with where it sits in the walk
#[derive(Debug, Clone)]
pub struct WalkPage<T> {
    pub items: Vec<T>,

    /// Cursor this page was fetched with
    pub page_cursor: Option<PageToken>,

    /// Cursor of the following page; `None` on the last page
    pub next_cursor: Option<PageToken>,
}

/// How a walk ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkOutcome {
    /// The last page was fetched
    Complete,

    /// Stopped early; `resume` is the next unfetched page
    Partial { resume: Option<PageToken> },
}

#[derive(Debug, Clone)]
pub struct PaginatedWalk {
    cursor: Option<PageToken>,
    ceiling: u64,
    used: u64,
    complete: bool,
    stop: Option<StopSignal>,
}

impl PaginatedWalk {
    /// Starts a walk at `start` (the first page when `None`) allowed `ceiling` units
    pub fn new(start: Option<PageToken>, ceiling: u64) -> Self {
        Self {
            cursor: start,
            ceiling,
            used: 0,
            complete: false,
            stop: None,
        }
    }

    /// Makes the walk refuse further fetches once `stop` is set
    pub fn with_stop(mut self, stop: StopSignal) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn units_used(&self) -> u64 {
        self.used
    }

    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    /// Cursor of the next page to fetch
    pub fn cursor(&self) -> Option<&PageToken> {
        self.cursor.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.as_ref().is_some_and(StopSignal::is_stop_requested)
    }

    /// True if another page may be fetched
    pub fn can_fetch(&self) -> bool {
        !self.complete && self.used + PAGE_COST <= self.ceiling && !self.stop_requested()
    }

    /// Counts units spent by nested walks against this walk's ceiling
    pub fn absorb(&mut self, units: u64) {
        self.used += units;
    }

    /// Fetches the next page
    ///
    /// Returns `Ok(None)` without calling `fetch` if the walk is complete,
    /// out of units or stopped. A failed fetch costs nothing and leaves the
    /// cursor where it was.
    pub async fn next_page<T, F, Fut>(&mut self, fetch: F) -> ServiceResult<Option<WalkPage<T>>>
    where
        F: FnOnce(Option<PageToken>) -> Fut,
        Fut: Future<Output = ServiceResult<Page<T>>>,
    {
        if !self.can_fetch() {
            return Ok(None);
        }

        let page_cursor = self.cursor.clone();
        let page = fetch(page_cursor.clone()).await?;

        self.used += PAGE_COST;
        self.cursor = page.next_page_token.clone();
        self.complete = self.cursor.is_none();

        Ok(Some(WalkPage {
            items: page.items,
            page_cursor,
            next_cursor: page.next_page_token,
        }))
    }

    pub fn outcome(&self) -> WalkOutcome {
        if self.complete {
            WalkOutcome::Complete
        } else {
            WalkOutcome::Partial {
                resume: self.cursor.clone(),
            }
        }
    }
}

/// Drains a walk, concatenating every page
pub async fn collect_all<T, F, Fut>(walk: &mut PaginatedWalk, mut fetch: F) -> ServiceResult<Vec<T>>
where
    F: FnMut(Option<PageToken>) -> Fut,
    Fut: Future<Output = ServiceResult<Page<T>>>,
{
    let mut items = Vec::new();
    while let Some(page) = walk.next_page(&mut fetch).await? {
        items.extend(page.items);
    }
    Ok(items)
}
