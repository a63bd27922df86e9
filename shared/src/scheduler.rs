//! Single-flight page fetch coordinator.
//!
//! `LoadScheduler` is the only writer of the page cache, the final-page
//! marker and the loading flag. Every other component reads them through it.
//!
//! Invariants:
//! - at most one fetch is in flight (`in_flight.is_some()` is the loading flag);
//! - once a final page `k` is known, no page `> k` is handed out until reset;
//! - a completion is applied only if its token is the live one, so a reset
//!   happens-before any effect of a fetch issued earlier.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::capabilities::{FetchError, PageOutput};
use crate::model::RequestToken;
use crate::page_cache::PageCache;
use crate::viewport::PageRange;
use crate::DEFAULT_ITEMS_PER_PAGE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InFlight {
    token: RequestToken,
    page: usize,
    /// Item to scroll back to once this page lands, recorded when the fetch
    /// was issued during a pending deep-link scroll.
    reanchor: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Token no longer live (superseded by reset or unmount). Nothing changed.
    Stale,
    /// The shell aborted the live request on its own; the flight is released
    /// without recording a failure.
    Released { page: usize },
    Stored {
        page: usize,
        items: usize,
        became_final: bool,
        reanchor: Option<usize>,
    },
    Failed {
        page: usize,
        error: FetchError,
    },
}

/// What the owner renders for one page index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageSlot<T> {
    Loaded { index: usize, items: Vec<T> },
    /// Not loaded yet: `slots` empty cells keep the layout height stable.
    Placeholder { index: usize, slots: usize },
}

impl<T> PageSlot<T> {
    pub fn index(&self) -> usize {
        match self {
            Self::Loaded { index, .. } | Self::Placeholder { index, .. } => *index,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

#[derive(Debug, Clone)]
pub struct LoadScheduler<T> {
    items_per_page: usize,
    cache: PageCache<T>,
    in_flight: Option<InFlight>,
    failed: BTreeSet<usize>,
    last_token: RequestToken,
}

impl<T> Default for LoadScheduler<T> {
    fn default() -> Self {
        Self::new(DEFAULT_ITEMS_PER_PAGE)
    }
}

impl<T> LoadScheduler<T> {
    pub fn new(items_per_page: usize) -> Self {
        Self {
            items_per_page: items_per_page.max(1),
            cache: PageCache::new(),
            in_flight: None,
            failed: BTreeSet::new(),
            last_token: RequestToken(0),
        }
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    pub fn cache(&self) -> &PageCache<T> {
        &self.cache
    }

    pub fn final_page(&self) -> Option<usize> {
        self.cache.final_page()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn failed_pages(&self) -> impl Iterator<Item = usize> + '_ {
        self.failed.iter().copied()
    }

    /// First page in `range` that still needs fetching, or `None` when the
    /// window is satisfied or the result set is exhausted within view.
    pub fn next_candidate(&self, range: PageRange) -> Option<usize> {
        let final_page = self.cache.final_page();
        range.pages().find(|&page| {
            final_page.map_or(true, |last| page < last)
                && !self.cache.contains(page)
                && !self.failed.contains(&page)
        })
    }

    /// Scheduling minus the I/O: claims the flight for the next candidate
    /// and returns it with a fresh token. No-op while a fetch is outstanding;
    /// the caller re-derives after completion.
    pub fn try_begin(
        &mut self,
        range: PageRange,
        reanchor: Option<usize>,
    ) -> Option<(usize, RequestToken)> {
        if let Some(flight) = self.in_flight {
            debug!(page = flight.page, token = %flight.token, "fetch in flight; not scheduling");
            return None;
        }
        let page = self.next_candidate(range)?;
        self.last_token = self.last_token.next();
        let token = self.last_token;
        self.in_flight = Some(InFlight {
            token,
            page,
            reanchor,
        });
        Some((page, token))
    }

    pub fn complete(
        &mut self,
        token: RequestToken,
        result: Result<PageOutput<T>, FetchError>,
    ) -> Completion {
        let flight = match self.in_flight {
            Some(flight) if flight.token == token => flight,
            _ => {
                debug!(%token, "dropping completion for superseded request");
                return Completion::Stale;
            }
        };
        self.in_flight = None;
        let page = flight.page;

        match result {
            Ok(output) => {
                let items = output.items.len();
                let short = items < self.items_per_page;
                let hinted_last = output
                    .page_count_hint
                    .is_some_and(|pages| pages <= page + 1);
                self.cache.put(page, output.items);

                let became_final = (short || hinted_last) && self.cache.mark_final(page);
                if became_final {
                    info!(page, items, "end of result set");
                }
                Completion::Stored {
                    page,
                    items,
                    became_final,
                    reanchor: flight.reanchor,
                }
            }
            Err(FetchError::Cancelled) => {
                debug!(page, %token, "request aborted by shell");
                Completion::Released { page }
            }
            Err(error) => {
                warn!(page, %token, %error, "page fetch failed");
                self.failed.insert(page);
                Completion::Failed { page, error }
            }
        }
    }

    /// Drops the result set. Returns the token of the fetch that was in
    /// flight, which the caller must cancel with the shell.
    pub fn reset(&mut self) -> Option<RequestToken> {
        let cancelled = self.in_flight.take().map(|flight| flight.token);
        self.cache.clear();
        self.failed.clear();
        cancelled
    }

    /// Changes the page size. Any loaded data is meaningless afterwards, so
    /// this resets as well.
    pub fn reconfigure(&mut self, items_per_page: usize) -> Option<RequestToken> {
        self.items_per_page = items_per_page.max(1);
        self.reset()
    }

    /// Makes failed pages eligible again. Returns how many were cleared.
    pub fn clear_failures(&mut self) -> usize {
        let cleared = self.failed.len();
        self.failed.clear();
        cleared
    }

    /// `min(final, max(range.end, highest loaded))`.
    pub fn last_renderable_page(&self, range: PageRange) -> usize {
        let needed = self
            .cache
            .highest_loaded_page()
            .map_or(range.end, |highest| highest.max(range.end));
        self.cache
            .final_page()
            .map_or(needed, |last| last.min(needed))
    }
}

impl<T: Clone> LoadScheduler<T> {
    /// Cached items or a placeholder for every page from 0 through the last
    /// renderable one.
    pub fn page_slots(&self, range: PageRange) -> Vec<PageSlot<T>> {
        (0..=self.last_renderable_page(range))
            .map(|index| match self.cache.get(index) {
                Some(page) => PageSlot::Loaded {
                    index,
                    items: page.items().to_vec(),
                },
                None => PageSlot::Placeholder {
                    index,
                    slots: self.items_per_page,
                },
            })
            .collect()
    }
}
