use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

use crate::config::PagerConfig;
use crate::deep_link::DeepLinkState;
use crate::scheduler::{LoadScheduler, PageSlot};
use crate::viewport::ViewportTracker;
use crate::PagerError;

/// One listing entry as produced by the backend. The engine never looks
/// inside; rendering is the shell's business.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListItem(pub serde_json::Value);

impl ListItem {
    pub fn new(value: impl Into<serde_json::Value>) -> Self {
        Self(value.into())
    }
}

/// Identifies one page fetch. Tokens are handed out in increasing order and
/// never reused for the lifetime of the core.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestToken(pub u64);

impl RequestToken {
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Filters, sort order and owner of a list view, forwarded verbatim to the
/// paged-search backend.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchQuery(BTreeMap<String, String>);

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SearchQuery {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    #[default]
    Unmounted,
    /// Mounted, waiting for the initial fragment before the first fetch.
    Mounting,
    Active,
}

#[derive(Debug, Default)]
pub struct Model {
    pub config: PagerConfig,
    pub query: SearchQuery,
    pub lifecycle: Lifecycle,
    pub scheduler: LoadScheduler<ListItem>,
    pub viewport: ViewportTracker,
    pub deep_link: DeepLinkState,
    pub last_error: Option<PagerError>,
}

impl Model {
    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    pub fn set_error(&mut self, error: PagerError) {
        self.last_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Total item count, known only once the final page has been loaded.
    pub fn known_total(&self) -> Option<usize> {
        let cache = self.scheduler.cache();
        let final_page = cache.final_page()?;
        let last = cache.get(final_page)?;
        Some(final_page * self.config.items_per_page + last.len())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UserFacingError {
    pub code: String,
    pub message: String,
    pub page: Option<usize>,
    pub is_retryable: bool,
}

impl From<&PagerError> for UserFacingError {
    fn from(e: &PagerError) -> Self {
        Self {
            code: e.code().to_string(),
            message: e.user_facing_message(),
            page: e.page,
            is_retryable: e.is_retryable(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ViewModel {
    /// Every page from 0 up to the last renderable one, loaded or placeholder.
    pub pages: Vec<PageSlot<ListItem>>,
    pub items_per_page: usize,
    pub items_per_row: usize,
    pub visible_item_index: usize,
    /// 1-based, for "showing result N" labels.
    pub showing_item: usize,
    pub known_total: Option<usize>,
    pub is_loading: bool,
    pub final_page: Option<usize>,
    pub failed_pages: Vec<usize>,
    pub error: Option<UserFacingError>,
}
