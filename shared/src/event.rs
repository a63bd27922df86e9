use serde::{Deserialize, Serialize};

use crate::capabilities::PageResult;
use crate::config::PagerConfig;
use crate::model::{RequestToken, SearchQuery};
use crate::viewport::LayoutSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Configure(PagerConfig),

    Mounted {
        layout: LayoutSnapshot,
    },
    Unmounted,

    QueryChanged(SearchQuery),
    Reset,

    Scrolled(LayoutSnapshot),
    Resized(LayoutSnapshot),
    FragmentChanged(String),

    RetryFailedPages,
    DismissError,

    // Internal: capability responses, never sent by the shell directly.
    #[serde(skip)]
    InitialFragment(String),
    #[serde(skip)]
    PageFetched {
        token: RequestToken,
        page: usize,
        result: Box<PageResult>,
    },
    #[serde(skip)]
    ItemMeasured {
        index: usize,
        layout: LayoutSnapshot,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Configure(_) => "configure",
            Self::Mounted { .. } => "mounted",
            Self::Unmounted => "unmounted",
            Self::QueryChanged(_) => "query_changed",
            Self::Reset => "reset",
            Self::Scrolled(_) => "scrolled",
            Self::Resized(_) => "resized",
            Self::FragmentChanged(_) => "fragment_changed",
            Self::RetryFailedPages => "retry_failed_pages",
            Self::DismissError => "dismiss_error",
            Self::InitialFragment(_) => "initial_fragment",
            Self::PageFetched { .. } => "page_fetched",
            Self::ItemMeasured { .. } => "item_measured",
        }
    }
}
