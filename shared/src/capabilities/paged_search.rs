use crux_core::capability::{CapabilityContext, Operation};
use crux_core::macros::Capability;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{ListItem, RequestToken, SearchQuery};

/// Requests to the paged search/listing backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageRequest {
    Fetch {
        token: RequestToken,
        page_index: usize,
        page_size: usize,
        query: SearchQuery,
    },
    /// Advisory: the shell should abort the request carrying `token`. The
    /// core ignores any late reply regardless.
    Cancel { token: RequestToken },
}

impl Operation for PageRequest {
    type Output = PageResult;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageOutput<T = ListItem> {
    pub items: Vec<T>,
    /// Total number of pages, when the backend reports one.
    #[serde(default)]
    pub page_count_hint: Option<usize>,
}

impl<T> PageOutput<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            page_count_hint: None,
        }
    }

    #[must_use]
    pub fn with_page_count(mut self, pages: usize) -> Self {
        self.page_count_hint = Some(pages);
        self
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum FetchError {
    #[error("request cancelled")]
    Cancelled,

    #[error("network error: {message}")]
    Network { message: String },

    #[error("request timed out")]
    Timeout,

    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("request failed"))]
    Http {
        status: u16,
        message: Option<String>,
    },

    #[error("malformed page: {message}")]
    Decode { message: String },
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl FetchError {
    /// Builds an error from a failed HTTP response, picking up the backend's
    /// `{"message": ...}` body when there is one.
    #[must_use]
    pub fn from_http_status(status: u16, body: Option<&[u8]>) -> Self {
        let message = body
            .and_then(|b| serde_json::from_slice::<ApiErrorBody>(b).ok())
            .and_then(|e| e.message)
            .filter(|m| !m.is_empty());
        Self::Http { status, message }
    }
}

pub type PageResult = Result<PageOutput, FetchError>;

#[derive(Capability)]
pub struct PagedSearch<Ev> {
    context: CapabilityContext<PageRequest, Ev>,
}

impl<Ev> PagedSearch<Ev> {
    pub fn new(context: CapabilityContext<PageRequest, Ev>) -> Self {
        Self { context }
    }
}

impl<Ev> PagedSearch<Ev>
where
    Ev: 'static,
{
    pub fn fetch<F>(
        &self,
        token: RequestToken,
        page_index: usize,
        page_size: usize,
        query: SearchQuery,
        callback: F,
    ) where
        F: FnOnce(PageResult) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = ctx
                .request_from_shell(PageRequest::Fetch {
                    token,
                    page_index,
                    page_size,
                    query,
                })
                .await;
            ctx.update_app(callback(result));
        });
    }

    pub fn cancel(&self, token: RequestToken) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(PageRequest::Cancel { token }).await;
        });
    }
}
