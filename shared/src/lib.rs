// lib.rs - headless pagination core shared by every list view

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod app;
pub mod capabilities;
pub mod config;
pub mod deep_link;
pub mod event;
pub mod model;
pub mod page_cache;
pub mod resize;
pub mod scheduler;
pub mod viewport;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use app::App;
pub use capabilities::{Capabilities, Effect, FetchError, PageOutput, PageResult};
pub use config::{ConfigError, PagerConfig};
pub use crux_core::{render::Render, App as CruxApp};
pub use event::Event;
pub use model::{ListItem, Model, RequestToken, SearchQuery, UserFacingError, ViewModel};
pub use page_cache::{Page, PageCache};
pub use scheduler::{Completion, LoadScheduler, PageSlot};
pub use viewport::{ItemBounds, LayoutSnapshot, PageRange, RenderedItem, ViewportModel};

pub const DEFAULT_ITEMS_PER_PAGE: usize = 20;
pub const MAX_ITEMS_PER_PAGE: usize = 500;
pub const DEFAULT_ROW_HEIGHT_PX: f64 = 280.0;
pub const DEFAULT_HEADER_OFFSET_PX: f64 = 64.0;
pub const DEFAULT_GRACE_PX: f64 = 16.0;
pub const MAX_OFFSET_PX: f64 = 10_000.0;
/// Upper bound on pages one viewport can ask for, whatever geometry the shell reports.
pub const MAX_WINDOW_PAGES: usize = 32;
/// Largest 1-based item a deep link may name; anything above reads as no link.
pub const MAX_LINKED_ITEM: usize = 1_000_000;
pub const FRAGMENT_INDEX_KEYS: &[&str] = &["i", "item"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    RateLimited,
    Server,
    Rejected,
    Decode,
    InvalidConfig,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::RateLimited => "RATE_LIMITED",
            Self::Server => "SERVER_ERROR",
            Self::Rejected => "REQUEST_REJECTED",
            Self::Decode => "DECODE_ERROR",
            Self::InvalidConfig => "INVALID_CONFIG",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network | Self::Timeout | Self::RateLimited | Self::Server => {
                ErrorSeverity::Transient
            }
            Self::Rejected | Self::Decode | Self::InvalidConfig | Self::Internal => {
                ErrorSeverity::Permanent
            }
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self.default_severity(), ErrorSeverity::Transient)
    }
}

/// Error surfaced to the host. Nothing in the engine throws it upward; it is
/// parked on the model and rendered through the view model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PagerError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub page: Option<usize>,
    pub context: HashMap<String, String>,
}

impl PagerError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            page: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to load more results. Please check your connection.".into()
            }
            ErrorKind::Timeout => "Loading more results timed out. Please try again.".into(),
            ErrorKind::RateLimited => {
                "Too many requests. Please wait a moment and try again.".into()
            }
            ErrorKind::Server => "The server could not load these results.".into(),
            ErrorKind::Rejected | ErrorKind::InvalidConfig => self.message.clone(),
            ErrorKind::Decode => "Some results could not be read.".into(),
            ErrorKind::Internal => "An unexpected error occurred.".into(),
        }
    }
}

impl std::fmt::Display for PagerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(page) = self.page {
            write!(f, " (page {page})")?;
        }
        Ok(())
    }
}

impl std::error::Error for PagerError {}

impl From<FetchError> for PagerError {
    fn from(e: FetchError) -> Self {
        let kind = match &e {
            FetchError::Network { .. } => ErrorKind::Network,
            FetchError::Timeout => ErrorKind::Timeout,
            FetchError::Http { status, .. } => match *status {
                408 => ErrorKind::Timeout,
                429 => ErrorKind::RateLimited,
                500..=599 => ErrorKind::Server,
                _ => ErrorKind::Rejected,
            },
            FetchError::Decode { .. } => ErrorKind::Decode,
            // Never surfaced: cancellation is filtered out before conversion.
            FetchError::Cancelled => ErrorKind::Internal,
        };
        let err = Self::new(kind, e.to_string());
        match e {
            FetchError::Http { status, .. } => err.with_context("http_status", status.to_string()),
            _ => err,
        }
    }
}

impl From<ConfigError> for PagerError {
    fn from(e: ConfigError) -> Self {
        PagerError::new(ErrorKind::InvalidConfig, e.to_string())
    }
}
