use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    DEFAULT_GRACE_PX, DEFAULT_HEADER_OFFSET_PX, DEFAULT_ITEMS_PER_PAGE, DEFAULT_ROW_HEIGHT_PX,
    MAX_ITEMS_PER_PAGE, MAX_OFFSET_PX,
};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("items per page must be between 1 and {max}, got {value}")]
    ItemsPerPage { value: usize, max: usize },
    #[error("{field} must be a finite, non-negative length up to {max}px, got {value}")]
    Length {
        field: &'static str,
        value: f64,
        max: f64,
    },
    #[error("estimated row height must be positive, got {0}")]
    RowHeight(f64),
    #[error("failed to parse pager config: {0}")]
    Parse(String),
}

/// Per-list-view tuning. Everything here is a host decision; the engine only
/// validates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PagerConfig {
    /// Page size requested from the backend. A page returning fewer items
    /// than this marks the end of the result set.
    pub items_per_page: usize,
    /// Row height used until the shell reports a measured one.
    pub estimated_row_height: f64,
    /// Height of any sticky header covering the top of the viewport.
    pub header_offset: f64,
    /// Extra pixels treated as above the fold when scrolling to an item.
    pub grace: f64,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            estimated_row_height: DEFAULT_ROW_HEIGHT_PX,
            header_offset: DEFAULT_HEADER_OFFSET_PX,
            grace: DEFAULT_GRACE_PX,
        }
    }
}

impl PagerConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.items_per_page == 0 || self.items_per_page > MAX_ITEMS_PER_PAGE {
            return Err(ConfigError::ItemsPerPage {
                value: self.items_per_page,
                max: MAX_ITEMS_PER_PAGE,
            });
        }
        if !self.estimated_row_height.is_finite() || self.estimated_row_height <= 0.0 {
            return Err(ConfigError::RowHeight(self.estimated_row_height));
        }
        Self::validate_length("header offset", self.header_offset)?;
        Self::validate_length("grace", self.grace)?;
        Ok(())
    }

    #[must_use]
    pub fn with_items_per_page(mut self, items_per_page: usize) -> Self {
        self.items_per_page = items_per_page;
        self
    }

    #[must_use]
    pub fn with_row_height(mut self, row_height: f64) -> Self {
        self.estimated_row_height = row_height;
        self
    }

    #[must_use]
    pub fn with_header_offset(mut self, header_offset: f64) -> Self {
        self.header_offset = header_offset;
        self
    }

    #[must_use]
    pub fn with_grace(mut self, grace: f64) -> Self {
        self.grace = grace;
        self
    }

    fn validate_length(field: &'static str, value: f64) -> Result<(), ConfigError> {
        if !value.is_finite() || !(0.0..=MAX_OFFSET_PX).contains(&value) {
            return Err(ConfigError::Length {
                field,
                value,
                max: MAX_OFFSET_PX,
            });
        }
        Ok(())
    }
}
