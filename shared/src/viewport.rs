//! Geometry: which item is on screen and which pages the window needs.
//!
//! [`ViewportModel`] is a pure function of the current layout. Only the
//! scroll/resize handlers write the tracked state in [`ViewportTracker`].

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::config::PagerConfig;
use crate::MAX_WINDOW_PAGES;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemBounds {
    /// Relative to the top of the viewport, like a bounding client rect.
    pub top: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderedItem {
    pub index: usize,
    pub top: f64,
    pub height: f64,
}

/// What the shell knows about the on-screen layout at one instant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutSnapshot {
    pub viewport_height: f64,
    pub scroll_offset: f64,
    pub items_per_row: usize,
    /// Measured row height; zero when nothing has rendered yet.
    pub row_height: f64,
    pub rendered: Vec<RenderedItem>,
}

impl LayoutSnapshot {
    pub fn rendered_item_count(&self) -> usize {
        self.rendered.len()
    }

    pub fn rendered_item_bounds(&self, index: usize) -> Option<ItemBounds> {
        self.rendered
            .iter()
            .find(|item| item.index == index)
            .map(|item| ItemBounds {
                top: item.top,
                height: item.height,
            })
    }

    /// Lowest-indexed rendered item whose top edge is at or below `offset`.
    pub fn first_item_at_or_below(&self, offset: f64) -> Option<usize> {
        self.rendered
            .iter()
            .filter(|item| item.top.is_finite() && item.top >= offset)
            .map(|item| item.index)
            .min()
    }
}

/// Inclusive range of page indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: usize,
    pub end: usize,
}

impl PageRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn single(page: usize) -> Self {
        Self::new(page, page)
    }

    pub fn contains(&self, page: usize) -> bool {
        (self.start..=self.end).contains(&page)
    }

    pub fn pages(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub visible_item_index: usize,
    pub visible_page: usize,
    pub visible_page_range: PageRange,
    pub items_per_row: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportModel {
    pub row_height: f64,
    pub items_per_page: usize,
    pub items_per_row: usize,
    pub header_offset: f64,
    pub grace: f64,
    pub viewport_height: f64,
}

impl ViewportModel {
    pub fn new(
        config: &PagerConfig,
        items_per_row: usize,
        layout: Option<&LayoutSnapshot>,
    ) -> Self {
        let measured_row = layout
            .map(|l| l.row_height)
            .filter(|h| h.is_finite() && *h > 0.0);
        let viewport_height = layout
            .map(|l| l.viewport_height)
            .filter(|h| h.is_finite() && *h > 0.0)
            .unwrap_or(0.0);

        Self {
            row_height: measured_row.unwrap_or(config.estimated_row_height),
            items_per_page: config.items_per_page.max(1),
            items_per_row: items_per_row.max(1),
            header_offset: config.header_offset,
            grace: config.grace,
            viewport_height,
        }
    }

    pub fn rows_per_page(&self) -> f64 {
        self.items_per_page as f64 / self.items_per_row.max(1) as f64
    }

    pub fn page_height(&self) -> f64 {
        self.row_height * self.rows_per_page()
    }

    /// First rendered item below the header, or 0 when nothing renders yet.
    pub fn current_item(&self, layout: Option<&LayoutSnapshot>) -> usize {
        layout
            .and_then(|l| l.first_item_at_or_below(self.header_offset))
            .unwrap_or(0)
    }

    pub fn page_of(&self, item_index: usize) -> usize {
        item_index / self.items_per_page
    }

    /// Page of the visible item, biased one row back so a half-scrolled row
    /// does not drop its page out of the window.
    pub fn visible_page(&self, visible_item_index: usize) -> usize {
        visible_item_index.saturating_sub(self.items_per_row).max(1) / self.items_per_page
    }

    pub fn total_visible_pages(&self) -> usize {
        let page_height = self.page_height();
        if !page_height.is_finite() || page_height <= 0.0 || self.viewport_height <= 0.0 {
            return 0;
        }
        let pages = (self.viewport_height / page_height).ceil();
        if pages >= MAX_WINDOW_PAGES as f64 {
            return MAX_WINDOW_PAGES;
        }
        pages as usize
    }

    /// Pages covering the viewport plus one screenful of lookahead.
    pub fn visible_page_range(&self, visible_item_index: usize) -> PageRange {
        let first = self.visible_page(visible_item_index);
        PageRange::new(first, first.saturating_add(self.total_visible_pages()))
    }

    pub fn state(&self, visible_item_index: usize) -> ViewportState {
        ViewportState {
            visible_item_index,
            visible_page: self.visible_page(visible_item_index),
            visible_page_range: self.visible_page_range(visible_item_index),
            items_per_row: self.items_per_row,
        }
    }

    /// Scroll offset that puts an item just under the header, `grace` pixels
    /// down.
    pub fn scroll_offset_for(&self, bounds: ItemBounds, scroll_offset: f64) -> f64 {
        (bounds.top + scroll_offset - (self.header_offset + self.grace)).max(0.0)
    }
}

/// Layout facts the engine remembers between events.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportTracker {
    items_per_row: usize,
    visible_item_index: usize,
    layout: Option<LayoutSnapshot>,
}

impl Default for ViewportTracker {
    fn default() -> Self {
        Self {
            items_per_row: 1,
            visible_item_index: 0,
            layout: None,
        }
    }
}

impl ViewportTracker {
    pub fn items_per_row(&self) -> usize {
        self.items_per_row
    }

    pub fn visible_item_index(&self) -> usize {
        self.visible_item_index
    }

    pub fn layout(&self) -> Option<&LayoutSnapshot> {
        self.layout.as_ref()
    }

    pub fn record_layout(&mut self, layout: LayoutSnapshot) {
        self.layout = Some(layout);
    }

    pub fn set_items_per_row(&mut self, items_per_row: usize) {
        self.items_per_row = items_per_row.max(1);
    }

    /// Returns whether the index changed.
    pub fn set_visible_item_index(&mut self, index: usize) -> bool {
        let changed = self.visible_item_index != index;
        self.visible_item_index = index;
        changed
    }

    pub fn reset_position(&mut self) {
        self.visible_item_index = 0;
    }

    pub fn model(&self, config: &PagerConfig) -> ViewportModel {
        ViewportModel::new(config, self.items_per_row, self.layout.as_ref())
    }

    pub fn state(&self, config: &PagerConfig) -> ViewportState {
        self.model(config).state(self.visible_item_index)
    }
}
