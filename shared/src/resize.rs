//! Keeps the user's place when a responsive layout changes column count.

use crate::viewport::LayoutSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reflow {
    Unchanged,
    /// Columns changed; scroll back to `anchor`, which was visible before the
    /// reflow.
    Changed {
        anchor: usize,
        previous: usize,
        items_per_row: usize,
    },
}

pub struct ResizeAdapter;

impl ResizeAdapter {
    /// Compares the reported columns against the current ones. The anchor is
    /// taken from the visible index *before* items-per-row is updated.
    pub fn on_layout(
        current_items_per_row: usize,
        visible_item_index: usize,
        layout: &LayoutSnapshot,
    ) -> Reflow {
        let items_per_row = layout.items_per_row.max(1);
        if items_per_row == current_items_per_row {
            return Reflow::Unchanged;
        }
        Reflow::Changed {
            anchor: visible_item_index,
            previous: current_items_per_row,
            items_per_row,
        }
    }
}
