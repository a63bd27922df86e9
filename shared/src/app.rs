//! Event handling for the pager core.
//!
//! Every handler runs to completion on the core's single thread. The only
//! asynchrony is the shell answering capability requests, and those answers
//! come back as internal events (`InitialFragment`, `PageFetched`,
//! `ItemMeasured`).

use tracing::{debug, info, warn};

use crate::capabilities::Capabilities;
use crate::event::Event;
use crate::model::{Lifecycle, Model, UserFacingError, ViewModel};
use crate::resize::{Reflow, ResizeAdapter};
use crate::scheduler::Completion;
use crate::PagerError;

#[derive(Default)]
pub struct App;

impl App {
    /// Drops the result set and position. Does not scroll; the host decides
    /// whether a new query starts at the top.
    fn reset(model: &mut Model, caps: &Capabilities) {
        if let Some(token) = model.scheduler.reset() {
            debug!(%token, "cancelling in-flight fetch");
            caps.paged_search.cancel(token);
        }
        model.viewport.reset_position();
        model.deep_link.reset();
        model.clear_error();
    }

    /// Issues the next fetch the visible window needs. Returns whether one
    /// was started.
    fn schedule_next(model: &mut Model, caps: &Capabilities) -> bool {
        if !model.is_active() {
            return false;
        }
        let range = model.viewport.state(&model.config).visible_page_range;
        let reanchor = model.deep_link.pending_target();
        let Some((page, token)) = model.scheduler.try_begin(range, reanchor) else {
            return false;
        };

        info!(page, %token, window_start = range.start, window_end = range.end, "fetching page");
        caps.paged_search.fetch(
            token,
            page,
            model.config.items_per_page,
            model.query.clone(),
            move |result| Event::PageFetched {
                token,
                page,
                result: Box::new(result),
            },
        );
        true
    }

    fn navigate(model: &mut Model, caps: &Capabilities, raw: &str) {
        let target = model.deep_link.navigate(raw);
        info!(target, fragment = raw, "navigating to item");
        model.viewport.set_visible_item_index(target);

        Self::schedule_next(model, caps);
        caps.render.render();
        if Self::target_unreachable(model, target) {
            Self::abandon_pending_scroll(model, caps);
            return;
        }
        Self::scroll_to_item(model, caps, target);
    }

    /// True when `target` can never render: past the known end of the
    /// result set, or on a page whose fetch failed.
    fn target_unreachable(model: &Model, target: usize) -> bool {
        let page = model.viewport.model(&model.config).page_of(target);
        model.known_total().is_some_and(|total| target >= total)
            || model.scheduler.final_page().is_some_and(|last| page > last)
            || model.scheduler.failed_pages().any(|failed| failed == page)
    }

    /// Gives up on the pending deep-link scroll and falls back to whatever
    /// the last layout shows, so user scrolls drive the fragment again.
    fn abandon_pending_scroll(model: &mut Model, caps: &Capabilities) {
        let Some(target) = model.deep_link.abandon_scroll() else {
            return;
        };
        let current = model
            .viewport
            .model(&model.config)
            .current_item(model.viewport.layout());
        warn!(target, fallback = current, total = model.known_total(), "abandoning deep link");
        model.viewport.set_visible_item_index(current);
        caps.render.render();
    }

    /// Item 0 is always at offset 0. Anything else has to be measured first,
    /// which finishes in `ItemMeasured`.
    fn scroll_to_item(model: &mut Model, caps: &Capabilities, index: usize) {
        model.deep_link.begin_scroll(index);
        if index == 0 {
            caps.layout.scroll_to(0.0);
            model.deep_link.finish_scroll(0);
            model.viewport.set_visible_item_index(0);
            return;
        }
        caps.layout
            .measure(index, move |layout| Event::ItemMeasured { index, layout });
    }

    /// A page just landed; if a deep-link scroll is waiting on it, try again.
    fn resume_pending_scroll(
        model: &mut Model,
        caps: &Capabilities,
        page: usize,
        reanchor: Option<usize>,
    ) {
        let Some(target) = model.deep_link.pending_target() else {
            return;
        };
        if Self::target_unreachable(model, target) {
            Self::abandon_pending_scroll(model, caps);
            return;
        }
        let target_page = model.viewport.model(&model.config).page_of(target);
        if !model.scheduler.cache().contains(target_page) {
            return;
        }
        if reanchor == Some(target) || target_page == page {
            Self::scroll_to_item(model, caps, target);
        }
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        debug!(event = event.name(), lifecycle = ?model.lifecycle, "update");

        match event {
            Event::Configure(config) => {
                if let Err(e) = config.validate() {
                    warn!(error = %e, "rejected pager config");
                    model.set_error(e.into());
                    caps.render.render();
                    return;
                }
                if config == model.config {
                    return;
                }

                let page_size_changed = config.items_per_page != model.config.items_per_page;
                model.config = config;
                if page_size_changed {
                    info!(items_per_page = model.config.items_per_page, "page size changed");
                    if let Some(token) = model.scheduler.reconfigure(model.config.items_per_page) {
                        caps.paged_search.cancel(token);
                    }
                    Self::reset(model, caps);
                }
                Self::schedule_next(model, caps);
                caps.render.render();
            }

            Event::Mounted { layout } => {
                model.lifecycle = Lifecycle::Mounting;
                Self::reset(model, caps);
                model.viewport.set_items_per_row(layout.items_per_row);
                model.viewport.record_layout(layout);
                caps.location.read_fragment(Event::InitialFragment);
            }

            Event::InitialFragment(raw) => {
                if model.lifecycle != Lifecycle::Mounting {
                    debug!("initial fragment arrived after unmount");
                    return;
                }
                model.lifecycle = Lifecycle::Active;
                Self::navigate(model, caps, &raw);
            }

            Event::Unmounted => {
                Self::reset(model, caps);
                model.lifecycle = Lifecycle::Unmounted;
            }

            Event::QueryChanged(query) => {
                if query == model.query {
                    return;
                }
                info!(filters = query.iter().count(), "query changed");
                model.query = query;
                Self::reset(model, caps);
                Self::schedule_next(model, caps);
                caps.render.render();
            }

            Event::Reset => {
                Self::reset(model, caps);
                Self::schedule_next(model, caps);
                caps.render.render();
            }

            Event::Scrolled(layout) => {
                model.viewport.record_layout(layout);
                if !model.is_active() {
                    return;
                }
                // A deep-link scroll is in progress: the position the shell
                // reports is transient and must not become the target.
                if model.deep_link.is_scroll_pending() {
                    if Self::schedule_next(model, caps) {
                        caps.render.render();
                    }
                    return;
                }

                let current = model
                    .viewport
                    .model(&model.config)
                    .current_item(model.viewport.layout());
                let moved = model.viewport.set_visible_item_index(current);
                if let Some(fragment) = model.deep_link.fragment_for_scroll(current) {
                    caps.location.write_fragment(fragment);
                }
                let fetching = Self::schedule_next(model, caps);
                if moved || fetching {
                    caps.render.render();
                }
            }

            Event::Resized(layout) => {
                let reflow = ResizeAdapter::on_layout(
                    model.viewport.items_per_row(),
                    model.viewport.visible_item_index(),
                    &layout,
                );
                model.viewport.record_layout(layout);

                match reflow {
                    Reflow::Unchanged => {}
                    Reflow::Changed {
                        anchor,
                        previous,
                        items_per_row,
                    } => {
                        info!(anchor, previous, items_per_row, "columns changed; re-anchoring");
                        model.viewport.set_items_per_row(items_per_row);
                        if !model.is_active() {
                            return;
                        }
                        model.viewport.set_visible_item_index(anchor);
                        Self::schedule_next(model, caps);
                        caps.render.render();
                        Self::scroll_to_item(model, caps, anchor);
                    }
                }
            }

            Event::FragmentChanged(raw) => {
                if !model.is_active() {
                    return;
                }
                if model.deep_link.is_echo(&raw) {
                    debug!(fragment = %raw, "ignoring echo of our own fragment write");
                    return;
                }
                Self::navigate(model, caps, &raw);
            }

            Event::PageFetched {
                token,
                page,
                result,
            } => match model.scheduler.complete(token, *result) {
                Completion::Stale => {
                    debug!(%token, page, "stale page ignored");
                }
                Completion::Released { page } => {
                    debug!(page, "fetch released without data");
                    caps.render.render();
                }
                Completion::Stored {
                    page,
                    items,
                    became_final,
                    reanchor,
                } => {
                    debug!(page, items, became_final, "page stored");
                    caps.render.render();
                    Self::resume_pending_scroll(model, caps, page, reanchor);
                    if Self::schedule_next(model, caps) {
                        caps.render.render();
                    }
                }
                Completion::Failed { page, error } => {
                    model.set_error(PagerError::from(error).with_page(page));
                    caps.render.render();
                    let target_page = model
                        .deep_link
                        .pending_target()
                        .map(|target| model.viewport.model(&model.config).page_of(target));
                    if target_page == Some(page) {
                        Self::abandon_pending_scroll(model, caps);
                    }
                }
            },

            Event::ItemMeasured { index, layout } => {
                model.viewport.record_layout(layout.clone());
                if model.deep_link.pending_target() != Some(index) {
                    debug!(index, "measurement for superseded scroll target");
                    return;
                }
                let Some(bounds) = layout.rendered_item_bounds(index) else {
                    let page = model.viewport.model(&model.config).page_of(index);
                    // A loaded page that still does not render the item
                    // never will.
                    if model.scheduler.cache().contains(page)
                        || Self::target_unreachable(model, index)
                    {
                        Self::abandon_pending_scroll(model, caps);
                    } else {
                        debug!(index, page, "target not rendered yet; waiting for its page");
                    }
                    return;
                };

                let offset = model
                    .viewport
                    .model(&model.config)
                    .scroll_offset_for(bounds, layout.scroll_offset);
                debug!(index, offset, "scrolling to item");
                caps.layout.scroll_to(offset);
                model.deep_link.finish_scroll(index);
                model.viewport.set_visible_item_index(index);
                Self::schedule_next(model, caps);
                caps.render.render();
            }

            Event::RetryFailedPages => {
                let cleared = model.scheduler.clear_failures();
                info!(cleared, "retrying failed pages");
                model.clear_error();
                Self::schedule_next(model, caps);
                caps.render.render();
            }

            Event::DismissError => {
                model.clear_error();
                caps.render.render();
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        let state = model.viewport.state(&model.config);
        let pages = if model.lifecycle == Lifecycle::Unmounted {
            Vec::new()
        } else {
            model.scheduler.page_slots(state.visible_page_range)
        };

        ViewModel {
            pages,
            items_per_page: model.config.items_per_page,
            items_per_row: state.items_per_row,
            visible_item_index: state.visible_item_index,
            showing_item: state.visible_item_index + 1,
            known_total: model.known_total(),
            is_loading: model.scheduler.is_loading(),
            final_page: model.scheduler.final_page(),
            failed_pages: model.scheduler.failed_pages().collect(),
            error: model.last_error.as_ref().map(UserFacingError::from),
        }
    }
}
