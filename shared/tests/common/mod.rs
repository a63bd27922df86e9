//! A scripted shell: lays items out on a fixed grid, answers layout and
//! location requests immediately, and holds page fetches until the test
//! releases them.

#![allow(dead_code)]

use std::collections::VecDeque;

use crux_core::{testing::AppTester, Request};
use listing_pager::capabilities::{LayoutOperation, LocationOperation, PageRequest};
use listing_pager::{
    App, CruxApp, Effect, Event, FetchError, LayoutSnapshot, ListItem, Model, PageOutput,
    PageResult, PageSlot, RenderedItem, RequestToken, SearchQuery, ViewModel,
};
use serde_json::json;

pub const ROW_HEIGHT: f64 = 100.0;
pub const VIEWPORT_HEIGHT: f64 = 800.0;

pub struct FakeShell {
    app: AppTester<App, Effect>,
    pub model: Model,
    pub total_items: usize,
    pub items_per_row: usize,
    pub viewport_height: f64,
    pub scroll_offset: f64,
    pub fragment: String,
    pending: VecDeque<Request<PageRequest>>,
    pub fetched_pages: Vec<usize>,
    pub last_query: Option<SearchQuery>,
    pub last_page_size: Option<usize>,
    pub cancelled: Vec<RequestToken>,
    pub scroll_commands: Vec<f64>,
    pub fragment_writes: Vec<String>,
    pub measured: Vec<usize>,
    pub renders: usize,
}

impl FakeShell {
    pub fn new(total_items: usize) -> Self {
        Self {
            app: AppTester::default(),
            model: Model::default(),
            total_items,
            items_per_row: 1,
            viewport_height: VIEWPORT_HEIGHT,
            scroll_offset: 0.0,
            fragment: String::new(),
            pending: VecDeque::new(),
            fetched_pages: Vec::new(),
            last_query: None,
            last_page_size: None,
            cancelled: Vec::new(),
            scroll_commands: Vec::new(),
            fragment_writes: Vec::new(),
            measured: Vec::new(),
            renders: 0,
        }
    }

    pub fn with_columns(mut self, items_per_row: usize) -> Self {
        self.items_per_row = items_per_row;
        self
    }

    pub fn view(&self) -> ViewModel {
        App.view(&self.model)
    }

    pub fn pending_fetches(&self) -> usize {
        self.pending.len()
    }

    /// Where every loaded item currently sits, relative to the viewport top.
    pub fn snapshot(&self) -> LayoutSnapshot {
        let view = self.view();
        let header = self.model.config.header_offset;
        let items_per_row = self.items_per_row.max(1);
        let items_per_page = view.items_per_page;

        let rendered = view
            .pages
            .iter()
            .filter_map(|slot| match slot {
                PageSlot::Loaded { index, items } => Some((*index, items.len())),
                PageSlot::Placeholder { .. } => None,
            })
            .flat_map(|(page, len)| (0..len).map(move |i| page * items_per_page + i))
            .map(|index| RenderedItem {
                index,
                top: header + (index / items_per_row) as f64 * ROW_HEIGHT - self.scroll_offset,
                height: ROW_HEIGHT,
            })
            .collect();

        LayoutSnapshot {
            viewport_height: self.viewport_height,
            scroll_offset: self.scroll_offset,
            items_per_row,
            row_height: ROW_HEIGHT,
            rendered,
        }
    }

    pub fn dispatch(&mut self, event: Event) {
        let update = self.app.update(event, &mut self.model);
        let mut effects = update.effects;
        effects.extend(self.dispatch_all(update.events));
        self.run(effects);
    }

    pub fn mount(&mut self, fragment: &str) {
        self.fragment = fragment.to_owned();
        let layout = self.snapshot();
        self.dispatch(Event::Mounted { layout });
    }

    /// User scroll that puts the row holding `item` right under the header.
    pub fn scroll_to_row_of(&mut self, item: usize) {
        self.scroll_offset = (item / self.items_per_row.max(1)) as f64 * ROW_HEIGHT;
        let layout = self.snapshot();
        self.dispatch(Event::Scrolled(layout));
    }

    /// Breakpoint change: same scroll offset, different column count.
    pub fn resize_columns(&mut self, items_per_row: usize) {
        self.items_per_row = items_per_row;
        let layout = self.snapshot();
        self.dispatch(Event::Resized(layout));
    }

    /// The user edits the URL or presses back/forward.
    pub fn change_fragment(&mut self, fragment: &str) {
        self.fragment = fragment.to_owned();
        self.dispatch(Event::FragmentChanged(fragment.to_owned()));
    }

    /// Answers the oldest outstanding fetch from the backing data set.
    pub fn respond_next(&mut self) -> bool {
        let Some(request) = self.pending.pop_front() else {
            return false;
        };
        let PageRequest::Fetch {
            page_index,
            page_size,
            ..
        } = request.operation.clone()
        else {
            unreachable!("only fetches are queued");
        };
        let start = (page_index * page_size).min(self.total_items);
        let end = (start + page_size).min(self.total_items);
        let items = (start..end)
            .map(|id| ListItem::new(json!({ "id": id })))
            .collect();
        self.resolve_fetch(request, Ok(PageOutput::new(items)));
        true
    }

    pub fn fail_next(&mut self, error: FetchError) -> bool {
        let Some(request) = self.pending.pop_front() else {
            return false;
        };
        self.resolve_fetch(request, Err(error));
        true
    }

    /// Answers fetches until the core stops asking.
    pub fn settle(&mut self) {
        while self.respond_next() {}
    }

    fn resolve_fetch(&mut self, mut request: Request<PageRequest>, result: PageResult) {
        let update = self
            .app
            .resolve(&mut request, result)
            .expect("fetch resolves");
        let mut effects = update.effects;
        effects.extend(self.dispatch_all(update.events));
        self.run(effects);
    }

    fn dispatch_all(&mut self, events: Vec<Event>) -> Vec<Effect> {
        let mut effects = Vec::new();
        for event in events {
            let update = self.app.update(event, &mut self.model);
            effects.extend(update.effects);
            effects.extend(self.dispatch_all(update.events));
        }
        effects
    }

    fn run(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::Render(_) => self.renders += 1,
                Effect::PagedSearch(request) => match request.operation.clone() {
                    PageRequest::Fetch {
                        page_index,
                        page_size,
                        query,
                        ..
                    } => {
                        self.fetched_pages.push(page_index);
                        self.last_page_size = Some(page_size);
                        self.last_query = Some(query);
                        self.pending.push_back(request);
                    }
                    PageRequest::Cancel { token } => self.cancelled.push(token),
                },
                Effect::Layout(mut request) => match request.operation.clone() {
                    LayoutOperation::Measure { item_index } => {
                        self.measured.push(item_index);
                        let snapshot = self.snapshot();
                        let update = self
                            .app
                            .resolve(&mut request, snapshot)
                            .expect("measure resolves");
                        queue.extend(update.effects);
                        queue.extend(self.dispatch_all(update.events));
                    }
                    LayoutOperation::ScrollTo { offset } => {
                        self.scroll_commands.push(offset);
                        self.scroll_offset = offset;
                        // Programmatic scrolls fire scroll events too.
                        let layout = self.snapshot();
                        let update = self.app.update(Event::Scrolled(layout), &mut self.model);
                        queue.extend(update.effects);
                    }
                },
                Effect::Location(mut request) => match request.operation.clone() {
                    LocationOperation::ReadFragment => {
                        let fragment = self.fragment.clone();
                        let update = self
                            .app
                            .resolve(&mut request, fragment)
                            .expect("read fragment resolves");
                        queue.extend(update.effects);
                        queue.extend(self.dispatch_all(update.events));
                    }
                    LocationOperation::WriteFragment { fragment } => {
                        self.fragment = fragment.clone();
                        self.fragment_writes.push(fragment);
                    }
                },
            }
        }
    }
}
