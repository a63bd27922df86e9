//! Shell-side effects the core depends on.
//!
//! Rendering goes through Crux's built-in Render capability; paged search,
//! layout and location are custom request/notify capabilities implemented by
//! each shell.

mod layout;
mod location;
mod paged_search;

pub use self::layout::{Layout, LayoutOperation};
pub use self::location::{Location, LocationOperation};
pub use self::paged_search::{FetchError, PageOutput, PageRequest, PageResult, PagedSearch};
pub use crux_core::render::Render;

use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub render: Render<Event>,
    pub paged_search: PagedSearch<Event>,
    pub layout: Layout<Event>,
    pub location: Location<Event>,
}
