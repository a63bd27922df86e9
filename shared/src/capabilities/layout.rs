use crux_core::capability::{CapabilityContext, Operation};
use crux_core::macros::Capability;
use serde::{Deserialize, Serialize};

use crate::viewport::LayoutSnapshot;

/// Requests to the rendering/viewport layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LayoutOperation {
    /// Report the current layout, including the bounds of `item_index` if it
    /// is rendered.
    Measure { item_index: usize },
    ScrollTo { offset: f64 },
}

impl Operation for LayoutOperation {
    type Output = LayoutSnapshot;
}

#[derive(Capability)]
pub struct Layout<Ev> {
    context: CapabilityContext<LayoutOperation, Ev>,
}

impl<Ev> Layout<Ev> {
    pub fn new(context: CapabilityContext<LayoutOperation, Ev>) -> Self {
        Self { context }
    }
}

impl<Ev> Layout<Ev>
where
    Ev: 'static,
{
    pub fn measure<F>(&self, item_index: usize, callback: F)
    where
        F: FnOnce(LayoutSnapshot) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let layout = ctx
                .request_from_shell(LayoutOperation::Measure { item_index })
                .await;
            ctx.update_app(callback(layout));
        });
    }

    pub fn scroll_to(&self, offset: f64) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(LayoutOperation::ScrollTo { offset }).await;
        });
    }
}
