use crux_core::capability::{CapabilityContext, Operation};
use crux_core::macros::Capability;
use serde::{Deserialize, Serialize};

/// Requests to the browser location/history facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationOperation {
    ReadFragment,
    /// Replace the fragment without adding a history entry.
    WriteFragment { fragment: String },
}

impl Operation for LocationOperation {
    type Output = String;
}

#[derive(Capability)]
pub struct Location<Ev> {
    context: CapabilityContext<LocationOperation, Ev>,
}

impl<Ev> Location<Ev> {
    pub fn new(context: CapabilityContext<LocationOperation, Ev>) -> Self {
        Self { context }
    }
}

impl<Ev> Location<Ev>
where
    Ev: 'static,
{
    pub fn read_fragment<F>(&self, callback: F)
    where
        F: FnOnce(String) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let fragment = ctx.request_from_shell(LocationOperation::ReadFragment).await;
            ctx.update_app(callback(fragment));
        });
    }

    pub fn write_fragment(&self, fragment: String) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(LocationOperation::WriteFragment { fragment })
                .await;
        });
    }
}
