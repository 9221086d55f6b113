use std::sync::Arc;
use std::sync::Mutex;

use anyhow::Result;
use uuid::Uuid;

use fleetcore_context::Context;

use crate::Dispatcher;
use crate::DispatcherBackend;

/// Records `start_action` calls instead of running anything, for use in tests.
#[derive(Clone, Default)]
pub struct DispatcherFixture {
    started: Arc<Mutex<Vec<Uuid>>>,
}

impl DispatcherFixture {
    pub fn new() -> DispatcherFixture {
        DispatcherFixture::default()
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::from(self.clone())
    }

    /// IDs passed to `start_action`, in call order.
    pub fn started(&self) -> Vec<Uuid> {
        self.started.lock().expect("fixture mutex poisoned").clone()
    }
}

#[async_trait::async_trait]
impl DispatcherBackend for DispatcherFixture {
    async fn start_action(&self, _: &Context, id: Uuid) -> Result<()> {
        self.started.lock().expect("fixture mutex poisoned").push(id);
        Ok(())
    }
}
