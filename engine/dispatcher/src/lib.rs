//! Hands queued actions to worker executors.
//!
//! The engine only needs to call [`Dispatcher::start_action`] once an action's
//! dependencies are registered and it has moved to `READY`; everything about how (and on
//! which worker) it actually runs is opaque to the caller, mirroring how `Tasks` hides
//! the queue platform from the rest of the teacher codebase.
use std::sync::Arc;

use anyhow::Result;
use uuid::Uuid;

use fleetcore_context::Context;

/// Submits ready actions for execution.
#[derive(Clone)]
pub struct Dispatcher(Arc<dyn DispatcherBackend>);

impl Dispatcher {
    /// Ask the backend to start running the action identified by `id`.
    ///
    /// The engine calls this once, right after the action transitions to `READY`; the
    /// dispatcher owns the `READY -> RUNNING` transition and any retry/backoff policy.
    pub async fn start_action(&self, context: &Context, id: Uuid) -> Result<()> {
        self.0.start_action(context, id).await
    }
}

impl<T> From<T> for Dispatcher
where
    T: DispatcherBackend + 'static,
{
    fn from(value: T) -> Self {
        Dispatcher(Arc::new(value))
    }
}

/// Operations implemented by dispatch backends.
#[async_trait::async_trait]
pub trait DispatcherBackend: Send + Sync {
    async fn start_action(&self, context: &Context, id: Uuid) -> Result<()>;
}

#[cfg(any(test, feature = "test-fixture"))]
mod fixture;
#[cfg(any(test, feature = "test-fixture"))]
pub use fixture::DispatcherFixture;
