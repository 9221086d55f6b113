//! Durable record of every action, its dependency edges and its lifecycle status.
use std::sync::Arc;

use anyhow::Result;
use uuid::Uuid;

use fleetcore_context::Context;
use fleetcore_models::Action;
use fleetcore_models::ActionStatus;
use fleetcore_models::ResultCode;

/// Durable store of [`Action`] records and their dependency edges.
///
/// Contract surface the engine consumes, per spec §4.3: `store`, `get`,
/// `add_dependency`, `list_dependents`, `set_status`.
#[derive(Clone)]
pub struct ActionStore(Arc<dyn ActionStoreBackend>);

impl ActionStore {
    /// Persist an action. On first call (nil id) a fresh id is assigned and returned on
    /// the resulting record; subsequent calls update the existing record in place.
    pub async fn store(&self, context: &Context, action: Action) -> Result<Action> {
        self.0.store(context, action).await
    }

    /// Look up an action by id.
    pub async fn get(&self, context: &Context, id: Uuid) -> Result<Option<Action>> {
        self.0.get(context, id).await
    }

    /// Register a `child -> parent` dependency edge. Must be visible to `list_dependents`
    /// before the parent begins waiting (spec §8 invariant).
    pub async fn add_dependency(
        &self,
        context: &Context,
        child_id: Uuid,
        parent_id: Uuid,
    ) -> Result<()> {
        self.0.add_dependency(context, child_id, parent_id).await
    }

    /// List the ids of actions depending on `parent_id` — i.e. its derived children.
    pub async fn list_dependents(&self, context: &Context, parent_id: Uuid) -> Result<Vec<Uuid>> {
        self.0.list_dependents(context, parent_id).await
    }

    /// Update just the status (and optionally result/reason) of an action.
    pub async fn set_status(
        &self,
        context: &Context,
        id: Uuid,
        status: ActionStatus,
        result: Option<ResultCode>,
        reason: Option<String>,
    ) -> Result<()> {
        self.0.set_status(context, id, status, result, reason).await
    }
}

impl<T> From<T> for ActionStore
where
    T: ActionStoreBackend + 'static,
{
    fn from(value: T) -> Self {
        ActionStore(Arc::new(value))
    }
}

/// Operations implemented by persistent store backends for action records.
#[async_trait::async_trait]
pub trait ActionStoreBackend: Send + Sync {
    async fn store(&self, context: &Context, action: Action) -> Result<Action>;
    async fn get(&self, context: &Context, id: Uuid) -> Result<Option<Action>>;
    async fn add_dependency(&self, context: &Context, child_id: Uuid, parent_id: Uuid) -> Result<()>;
    async fn list_dependents(&self, context: &Context, parent_id: Uuid) -> Result<Vec<Uuid>>;
    async fn set_status(
        &self,
        context: &Context,
        id: Uuid,
        status: ActionStatus,
        result: Option<ResultCode>,
        reason: Option<String>,
    ) -> Result<()>;
}
