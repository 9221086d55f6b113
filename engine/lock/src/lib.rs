//! Process-coherent exclusive locks over cluster IDs and node IDs.
//!
//! Unlike the teacher's distributed coordinator (which arbitrates locks across a fleet
//! of processes via Zookeeper/etcd), the cluster action engine only needs locks to be
//! coherent within a single running process: at most one top-level action may hold the
//! lock for a given cluster or node at a time. The facade-over-trait-object shape is
//! kept so a distributed backend can be swapped in later without touching callers.
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use uuid::Uuid;

use fleetcore_context::Context;

/// Lock namespace: cluster IDs and node IDs never collide with each other.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum LockScope {
    Cluster,
    Node,
}

/// Exclusive, non-blocking locks keyed by `(scope, id)`.
///
/// Callers never block waiting for a lock: `acquire` either succeeds immediately or
/// returns `None` to signal contention, leaving retry policy to the caller.
#[derive(Clone)]
pub struct LockManager(Arc<dyn LockBackend>);

impl LockManager {
    /// Attempt to acquire the lock identified by `(scope, id)` on behalf of `owner`.
    ///
    /// Returns the current holder's identity on success (which is `owner` itself,
    /// whether freshly acquired or already held by `owner`). Returns `None` if another
    /// owner currently holds it and `forced` is `false`. When `forced` is `true`, any
    /// existing holder is preempted and `owner` installed in its place.
    pub async fn acquire(
        &self,
        context: &Context,
        id: Uuid,
        owner: &str,
        scope: LockScope,
        forced: bool,
    ) -> Result<Option<String>> {
        self.0.acquire(context, id, owner, scope, forced).await
    }

    /// Release the lock identified by `(scope, id)` if held by `owner`.
    ///
    /// Idempotent: releasing a lock not held by `owner` (including one already
    /// released, or never acquired) is not an error.
    pub async fn release(
        &self,
        context: &Context,
        id: Uuid,
        owner: &str,
        scope: LockScope,
    ) -> Result<()> {
        self.0.release(context, id, owner, scope).await
    }
}

impl<T> From<T> for LockManager
where
    T: LockBackend + 'static,
{
    fn from(value: T) -> Self {
        LockManager(Arc::new(value))
    }
}

/// Operations implemented by lock backends.
#[async_trait::async_trait]
pub trait LockBackend: Send + Sync {
    async fn acquire(
        &self,
        context: &Context,
        id: Uuid,
        owner: &str,
        scope: LockScope,
        forced: bool,
    ) -> Result<Option<String>>;

    async fn release(
        &self,
        context: &Context,
        id: Uuid,
        owner: &str,
        scope: LockScope,
    ) -> Result<()>;
}

/// Default, process-local lock backend. Good enough for a single `fleetcored` process;
/// a fleet of cooperating processes would need a distributed backend instead.
#[derive(Default)]
pub struct ProcessLockManager {
    held: Mutex<HashMap<(LockScope, Uuid), String>>,
}

impl ProcessLockManager {
    pub fn new() -> ProcessLockManager {
        ProcessLockManager::default()
    }
}

#[async_trait::async_trait]
impl LockBackend for ProcessLockManager {
    async fn acquire(
        &self,
        _: &Context,
        id: Uuid,
        owner: &str,
        scope: LockScope,
        forced: bool,
    ) -> Result<Option<String>> {
        let mut held = self.held.lock().await;
        let key = (scope, id);
        match held.get(&key) {
            Some(current) if current == owner => Ok(Some(current.clone())),
            Some(_) if !forced => Ok(None),
            _ => {
                held.insert(key, owner.to_string());
                Ok(Some(owner.to_string()))
            }
        }
    }

    async fn release(&self, _: &Context, id: Uuid, owner: &str, scope: LockScope) -> Result<()> {
        let mut held = self.held.lock().await;
        let key = (scope, id);
        if held.get(&key).map(String::as_str) == Some(owner) {
            held.remove(&key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> LockManager {
        LockManager::from(ProcessLockManager::new())
    }

    #[tokio::test]
    async fn acquire_then_contend() {
        let manager = manager();
        let context = Context::fixture();
        let id = Uuid::new_v4();

        let held = manager
            .acquire(&context, id, "action-1", LockScope::Cluster, false)
            .await
            .unwrap();
        assert_eq!(held, Some("action-1".to_string()));

        let contended = manager
            .acquire(&context, id, "action-2", LockScope::Cluster, false)
            .await
            .unwrap();
        assert_eq!(contended, None);
    }

    #[tokio::test]
    async fn forced_acquire_preempts_holder() {
        let manager = manager();
        let context = Context::fixture();
        let id = Uuid::new_v4();

        manager
            .acquire(&context, id, "action-1", LockScope::Cluster, false)
            .await
            .unwrap();
        let stolen = manager
            .acquire(&context, id, "action-2", LockScope::Cluster, true)
            .await
            .unwrap();
        assert_eq!(stolen, Some("action-2".to_string()));
    }

    #[tokio::test]
    async fn release_is_idempotent_and_scoped_to_owner() {
        let manager = manager();
        let context = Context::fixture();
        let id = Uuid::new_v4();

        manager
            .acquire(&context, id, "action-1", LockScope::Cluster, false)
            .await
            .unwrap();
        // Releasing under the wrong owner is a no-op, not an error.
        manager
            .release(&context, id, "action-2", LockScope::Cluster)
            .await
            .unwrap();
        let still_contended = manager
            .acquire(&context, id, "action-2", LockScope::Cluster, false)
            .await
            .unwrap();
        assert_eq!(still_contended, None);

        manager
            .release(&context, id, "action-1", LockScope::Cluster)
            .await
            .unwrap();
        manager
            .release(&context, id, "action-1", LockScope::Cluster)
            .await
            .unwrap();
        let reacquired = manager
            .acquire(&context, id, "action-2", LockScope::Cluster, false)
            .await
            .unwrap();
        assert_eq!(reacquired, Some("action-2".to_string()));
    }

    #[tokio::test]
    async fn cluster_and_node_scopes_are_independent() {
        let manager = manager();
        let context = Context::fixture();
        let id = Uuid::new_v4();

        manager
            .acquire(&context, id, "action-1", LockScope::Cluster, false)
            .await
            .unwrap();
        let node_lock = manager
            .acquire(&context, id, "action-2", LockScope::Node, false)
            .await
            .unwrap();
        assert_eq!(node_lock, Some("action-2".to_string()));
    }
}
