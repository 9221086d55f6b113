//! Repository interface for loading and persisting [`Cluster`] records.
use std::sync::Arc;

use anyhow::Result;
use uuid::Uuid;

use fleetcore_context::Context;
use fleetcore_models::Cluster;

/// Load and persist cluster records.
#[derive(Clone)]
pub struct ClusterRepository(Arc<dyn ClusterRepositoryBackend>);

impl ClusterRepository {
    /// Load a cluster by id, if it exists.
    pub async fn get(&self, context: &Context, id: Uuid) -> Result<Option<Cluster>> {
        self.0.get(context, id).await
    }

    /// Persist the full cluster record.
    pub async fn store(&self, context: &Context, cluster: &Cluster) -> Result<()> {
        self.0.store(context, cluster.clone()).await
    }

    /// Remove a cluster record once `do_delete` has torn down its last node.
    pub async fn delete(&self, context: &Context, id: Uuid) -> Result<()> {
        self.0.delete(context, id).await
    }
}

impl<T> From<T> for ClusterRepository
where
    T: ClusterRepositoryBackend + 'static,
{
    fn from(value: T) -> Self {
        ClusterRepository(Arc::new(value))
    }
}

/// Operations implemented by persistent store backends for cluster records.
#[async_trait::async_trait]
pub trait ClusterRepositoryBackend: Send + Sync {
    async fn get(&self, context: &Context, id: Uuid) -> Result<Option<Cluster>>;
    async fn store(&self, context: &Context, cluster: Cluster) -> Result<()>;
    async fn delete(&self, context: &Context, id: Uuid) -> Result<()>;
}
