//! Repository interface for loading and persisting [`Node`] records.
use std::sync::Arc;

use anyhow::Result;
use uuid::Uuid;

use fleetcore_context::Context;
use fleetcore_models::Node;

/// Load and persist node records.
#[derive(Clone)]
pub struct NodeRepository(Arc<dyn NodeRepositoryBackend>);

impl NodeRepository {
    /// Load a node by id, if it exists.
    pub async fn get(&self, context: &Context, id: Uuid) -> Result<Option<Node>> {
        self.0.get(context, id).await
    }

    /// Persist the full node record.
    pub async fn store(&self, context: &Context, node: &Node) -> Result<()> {
        self.0.store(context, node.clone()).await
    }

    /// Remove a node record, e.g. once `NODE_DELETE` has finished.
    pub async fn delete(&self, context: &Context, id: Uuid) -> Result<()> {
        self.0.delete(context, id).await
    }

    /// List the nodes currently bound to a cluster.
    pub async fn list_by_cluster(&self, context: &Context, cluster_id: Uuid) -> Result<Vec<Node>> {
        self.0.list_by_cluster(context, cluster_id).await
    }
}

impl<T> From<T> for NodeRepository
where
    T: NodeRepositoryBackend + 'static,
{
    fn from(value: T) -> Self {
        NodeRepository(Arc::new(value))
    }
}

/// Operations implemented by persistent store backends for node records.
#[async_trait::async_trait]
pub trait NodeRepositoryBackend: Send + Sync {
    async fn get(&self, context: &Context, id: Uuid) -> Result<Option<Node>>;
    async fn store(&self, context: &Context, node: Node) -> Result<()>;
    async fn delete(&self, context: &Context, id: Uuid) -> Result<()>;
    async fn list_by_cluster(&self, context: &Context, cluster_id: Uuid) -> Result<Vec<Node>>;
}
