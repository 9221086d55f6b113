//! In-memory store backends used by the engine's own tests and by downstream consumers.
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use uuid::Uuid;

use fleetcore_context::Context;
use fleetcore_models::Action;
use fleetcore_models::ActionStatus;
use fleetcore_models::Cluster;
use fleetcore_models::Node;
use fleetcore_models::ResultCode;

use crate::ActionStoreBackend;
use crate::ClusterRepository;
use crate::ClusterRepositoryBackend;
use crate::ActionStore;
use crate::NodeRepository;
use crate::NodeRepositoryBackend;

/// Shared in-memory state backing all three fixture repositories.
#[derive(Default)]
struct State {
    clusters: HashMap<Uuid, Cluster>,
    nodes: HashMap<Uuid, Node>,
    actions: HashMap<Uuid, Action>,
    dependents: HashMap<Uuid, Vec<Uuid>>,
}

/// An in-memory repository stack for unit tests.
#[derive(Clone)]
pub struct StoreFixture {
    state: Arc<Mutex<State>>,
}

impl StoreFixture {
    pub fn new() -> StoreFixture {
        StoreFixture {
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Seed a cluster record directly, bypassing the repository interface.
    pub async fn seed_cluster(&self, cluster: Cluster) {
        self.state.lock().await.clusters.insert(cluster.id, cluster);
    }

    /// Seed a node record directly, bypassing the repository interface.
    pub async fn seed_node(&self, node: Node) {
        self.state.lock().await.nodes.insert(node.id, node);
    }

    pub fn cluster_repository(&self) -> ClusterRepository {
        ClusterRepository::from(FixtureBackend {
            state: self.state.clone(),
        })
    }

    pub fn node_repository(&self) -> NodeRepository {
        NodeRepository::from(FixtureBackend {
            state: self.state.clone(),
        })
    }

    pub fn action_store(&self) -> ActionStore {
        ActionStore::from(FixtureBackend {
            state: self.state.clone(),
        })
    }
}

impl Default for StoreFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
struct FixtureBackend {
    state: Arc<Mutex<State>>,
}

#[async_trait::async_trait]
impl ClusterRepositoryBackend for FixtureBackend {
    async fn get(&self, _: &Context, id: Uuid) -> Result<Option<Cluster>> {
        Ok(self.state.lock().await.clusters.get(&id).cloned())
    }

    async fn store(&self, _: &Context, cluster: Cluster) -> Result<()> {
        self.state.lock().await.clusters.insert(cluster.id, cluster);
        Ok(())
    }

    async fn delete(&self, _: &Context, id: Uuid) -> Result<()> {
        self.state.lock().await.clusters.remove(&id);
        Ok(())
    }
}

#[async_trait::async_trait]
impl NodeRepositoryBackend for FixtureBackend {
    async fn get(&self, _: &Context, id: Uuid) -> Result<Option<Node>> {
        Ok(self.state.lock().await.nodes.get(&id).cloned())
    }

    async fn store(&self, _: &Context, node: Node) -> Result<()> {
        self.state.lock().await.nodes.insert(node.id, node);
        Ok(())
    }

    async fn delete(&self, _: &Context, id: Uuid) -> Result<()> {
        self.state.lock().await.nodes.remove(&id);
        Ok(())
    }

    async fn list_by_cluster(&self, _: &Context, cluster_id: Uuid) -> Result<Vec<Node>> {
        let state = self.state.lock().await;
        Ok(state
            .nodes
            .values()
            .filter(|node| node.cluster_id == Some(cluster_id))
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl ActionStoreBackend for FixtureBackend {
    async fn store(&self, _: &Context, mut action: Action) -> Result<Action> {
        let mut state = self.state.lock().await;
        if action.id.is_nil() {
            action.id = Uuid::new_v4();
        }
        state.actions.insert(action.id, action.clone());
        Ok(action)
    }

    async fn get(&self, _: &Context, id: Uuid) -> Result<Option<Action>> {
        Ok(self.state.lock().await.actions.get(&id).cloned())
    }

    async fn add_dependency(&self, _: &Context, child_id: Uuid, parent_id: Uuid) -> Result<()> {
        let mut state = self.state.lock().await;
        state.dependents.entry(parent_id).or_default().push(child_id);
        if let Some(parent) = state.actions.get_mut(&parent_id) {
            parent.dependents.push(child_id);
        }
        Ok(())
    }

    async fn list_dependents(&self, _: &Context, parent_id: Uuid) -> Result<Vec<Uuid>> {
        Ok(self
            .state
            .lock()
            .await
            .dependents
            .get(&parent_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_status(
        &self,
        _: &Context,
        id: Uuid,
        status: ActionStatus,
        result: Option<ResultCode>,
        reason: Option<String>,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        if let Some(action) = state.actions.get_mut(&id) {
            action.status = status;
            if result.is_some() {
                action.result = result;
            }
            let _ = reason;
        }
        Ok(())
    }
}
