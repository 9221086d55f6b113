//! Repository interfaces for the records the engine persists: clusters, nodes
//! and actions. Each repository is a thin facade over a pluggable backend,
//! mirroring how the rest of the engine hides storage behind a trait object.
mod action_store;
mod cluster_repo;
mod node_repo;

#[cfg(any(test, feature = "test-fixture"))]
mod fixture;

pub use action_store::ActionStore;
pub use action_store::ActionStoreBackend;
pub use cluster_repo::ClusterRepository;
pub use cluster_repo::ClusterRepositoryBackend;
pub use node_repo::NodeRepository;
pub use node_repo::NodeRepositoryBackend;

#[cfg(any(test, feature = "test-fixture"))]
pub use fixture::StoreFixture;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use fleetcore_context::Context;
    use fleetcore_models::Action;
    use fleetcore_models::ActionKind;
    use fleetcore_models::ActionStatus;
    use fleetcore_models::Cluster;
    use fleetcore_models::ClusterStatus;
    use fleetcore_models::Owner;
    use fleetcore_models::ResultCode;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn fixture_cluster() -> Cluster {
        let now = OffsetDateTime::UNIX_EPOCH;
        Cluster {
            id: Uuid::new_v4(),
            profile_id: "profile-1".to_string(),
            desired_capacity: 3,
            min_size: 0,
            max_size: -1,
            status: ClusterStatus::Active,
            status_reason: String::new(),
            node_ids: Vec::new(),
            policies: Vec::new(),
            next_index: 0,
            owner: Owner::new("user", "project", "default"),
            metadata: serde_json::Value::Null,
            created_ts: now,
            updated_ts: now,
        }
    }

    #[tokio::test]
    async fn cluster_round_trips_through_repository() {
        let fixture = StoreFixture::new();
        let repo = fixture.cluster_repository();
        let context = Context::fixture();
        let cluster = fixture_cluster();
        let id = cluster.id;
        repo.store(&context, &cluster).await.unwrap();
        let loaded = repo.get(&context, id).await.unwrap().unwrap();
        assert_eq!(loaded.desired_capacity, 3);
    }

    #[tokio::test]
    async fn dependents_are_visible_once_registered() {
        let fixture = StoreFixture::new();
        let store = fixture.action_store();
        let context = Context::fixture();
        let owner = Owner::new("user", "project", "default");
        let parent = Action::new_top_level(Uuid::new_v4(), ActionKind::ClusterScaleOut, owner);
        let parent = store.store(&context, parent).await.unwrap();

        let node_id = Uuid::new_v4();
        let child = Action::derived(&parent, "create", node_id, ActionKind::NodeCreate, BTreeMap::new());
        let child = store.store(&context, child).await.unwrap();
        store.add_dependency(&context, child.id, parent.id).await.unwrap();

        let dependents = store.list_dependents(&context, parent.id).await.unwrap();
        assert_eq!(dependents, vec![child.id]);

        store
            .set_status(
                &context,
                child.id,
                ActionStatus::Succeeded,
                Some(ResultCode::Ok),
                None,
            )
            .await
            .unwrap();
        let reloaded = store.get(&context, child.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, ActionStatus::Succeeded);
    }
}
