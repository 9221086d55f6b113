//! Integration tests driving [`ClusterActionExecutor::execute`] end to end against the
//! in-memory fixture stack.
use time::OffsetDateTime;
use uuid::Uuid;

use fleetcore_context::Context;
use fleetcore_models::Action;
use fleetcore_models::ActionKind;
use fleetcore_models::ActionStatus;
use fleetcore_models::Cluster;
use fleetcore_models::ClusterPolicyBinding;
use fleetcore_models::ClusterStatus;
use fleetcore_models::Node;
use fleetcore_models::NodeStatus;
use fleetcore_models::Owner;
use fleetcore_models::ResultCode;
use fleetcore_policy::CheckOutcome;
use fleetcore_policy::Policy;
use fleetcore_policy::PolicyRegistry;
use fleetcore_profile::FixtureProfile;
use fleetcore_profile::ProfileRegistry;

use crate::fixture::ExecutorFixture;

fn owner() -> Owner {
    Owner::new("user", "project", "default")
}

fn fixture_cluster(desired: i64, min: i64, max: i64) -> Cluster {
    let now = OffsetDateTime::UNIX_EPOCH;
    Cluster {
        id: Uuid::new_v4(),
        profile_id: "compute/v1".to_string(),
        desired_capacity: desired,
        min_size: min,
        max_size: max,
        status: ClusterStatus::Active,
        status_reason: String::new(),
        node_ids: Vec::new(),
        policies: Vec::new(),
        next_index: 1,
        owner: owner(),
        metadata: serde_json::Value::Null,
        created_ts: now,
        updated_ts: now,
    }
}

fn fixture_node(cluster_id: Uuid, index: i64) -> Node {
    let now = OffsetDateTime::UNIX_EPOCH;
    Node {
        id: Uuid::new_v4(),
        profile_id: "compute/v1".to_string(),
        cluster_id: Some(cluster_id),
        index,
        status: NodeStatus::Active,
        status_reason: String::new(),
        metadata: serde_json::Value::Null,
        placement: None,
        data: serde_json::Value::Null,
        owner: owner(),
        created_ts: now,
        updated_ts: now,
    }
}

fn profiles() -> ProfileRegistry {
    let mut builder = ProfileRegistry::build();
    builder.register(FixtureProfile::new("compute/v1"));
    builder.finish()
}

#[tokio::test]
async fn scenario_1_create_single_node_cluster() {
    let context = Context::fixture();
    let fixture = ExecutorFixture::new();
    let executor = fixture.executor(profiles(), PolicyRegistry::build().finish());

    let cluster = fixture_cluster(1, 0, -1);
    let cluster_id = cluster.id;
    fixture.store.seed_cluster(cluster).await;

    let action = Action::new_top_level(cluster_id, ActionKind::ClusterCreate, owner());
    let action = fixture.action_store().store(&context, action).await.unwrap();

    let (code, message) = executor.execute(&context, action.id).await.unwrap();
    assert_eq!(code, ResultCode::Ok);
    assert_eq!(message, "Cluster creation succeeded.");

    let cluster = fixture.cluster_repository().get(&context, cluster_id).await.unwrap().unwrap();
    assert_eq!(cluster.status, ClusterStatus::Active);
    assert_eq!(cluster.status_reason, "Cluster creation succeeded.");
    assert_eq!(cluster.node_ids.len(), 1);

    let node = fixture
        .node_repository()
        .get(&context, cluster.node_ids[0])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(node.index, 1);
    assert_eq!(node.status, NodeStatus::Active);

    let stored_action = fixture.action_store().get(&context, action.id).await.unwrap().unwrap();
    let nodes = stored_action.data.get("nodes").and_then(|v| v.as_array()).unwrap();
    assert_eq!(nodes.len(), 1);
}

#[tokio::test]
async fn scenario_2_update_two_node_cluster() {
    let context = Context::fixture();
    let fixture = ExecutorFixture::new();
    let executor = fixture.executor(profiles(), PolicyRegistry::build().finish());

    let mut cluster = fixture_cluster(2, 0, -1);
    let cluster_id = cluster.id;
    let node_a = fixture_node(cluster_id, 1);
    let node_b = fixture_node(cluster_id, 2);
    cluster.node_ids = vec![node_a.id, node_b.id];
    fixture.store.seed_cluster(cluster).await;
    fixture.store.seed_node(node_a).await;
    fixture.store.seed_node(node_b).await;

    let mut action = Action::new_top_level(cluster_id, ActionKind::ClusterUpdate, owner());
    action
        .inputs
        .insert("new_profile_id".to_string(), serde_json::json!("compute/v2"));
    let action = fixture.action_store().store(&context, action).await.unwrap();

    let (code, message) = executor.execute(&context, action.id).await.unwrap();
    assert_eq!(code, ResultCode::Ok);
    assert_eq!(message, "Cluster update completed.");

    let cluster = fixture.cluster_repository().get(&context, cluster_id).await.unwrap().unwrap();
    assert_eq!(cluster.profile_id, "compute/v2");
    assert_eq!(cluster.status, ClusterStatus::Active);
}

#[tokio::test]
async fn scenario_3_delete_two_node_cluster() {
    let context = Context::fixture();
    let fixture = ExecutorFixture::new();

    let mut cluster = fixture_cluster(2, 0, -1);
    let cluster_id = cluster.id;
    let node_a = fixture_node(cluster_id, 1);
    let node_b = fixture_node(cluster_id, 2);
    cluster.node_ids = vec![node_a.id, node_b.id];
    fixture.store.seed_cluster(cluster).await;
    fixture.store.seed_node(node_a).await;
    fixture.store.seed_node(node_b).await;

    let executor = fixture.executor(profiles(), PolicyRegistry::build().finish());
    let action = Action::new_top_level(cluster_id, ActionKind::ClusterDelete, owner());
    let action = fixture.action_store().store(&context, action).await.unwrap();

    let (code, message) = executor.execute(&context, action.id).await.unwrap();
    assert_eq!(code, ResultCode::Ok);
    assert_eq!(message, "Cluster deletion succeeded.");

    let cluster = fixture.cluster_repository().get(&context, cluster_id).await.unwrap();
    assert!(cluster.is_none(), "deleted cluster record must be removed");
}

#[tokio::test]
async fn scenario_4_add_nodes_rejects_node_owned_by_another_cluster() {
    let context = Context::fixture();
    let fixture = ExecutorFixture::new();
    let executor = fixture.executor(profiles(), PolicyRegistry::build().finish());

    let cluster = fixture_cluster(0, 0, -1);
    let cluster_id = cluster.id;
    let other_cluster_id = Uuid::new_v4();
    let stray = fixture_node(other_cluster_id, 1);
    let stray_id = stray.id;
    fixture.store.seed_cluster(cluster).await;
    fixture.store.seed_node(stray).await;

    let mut action = Action::new_top_level(cluster_id, ActionKind::ClusterAddNodes, owner());
    action
        .inputs
        .insert("nodes".to_string(), serde_json::json!([stray_id.to_string()]));
    let action = fixture.action_store().store(&context, action).await.unwrap();

    let (code, message) = executor.execute(&context, action.id).await.unwrap();
    assert_eq!(code, ResultCode::Error);
    assert_eq!(
        message,
        format!("Node [{}] is already owned by cluster [{}].", stray_id, other_cluster_id)
    );

    let stored_action = fixture.action_store().get(&context, action.id).await.unwrap().unwrap();
    assert!(stored_action.data.is_empty(), "do_add_nodes must not touch action.data on ERROR");
}

#[tokio::test]
async fn scenario_5_scale_out_from_empty_cluster() {
    let context = Context::fixture();
    let fixture = ExecutorFixture::new();
    let executor = fixture.executor(profiles(), PolicyRegistry::build().finish());

    let cluster = fixture_cluster(0, 0, -1);
    let cluster_id = cluster.id;
    fixture.store.seed_cluster(cluster).await;

    let mut action = Action::new_top_level(cluster_id, ActionKind::ClusterScaleOut, owner());
    action.inputs.insert("count".to_string(), serde_json::json!(2));
    let action = fixture.action_store().store(&context, action).await.unwrap();

    let (code, message) = executor.execute(&context, action.id).await.unwrap();
    assert_eq!(code, ResultCode::Ok);
    assert_eq!(message, "Cluster scaling succeeded.");

    let cluster = fixture.cluster_repository().get(&context, cluster_id).await.unwrap().unwrap();
    assert_eq!(cluster.node_ids.len(), 2);
    assert_eq!(cluster.status, ClusterStatus::Active);
}

#[tokio::test]
async fn scenario_6_attach_singleton_policy_conflict() {
    let context = Context::fixture();
    let fixture = ExecutorFixture::new();

    let mut builder = PolicyRegistry::build();
    let existing_id = Uuid::new_v4();
    let new_id = Uuid::new_v4();
    builder.register(existing_id, SingletonPolicy);
    builder.register(new_id, SingletonPolicy);
    let policies = builder.finish();

    let mut cluster = fixture_cluster(0, 0, -1);
    let cluster_id = cluster.id;
    cluster.policies.push(ClusterPolicyBinding::new(cluster_id, existing_id));
    fixture.store.seed_cluster(cluster).await;

    let executor = fixture.executor(profiles(), policies);
    let mut action = Action::new_top_level(cluster_id, ActionKind::ClusterAttachPolicy, owner());
    action
        .inputs
        .insert("policy_id".to_string(), serde_json::json!(new_id.to_string()));
    let action = fixture.action_store().store(&context, action).await.unwrap();

    let (code, message) = executor.execute(&context, action.id).await.unwrap();
    assert_eq!(code, ResultCode::Error);
    assert_eq!(
        message,
        format!(
            "Only one instance of policy type (singleton-type) can be attached to a cluster, but \
             another instance ({}) is found attached to the cluster ({}) already.",
            existing_id, cluster_id
        )
    );
}

struct SingletonPolicy;

#[async_trait::async_trait]
impl Policy for SingletonPolicy {
    fn kind(&self) -> &str {
        "singleton-type"
    }

    fn singleton(&self) -> bool {
        true
    }

    async fn check(
        &self,
        _: &Context,
        _: &Cluster,
        _: fleetcore_models::PolicyPhase,
    ) -> anyhow::Result<CheckOutcome> {
        Ok(CheckOutcome::ok())
    }
}

#[tokio::test]
async fn attach_already_attached_policy_is_a_noop() {
    let context = Context::fixture();
    let fixture = ExecutorFixture::new();

    let mut builder = PolicyRegistry::build();
    let policy_id = Uuid::new_v4();
    builder.register(policy_id, SingletonPolicy);
    let policies = builder.finish();

    let mut cluster = fixture_cluster(0, 0, -1);
    let cluster_id = cluster.id;
    cluster.policies.push(ClusterPolicyBinding::new(cluster_id, policy_id));
    fixture.store.seed_cluster(cluster).await;

    let executor = fixture.executor(profiles(), policies);
    let mut action = Action::new_top_level(cluster_id, ActionKind::ClusterAttachPolicy, owner());
    action
        .inputs
        .insert("policy_id".to_string(), serde_json::json!(policy_id.to_string()));
    let action = fixture.action_store().store(&context, action).await.unwrap();

    let (code, message) = executor.execute(&context, action.id).await.unwrap();
    assert_eq!(code, ResultCode::Ok);
    assert_eq!(message, "Policy already attached.");
}

#[tokio::test]
async fn detach_not_attached_policy_is_a_noop() {
    let context = Context::fixture();
    let fixture = ExecutorFixture::new();

    let cluster = fixture_cluster(0, 0, -1);
    let cluster_id = cluster.id;
    fixture.store.seed_cluster(cluster).await;

    let executor = fixture.executor(profiles(), PolicyRegistry::build().finish());
    let mut action = Action::new_top_level(cluster_id, ActionKind::ClusterDetachPolicy, owner());
    action
        .inputs
        .insert("policy_id".to_string(), serde_json::json!(Uuid::new_v4().to_string()));
    let action = fixture.action_store().store(&context, action).await.unwrap();

    let (code, message) = executor.execute(&context, action.id).await.unwrap();
    assert_eq!(code, ResultCode::Ok);
    assert_eq!(message, "Policy not attached.");
}

#[tokio::test]
async fn cluster_lock_is_released_after_every_action() {
    let context = Context::fixture();
    let fixture = ExecutorFixture::new();
    let executor = fixture.executor(profiles(), PolicyRegistry::build().finish());

    let cluster = fixture_cluster(1, 0, -1);
    let cluster_id = cluster.id;
    fixture.store.seed_cluster(cluster).await;

    let action = Action::new_top_level(cluster_id, ActionKind::ClusterCreate, owner());
    let action = fixture.action_store().store(&context, action).await.unwrap();
    executor.execute(&context, action.id).await.unwrap();

    // If the lock were still held, a second top-level action against the same cluster
    // would fail to acquire it.
    let second = Action::new_top_level(cluster_id, ActionKind::ClusterUpdate, owner());
    let second = fixture.action_store().store(&context, second).await.unwrap();
    let (code, _) = executor.execute(&context, second.id).await.unwrap();
    assert_ne!(code, ResultCode::Error);
}

#[tokio::test]
async fn unsupported_action_kind_is_an_error() {
    let context = Context::fixture();
    let fixture = ExecutorFixture::new();
    let executor = fixture.executor(profiles(), PolicyRegistry::build().finish());

    let cluster = fixture_cluster(0, 0, -1);
    let cluster_id = cluster.id;
    fixture.store.seed_cluster(cluster).await;

    let action = Action::new_top_level(cluster_id, ActionKind::NodeCreate, owner());
    let action = fixture.action_store().store(&context, action).await.unwrap();

    let (code, message) = executor.execute(&context, action.id).await.unwrap();
    assert_eq!(code, ResultCode::Error);
    assert_eq!(message, "Unsupported action: NodeCreate");
}

#[tokio::test]
async fn missing_cluster_is_reported_without_a_lock_attempt() {
    let context = Context::fixture();
    let fixture = ExecutorFixture::new();
    let executor = fixture.executor(profiles(), PolicyRegistry::build().finish());

    let missing_cluster = Uuid::new_v4();
    let action = Action::new_top_level(missing_cluster, ActionKind::ClusterCreate, owner());
    let action = fixture.action_store().store(&context, action).await.unwrap();

    let (code, message) = executor.execute(&context, action.id).await.unwrap();
    assert_eq!(code, ResultCode::Error);
    assert_eq!(message, format!("Cluster ({}) is not found", missing_cluster));
}

#[tokio::test]
async fn action_kind_set_but_action_record_missing_errors() {
    let context = Context::fixture();
    let fixture = ExecutorFixture::new();
    let executor = fixture.executor(profiles(), PolicyRegistry::build().finish());
    let result = executor.execute(&context, Uuid::new_v4()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn execute_leaves_the_top_level_actions_own_status_to_its_caller() {
    let context = Context::fixture();
    let fixture = ExecutorFixture::new();
    let executor = fixture.executor(profiles(), PolicyRegistry::build().finish());

    let cluster = fixture_cluster(1, 0, -1);
    let cluster_id = cluster.id;
    fixture.store.seed_cluster(cluster).await;

    let action = Action::new_top_level(cluster_id, ActionKind::ClusterCreate, owner());
    let action = fixture.action_store().store(&context, action).await.unwrap();
    executor.execute(&context, action.id).await.unwrap();

    // Unlike derived node actions (finished by `NodeActionExecutor::finish`), a
    // top-level action's own terminal status is the caller's responsibility: `execute`
    // only returns the `(ResultCode, String)` pair.
    let stored_action = fixture.action_store().get(&context, action.id).await.unwrap().unwrap();
    assert_eq!(stored_action.status, ActionStatus::Init);
}
