//! `fleetcored demo`: run a single `ClusterCreate` action end to end.
//!
//! Spec §1 treats persistence, provider drivers and the dispatch transport as external
//! collaborators this engine only consumes through a trait boundary; this workspace
//! ships no real implementation of any of them, only the in-memory fixtures the engine's
//! own test suite uses. This command wires those up via [`ExecutorFixture`] so the
//! engine is runnable end to end without a deployment's worth of backends.
use anyhow::Result;
use slog::info;
use slog::Logger;
use time::OffsetDateTime;
use uuid::Uuid;

use fleetcore_context::Context;
use fleetcore_executor::fixture::ExecutorFixture;
use fleetcore_models::Action;
use fleetcore_models::ActionKind;
use fleetcore_models::Cluster;
use fleetcore_models::ClusterStatus;
use fleetcore_models::Owner;
use fleetcore_models::UNBOUNDED;
use fleetcore_policy::PolicyRegistry;
use fleetcore_profile::FixtureProfile;
use fleetcore_profile::ProfileRegistry;

use crate::config::Conf;

/// Build an in-memory engine stack, submit a `ClusterCreate` action for a cluster with
/// `capacity` desired nodes against a `demo/v1` profile, and run it to terminal state.
pub async fn run(logger: Logger, conf: Conf, capacity: i64) -> Result<()> {
    let context = Context::root(logger.clone()).build();

    let fixture = ExecutorFixture::new();
    let mut profiles = ProfileRegistry::build();
    profiles.register(FixtureProfile::new("demo/v1"));
    let profiles = profiles.finish();
    let policies = PolicyRegistry::build().finish();
    let executor = fixture.executor_with_config(profiles, policies, conf.executor);

    let owner = Owner::new("demo-user", "demo-project", "demo-domain");
    let now = OffsetDateTime::now_utc();
    let cluster = Cluster {
        id: Uuid::new_v4(),
        profile_id: "demo/v1".to_string(),
        desired_capacity: capacity,
        min_size: 0,
        max_size: UNBOUNDED,
        status: ClusterStatus::Init,
        status_reason: String::new(),
        node_ids: Vec::new(),
        policies: Vec::new(),
        next_index: 1,
        owner: owner.clone(),
        metadata: serde_json::json!({}),
        created_ts: now,
        updated_ts: now,
    };
    fixture.store.seed_cluster(cluster.clone()).await;

    let action = Action::new_top_level(cluster.id, ActionKind::ClusterCreate, owner);
    let action = fixture.action_store().store(&context, action).await?;

    info!(logger, "submitting demo action";
        "action_id" => %action.id, "cluster_id" => %cluster.id, "capacity" => capacity);
    let (code, message) = executor.execute(&context, action.id).await?;
    info!(logger, "demo action finished"; "result" => ?code, "message" => %message);
    println!("{:?}: {}", code, message);
    Ok(())
}
