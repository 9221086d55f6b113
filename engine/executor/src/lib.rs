//! The cluster action executor: orchestrates a single top-level cluster mutation.
//!
//! [`ClusterActionExecutor::execute`] is the engine's only public entry point. It runs
//! one cluster [`Action`] to terminal state: acquire the cluster lock, invoke BEFORE
//! policies, dispatch on the action kind, fan out derived node actions and wait on them,
//! invoke AFTER policies, persist cluster status, release the lock. Every operation
//! contract from spec §4.1.2 is a private method on this struct.
use anyhow::Result;
use uuid::Uuid;

use fleetcore_context::Context;
use fleetcore_dispatcher::Dispatcher;
use fleetcore_events::Event;
use fleetcore_events::Events;
use fleetcore_lock::LockManager;
use fleetcore_lock::LockScope;
use fleetcore_models::Action;
use fleetcore_models::ActionKind;
use fleetcore_models::events::ClusterActionPayload;
use fleetcore_models::events::EventPhase;
use fleetcore_models::PolicyPhase;
use fleetcore_models::ResultCode;
use fleetcore_policy::policy_check;
use fleetcore_policy::PolicyRegistry;
use fleetcore_profile::ProfileRegistry;
use fleetcore_store::ActionStore;
use fleetcore_store::ClusterRepository;
use fleetcore_store::NodeRepository;

mod config;
mod control;
mod ops;
mod telemetry;
mod wait;

pub use config::ExecutorConfig;
pub use control::ActionControl;
pub use control::ActionControlRegistry;
pub use telemetry::register_metrics;
pub use wait::wait_for_dependents;

/// Orchestrates top-level cluster actions against the five collaborating engine
/// components. Every field is a cheaply-`Clone`-able facade over an `Arc<dyn Backend>`,
/// so the executor itself is `Clone` and may be shared across dispatcher workers.
#[derive(Clone)]
pub struct ClusterActionExecutor {
    pub store: ActionStore,
    pub clusters: ClusterRepository,
    pub nodes: NodeRepository,
    pub lock: LockManager,
    pub dispatcher: Dispatcher,
    pub events: Events,
    pub policies: PolicyRegistry,
    pub profiles: ProfileRegistry,
    pub config: ExecutorConfig,
    pub controls: ActionControlRegistry,
}

impl ClusterActionExecutor {
    /// Run the top-level cluster action identified by `action_id` to terminal state.
    ///
    /// Preconditions: the action record exists with `target` set to a cluster id.
    /// Always releases the cluster lock on every exit path (spec §4.1 step 4).
    pub async fn execute(&self, context: &Context, action_id: Uuid) -> Result<(ResultCode, String)> {
        let owner = action_id.to_string();
        let mut action = match self.store.get(context, action_id).await? {
            Some(action) => action,
            None => anyhow::bail!("action {} not found in the action store", action_id),
        };
        telemetry::ACTIONS_TOTAL.with_label_values(&[&format!("{:?}", action.kind)]).inc();

        let cluster = match self.clusters.get(context, action.target).await? {
            Some(cluster) => cluster,
            None => {
                let message = format!("Cluster ({}) is not found", action.target);
                self.emit_failure(context, &action, None, &message).await?;
                return Ok((ResultCode::Error, message));
            }
        };

        let forced = matches!(action.kind, ActionKind::ClusterDelete);
        let held = self
            .lock
            .acquire(context, cluster.id, &owner, LockScope::Cluster, forced)
            .await?;
        if held.is_none() {
            return Ok((ResultCode::Error, "Failed in locking cluster.".to_string()));
        }

        let timeout = self.config.action_timeout();
        let control = self.controls.begin(action.id, timeout);
        let result = self.execute_locked(context, &mut action, cluster, &control).await;
        self.controls.end(action.id);

        self.lock
            .release(context, action.target, &owner, LockScope::Cluster)
            .await?;

        result
    }

    async fn execute_locked(
        &self,
        context: &Context,
        action: &mut Action,
        mut cluster: fleetcore_models::Cluster,
        control: &ActionControl,
    ) -> Result<(ResultCode, String)> {
        let before = policy_check(context, &mut cluster, PolicyPhase::Before, &self.policies).await?;
        if cluster.policies.iter().any(|binding| binding.enabled) {
            record_policy_outcome(action, &before);
        }
        if let fleetcore_models::CheckStatus::CheckError = before.status {
            let reason = before.reason.unwrap_or_default();
            let message = format!("Policy check failure: {}", reason);
            self.emit_failure(context, action, Some(&cluster), &message).await?;
            return Ok((ResultCode::Error, message));
        }

        let outcome = self.dispatch(context, action, &mut cluster, control).await?;
        let (code, message) = match outcome {
            Ok(pair) => pair,
            Err(unsupported) => {
                self.emit_failure(context, action, Some(&cluster), &unsupported).await?;
                return Ok((ResultCode::Error, unsupported));
            }
        };

        if code == ResultCode::Ok {
            let after = policy_check(context, &mut cluster, PolicyPhase::After, &self.policies).await?;
            if cluster.policies.iter().any(|binding| binding.enabled) {
                record_policy_outcome(action, &after);
            }
            if let fleetcore_models::CheckStatus::CheckError = after.status {
                let reason = after.reason.unwrap_or_default();
                let message = format!("Policy check failure: {}", reason);
                self.emit_failure(context, action, Some(&cluster), &message).await?;
                return Ok((ResultCode::Error, message));
            }
        }

        Ok((code, message))
    }

    /// Dispatch on the action kind. `Err(message)` here is the "unsupported action"
    /// branch of spec §4.1 step 3b, not a fault — it is folded into an ERROR result by
    /// the caller the same as any other operation failure.
    async fn dispatch(
        &self,
        context: &Context,
        action: &mut Action,
        cluster: &mut fleetcore_models::Cluster,
        control: &ActionControl,
    ) -> Result<Result<(ResultCode, String), String>> {
        let pair = match action.kind {
            ActionKind::ClusterCreate => self.do_create(context, action, cluster, control).await?,
            ActionKind::ClusterUpdate => self.do_update(context, action, cluster, control).await?,
            ActionKind::ClusterDelete => self.do_delete(context, action, cluster, control).await?,
            ActionKind::ClusterAddNodes => self.do_add_nodes(context, action, cluster, control).await?,
            ActionKind::ClusterDelNodes => self.do_del_nodes(context, action, cluster, control).await?,
            ActionKind::ClusterResize => self.do_resize(context, action, cluster, control).await?,
            ActionKind::ClusterScaleIn => self.do_scale_in(context, action, cluster, control).await?,
            ActionKind::ClusterScaleOut => self.do_scale_out(context, action, cluster, control).await?,
            ActionKind::ClusterAttachPolicy => self.do_attach_policy(context, action, cluster).await?,
            ActionKind::ClusterDetachPolicy => self.do_detach_policy(context, action, cluster).await?,
            ActionKind::ClusterUpdatePolicy => self.do_update_policy(context, action, cluster).await?,
            other => return Ok(Err(format!("Unsupported action: {:?}", other))),
        };
        Ok(Ok(pair))
    }

    async fn emit_failure(
        &self,
        context: &Context,
        action: &Action,
        cluster: Option<&fleetcore_models::Cluster>,
        message: &str,
    ) -> Result<()> {
        let payload = ClusterActionPayload {
            cluster_id: cluster.map(|c| c.id).unwrap_or(action.target),
            action_id: action.id,
            kind: action.kind,
            phase: EventPhase::End,
            result: Some(ResultCode::Error),
            message: message.to_string(),
        };
        let event = Event::new(format!("{}.failed", kind_entity(action.kind)), &payload)?;
        self.events.emit(context, event).await
    }
}

/// Write a `policy_check` outcome into `action.data` as `{status, reason}` (spec §6).
fn record_policy_outcome(action: &mut Action, outcome: &fleetcore_policy::CheckOutcome) {
    let status = match outcome.status {
        fleetcore_models::CheckStatus::Ok => "OK",
        fleetcore_models::CheckStatus::CheckError => "CHECK_ERROR",
    };
    action.data.insert("status".to_string(), serde_json::Value::String(status.to_string()));
    if let Some(reason) = &outcome.reason {
        action.data.insert("reason".to_string(), serde_json::Value::String(reason.clone()));
    }
}

/// `cluster` or `node`, used to build `<entity>.<verb>.<phase>` event codes.
fn kind_entity(kind: ActionKind) -> &'static str {
    if kind.is_cluster_kind() {
        "cluster"
    } else {
        "node"
    }
}

#[cfg(any(test, feature = "test-fixture"))]
pub mod fixture;

#[cfg(test)]
mod tests;
