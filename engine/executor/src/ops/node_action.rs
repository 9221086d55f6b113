//! Execution of derived node actions (`NODE_CREATE`, `NODE_DELETE`, `NODE_UPDATE`,
//! `NODE_JOIN`, `NODE_LEAVE`) against the profile abstraction.
//!
//! The dispatcher is an external collaborator the spec treats as opaque (§1): the
//! engine only ever calls `start_action(id)` and never learns how a worker actually
//! runs it. [`InlineDispatcherBackend`] is this workspace's own worker: it spawns a
//! task per `start_action` call that runs [`NodeActionExecutor::run`] to completion,
//! so the crate is runnable end to end without an external task queue.
use anyhow::Result;
use serde_json::Value as Json;
use uuid::Uuid;

use fleetcore_context::Context;
use fleetcore_errors::NodeNotFound;
use fleetcore_events::Event;
use fleetcore_events::Events;
use fleetcore_lock::LockManager;
use fleetcore_lock::LockScope;
use fleetcore_models::events::EventPhase;
use fleetcore_models::events::NodeActionPayload;
use fleetcore_models::Action;
use fleetcore_models::ActionKind;
use fleetcore_models::ActionStatus;
use fleetcore_models::Node;
use fleetcore_models::NodeStatus;
use fleetcore_models::ResultCode;
use fleetcore_profile::ProfileRegistry;
use fleetcore_store::ActionStore;
use fleetcore_store::NodeRepository;

/// Runs a single derived node action to terminal state against the node repository and
/// the profile registry. Unlike [`crate::ClusterActionExecutor`], a node action never
/// fans out further children of its own — it is always a leaf in the dependency DAG.
#[derive(Clone)]
pub struct NodeActionExecutor {
    pub store: ActionStore,
    pub nodes: NodeRepository,
    pub lock: LockManager,
    pub profiles: ProfileRegistry,
    pub events: Events,
}

impl NodeActionExecutor {
    /// Run the node action identified by `action_id` to terminal state. Errors other
    /// than ones the action itself can carry as a FAILED result (missing record, lock
    /// contention, profile fault) are folded into a FAILED status with the message as
    /// `status_reason`, mirroring how `ClusterActionExecutor::execute` never lets a
    /// fault escape its own boundary.
    pub async fn run(&self, context: &Context, action_id: Uuid) -> Result<()> {
        let mut action = match self.store.get(context, action_id).await? {
            Some(action) => action,
            None => return Ok(()),
        };
        self.store
            .set_status(context, action.id, ActionStatus::Running, None, None)
            .await?;

        let owner = action.id.to_string();
        let held = self
            .lock
            .acquire(context, action.target, &owner, LockScope::Node, false)
            .await?;
        if held.is_none() {
            self.finish(context, &action, ResultCode::Error, "Failed in locking node.".to_string())
                .await?;
            return Ok(());
        }

        let outcome = self.perform(context, &mut action).await;
        let (code, message) = match outcome {
            Ok(pair) => pair,
            Err(error) => (ResultCode::Error, error.to_string()),
        };

        self.lock
            .release(context, action.target, &owner, LockScope::Node)
            .await?;
        self.finish(context, &action, code, message).await?;
        Ok(())
    }

    async fn perform(&self, context: &Context, action: &mut Action) -> Result<(ResultCode, String)> {
        let node_id = action.target;
        let mut node = match self.nodes.get(context, node_id).await? {
            Some(node) => node,
            None => return Err(NodeNotFound::new(node_id.to_string()).into()),
        };

        let profile = self.profiles.lookup(&node.profile_id)?;
        let result = match action.kind {
            ActionKind::NodeCreate => profile.create(context, &mut node).await,
            ActionKind::NodeDelete => profile.delete(context, &mut node).await,
            ActionKind::NodeUpdate => {
                let new_profile_id = action.input_str("new_profile_id").unwrap_or_default().to_string();
                let outcome = profile.update(context, &mut node, &new_profile_id).await;
                if outcome.is_ok() {
                    node.profile_id = new_profile_id;
                }
                outcome
            }
            ActionKind::NodeJoin => {
                let cluster_id = action
                    .input_str("cluster_id")
                    .and_then(|s| Uuid::parse_str(s).ok())
                    .unwrap_or(node_id);
                let outcome = profile.join(context, &mut node, cluster_id).await;
                if outcome.is_ok() {
                    node.cluster_id = Some(cluster_id);
                    if let Some(index) = action.inputs.get("index").and_then(Json::as_i64) {
                        node.index = index;
                    }
                }
                outcome
            }
            ActionKind::NodeLeave => {
                let outcome = profile.leave(context, &mut node).await;
                if outcome.is_ok() {
                    node.cluster_id = None;
                    node.index = fleetcore_models::ORPHAN_INDEX;
                }
                outcome
            }
            other => anyhow::bail!("node action executor cannot handle {:?}", other),
        };

        match result {
            Ok(()) => {
                if action.kind == ActionKind::NodeDelete {
                    self.nodes.delete(context, node_id).await?;
                } else {
                    node.status = NodeStatus::Active;
                    node.status_reason.clear();
                    self.nodes.store(context, &node).await?;
                }
                Ok((ResultCode::Ok, String::new()))
            }
            Err(error) => {
                node.status = NodeStatus::Error;
                node.status_reason = error.to_string();
                self.nodes.store(context, &node).await?;
                Ok((ResultCode::Error, error.to_string()))
            }
        }
    }

    async fn finish(
        &self,
        context: &Context,
        action: &Action,
        code: ResultCode,
        message: String,
    ) -> Result<()> {
        let status = match code {
            ResultCode::Ok => ActionStatus::Succeeded,
            ResultCode::Cancel => ActionStatus::Cancelled,
            _ => ActionStatus::Failed,
        };
        self.store
            .set_status(context, action.id, status, Some(code), Some(message.clone()))
            .await?;

        let payload = NodeActionPayload {
            node_id: action.target,
            cluster_id: None,
            action_id: action.id,
            kind: action.kind,
            phase: EventPhase::End,
            result: Some(code),
            message,
        };
        let verb = node_action_verb(action.kind);
        let event = Event::new(format!("node.{}.end", verb), &payload)?;
        self.events.emit(context, event).await
    }
}

fn node_action_verb(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::NodeCreate => "create",
        ActionKind::NodeDelete => "delete",
        ActionKind::NodeUpdate => "update",
        ActionKind::NodeJoin => "join",
        ActionKind::NodeLeave => "leave",
        _ => "unknown",
    }
}

/// A [`fleetcore_dispatcher::DispatcherBackend`] that runs every queued action inline,
/// on its own spawned task, via a [`NodeActionExecutor`]. This is the workspace's
/// concrete worker pool stand-in: production deployments with an external task queue
/// would replace it with a backend that enqueues onto that transport instead.
pub struct InlineDispatcherBackend {
    executor: NodeActionExecutor,
}

impl InlineDispatcherBackend {
    pub fn new(executor: NodeActionExecutor) -> InlineDispatcherBackend {
        InlineDispatcherBackend { executor }
    }
}

#[async_trait::async_trait]
impl fleetcore_dispatcher::DispatcherBackend for InlineDispatcherBackend {
    async fn start_action(&self, context: &Context, id: Uuid) -> Result<()> {
        let executor = self.executor.clone();
        let context = context.clone();
        tokio::spawn(async move {
            if let Err(error) = executor.run(&context, id).await {
                slog::error!(context.logger, "node action execution failed"; "action_id" => %id, "error" => %error);
            }
        });
        Ok(())
    }
}
