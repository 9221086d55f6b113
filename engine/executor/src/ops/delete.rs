//! `do_delete` and the `_delete_nodes` helper it shares with `do_del_nodes`.
use serde_json::Value as Json;
use uuid::Uuid;

use anyhow::Result;

use fleetcore_context::Context;
use fleetcore_models::Action;
use fleetcore_models::ActionKind;
use fleetcore_models::ActionStatus;
use fleetcore_models::Cluster;
use fleetcore_models::ClusterStatus;
use fleetcore_models::ResultCode;

use crate::control::ActionControl;
use crate::wait::wait_for_dependents;
use crate::ClusterActionExecutor;

/// Read `action.data['deletion']['destroy_after_delete']`, defaulting to `true`.
pub(crate) fn destroy_after_delete(action: &Action) -> bool {
    action
        .data_object("deletion")
        .and_then(|m| m.get("destroy_after_delete"))
        .and_then(Json::as_bool)
        .unwrap_or(true)
}

/// Force `action.data['deletion']['destroy_after_delete']` to a specific value, keeping
/// any other keys already in that object (e.g. a policy-supplied `candidates` list).
pub(crate) fn set_destroy_after_delete(action: &mut Action, value: bool) {
    let entry = action
        .data
        .entry("deletion".to_string())
        .or_insert_with(|| Json::Object(Default::default()));
    if let Json::Object(map) = entry {
        map.insert("destroy_after_delete".to_string(), Json::Bool(value));
    } else {
        *entry = serde_json::json!({ "destroy_after_delete": value });
    }
}

/// Set `action.data['deletion']['destroy_after_delete'] = true` unless a BEFORE policy
/// already recorded an explicit value.
pub(crate) fn ensure_destroy_after_delete_default(action: &mut Action) {
    let entry = action
        .data
        .entry("deletion".to_string())
        .or_insert_with(|| Json::Object(Default::default()));
    if let Json::Object(map) = entry {
        map.entry("destroy_after_delete".to_string()).or_insert(Json::Bool(true));
    }
}

impl ClusterActionExecutor {
    /// `do_delete`: tear down every member node, then the cluster object itself.
    pub(crate) async fn do_delete(
        &self,
        context: &Context,
        action: &mut Action,
        cluster: &mut Cluster,
        control: &ActionControl,
    ) -> Result<(ResultCode, String)> {
        ensure_destroy_after_delete_default(action);
        cluster.status = ClusterStatus::Deleting;
        cluster.status_reason = "Deletion in progress.".to_string();
        self.clusters.store(context, cluster).await?;

        let member_ids = cluster.node_ids.clone();
        let (code, message) = self.delete_nodes(context, action, cluster, control, member_ids).await?;
        match code {
            ResultCode::Timeout | ResultCode::Error => {
                cluster.status = ClusterStatus::Warning;
                cluster.status_reason = message.clone();
                self.clusters.store(context, cluster).await?;
                Ok((code, message))
            }
            ResultCode::Cancel => {
                cluster.status = ClusterStatus::Active;
                cluster.status_reason = message.clone();
                self.clusters.store(context, cluster).await?;
                Ok((code, message))
            }
            ResultCode::Retry => Ok((code, message)),
            ResultCode::Ok => {
                if !cluster.do_delete() {
                    return Ok((ResultCode::Error, "Cannot delete cluster object.".to_string()));
                }
                self.clusters.delete(context, cluster.id).await?;
                Ok((ResultCode::Ok, "Cluster deletion succeeded.".to_string()))
            }
        }
    }

    /// `_delete_nodes`: dispatch a derived `NODE_DELETE` (or `NODE_LEAVE`, per
    /// `destroy_after_delete`) per id in `ids` and wait for all of them.
    ///
    /// A no-op (`(OK, "")`, no side effects) when `ids` is empty. Updates
    /// `cluster.node_ids` and records `action.data['nodes']` on success only — the wait
    /// path must leave `action.data` untouched on failure (spec §4.1.2).
    pub(crate) async fn delete_nodes(
        &self,
        context: &Context,
        action: &mut Action,
        cluster: &mut Cluster,
        control: &ActionControl,
        ids: Vec<Uuid>,
    ) -> Result<(ResultCode, String)> {
        if ids.is_empty() {
            return Ok((ResultCode::Ok, String::new()));
        }

        let kind = if destroy_after_delete(action) {
            ActionKind::NodeDelete
        } else {
            ActionKind::NodeLeave
        };
        let verb = if kind == ActionKind::NodeDelete { "delete" } else { "leave" };

        for &node_id in &ids {
            let child = Action::derived(action, verb, node_id, kind, Default::default());
            let child = self.store.store(context, child).await?;
            self.store.add_dependency(context, child.id, action.id).await?;
            self.store
                .set_status(context, child.id, ActionStatus::Ready, None, None)
                .await?;
            self.dispatcher.start_action(context, child.id).await?;
        }

        let (code, message) = wait_for_dependents(context, &self.store, control, action.id, &self.config).await?;
        if code == ResultCode::Ok {
            cluster.node_ids.retain(|id| !ids.contains(id));
            action.data.insert("nodes".to_string(), serde_json::to_value(&ids)?);
        }
        Ok((code, message))
    }
}
