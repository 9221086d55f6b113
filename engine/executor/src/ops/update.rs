//! `do_update`.
use std::collections::BTreeMap;

use anyhow::Result;
use serde_json::Value as Json;

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

impl ClusterActionExecutor {
    /// `do_update`: roll `new_profile_id` out to every member, then the cluster record
    /// itself. A cluster with no members updates immediately, with nothing to wait on.
    pub(crate) async fn do_update(
        &self,
        context: &Context,
        action: &mut Action,
        cluster: &mut Cluster,
        control: &ActionControl,
    ) -> Result<(ResultCode, String)> {
        let new_profile_id = action.input_str("new_profile_id").unwrap_or_default().to_string();

        if cluster.node_ids.is_empty() {
            cluster.profile_id = new_profile_id;
            cluster.status = ClusterStatus::Active;
            cluster.status_reason = "Cluster update completed.".to_string();
            self.clusters.store(context, cluster).await?;
            return Ok((ResultCode::Ok, "Cluster update completed.".to_string()));
        }

        cluster.status = ClusterStatus::Updating;
        cluster.status_reason = "Update in progress.".to_string();
        self.clusters.store(context, cluster).await?;

        let member_ids = cluster.node_ids.clone();
        let mut children = Vec::with_capacity(member_ids.len());
        for node_id in member_ids {
            let mut inputs = BTreeMap::new();
            inputs.insert("new_profile_id".to_string(), Json::String(new_profile_id.clone()));
            let child = Action::derived(action, "update", node_id, ActionKind::NodeUpdate, inputs);
            let child = self.store.store(context, child).await?;
            self.store.add_dependency(context, child.id, action.id).await?;
            self.store
                .set_status(context, child.id, ActionStatus::Ready, None, None)
                .await?;
            self.dispatcher.start_action(context, child.id).await?;
            children.push(child.id);
        }
        action.data.insert("nodes".to_string(), serde_json::to_value(&children)?);

        let (code, message) = wait_for_dependents(context, &self.store, control, action.id, &self.config).await?;
        if code == ResultCode::Ok {
            cluster.profile_id = new_profile_id;
            cluster.status = ClusterStatus::Active;
            cluster.status_reason = "Cluster update completed.".to_string();
            self.clusters.store(context, cluster).await?;
            return Ok((ResultCode::Ok, "Cluster update completed.".to_string()));
        }

        Ok((code, message))
    }
}
