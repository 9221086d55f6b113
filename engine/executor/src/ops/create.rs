//! `do_create` and the `_create_nodes` helper it (and `do_resize`/`do_scale_out`) share.
use std::collections::BTreeMap;

use anyhow::Result;
use serde_json::Value as Json;
use time::OffsetDateTime;
use uuid::Uuid;

use fleetcore_context::Context;
use fleetcore_errors::ClusterNotFound;
use fleetcore_models::Action;
use fleetcore_models::ActionKind;
use fleetcore_models::ActionStatus;
use fleetcore_models::Cluster;
use fleetcore_models::ClusterStatus;
use fleetcore_models::Node;
use fleetcore_models::ResultCode;

use crate::control::ActionControl;
use crate::wait::wait_for_dependents;
use crate::ClusterActionExecutor;

impl ClusterActionExecutor {
    /// `do_create`: bootstrap the cluster object, then provision its initial membership.
    pub(crate) async fn do_create(
        &self,
        context: &Context,
        action: &mut Action,
        cluster: &mut Cluster,
        control: &ActionControl,
    ) -> Result<(ResultCode, String)> {
        if !cluster.do_create() {
            cluster.status = ClusterStatus::Error;
            cluster.status_reason = "Cluster creation failed.".to_string();
            self.clusters.store(context, cluster).await?;
            return Ok((ResultCode::Error, "Cluster creation failed.".to_string()));
        }

        let count = cluster.desired_capacity;
        let (code, message) = self.create_nodes(context, action, cluster, control, count).await?;
        match code {
            ResultCode::Ok => {
                cluster.status = ClusterStatus::Active;
                cluster.status_reason = "Cluster creation succeeded.".to_string();
                self.clusters.store(context, cluster).await?;
                Ok((ResultCode::Ok, "Cluster creation succeeded.".to_string()))
            }
            ResultCode::Retry => Ok((code, message)),
            _ => {
                cluster.status = ClusterStatus::Error;
                cluster.status_reason = message.clone();
                self.clusters.store(context, cluster).await?;
                Ok((code, message))
            }
        }
    }

    /// `_create_nodes`: mint `count` new member nodes, dispatch a derived `NODE_CREATE`
    /// per node, and wait for every one of them to finish provisioning.
    ///
    /// A no-op (`(OK, "")`, no side effects at all) when `count <= 0`.
    pub(crate) async fn create_nodes(
        &self,
        context: &Context,
        action: &mut Action,
        cluster: &mut Cluster,
        control: &ActionControl,
        count: i64,
    ) -> Result<(ResultCode, String)> {
        if count <= 0 {
            return Ok((ResultCode::Ok, String::new()));
        }

        let reloaded = self
            .clusters
            .get(context, cluster.id)
            .await?
            .ok_or_else(|| ClusterNotFound::new(cluster.id.to_string()))?;
        cluster.next_index = reloaded.next_index;

        let placement = action.data.get("placement").and_then(Json::as_array).cloned();
        let first8: String = cluster.id.to_string().chars().take(8).collect();

        let mut created = Vec::new();
        for i in 0..count {
            let index = cluster.take_next_index();
            let now = OffsetDateTime::now_utc();
            let mut node = Node::new_orphan(cluster.profile_id.clone(), cluster.owner.clone(), now);
            node.id = Uuid::new_v4();
            node.cluster_id = Some(cluster.id);
            node.index = index;
            node.metadata = serde_json::json!({ "name": format!("node-{}-{:03}", first8, index) });

            if let Some(entry) = placement.as_ref().and_then(|list| list.get(i as usize)) {
                node.placement = Some(entry.clone());
                node.data = serde_json::json!({ "placement": entry });
            }

            self.nodes.store(context, &node).await?;
            cluster.node_ids.push(node.id);

            let child = Action::derived(action, "create", node.id, ActionKind::NodeCreate, BTreeMap::new());
            let child = self.store.store(context, child).await?;
            self.store.add_dependency(context, child.id, action.id).await?;
            self.store
                .set_status(context, child.id, ActionStatus::Ready, None, None)
                .await?;
            self.dispatcher.start_action(context, child.id).await?;
            created.push(node.id);
        }

        let mut all_nodes: Vec<Uuid> = action
            .data
            .get("nodes")
            .and_then(Json::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|v| v.as_str().and_then(|s| Uuid::parse_str(s).ok()))
                    .collect()
            })
            .unwrap_or_default();
        all_nodes.extend(created);
        action.data.insert("nodes".to_string(), serde_json::to_value(&all_nodes)?);

        wait_for_dependents(context, &self.store, control, action.id, &self.config).await
    }
}
