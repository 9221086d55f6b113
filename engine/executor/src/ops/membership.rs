//! `do_add_nodes` and `do_del_nodes`.
use std::collections::BTreeMap;

use anyhow::Result;
use serde_json::Value as Json;
use uuid::Uuid;

use fleetcore_context::Context;
use fleetcore_models::Action;
use fleetcore_models::ActionKind;
use fleetcore_models::ActionStatus;
use fleetcore_models::Cluster;
use fleetcore_models::NodeStatus;
use fleetcore_models::ResultCode;

use crate::control::ActionControl;
use crate::ops::delete::set_destroy_after_delete;
use crate::ops::parse_uuid_list;
use crate::wait::wait_for_dependents;
use crate::ClusterActionExecutor;

impl ClusterActionExecutor {
    /// `do_add_nodes`: validate every candidate id, then join the eligible ones in.
    ///
    /// `action.data['nodes']` is populated with the processed ids on success and left
    /// untouched on failure (spec §4.1.2).
    pub(crate) async fn do_add_nodes(
        &self,
        context: &Context,
        action: &mut Action,
        cluster: &mut Cluster,
        control: &ActionControl,
    ) -> Result<(ResultCode, String)> {
        let ids = parse_uuid_list(action, "nodes");
        let mut to_join = Vec::new();
        for id in ids {
            let node = match self.nodes.get(context, id).await? {
                Some(node) => node,
                None => return Ok((ResultCode::Error, format!("Node [{}] is not found.", id))),
            };
            if node.cluster_id == Some(cluster.id) {
                continue;
            }
            if let Some(other) = node.cluster_id {
                return Ok((
                    ResultCode::Error,
                    format!("Node [{}] is already owned by cluster [{}].", id, other),
                ));
            }
            if node.status != NodeStatus::Active {
                return Ok((ResultCode::Error, format!("Node [{}] is not in ACTIVE status.", id)));
            }
            to_join.push(id);
        }

        if to_join.is_empty() {
            return Ok((ResultCode::Ok, "Completed adding nodes.".to_string()));
        }

        for &node_id in &to_join {
            let index = cluster.take_next_index();
            let mut inputs = BTreeMap::new();
            inputs.insert("cluster_id".to_string(), Json::String(cluster.id.to_string()));
            inputs.insert("index".to_string(), Json::from(index));
            let child = Action::derived(action, "join", node_id, ActionKind::NodeJoin, inputs);
            let child = self.store.store(context, child).await?;
            self.store.add_dependency(context, child.id, action.id).await?;
            self.store
                .set_status(context, child.id, ActionStatus::Ready, None, None)
                .await?;
            self.dispatcher.start_action(context, child.id).await?;
        }

        let (code, message) = wait_for_dependents(context, &self.store, control, action.id, &self.config).await?;
        if code == ResultCode::Ok {
            cluster.node_ids.extend(to_join.iter().copied());
            self.clusters.store(context, cluster).await?;
            action.data.insert("nodes".to_string(), serde_json::to_value(&to_join)?);
            return Ok((ResultCode::Ok, "Completed adding nodes.".to_string()));
        }
        Ok((code, message))
    }

    /// `do_del_nodes`: remove specific member nodes, leaving them (`NODE_LEAVE`) rather
    /// than destroying them (spec §4.1.2, contrast with `do_delete`'s `NODE_DELETE`).
    pub(crate) async fn do_del_nodes(
        &self,
        context: &Context,
        action: &mut Action,
        cluster: &mut Cluster,
        control: &ActionControl,
    ) -> Result<(ResultCode, String)> {
        let ids = parse_uuid_list(action, "nodes");
        let mut to_remove = Vec::new();
        for id in ids {
            let node = match self.nodes.get(context, id).await? {
                Some(node) => node,
                None => return Ok((ResultCode::Error, format!("Node [{}] is not found.", id))),
            };
            if node.cluster_id == Some(cluster.id) {
                to_remove.push(id);
            }
        }

        set_destroy_after_delete(action, false);
        let (code, message) = self.delete_nodes(context, action, cluster, control, to_remove).await?;
        if code == ResultCode::Ok {
            self.clusters.store(context, cluster).await?;
            return Ok((ResultCode::Ok, "Completed deleting nodes.".to_string()));
        }
        Ok((code, message))
    }
}
