//! `do_resize`, `do_scale_in`, `do_scale_out` and the sizing helpers they share.
use std::cmp::Ordering;

use anyhow::Result;
use serde_json::Value as Json;
use uuid::Uuid;

use fleetcore_context::Context;
use fleetcore_models::Action;
use fleetcore_models::Cluster;
use fleetcore_models::ClusterStatus;
use fleetcore_models::ResultCode;

use crate::control::ActionControl;
use crate::ops::calculate_desired;
use crate::ops::check_size_violation;
use crate::ops::cluster_bound_message;
use crate::ops::scale_count;
use crate::ops::specified_bound_message;
use crate::ops::truncate_desired;
use crate::ops::SizeViolation;
use crate::ClusterActionExecutor;

/// Merge `{"count": count}` into `action.data[section]`, keeping any other keys already
/// there (e.g. a policy-supplied `candidates` list).
fn stash_count(action: &mut Action, section: &str, count: i64) {
    let entry = action
        .data
        .entry(section.to_string())
        .or_insert_with(|| Json::Object(Default::default()));
    if let Json::Object(map) = entry {
        map.insert("count".to_string(), Json::from(count));
    } else {
        *entry = serde_json::json!({ "count": count });
    }
}

impl ClusterActionExecutor {
    /// Persist `desired_capacity`/`min_size`/`max_size` if they actually changed.
    async fn update_cluster_properties(
        &self,
        context: &Context,
        cluster: &mut Cluster,
        desired: i64,
        min_size: i64,
        max_size: i64,
    ) -> Result<()> {
        if cluster.desired_capacity == desired && cluster.min_size == min_size && cluster.max_size == max_size {
            return Ok(());
        }
        cluster.desired_capacity = desired;
        cluster.min_size = min_size;
        cluster.max_size = max_size;
        self.clusters.store(context, cluster).await
    }

    /// Pick which members to remove for a shrink: a policy-supplied candidate list in
    /// `action.data['deletion']['candidates']` if present, else the lowest-index members
    /// (oldest-first), truncated to `count`.
    async fn select_deletion_candidates(
        &self,
        context: &Context,
        action: &Action,
        cluster: &Cluster,
        count: i64,
    ) -> Result<Vec<Uuid>> {
        let count = count.max(0) as usize;
        if let Some(candidates) = action
            .data_object("deletion")
            .and_then(|m| m.get("candidates"))
            .and_then(Json::as_array)
        {
            let ids: Vec<Uuid> = candidates
                .iter()
                .filter_map(|v| v.as_str().and_then(|s| Uuid::parse_str(s).ok()))
                .collect();
            return Ok(ids.into_iter().take(count).collect());
        }

        let mut members = self.nodes.list_by_cluster(context, cluster.id).await?;
        members.sort_by_key(|node| node.index);
        Ok(members.into_iter().take(count).map(|node| node.id).collect())
    }

    /// Shared tail of resize/scale-in/scale-out: on OK, mark the cluster ACTIVE with
    /// `success_text`; on any other code, propagate the message without touching status.
    async fn finish_sizing(
        &self,
        context: &Context,
        cluster: &mut Cluster,
        code: ResultCode,
        message: String,
        success_text: &str,
    ) -> Result<(ResultCode, String)> {
        if code == ResultCode::Ok {
            cluster.status = ClusterStatus::Active;
            cluster.status_reason = success_text.to_string();
            self.clusters.store(context, cluster).await?;
            return Ok((ResultCode::Ok, success_text.to_string()));
        }
        Ok((code, message))
    }

    /// `do_resize`: apply an explicit `adjustment_type`/`number` against the cluster's
    /// current size, subject to `min_size`/`max_size` (the resize's own, or the
    /// cluster's current ones by default) and `strict`.
    pub(crate) async fn do_resize(
        &self,
        context: &Context,
        action: &mut Action,
        cluster: &mut Cluster,
        control: &ActionControl,
    ) -> Result<(ResultCode, String)> {
        let adjustment_type = action.input_str("adjustment_type").unwrap_or("EXACT_CAPACITY").to_string();
        let number = action.inputs.get("number").and_then(Json::as_i64).unwrap_or(0);
        let strict = action.inputs.get("strict").and_then(Json::as_bool).unwrap_or(false);
        let new_min = action.inputs.get("min_size").and_then(Json::as_i64).unwrap_or(cluster.min_size);
        let new_max = action.inputs.get("max_size").and_then(Json::as_i64).unwrap_or(cluster.max_size);

        let desired = calculate_desired(cluster.desired_capacity, &adjustment_type, number);
        let desired = truncate_desired(cluster, desired, strict);

        if let Some(violation) = check_size_violation(desired, new_min, new_max) {
            return Ok((ResultCode::Error, specified_bound_message(desired, violation)));
        }

        let current_count = cluster.node_ids.len() as i64;
        self.update_cluster_properties(context, cluster, desired, new_min, new_max).await?;

        match desired.cmp(&current_count) {
            Ordering::Equal => {
                cluster.status = ClusterStatus::Active;
                cluster.status_reason = "Cluster resize succeeded.".to_string();
                self.clusters.store(context, cluster).await?;
                Ok((ResultCode::Ok, "Cluster resize succeeded.".to_string()))
            }
            Ordering::Greater => {
                let delta = desired - current_count;
                stash_count(action, "creation", delta);
                let (code, message) = self.create_nodes(context, action, cluster, control, delta).await?;
                self.finish_sizing(context, cluster, code, message, "Cluster resize succeeded.")
                    .await
            }
            Ordering::Less => {
                let delta = current_count - desired;
                let candidates = self.select_deletion_candidates(context, action, cluster, delta).await?;
                stash_count(action, "deletion", delta);
                let (code, message) = self.delete_nodes(context, action, cluster, control, candidates).await?;
                self.finish_sizing(context, cluster, code, message, "Cluster resize succeeded.")
                    .await
            }
        }
    }

    /// `do_scale_out`: grow by a fixed count, against the cluster's own current bounds.
    pub(crate) async fn do_scale_out(
        &self,
        context: &Context,
        action: &mut Action,
        cluster: &mut Cluster,
        control: &ActionControl,
    ) -> Result<(ResultCode, String)> {
        let count = scale_count(action, "creation");
        if count < 0 {
            return Ok((ResultCode::Error, format!("Invalid count ({}) for scaling out.", count)));
        }

        let current = cluster.node_ids.len() as i64;
        let desired = current + count;
        if let Some(violation) = check_size_violation(desired, cluster.min_size, cluster.max_size) {
            return Ok((ResultCode::Error, cluster_bound_message(desired, violation)));
        }

        self.update_cluster_properties(context, cluster, desired, cluster.min_size, cluster.max_size)
            .await?;
        stash_count(action, "creation", count);
        let (code, message) = self.create_nodes(context, action, cluster, control, count).await?;
        self.finish_sizing(context, cluster, code, message, "Cluster scaling succeeded.")
            .await
    }

    /// `do_scale_in`: shrink by a fixed count, clamping best-effort to `min_size` when
    /// the cluster is currently at or above it (spec §4.1.2).
    pub(crate) async fn do_scale_in(
        &self,
        context: &Context,
        action: &mut Action,
        cluster: &mut Cluster,
        control: &ActionControl,
    ) -> Result<(ResultCode, String)> {
        let count = scale_count(action, "deletion");
        if count < 0 {
            return Ok((ResultCode::Error, format!("Invalid count ({}) for scaling in.", count)));
        }

        let current = cluster.node_ids.len() as i64;
        let mut desired = current - count;
        if desired < cluster.min_size && current >= cluster.min_size {
            desired = cluster.min_size;
        }
        if let Some(violation) = check_size_violation(desired, cluster.min_size, cluster.max_size) {
            return Ok((ResultCode::Error, cluster_bound_message(desired, violation)));
        }

        let delta = current - desired;
        let candidates = self.select_deletion_candidates(context, action, cluster, delta).await?;
        self.update_cluster_properties(context, cluster, desired, cluster.min_size, cluster.max_size)
            .await?;
        stash_count(action, "deletion", delta);
        let (code, message) = self.delete_nodes(context, action, cluster, control, candidates).await?;
        self.finish_sizing(context, cluster, code, message, "Cluster scaling succeeded.")
            .await
    }
}
