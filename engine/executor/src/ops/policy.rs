//! `do_attach_policy`, `do_detach_policy` and `do_update_policy`.
use anyhow::Result;
use serde_json::Value as Json;
use uuid::Uuid;

use fleetcore_context::Context;
use fleetcore_models::Action;
use fleetcore_models::Cluster;
use fleetcore_models::ClusterPolicyBinding;
use fleetcore_models::ResultCode;

use crate::ClusterActionExecutor;

fn required_policy_id(action: &Action) -> Option<Uuid> {
    action.input_str("policy_id").and_then(|s| Uuid::parse_str(s).ok())
}

impl ClusterActionExecutor {
    /// `do_attach_policy`: bind a new policy, rejecting a conflicting `singleton` type.
    pub(crate) async fn do_attach_policy(
        &self,
        context: &Context,
        action: &mut Action,
        cluster: &mut Cluster,
    ) -> Result<(ResultCode, String)> {
        let policy_id = match required_policy_id(action) {
            Some(id) => id,
            None => return Ok((ResultCode::Error, "Policy not specified.".to_string())),
        };

        if cluster.has_policy(policy_id) {
            return Ok((ResultCode::Ok, "Policy already attached.".to_string()));
        }

        let policy = self.policies.lookup(policy_id)?;
        if policy.singleton() {
            for existing in &cluster.policies {
                let existing_policy = self.policies.lookup(existing.policy_id)?;
                if existing_policy.kind() == policy.kind() {
                    return Ok((
                        ResultCode::Error,
                        format!(
                            "Only one instance of policy type ({}) can be attached to a cluster, but \
                             another instance ({}) is found attached to the cluster ({}) already.",
                            policy.kind(),
                            existing.policy_id,
                            cluster.id
                        ),
                    ));
                }
            }
        }

        let (ok, reason) = policy.attach(context, cluster).await?;
        if !ok {
            return Ok((ResultCode::Error, reason.unwrap_or_default()));
        }

        let mut binding = ClusterPolicyBinding::new(cluster.id, policy_id);
        binding.priority = action.inputs.get("priority").and_then(Json::as_i64).unwrap_or(0) as i32;
        binding.cooldown = action.inputs.get("cooldown").and_then(Json::as_u64).unwrap_or(0);
        binding.level = action.inputs.get("level").and_then(Json::as_i64).unwrap_or(0) as i32;
        binding.enabled = action.inputs.get("enabled").and_then(Json::as_bool).unwrap_or(true);
        binding.data = None;

        cluster.add_policy(binding);
        self.clusters.store(context, cluster).await?;
        Ok((ResultCode::Ok, "Policy attached.".to_string()))
    }

    /// `do_detach_policy`: remove a binding, letting the policy veto with a reason.
    pub(crate) async fn do_detach_policy(
        &self,
        context: &Context,
        action: &mut Action,
        cluster: &mut Cluster,
    ) -> Result<(ResultCode, String)> {
        let policy_id = match required_policy_id(action) {
            Some(id) => id,
            None => return Ok((ResultCode::Error, "Policy not specified.".to_string())),
        };

        if !cluster.has_policy(policy_id) {
            return Ok((ResultCode::Ok, "Policy not attached.".to_string()));
        }

        let policy = self.policies.lookup(policy_id)?;
        let (ok, reason) = policy.detach(context, cluster).await?;
        if !ok {
            return Ok((ResultCode::Error, reason.unwrap_or_default()));
        }

        cluster.remove_policy(policy_id);
        self.clusters.store(context, cluster).await?;
        Ok((ResultCode::Ok, "Policy detached.".to_string()))
    }

    /// `do_update_policy`: apply whichever of `{cooldown, level, priority, enabled}` are
    /// present in `action.inputs` to the existing binding.
    pub(crate) async fn do_update_policy(
        &self,
        context: &Context,
        action: &mut Action,
        cluster: &mut Cluster,
    ) -> Result<(ResultCode, String)> {
        let policy_id = match required_policy_id(action) {
            Some(id) => id,
            None => return Ok((ResultCode::Error, "Policy not specified.".to_string())),
        };

        if !cluster.has_policy(policy_id) {
            return Ok((ResultCode::Error, "Policy not attached.".to_string()));
        }

        let has_update = ["cooldown", "level", "priority", "enabled"]
            .iter()
            .any(|key| action.inputs.contains_key(*key));
        if !has_update {
            return Ok((ResultCode::Ok, "No update is needed.".to_string()));
        }

        let binding = cluster
            .find_policy_mut(policy_id)
            .expect("has_policy just confirmed this binding exists");
        if let Some(value) = action.inputs.get("cooldown").and_then(Json::as_u64) {
            binding.cooldown = value;
        }
        if let Some(value) = action.inputs.get("level").and_then(Json::as_i64) {
            binding.level = value as i32;
        }
        if let Some(value) = action.inputs.get("priority").and_then(Json::as_i64) {
            binding.priority = value as i32;
        }
        if let Some(value) = action.inputs.get("enabled").and_then(Json::as_bool) {
            binding.enabled = value;
        }

        self.clusters.store(context, cluster).await?;
        Ok((ResultCode::Ok, "Policy updated.".to_string()))
    }
}
