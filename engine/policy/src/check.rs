//! `policy_check`: evaluate a cluster's attached policies for one phase.
use anyhow::Result;
use time::Duration;
use time::OffsetDateTime;

use fleetcore_context::Context;
use fleetcore_models::CheckStatus;
use fleetcore_models::Cluster;
use fleetcore_models::PolicyPhase;

use crate::CheckOutcome;
use crate::PolicyRegistry;

/// The severity level `_execute` checks at. Bindings whose `level` is higher than this
/// are reserved for a stricter enforcement mode the executor does not yet request.
pub const BASELINE_LEVEL: i32 = 0;

/// Evaluate every enabled binding on `cluster` for `phase`, in priority-ascending order.
///
/// A binding is skipped if its `level` exceeds [`BASELINE_LEVEL`], or if its `cooldown`
/// has not yet elapsed since its last invocation. The first binding whose handler
/// returns `CHECK_ERROR` short-circuits the remaining bindings for this phase; its
/// outcome is what's returned. Every binding actually invoked has its `last_run`
/// timestamp updated, regardless of outcome.
pub async fn policy_check(
    context: &Context,
    cluster: &mut Cluster,
    phase: PolicyPhase,
    registry: &PolicyRegistry,
) -> Result<CheckOutcome> {
    let now = OffsetDateTime::now_utc();
    let mut indices: Vec<usize> = cluster
        .policies
        .iter()
        .enumerate()
        .filter(|(_, binding)| binding.enabled)
        .map(|(idx, _)| idx)
        .collect();
    indices.sort_by_key(|&idx| cluster.policies[idx].priority);

    let mut outcome = CheckOutcome::ok();
    for idx in indices {
        let (policy_id, cooldown, level, last_run) = {
            let binding = &cluster.policies[idx];
            (binding.policy_id, binding.cooldown, binding.level, binding.last_run)
        };
        if level > BASELINE_LEVEL {
            continue;
        }
        if let Some(last_run) = last_run {
            if now - last_run < Duration::seconds(cooldown as i64) {
                continue;
            }
        }

        let policy = registry.lookup(policy_id)?;
        let snapshot = cluster.clone();
        let result = policy.check(context, &snapshot, phase).await?;
        cluster.policies[idx].last_run = Some(now);
        if let CheckStatus::CheckError = result.status {
            outcome = result;
            break;
        }
    }
    Ok(outcome)
}
