//! Interface implemented by individual policy types.
use anyhow::Result;
use fleetcore_models::Cluster;
use fleetcore_models::PolicyPhase;

use fleetcore_context::Context;

/// Outcome of invoking a single binding's phase handler.
#[derive(Clone, Debug)]
pub struct CheckOutcome {
    pub status: fleetcore_models::CheckStatus,
    pub reason: Option<String>,
}

impl CheckOutcome {
    pub fn ok() -> CheckOutcome {
        CheckOutcome {
            status: fleetcore_models::CheckStatus::Ok,
            reason: None,
        }
    }

    pub fn check_error<S: Into<String>>(reason: S) -> CheckOutcome {
        CheckOutcome {
            status: fleetcore_models::CheckStatus::CheckError,
            reason: Some(reason.into()),
        }
    }
}

/// A policy implementation the engine can attach to, detach from, and check against a
/// cluster. The engine treats every policy as an opaque strategy identified by a
/// registry-assigned id; it never reaches into a policy's internal state.
#[async_trait::async_trait]
pub trait Policy: Send + Sync {
    /// Identifies the policy's type, e.g. `"scaling"` or `"affinity"`. Two bindings on
    /// the same cluster whose policies share a `kind` conflict if either is `singleton`.
    fn kind(&self) -> &str;

    /// `true` if at most one binding of this policy's type may be attached per cluster.
    fn singleton(&self) -> bool {
        false
    }

    /// Called from `do_attach_policy` once conflict checks have passed. Returning
    /// `(false, reason)` aborts the attach with that reason as the action's ERROR
    /// message.
    async fn attach(&self, context: &Context, cluster: &Cluster) -> Result<(bool, Option<String>)> {
        let _ = (context, cluster);
        Ok((true, None))
    }

    /// Called from `do_detach_policy`. Returning `(false, reason)` aborts the detach.
    async fn detach(&self, context: &Context, cluster: &Cluster) -> Result<(bool, Option<String>)> {
        let _ = (context, cluster);
        Ok((true, None))
    }

    /// Evaluate this policy against `cluster` for the given phase.
    async fn check(
        &self,
        context: &Context,
        cluster: &Cluster,
        phase: PolicyPhase,
    ) -> Result<CheckOutcome>;
}
