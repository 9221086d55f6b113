//! Policy bindings and policy-check outcomes.
use serde_json::Value as Json;
use time::OffsetDateTime;
use uuid::Uuid;

use serde::Deserialize;
use serde::Serialize;

/// A `(cluster, policy)` relation carrying priority, cooldown, level and enabled flag.
///
/// Invariant: at most one enabled binding per `(cluster_id, policy_id)`; if the policy
/// type declares itself `singleton`, at most one binding of that type per cluster
/// (enforced by the executor's `do_attach_policy`, not by this struct).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClusterPolicyBinding {
    pub cluster_id: Uuid,
    pub policy_id: Uuid,

    /// Lower priority bindings run first during `policy_check`.
    pub priority: i32,

    /// Minimum interval, in seconds, between successive invocations of this binding.
    pub cooldown: u64,

    /// Minimum severity level at which this binding's handler is invoked.
    pub level: i32,

    pub enabled: bool,

    pub data: Option<Json>,

    /// Timestamp of this binding's last `policy_check` invocation, used to enforce
    /// `cooldown`. `None` means the binding has never been invoked.
    #[serde(default)]
    pub last_run: Option<OffsetDateTime>,
}

impl ClusterPolicyBinding {
    pub fn new(cluster_id: Uuid, policy_id: Uuid) -> ClusterPolicyBinding {
        ClusterPolicyBinding {
            cluster_id,
            policy_id,
            priority: 0,
            cooldown: 0,
            level: 0,
            enabled: true,
            data: None,
            last_run: None,
        }
    }
}

/// The two phases a `policy_check` can be invoked for around a cluster action.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyPhase {
    Before,
    After,
}

/// Outcome of a `policy_check` call, written into `action.data['status'|'reason']`.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatus {
    Ok,
    CheckError,
}
