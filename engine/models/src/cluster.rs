//! The cluster object: desired shape, membership and attached policy bindings.
use serde_json::Value as Json;
use time::OffsetDateTime;
use uuid::Uuid;

use serde::Deserialize;
use serde::Serialize;

use crate::ClusterPolicyBinding;
use crate::Owner;

/// Sentinel `max_size` value meaning "unbounded".
pub const UNBOUNDED: i64 = -1;

/// Lifecycle status of a [`Cluster`].
#[derive(Clone, Copy, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterStatus {
    Init,
    Creating,
    Active,
    Updating,
    Deleting,
    Error,
    Warning,
}

/// A homogeneous, elastically scaled group of nodes under declarative policy.
///
/// Invariant: `min_size <= desired_capacity <= max_size` unless `max_size == UNBOUNDED`.
/// Invariant: the set of member nodes has size equal to the count of nodes whose
/// `cluster_id` equals this cluster's `id` — the executor and the repository jointly
/// maintain this by always updating both sides of the relationship together.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cluster {
    pub id: Uuid,
    pub profile_id: String,
    pub desired_capacity: i64,
    pub min_size: i64,
    pub max_size: i64,
    pub status: ClusterStatus,
    pub status_reason: String,

    /// IDs of the nodes currently bound to this cluster.
    pub node_ids: Vec<Uuid>,

    pub policies: Vec<ClusterPolicyBinding>,

    /// Next monotonic node index to hand out; never decreases.
    pub next_index: i64,

    pub owner: Owner,
    pub metadata: Json,

    pub created_ts: OffsetDateTime,
    pub updated_ts: OffsetDateTime,
}

impl Cluster {
    /// Hand out the next monotonic node index and advance the counter.
    pub fn take_next_index(&mut self) -> i64 {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    /// `true` if a policy of this id is already attached (regardless of `enabled`).
    pub fn has_policy(&self, policy_id: Uuid) -> bool {
        self.policies.iter().any(|b| b.policy_id == policy_id)
    }

    /// Find the binding for a given policy id, mutably.
    pub fn find_policy_mut(&mut self, policy_id: Uuid) -> Option<&mut ClusterPolicyBinding> {
        self.policies.iter_mut().find(|b| b.policy_id == policy_id)
    }

    /// Attach a new policy binding. Callers must have already checked for conflicts.
    pub fn add_policy(&mut self, binding: ClusterPolicyBinding) {
        self.policies.push(binding);
    }

    /// Detach the binding for `policy_id`, if present.
    pub fn remove_policy(&mut self, policy_id: Uuid) {
        self.policies.retain(|b| b.policy_id != policy_id);
    }

    /// Perform whatever cluster-object level bootstrap is required before nodes are
    /// provisioned (e.g. reserving the record with the provider). Returns whether the
    /// bootstrap succeeded; the executor treats `false` as an unrecoverable failure.
    pub fn do_create(&mut self) -> bool {
        true
    }

    /// Perform whatever cluster-object level teardown is required once all member nodes
    /// have been removed. Returns whether the teardown succeeded.
    pub fn do_delete(&mut self) -> bool {
        true
    }
}

