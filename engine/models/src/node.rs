//! The node object: a single unit of compute materialised by a [`crate::Profile`].
use serde_json::Value as Json;
use time::OffsetDateTime;
use uuid::Uuid;

use serde::Deserialize;
use serde::Serialize;

use crate::Owner;

/// Index used for nodes that are not (or no longer) bound to a cluster.
pub const ORPHAN_INDEX: i64 = -1;

/// Lifecycle status of a [`Node`].
#[derive(Clone, Copy, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
    Init,
    Creating,
    Active,
    Updating,
    Deleting,
    Error,
}

/// A single compute unit, optionally bound to a cluster.
///
/// Invariant: `cluster_id` is either `None` or equal to exactly one cluster's `id`;
/// `index` is `>= 1` while bound and [`ORPHAN_INDEX`] while unbound.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub id: Uuid,
    pub profile_id: String,
    pub cluster_id: Option<Uuid>,
    pub index: i64,
    pub status: NodeStatus,
    pub status_reason: String,
    pub metadata: Json,

    /// Opaque placement envelope, set by placement policies.
    pub placement: Option<Json>,

    /// Opaque per-action scratch space.
    #[serde(default)]
    pub data: Json,

    pub owner: Owner,

    pub created_ts: OffsetDateTime,
    pub updated_ts: OffsetDateTime,
}

impl Node {
    /// Create a new orphan node (not yet bound to any cluster).
    pub fn new_orphan<S: Into<String>>(profile_id: S, owner: Owner, now: OffsetDateTime) -> Node {
        Node {
            id: Uuid::nil(),
            profile_id: profile_id.into(),
            cluster_id: None,
            index: ORPHAN_INDEX,
            status: NodeStatus::Init,
            status_reason: String::new(),
            metadata: Json::Object(Default::default()),
            placement: None,
            data: Json::Object(Default::default()),
            owner,
            created_ts: now,
            updated_ts: now,
        }
    }

    /// `true` when the node is bound to `cluster_id` and no other.
    pub fn is_member_of(&self, cluster_id: Uuid) -> bool {
        self.cluster_id == Some(cluster_id)
    }
}
