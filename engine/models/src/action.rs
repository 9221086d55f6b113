//! The action object model: cluster actions and their derived node actions.
use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value as Json;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::Owner;

/// Identifies the kind of mutation an [`Action`] performs.
///
/// The eleven cluster kinds are the only ones a client may request directly; the five
/// node kinds only ever appear on actions created as derived children of a cluster action.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    ClusterCreate,
    ClusterDelete,
    ClusterUpdate,
    ClusterAddNodes,
    ClusterDelNodes,
    ClusterResize,
    ClusterScaleIn,
    ClusterScaleOut,
    ClusterAttachPolicy,
    ClusterDetachPolicy,
    ClusterUpdatePolicy,

    NodeCreate,
    NodeDelete,
    NodeUpdate,
    NodeJoin,
    NodeLeave,
}

impl ActionKind {
    /// `true` for the eleven cluster-scoped kinds a top-level action may carry.
    pub fn is_cluster_kind(self) -> bool {
        !matches!(
            self,
            ActionKind::NodeCreate
                | ActionKind::NodeDelete
                | ActionKind::NodeUpdate
                | ActionKind::NodeJoin
                | ActionKind::NodeLeave
        )
    }
}

/// Where an [`Action`] originated from.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum ActionCause {
    /// Requested directly by a user or an external system.
    UserOriginated,

    /// Spawned by a parent [`Action`] to carry out part of its work.
    #[serde(rename = "Derived Action")]
    Derived,
}

/// Lifecycle status of an [`Action`].
///
/// `Init -> Waiting -> Ready -> Running -> {Succeeded, Failed, Cancelled}`. An action
/// becomes `Ready` only once every dependency it requires has been registered with the
/// action store; the dispatcher is the only component that moves `Ready` to `Running`.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionStatus {
    Init,
    Waiting,
    Ready,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

/// Outcome of a completed (or retried) [`Action`].
#[derive(Clone, Copy, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultCode {
    Ok,
    Error,
    Cancel,
    Timeout,
    Retry,
}

/// A persisted record of an intended mutation with inputs, a lifecycle status and a
/// result code.
///
/// `inputs` carries the kind-specific arguments listed in spec §6 ("Action inputs");
/// `data` is the opaque envelope mutated by policies and by the action's own execution,
/// carrying deletion candidates, placement lists, counts, and the `policy_check` outcome.
/// Unrecognized keys in either map must be preserved untouched by anything that rewrites
/// part of the map, since other components may extend them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Action {
    pub id: Uuid,

    /// Human readable name, e.g. `node_create_<NODE_ID>` for derived node actions.
    pub name: String,

    /// ID of the cluster or node this action mutates.
    pub target: Uuid,

    pub kind: ActionKind,
    pub status: ActionStatus,
    pub result: Option<ResultCode>,
    pub cause: ActionCause,

    #[serde(default)]
    pub inputs: BTreeMap<String, Json>,

    #[serde(default)]
    pub data: BTreeMap<String, Json>,

    pub owner: Owner,

    /// The action this one was derived from, if any.
    pub parent_action_id: Option<Uuid>,

    /// Actions spawned by this one that it must wait on before completing.
    #[serde(default)]
    pub dependents: Vec<Uuid>,

    pub created_ts: OffsetDateTime,
    pub updated_ts: OffsetDateTime,
}

impl Action {
    /// Start a new, not-yet-persisted top-level action against `target`.
    pub fn new_top_level(target: Uuid, kind: ActionKind, owner: Owner) -> Action {
        let now = OffsetDateTime::UNIX_EPOCH;
        Action {
            id: Uuid::nil(),
            name: format!("{:?}", kind),
            target,
            kind,
            status: ActionStatus::Init,
            result: None,
            cause: ActionCause::UserOriginated,
            inputs: BTreeMap::new(),
            data: BTreeMap::new(),
            owner,
            parent_action_id: None,
            dependents: Vec::new(),
            created_ts: now,
            updated_ts: now,
        }
    }

    /// Build a derived child action, named per spec §4.1.1 (`node_<verb>_<NODE_ID>`).
    pub fn derived(
        parent: &Action,
        verb: &str,
        node_id: Uuid,
        kind: ActionKind,
        inputs: BTreeMap<String, Json>,
    ) -> Action {
        let now = parent.updated_ts;
        Action {
            id: Uuid::nil(),
            name: format!("node_{}_{}", verb, node_id),
            target: node_id,
            kind,
            status: ActionStatus::Init,
            result: None,
            cause: ActionCause::Derived,
            inputs,
            data: BTreeMap::new(),
            owner: parent.owner.clone(),
            parent_action_id: Some(parent.id),
            dependents: Vec::new(),
            created_ts: now,
            updated_ts: now,
        }
    }

    /// Fetch a string input, if present.
    pub fn input_str(&self, key: &str) -> Option<&str> {
        self.inputs.get(key).and_then(Json::as_str)
    }

    /// Fetch a nested `data` object keyed by `key`, if present.
    pub fn data_object(&self, key: &str) -> Option<&serde_json::Map<String, Json>> {
        self.data.get(key).and_then(Json::as_object)
    }
}
