//! Structured payloads carried by events emitted at action phase boundaries.
use uuid::Uuid;

use serde::Deserialize;
use serde::Serialize;

use crate::ActionKind;
use crate::ResultCode;

/// Which side of an action's lifecycle an event reports on.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPhase {
    Start,
    End,
}

/// Payload for `cluster.<verb>.<phase>` events.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClusterActionPayload {
    pub cluster_id: Uuid,
    pub action_id: Uuid,
    pub kind: ActionKind,
    pub phase: EventPhase,
    pub result: Option<ResultCode>,
    pub message: String,
}

/// Payload for `node.<verb>.<phase>` events.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeActionPayload {
    pub node_id: Uuid,
    pub cluster_id: Option<Uuid>,
    pub action_id: Uuid,
    pub kind: ActionKind,
    pub phase: EventPhase,
    pub result: Option<ResultCode>,
    pub message: String,
}
