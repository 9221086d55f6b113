//! Common errors from and for the cluster action engine.
//!
//! Each error is its own `thiserror`-derived type so callers can match on the concrete
//! type with [`anyhow::Error::downcast_ref`] rather than on string messages. The
//! executor (`fleetcore-executor`) is the only place these are expected to surface as
//! `(ResultCode, String)` pairs; every other caller sees them as plain `anyhow::Error`s.

/// The requested cluster was not found.
#[derive(Debug, thiserror::Error)]
#[error("Cluster ({cluster_id}) is not found")]
pub struct ClusterNotFound {
    pub cluster_id: String,
}

impl ClusterNotFound {
    pub fn new<S: Into<String>>(cluster_id: S) -> Self {
        Self {
            cluster_id: cluster_id.into(),
        }
    }
}

/// The requested node was not found.
#[derive(Debug, thiserror::Error)]
#[error("Node [{node_id}] is not found.")]
pub struct NodeNotFound {
    pub node_id: String,
}

impl NodeNotFound {
    pub fn new<S: Into<String>>(node_id: S) -> Self {
        Self {
            node_id: node_id.into(),
        }
    }
}

/// The requested profile was not found.
#[derive(Debug, thiserror::Error)]
#[error("Profile ({profile_id}) is not found")]
pub struct ProfileNotFound {
    pub profile_id: String,
}

impl ProfileNotFound {
    pub fn new<S: Into<String>>(profile_id: S) -> Self {
        Self {
            profile_id: profile_id.into(),
        }
    }
}

/// A lock could not be acquired because it is already held.
#[derive(Debug, thiserror::Error)]
#[error("lock on {scope:?} {target_id} is held by another owner")]
pub struct ResourceBusy {
    pub scope: String,
    pub target_id: String,
}

impl ResourceBusy {
    pub fn new<S: Into<String>>(scope: S, target_id: S) -> Self {
        Self {
            scope: scope.into(),
            target_id: target_id.into(),
        }
    }
}

/// A profile specification failed schema validation.
#[derive(Debug, thiserror::Error)]
#[error("profile spec for ({profile_id}) is invalid: {reason}")]
pub struct InvalidProfileSpec {
    pub profile_id: String,
    pub reason: String,
}

impl InvalidProfileSpec {
    pub fn new<S1: Into<String>, S2: Into<String>>(profile_id: S1, reason: S2) -> Self {
        Self {
            profile_id: profile_id.into(),
            reason: reason.into(),
        }
    }
}

/// Credentials or trust material for the target provider could not be retrieved.
#[derive(Debug, thiserror::Error)]
#[error("trust material for ({target_id}) could not be retrieved")]
pub struct TrustNotFound {
    pub target_id: String,
}

impl TrustNotFound {
    pub fn new<S: Into<String>>(target_id: S) -> Self {
        Self {
            target_id: target_id.into(),
        }
    }
}

/// A profile operation against the underlying provider failed.
#[derive(Debug, thiserror::Error)]
#[error("Failed in {operation} node {node_id}: {inner}")]
pub struct ResourceOperation {
    pub operation: String,
    pub node_id: String,
    pub inner: String,
}

impl ResourceOperation {
    pub fn new<S1, S2, S3>(operation: S1, node_id: S2, inner: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self {
            operation: operation.into(),
            node_id: node_id.into(),
            inner: inner.into(),
        }
    }
}

/// No policy implementation is registered for an attached binding's policy id.
#[derive(Debug, thiserror::Error)]
#[error("policy ({policy_id}) is not found")]
pub struct PolicyNotFound {
    pub policy_id: String,
}

impl PolicyNotFound {
    pub fn new<S: Into<String>>(policy_id: S) -> Self {
        Self {
            policy_id: policy_id.into(),
        }
    }
}

/// A policy BEFORE/AFTER check returned `CHECK_ERROR`.
#[derive(Debug, thiserror::Error)]
#[error("Policy check failure: {reason}")]
pub struct PolicyCheckFailure {
    pub reason: String,
}

impl PolicyCheckFailure {
    pub fn new<S: Into<String>>(reason: S) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
