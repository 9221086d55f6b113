//! The profile abstraction: a stateless, per-call strategy parameterized by an
//! immutable spec that is the only component talking to the underlying provider.
//!
//! The engine treats profiles as pure strategies and never inspects their internals —
//! it only calls the operations below and reacts to their `Result`.
use anyhow::Result;
use serde_json::Value as Json;
use uuid::Uuid;

use fleetcore_context::Context;
use fleetcore_errors::ResourceOperation;
use fleetcore_models::Node;

/// Operation label `do_recover` is asked to perform; presently only `"RECREATE"` has
/// defined behaviour, matching the only recovery strategy the executor requests.
pub const RECOVER_RECREATE: &str = "RECREATE";

/// A provider strategy for a single profile type+version, applied to nodes.
#[async_trait::async_trait]
pub trait Profile: Send + Sync {
    /// Type+version identifier of this profile, e.g. `"compute/v1"`.
    fn profile_id(&self) -> &str;

    /// Provision a new node against the underlying provider.
    async fn create(&self, context: &Context, node: &mut Node) -> Result<()>;

    /// Tear down a node at the underlying provider.
    async fn delete(&self, context: &Context, node: &mut Node) -> Result<()>;

    /// Migrate a node onto `new_profile_id`.
    async fn update(&self, context: &Context, node: &mut Node, new_profile_id: &str) -> Result<()>;

    /// Health check a node. `Ok(true)` means healthy.
    async fn check(&self, context: &Context, node: &Node) -> Result<bool>;

    /// Attach an already-provisioned node to a cluster.
    async fn join(&self, context: &Context, node: &mut Node, cluster_id: Uuid) -> Result<()>;

    /// Detach a node from its current cluster without destroying it.
    async fn leave(&self, context: &Context, node: &mut Node) -> Result<()>;

    /// Fetch the provider's current view of a node, as an opaque document.
    async fn get_details(&self, context: &Context, node: &Node) -> Result<Json>;

    /// Attempt to recover an unhealthy node. The default sequences `delete` then
    /// `create` when `operation` is [`RECOVER_RECREATE`], and is a no-op otherwise;
    /// profiles with a cheaper in-place recovery strategy may override this.
    async fn do_recover(
        &self,
        context: &Context,
        node: &mut Node,
        operation: Option<&str>,
    ) -> Result<()> {
        if operation != Some(RECOVER_RECREATE) {
            return Ok(());
        }
        let node_id = node.id;
        self.delete(context, node)
            .await
            .map_err(|inner| recover_failure(node_id, inner))?;
        self.create(context, node)
            .await
            .map_err(|inner| recover_failure(node_id, inner))?;
        Ok(())
    }
}

fn recover_failure(node_id: Uuid, inner: anyhow::Error) -> anyhow::Error {
    ResourceOperation::new("recovering", node_id.to_string(), inner.to_string()).into()
}

mod registry;

pub use registry::ProfileRegistry;
pub use registry::ProfileRegistryBuilder;

#[cfg(any(test, feature = "test-fixture"))]
mod fixture;
#[cfg(any(test, feature = "test-fixture"))]
pub use fixture::FixtureProfile;
