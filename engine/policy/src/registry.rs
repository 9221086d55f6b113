//! Collection of policy implementations known to the engine, keyed by the id their
//! bindings reference.
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use uuid::Uuid;

use fleetcore_errors::PolicyNotFound;

use crate::Policy;

/// Registry of [`Policy`] implementations, addressed by the id a `ClusterPolicyBinding`
/// carries in its `policy_id` field.
#[derive(Clone, Default)]
pub struct PolicyRegistry {
    entries: Arc<HashMap<Uuid, Arc<dyn Policy>>>,
}

impl PolicyRegistry {
    /// Begin building an empty registry.
    pub fn build() -> PolicyRegistryBuilder {
        PolicyRegistryBuilder::default()
    }

    /// Look up the policy implementation for `policy_id`.
    pub fn lookup(&self, policy_id: Uuid) -> Result<Arc<dyn Policy>> {
        self.entries
            .get(&policy_id)
            .cloned()
            .ok_or_else(|| PolicyNotFound::new(policy_id.to_string()).into())
    }
}

/// Incrementally build a [`PolicyRegistry`].
#[derive(Default)]
pub struct PolicyRegistryBuilder {
    entries: HashMap<Uuid, Arc<dyn Policy>>,
}

impl PolicyRegistryBuilder {
    /// Register a policy implementation under `policy_id`.
    ///
    /// # Panics
    ///
    /// Panics if `policy_id` is already registered.
    pub fn register<P>(&mut self, policy_id: Uuid, policy: P) -> &mut Self
    where
        P: Policy + 'static,
    {
        if self.entries.contains_key(&policy_id) {
            panic!("policy {} cannot be registered more than once", policy_id);
        }
        self.entries.insert(policy_id, Arc::new(policy));
        self
    }

    /// Complete the build process.
    pub fn finish(self) -> PolicyRegistry {
        PolicyRegistry {
            entries: Arc::new(self.entries),
        }
    }
}
