//! Collection of profile strategies known to the engine, keyed by `profile_id`.
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;

use fleetcore_errors::ProfileNotFound;

use crate::Profile;

/// Registry of [`Profile`] implementations, addressed by the `profile_id` string a
/// `Cluster` or `Node` record carries.
#[derive(Clone, Default)]
pub struct ProfileRegistry {
    entries: Arc<HashMap<String, Arc<dyn Profile>>>,
}

impl ProfileRegistry {
    /// Begin building an empty registry.
    pub fn build() -> ProfileRegistryBuilder {
        ProfileRegistryBuilder::default()
    }

    /// Look up the profile strategy for `profile_id`.
    pub fn lookup(&self, profile_id: &str) -> Result<Arc<dyn Profile>> {
        self.entries
            .get(profile_id)
            .cloned()
            .ok_or_else(|| ProfileNotFound::new(profile_id).into())
    }
}

/// Incrementally build a [`ProfileRegistry`].
#[derive(Default)]
pub struct ProfileRegistryBuilder {
    entries: HashMap<String, Arc<dyn Profile>>,
}

impl ProfileRegistryBuilder {
    /// Register a profile implementation under its own `profile_id()`.
    ///
    /// # Panics
    ///
    /// Panics if the profile's id is already registered.
    pub fn register<P>(&mut self, profile: P) -> &mut Self
    where
        P: Profile + 'static,
    {
        let id = profile.profile_id().to_string();
        if self.entries.contains_key(&id) {
            panic!("profile {} cannot be registered more than once", id);
        }
        self.entries.insert(id, Arc::new(profile));
        self
    }

    /// Complete the build process.
    pub fn finish(self) -> ProfileRegistry {
        ProfileRegistry {
            entries: Arc::new(self.entries),
        }
    }
}
