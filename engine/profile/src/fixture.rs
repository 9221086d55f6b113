use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use serde_json::Value as Json;
use uuid::Uuid;

use fleetcore_context::Context;
use fleetcore_models::Node;

use crate::Profile;

/// A profile that records which operations were invoked, in order, and can be told to
/// fail a named operation once. Used by this crate's own tests and by the executor's.
pub struct FixtureProfile {
    profile_id: String,
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, String>>,
}

impl FixtureProfile {
    pub fn new<S: Into<String>>(profile_id: S) -> FixtureProfile {
        FixtureProfile {
            profile_id: profile_id.into(),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Make `operation` return an error with `message` the next time it's called.
    pub fn failing_on<S1: Into<String>, S2: Into<String>>(self, operation: S1, message: S2) -> Self {
        self.failures
            .lock()
            .expect("fixture mutex poisoned")
            .insert(operation.into(), message.into());
        self
    }

    /// Number of times `operation` was invoked.
    pub fn calls(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .expect("fixture mutex poisoned")
            .iter()
            .filter(|call| call.as_str() == operation)
            .count()
    }

    /// The full call order, for asserting sequencing.
    pub fn order(&self) -> Vec<String> {
        self.calls.lock().expect("fixture mutex poisoned").clone()
    }

    fn record(&self, operation: &str) -> Result<()> {
        self.calls
            .lock()
            .expect("fixture mutex poisoned")
            .push(operation.to_string());
        if let Some(message) = self.failures.lock().expect("fixture mutex poisoned").get(operation) {
            anyhow::bail!("{}", message);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Profile for FixtureProfile {
    fn profile_id(&self) -> &str {
        &self.profile_id
    }

    async fn create(&self, _: &Context, _: &mut Node) -> Result<()> {
        self.record("create")
    }

    async fn delete(&self, _: &Context, _: &mut Node) -> Result<()> {
        self.record("delete")
    }

    async fn update(&self, _: &Context, _: &mut Node, _: &str) -> Result<()> {
        self.record("update")
    }

    async fn check(&self, _: &Context, _: &Node) -> Result<bool> {
        self.record("check")?;
        Ok(true)
    }

    async fn join(&self, _: &Context, _: &mut Node, _: Uuid) -> Result<()> {
        self.record("join")
    }

    async fn leave(&self, _: &Context, _: &mut Node) -> Result<()> {
        self.record("leave")
    }

    async fn get_details(&self, _: &Context, _: &Node) -> Result<Json> {
        self.record("get_details")?;
        Ok(Json::Null)
    }
}
