//! Executor configuration: timeouts and poll intervals.
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_action_timeout_secs() -> u64 {
    3600
}

/// Tunables for [`crate::ClusterActionExecutor`], loaded from the process configuration
/// file alongside the rest of `fleetcored`'s settings (`core/conf` precedent).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// How long `wait_for_dependents` sleeps between polls of the action store.
    #[serde(rename = "poll-interval-ms")]
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Wall-clock budget for a top-level action, from dispatch to terminal status,
    /// observed only at `wait_for_dependents` polls (spec §5).
    #[serde(rename = "action-timeout-secs")]
    #[serde(default = "default_action_timeout_secs")]
    pub action_timeout_secs: u64,
}

impl ExecutorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.action_timeout_secs)
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig {
            poll_interval_ms: default_poll_interval_ms(),
            action_timeout_secs: default_action_timeout_secs(),
        }
    }
}

#[cfg(any(test, feature = "test-fixture"))]
impl ExecutorConfig {
    /// A configuration tuned for fast unit tests: short polls, short timeouts.
    pub fn fixture() -> ExecutorConfig {
        ExecutorConfig {
            poll_interval_ms: 1,
            action_timeout_secs: 3600,
        }
    }
}
