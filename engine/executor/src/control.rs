//! Cooperative cancellation and timeout signalling for in-flight top-level actions.
//!
//! Neither is part of the persisted [`fleetcore_models::Action`] record: both are
//! purely in-process signals consulted by `wait_for_dependents` at its poll points
//! (spec §5), and vanish with the process the same as any other in-flight state would.
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use uuid::Uuid;

/// Handle an in-flight action's own executor consults to decide whether to keep waiting.
#[derive(Clone)]
pub struct ActionControl {
    cancelled: Arc<AtomicBool>,
    deadline: Instant,
}

impl ActionControl {
    fn new(timeout: Duration) -> ActionControl {
        ActionControl {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Instant::now() + timeout,
        }
    }

    /// Request cancellation. Cooperative: observed at the next `wait_for_dependents` poll.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn is_timeout(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

/// Tracks the [`ActionControl`] for every action currently executing in this process, so
/// an external caller (the dispatcher, an admin command) can request cancellation by id.
#[derive(Clone, Default)]
pub struct ActionControlRegistry {
    handles: Arc<Mutex<HashMap<Uuid, ActionControl>>>,
}

impl ActionControlRegistry {
    pub fn new() -> ActionControlRegistry {
        ActionControlRegistry::default()
    }

    /// Register a fresh control for `action_id`, replacing any stale entry left behind
    /// by a previous run of the same id.
    pub fn begin(&self, action_id: Uuid, timeout: Duration) -> ActionControl {
        let control = ActionControl::new(timeout);
        self.handles
            .lock()
            .expect("ActionControlRegistry mutex poisoned")
            .insert(action_id, control.clone());
        control
    }

    /// Drop the control once the action has reached a terminal state.
    pub fn end(&self, action_id: Uuid) {
        self.handles
            .lock()
            .expect("ActionControlRegistry mutex poisoned")
            .remove(&action_id);
    }

    /// Request cancellation of a running action by id. A no-op if the action is not
    /// currently tracked (already finished, or never started in this process).
    pub fn cancel(&self, action_id: Uuid) {
        if let Some(control) = self
            .handles
            .lock()
            .expect("ActionControlRegistry mutex poisoned")
            .get(&action_id)
        {
            control.cancel();
        }
    }
}
