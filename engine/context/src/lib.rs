//! The [`Context`] is a general purpose container carried through every engine call.
//!
//! Contexts are organised into a tree structure:
//!
//! - A root context represents the process-wide scope.
//! - Derived contexts narrow that scope with additional attributes, most commonly a
//!   [`Logger`] decorated with the action or cluster ID being processed.
//!
//! The cluster action executor derives a new [`Context`] for every top-level action it
//! runs so all log lines emitted while that action is in flight carry its ID.
use slog::Logger;
use slog::OwnedKV;
use slog::SendSyncRefUnwindSafeKV;

/// Operation-scoped values threaded through the engine.
///
/// Refer to the [crate level docs](crate) for details.
#[derive(Clone, Debug)]
pub struct Context {
    /// Logger with contextual attributes attached to it.
    pub logger: Logger,
}

impl Context {
    /// Derive a new [`Context`] by making changes to the current one.
    pub fn derive(&self) -> ContextBuilder {
        ContextBuilder {
            logger: self.logger.clone(),
        }
    }

    /// Derive a new [`Context`] by making changes to the current one using the provided callback.
    pub fn derive_with<F>(&self, callback: F) -> Context
    where
        F: FnOnce(ContextBuilder) -> ContextBuilder,
    {
        let builder = callback(self.derive());
        builder.build()
    }

    /// Initialise a new root context with no values attached.
    pub fn root(logger: Logger) -> ContextBuilder {
        ContextBuilder { logger }
    }
}

/// A builder for root and derived contexts.
pub struct ContextBuilder {
    logger: Logger,
}

impl ContextBuilder {
    /// Finalise the build process and return a new [`Context`].
    pub fn build(self) -> Context {
        Context {
            logger: self.logger,
        }
    }

    /// Update the [`Context`] logger to attach new log key/value pairs.
    pub fn log_values<T>(mut self, entries: OwnedKV<T>) -> Self
    where
        T: SendSyncRefUnwindSafeKV + 'static,
    {
        self.logger = self.logger.new(entries);
        self
    }
}

#[cfg(any(test, feature = "test-fixture"))]
impl Context {
    /// Create an empty context useful for tests.
    pub fn fixture() -> Context {
        let logger = Logger::root(slog::Discard, slog::o!());
        Context { logger }
    }
}
