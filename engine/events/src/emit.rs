//! Interfaces to emit events to a streaming backend.
use std::sync::Arc;

use anyhow::Result;

use fleetcore_context::Context;

use super::Event;

/// Emit events to the backing event streaming platform.
#[derive(Clone)]
pub struct Events(Arc<dyn EventsBackend>);

impl Events {
    /// Emit an event about a phase boundary or failure in cluster/node action processing.
    pub async fn emit(&self, context: &Context, event: Event) -> Result<()> {
        self.0.emit(context, event).await
    }
}

impl<T> From<T> for Events
where
    T: EventsBackend + 'static,
{
    fn from(value: T) -> Self {
        Events(Arc::new(value))
    }
}

/// Operations implemented by event streaming backends supported by the engine.
#[async_trait::async_trait]
pub trait EventsBackend: Send + Sync {
    /// Emit an event.
    async fn emit(&self, context: &Context, event: Event) -> Result<()>;
}

/// Emit every event as a structured log line instead of forwarding it anywhere.
///
/// This is the engine's minimal real backend: with no streaming platform in scope
/// (spec §1 non-goals), a deployment that only needs an audit trail in its own logs
/// can run against this rather than against a test fixture.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingEventsBackend;

#[async_trait::async_trait]
impl EventsBackend for LoggingEventsBackend {
    async fn emit(&self, context: &Context, event: Event) -> Result<()> {
        slog::info!(
            context.logger, "engine event";
            "code" => %event.code,
            "payload" => %event.payload,
        );
        Ok(())
    }
}

#[cfg(test)]
mod logging_tests {
    use super::LoggingEventsBackend;
    use super::EventsBackend;
    use fleetcore_context::Context;
    use crate::Event;

    #[tokio::test]
    async fn logs_without_error() {
        let context = Context::fixture();
        let backend = LoggingEventsBackend;
        let event = Event::new("cluster.create.start", &"test").unwrap();
        backend.emit(&context, event).await.unwrap();
    }
}

#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::EventsFixture;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::EventsFixtureBackend;

#[cfg(any(test, feature = "test-fixture"))]
mod fixture {
    use std::time::Duration;

    use anyhow::Result;
    use tokio::sync::broadcast;
    use tokio::sync::broadcast::Receiver;
    use tokio::sync::broadcast::Sender;

    use fleetcore_context::Context;

    use super::Event;
    use super::EventsBackend;

    /// Introspection tools for events emitted during unit tests.
    pub struct EventsFixture {
        events: Receiver<Event>,
        send: Sender<Event>,
    }

    impl Clone for EventsFixture {
        fn clone(&self) -> Self {
            Self {
                events: self.send.subscribe(),
                send: self.send.clone(),
            }
        }
    }

    impl EventsFixture {
        /// Create a backend that will send events to this fixture.
        pub fn backend(&self) -> EventsFixtureBackend {
            EventsFixtureBackend {
                send: self.send.clone(),
            }
        }

        /// Initialise an events backend fixture for unit tests.
        pub fn new() -> EventsFixture {
            let (send, events) = broadcast::channel(64);
            EventsFixture { events, send }
        }

        /// Fetch the next [`Event`] emitted onto the fixture.
        pub async fn pop(&mut self) -> Result<Event> {
            let event = self.events.recv().await?;
            Ok(event)
        }

        /// Fetch the next [`Event`] emitted onto the fixture, with a timeout.
        pub async fn pop_timeout(&mut self, timeout: Duration) -> Result<Event> {
            tokio::time::timeout(timeout, self.pop()).await?
        }
    }

    impl Default for EventsFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    /// Events backend for unit tests.
    pub struct EventsFixtureBackend {
        send: Sender<Event>,
    }

    #[async_trait::async_trait]
    impl EventsBackend for EventsFixtureBackend {
        async fn emit(&self, _: &Context, event: Event) -> Result<()> {
            self.send.send(event)?;
            Ok(())
        }
    }
}
