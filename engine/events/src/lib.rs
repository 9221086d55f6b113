//! Event emission interface for the cluster action engine.
//!
//! The engine emits one [`Event`] at the start and end of every phase boundary listed in
//! spec §6 ("Event payloads"): a failure event when `_execute` returns early, and phase
//! notifications `<entity>.<verb>.<phase>` around cluster and node actions. This crate only
//! defines the envelope and the emission interface; the structured payloads themselves
//! (`ClusterActionPayload`, `NodeActionPayload`) live in `fleetcore-models` since they are
//! domain shapes, not part of the transport.
use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

pub mod emit;
mod errors;

pub use self::emit::Events;
pub use self::emit::EventsBackend;
pub use self::emit::LoggingEventsBackend;
pub use self::errors::Error;

#[cfg(any(test, feature = "test-fixture"))]
pub use self::emit::EventsFixture;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::emit::EventsFixtureBackend;

/// An individual event emitted by the cluster action engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Identifier of the specific event (and its payload type), `<entity>.<verb>.<phase>`.
    pub code: String,

    /// Additional unstructured metadata attached to the event.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    /// JSON encoded event payload.
    #[serde(default)]
    pub payload: Value,

    /// Time the event was generated.
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
}

impl Event {
    /// Build a new event with the given code and JSON-encodable payload.
    pub fn new<P>(code: impl Into<String>, payload: &P) -> anyhow::Result<Event>
    where
        P: Serialize,
    {
        Ok(Event {
            code: code.into(),
            metadata: Default::default(),
            payload: serde_json::to_value(payload)?,
            time: OffsetDateTime::now_utc(),
        })
    }

    /// Attempt to decode the event payload into the specified type.
    pub fn decode<T>(&self) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        use anyhow::Context;
        serde_json::from_value(self.payload.clone())
            .context(Error::PayloadDecode)
            .map_err(anyhow::Error::from)
    }
}
