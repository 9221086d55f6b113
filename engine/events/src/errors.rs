//! Errors returned by the fleetcore-events crate.

/// Errors dealing with events.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unable to decode an event payload into the requested type.
    #[error("unable to decode event payload into the requested type")]
    PayloadDecode,
}
