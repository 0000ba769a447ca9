//! Error types for the sync engine.
//!
//! [`SyncError`] covers the fallible edges of the crate (transport, URL
//! derivation, mode fetch). [`InboundError`] describes why an inbound
//! message was dropped; it is only ever logged, never propagated out of
//! the engine.

use chatguessr_geo::Point;

/// Errors surfaced by the sync engine's I/O edges.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The transport could not accept an outbound message.
    #[error("transport error: {0}")]
    Transport(String),

    /// A guess could not be encoded as JSON.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// A page or endpoint URL could not be parsed or derived.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The `/config` request failed or returned an unexpected body.
    #[error("config fetch failed: {0}")]
    ConfigFetch(String),
}

/// Reasons an inbound channel message is dropped.
#[derive(Debug, thiserror::Error)]
pub enum InboundError {
    /// The payload is not a JSON guess.
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The message has no `Location` field.
    #[error("message has no Location")]
    MissingLocation,

    /// The message has no (or an empty) `Ident` field.
    #[error("message has no Ident")]
    MissingIdent,

    /// The location is not finite or its latitude is outside `[-90, 90]`.
    #[error("location ({0}) is out of range")]
    InvalidLocation(Point),

    /// The distance is negative or not finite.
    #[error("distance {0} is not a valid radius")]
    InvalidDistance(f64),
}
