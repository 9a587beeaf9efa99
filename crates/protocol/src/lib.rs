//! Wire shapes shared between the herald core and its transports.
//!
//! Lifecycle events, WebSocket frames, and the JSON error shape returned by
//! every HTTP endpoint. The core crates produce these types; the gateway
//! serializes them; external clients never see anything else.

pub mod error;
pub mod events;
pub mod frames;

pub use {
    error::{ErrorShape, error_codes},
    events::SessionEvent,
};

/// Bumped on incompatible changes to events or frames.
pub const PROTOCOL_VERSION: u32 = 2;
