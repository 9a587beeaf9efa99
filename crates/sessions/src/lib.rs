//! Session lifecycle management.
//!
//! A session is one logical user's connection to the messaging network.
//! [`SessionRegistry`] owns the only map from session id to live session;
//! each [`ClientSession`] wraps exactly one engine client and is driven by
//! the engine's event stream through an explicit state machine. Lifecycle
//! events fan out to transports through the [`NotificationBridge`].

pub mod notify;
pub mod registry;
pub mod session;

pub use {
    notify::NotificationBridge,
    registry::{ReconnectPolicy, SessionRegistry},
    session::{ClientSession, SessionState, SessionStatus},
};
