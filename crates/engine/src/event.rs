/// Events an engine client delivers while driving a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A scannable handshake code was issued (or re-issued on expiry).
    HandshakeCode(String),
    /// The out-of-band handshake completed.
    Authenticated,
    /// The client can deliver messages.
    Ready,
    /// The handshake or restored credentials were rejected.
    AuthFailure(String),
    /// The connection dropped.
    Disconnected(String),
}
