//! Client error types.

use thiserror::Error;

/// Errors surfaced by the chain clients.
#[derive(Debug, Error, Clone)]
pub enum ClientError {
    /// Connection loss or timeout after the reconnect cap was exhausted.
    #[error("transport error: {0}")]
    Transport(String),

    /// The active endpoint is blacklisted; the call was rejected without
    /// going out on the wire.
    #[error("endpoint {url} blacklisted for {remaining_secs}s")]
    Blacklisted {
        /// Endpoint that is cooling down.
        url: String,
        /// Seconds until the cooldown expires.
        remaining_secs: u64,
    },

    /// The node answered with an RPC-level error object.
    #[error("rpc error: {0}")]
    Rpc(String),

    /// The node answered, but the payload did not decode into the
    /// expected shape.
    #[error("decode error: {0}")]
    Decode(String),
}
