//! Error types for the HTTP server.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while serving requests.
///
/// A handler returning one of these is answered with a 500 response; the
/// connection stays open.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Internal server error.
    #[error("Internal server error: {0}")]
    InternalError(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The configured host could not be turned into a listening address.
    #[error("Cannot resolve listening address {0}")]
    InvalidAddress(String),
}

/// Why a framed read stopped before producing a complete message.
///
/// Every variant ends the connection it happened on.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The peer closed its end of the socket. `leftover` counts the bytes that
    /// were buffered but never formed a complete message.
    #[error("connection closed by peer with {leftover} unconsumed bytes")]
    Closed { leftover: usize },

    /// No data arrived within the read timeout.
    #[error("no data received for {0:?}")]
    TimedOut(Duration),

    /// Any other transport failure.
    #[error("read failure: {0}")]
    Fault(#[source] std::io::Error),
}
