//! Error types for the HTTP parser.

use thiserror::Error;

/// Protocol-level errors found while parsing a request head.
///
/// Each of these is answered with a client error response; none of them ends
/// the connection.
#[derive(Debug, Error)]
pub enum Error {
    /// The request head contained no lines at all.
    #[error("Empty request")]
    EmptyRequest,

    /// The request line did not split into method, path and version.
    #[error("Malformed request line: {0}")]
    MalformedRequestLine(String),

    /// The request asked for a transfer coding this server does not decode.
    #[error("Unsupported transfer encoding: {0}")]
    UnsupportedEncoding(String),

    /// The Content-Length header is not a non-negative integer.
    #[error("Invalid Content-Length: {0}")]
    InvalidContentLength(String),
}
