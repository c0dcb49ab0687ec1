//! HTTP request framing and parsing.
//!
//! This module turns raw bytes into requests: a byte buffer that finds
//! message boundaries in an arbitrarily chunked stream, the request-line and
//! header parser, and the header/cookie lookup helpers built on top of it.

mod buffer;
mod error;
mod headers;
mod method;
mod request;

// Re-export public items
pub use buffer::ByteStreamBuffer;
pub use error::Error;
pub use headers::{get_cookie, get_header_value, parse_cookies};
pub use method::Method;
pub use request::{percent_decode, Request};

// Re-export the parse_head function
pub use request::parse_head;
