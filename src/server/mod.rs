//! HTTP server implementation.
//!
//! This module holds the per-connection protocol engine (framed reads,
//! response serialization, the session state machine), the statistics shared
//! between connections, routing, and the accept loop that ties them together.

mod config;
mod connection;
mod error;
mod handler;
mod http_server;
mod reader;
mod response;
mod stats;

// Re-export public items
pub use config::ServerConfig;
pub use connection::{ConnectionContext, ConnectionSession};
pub use error::{Error, ReadError};
pub use handler::{handler_fn, HandlerFn, HandlerFuture, Route, Router};
pub use http_server::HttpServer;
pub use reader::{FramedReader, READ_CHUNK_SIZE};
pub use response::{http_date, serialize, serialize_at, write_response, Body, Response, StatusCode, SERVER_NAME};
pub use stats::{ConnectionGuard, StatsAggregator, StatsSnapshot};
