//! A minimal HTTP/1.1 server core.
//!
//! Requests are framed and parsed straight from the TCP byte stream, without
//! an HTTP library: a leftover buffer finds the blank line that ends each
//! request head, the head is parsed into a [`Request`], a `Content-Length`
//! body is read exactly, and the dispatch hook's [`Response`] is serialized
//! back onto the wire. Each connection is served by its own task; the only
//! state shared between connections is the [`StatsAggregator`].
//!
//! # Features
//!
//! - Framed reads over any `AsyncRead`, with per-call read timeouts
//! - Request-line and header parsing with case-insensitive lookup and cookies
//! - Response serialization with `Server`, `Date` and `Set-Cookie` headers
//! - Lock-protected server statistics, exported as text or JSON
//! - Exact-path routing, static files, and a few bundled pages
//!
//! # Examples
//!
//! ## Parsing a request head
//!
//! ```
//! use webcore_rs::{parse_head, Method};
//!
//! let request = parse_head("GET /docs/read%20me.txt?lang=en HTTP/1.1\r\nCookie: theme=dark").unwrap();
//!
//! assert_eq!(request.method, Method::GET);
//! assert_eq!(request.path, "/docs/read me.txt?lang=en");
//! assert_eq!(request.cookie("theme"), Some("dark"));
//! ```
//!
//! ## Error handling
//!
//! ```
//! use webcore_rs::{parse_head, ParserError};
//!
//! match parse_head("GET /only-two-tokens") {
//!     Ok(_) => println!("Request parsed successfully"),
//!     Err(ParserError::MalformedRequestLine(line)) => println!("Malformed request line: {}", line),
//!     Err(err) => println!("Other error: {}", err),
//! }
//! ```
//!
//! ## Serving
//!
//! ```no_run
//! use std::sync::Arc;
//! use webcore_rs::{Method, Response, Router, HttpServer, ServerConfig, StatsAggregator, StatusCode};
//!
//! # async fn run() -> Result<(), webcore_rs::ServerError> {
//! let router = Router::new().route("/", vec![Method::GET], |_req, _ctx| async {
//!     Ok(Response::text(StatusCode::Ok, "Hello!"))
//! });
//!
//! let server = HttpServer::with_stats(ServerConfig::default(), Arc::new(StatsAggregator::new()), router.into_handler());
//! server.start().await
//! # }
//! ```

// Export the parser module
pub mod parser;

// Export the server module
pub mod server;

// Export the bundled pages
pub mod routes;

// Re-export commonly used items for convenience
pub use parser::{get_cookie, get_header_value, parse_head, Error as ParserError, Method, Request};
pub use server::{
    ConnectionContext, ConnectionSession, Error as ServerError, HttpServer, ReadError, Response, Router,
    ServerConfig, StatsAggregator, StatsSnapshot, StatusCode,
};
