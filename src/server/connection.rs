//! One client connection, from accept to close.
//!
//! A session loops through the request cycle until the peer goes away:
//!
//! ```text
//! AwaitingHead ──► BodyPending ──► Dispatching ──► Responding ──┐
//!   │    │  ▲        (only with        │                        │
//!   │    │  │     Content-Length)      │                        │
//!   │    │  └──────────────────────────┼────────────────────────┘
//!   │    └── malformed head: 4xx ──────┼──► Responding
//!   ▼                                  ▼
//! Closing ◄── peer closed / timeout / I/O fault / write failure
//! ```
//!
//! The socket and its leftover bytes belong to the session alone; only the
//! statistics are shared with other connections.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::parser::{parse_head, Error as ParserError, Request};
use crate::server::error::ReadError;
use crate::server::handler::HandlerFn;
use crate::server::reader::FramedReader;
use crate::server::response::{write_response, Response, StatusCode};
use crate::server::stats::{ConnectionGuard, StatsAggregator};

/// What a handler may know about the connection a request arrived on.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    /// The client's address.
    pub peer: SocketAddr,
    /// Requests fully answered on this connection before the current one.
    pub requests_handled: u64,
    /// When the connection was accepted.
    pub started_at: Instant,
    /// When the most recent request head arrived.
    pub last_active: Instant,
}

impl ConnectionContext {
    /// Context for a connection accepted just now.
    pub fn new(peer: SocketAddr) -> Self {
        let now = Instant::now();
        Self {
            peer,
            requests_handled: 0,
            started_at: now,
            last_active: now,
        }
    }

    /// Time since the connection was accepted.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

enum SessionState {
    AwaitingHead,
    BodyPending(Request, Instant),
    Dispatching(Request, Instant),
    Responding(Response, Instant),
    Closing,
}

/// Drives the request/response cycle for one connection.
pub struct ConnectionSession<S> {
    reader: FramedReader<S>,
    context: ConnectionContext,
    stats: Arc<StatsAggregator>,
    handler: HandlerFn,
    read_timeout: Option<Duration>,
    _active: ConnectionGuard,
}

impl<S> ConnectionSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Start a session for a freshly accepted connection.
    ///
    /// The connection is counted as opened here and as closed when the
    /// session is dropped, however it ends.
    pub fn new(stream: S, peer: SocketAddr, stats: Arc<StatsAggregator>, handler: HandlerFn) -> Self {
        let active = stats.open_connection();
        Self {
            reader: FramedReader::new(stream),
            context: ConnectionContext::new(peer),
            stats,
            handler,
            read_timeout: None,
            _active: active,
        }
    }

    /// Give up on a client that sends nothing for this long while a request
    /// head is awaited.
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// The connection's context as handlers see it.
    pub fn context(&self) -> &ConnectionContext {
        &self.context
    }

    /// Serve requests until the connection ends, then close it.
    pub async fn run(mut self) {
        info!("Handling connection from {}", self.context.peer);

        let mut state = SessionState::AwaitingHead;
        loop {
            state = match state {
                SessionState::AwaitingHead => self.await_head().await,
                SessionState::BodyPending(request, started) => self.read_body(request, started).await,
                SessionState::Dispatching(request, started) => self.dispatch(request, started).await,
                SessionState::Responding(response, started) => self.respond(response, started).await,
                SessionState::Closing => break,
            };
        }

        self.close().await;
    }

    async fn await_head(&mut self) -> SessionState {
        let peer = self.context.peer;
        let head = match self.reader.read_until_blank_line(self.read_timeout).await {
            Ok(head) => head,
            Err(ReadError::Closed { leftover: 0 }) => {
                info!("Client {peer} closed the socket");
                return SessionState::Closing;
            }
            Err(e @ ReadError::Closed { .. }) => {
                info!("Client {peer} closed the socket mid-request: {e}");
                debug!("Abandoned bytes: {}", String::from_utf8_lossy(self.reader.leftover()).escape_debug());
                return SessionState::Closing;
            }
            Err(e @ ReadError::TimedOut(_)) => {
                warn!("Connection from {peer} has been idle too long ({e}), closing");
                return SessionState::Closing;
            }
            Err(e @ ReadError::Fault(_)) => {
                error!("Error reading from client {peer}: {e}");
                return SessionState::Closing;
            }
        };

        let started = Instant::now();
        self.context.last_active = started;
        debug!(
            "Request {} has arrived from {peer}...\n{}",
            self.context.requests_handled,
            head.escape_debug()
        );

        match parse_head(&head) {
            Ok(request) => {
                info!(
                    "Request has method={}, path={}, version={}, and {} headers",
                    request.method,
                    request.path,
                    request.version,
                    request.headers.len()
                );
                if request.content_length.is_some() {
                    SessionState::BodyPending(request, started)
                } else {
                    SessionState::Dispatching(request, started)
                }
            }
            Err(e) => {
                warn!("Rejecting request from {peer}: {e}");
                SessionState::Responding(reject(&e), started)
            }
        }
    }

    async fn read_body(&mut self, request: Request, started: Instant) -> SessionState {
        let length = request.content_length.unwrap_or_default();
        match self.reader.read_exact(length).await {
            Ok(body) => SessionState::Dispatching(request.with_body(body), started),
            Err(e) => {
                warn!(
                    "Abandoning request from {} after {} of {length} body bytes: {e}",
                    self.context.peer,
                    self.reader.leftover().len()
                );
                SessionState::Closing
            }
        }
    }

    async fn dispatch(&mut self, request: Request, started: Instant) -> SessionState {
        let response = match (self.handler)(request, self.context.clone()).await {
            Ok(response) => response,
            Err(e) => {
                error!("Handler failed for client {}: {e}", self.context.peer);
                Response::text(StatusCode::InternalServerError, format!("Internal server error: {e}"))
            }
        };
        SessionState::Responding(response, started)
    }

    async fn respond(&mut self, response: Response, started: Instant) -> SessionState {
        if let Err(e) = write_response(self.reader.get_mut(), response, &self.stats).await {
            error!("Error writing response to client {}: {e}", self.context.peer);
            return SessionState::Closing;
        }

        self.context.requests_handled += 1;
        self.stats.request_completed(started.elapsed());
        info!(
            "Done handling request {} from {}",
            self.context.requests_handled, self.context.peer
        );
        SessionState::AwaitingHead
    }

    async fn close(mut self) {
        if let Err(e) = self.reader.get_mut().shutdown().await {
            debug!("Shutdown of connection from {} failed: {e}", self.context.peer);
        }
        info!(
            "Done with connection from {} after {} requests in {:.3} s",
            self.context.peer,
            self.context.requests_handled,
            self.context.elapsed().as_secs_f64()
        );
    }
}

/// The response for a request head that could not be parsed.
fn reject(error: &ParserError) -> Response {
    match error {
        ParserError::EmptyRequest => Response::text(StatusCode::BadRequest, "You need a request-line!"),
        ParserError::MalformedRequestLine(_) => {
            Response::text(StatusCode::BadRequest, "Your request-line is malformed!")
        }
        ParserError::UnsupportedEncoding(_) => Response::text(
            StatusCode::LengthRequired,
            "Your request uses chunked transfer encoding, sorry!",
        ),
        ParserError::InvalidContentLength(value) => {
            Response::text(StatusCode::BadRequest, format!("Invalid Content-Length: {value}"))
        }
    }
}
