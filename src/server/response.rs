//! HTTP response types and wire serialization.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use log::debug;
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::server::error::Error;
use crate::server::stats::StatsAggregator;

/// Value of the `Server` header on every response.
pub const SERVER_NAME: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// How long cookies set by a response stay valid.
const COOKIE_LIFETIME_DAYS: i64 = 7;

/// HTTP status codes with their standard reason phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok = 200,
    BadRequest = 400,
    Forbidden = 403,
    NotFound = 404,
    MethodNotAllowed = 405,
    LengthRequired = 411,
    InternalServerError = 500,
}

impl StatusCode {
    /// The numeric status code.
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Get the reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::LengthRequired => "Length Required",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }

    /// Whether this is a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.as_u16())
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

/// A response body before it is put on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Raw bytes, sent unchanged.
    Bytes(Vec<u8>),
    /// Text, sent UTF-8 encoded.
    Text(String),
}

impl Body {
    /// Coerce the body to the bytes that go on the wire.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Body::Bytes(bytes) => bytes,
            Body::Text(text) => text.into_bytes(),
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Bytes(bytes)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

/// Represents an HTTP response.
///
/// A response without a mime type is sent with `Content-Length: 0` and no
/// body, whatever `body` holds.
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// The Content-Type of the body
    pub mime_type: Option<String>,
    /// The response body
    pub body: Option<Body>,
    /// `name=value` cookie directives, each sent as a Set-Cookie header
    pub cookies: Option<Vec<String>>,
    /// Extra headers, sent after the mandatory ones
    pub headers: Vec<(String, String)>,
}

impl Response {
    /// Create a new HTTP response with the given status code and no body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            mime_type: None,
            body: None,
            cookies: None,
            headers: Vec::new(),
        }
    }

    /// A `text/plain` response.
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self::new(status).with_content_type("text/plain").with_body_string(body)
    }

    /// A `text/html` response.
    pub fn html(status: StatusCode, body: impl Into<String>) -> Self {
        Self::new(status).with_content_type("text/html").with_body_string(body)
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.mime_type = Some(content_type.into());
        self
    }

    /// Set the response body with a string.
    pub fn with_body_string(mut self, body: impl Into<String>) -> Self {
        self.body = Some(Body::Text(body.into()));
        self
    }

    /// Set the response body with bytes.
    pub fn with_body_bytes(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(Body::Bytes(body.into()));
        self
    }

    /// Set the response body to the textual form of any displayable value.
    pub fn with_body_display(self, value: impl fmt::Display) -> Self {
        self.with_body_string(value.to_string())
    }

    /// Set the response body with a JSON value.
    ///
    /// This method serializes the provided value to JSON and sets it as the response body.
    pub fn with_json<T: Serialize>(self, value: &T) -> Result<Self, Error> {
        let json = serde_json::to_vec(value)?;
        Ok(self.with_content_type("application/json").with_body_bytes(json))
    }

    /// Add a `name=value` cookie.
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookies.get_or_insert_with(Vec::new).push(cookie.into());
        self
    }

    /// Add an extra header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Format a timestamp the way HTTP dates are written (RFC 1123, GMT).
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Serialize a response into wire bytes, dated now.
pub fn serialize(response: Response) -> Vec<u8> {
    serialize_at(response, Utc::now())
}

/// Serialize a response into wire bytes as if sent at `now`.
pub fn serialize_at(response: Response, now: DateTime<Utc>) -> Vec<u8> {
    let (head, body) = encode(response, now);
    let mut bytes = head.into_bytes();
    if let Some(body) = body {
        bytes.extend_from_slice(&body);
    }
    bytes
}

/// Split a response into its textual head (ending in the blank line) and
/// its body bytes.
fn encode(response: Response, now: DateTime<Utc>) -> (String, Option<Vec<u8>>) {
    let mut head = format!("HTTP/1.1 {}\r\n", response.status);
    head.push_str(&format!("Server: {SERVER_NAME}\r\n"));
    head.push_str(&format!("Date: {}\r\n", http_date(now)));

    for (name, value) in &response.headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }

    if let Some(cookies) = &response.cookies {
        let expires = http_date(now + TimeDelta::days(COOKIE_LIFETIME_DAYS));
        for cookie in cookies {
            head.push_str(&format!("Set-Cookie: {cookie}; Expires={expires}\r\n"));
        }
    }

    let body = match response.mime_type {
        None => {
            head.push_str("Content-Length: 0\r\n");
            None
        }
        Some(mime_type) => {
            let body = response.body.map(Body::into_bytes).unwrap_or_default();
            head.push_str(&format!("Content-Type: {mime_type}\r\n"));
            head.push_str(&format!("Content-Length: {}\r\n", body.len()));
            Some(body)
        }
    };

    head.push_str("\r\n");
    (head, body)
}

/// Write a response to the client.
///
/// A non-2xx status is counted as an error in `stats` exactly once, before
/// anything is written.
pub async fn write_response<W>(writer: &mut W, response: Response, stats: &StatsAggregator) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    if !response.status.is_success() {
        stats.error_observed();
    }

    let mime_type = response.mime_type.clone();
    let (head, body) = encode(response, Utc::now());

    debug!("Sending response-line and headers...\n{}", head.escape_debug());
    writer.write_all(head.as_bytes()).await?;

    if let Some(body) = body {
        debug!(
            "Response body has {} bytes, mime type '{}'",
            body.len(),
            mime_type.as_deref().unwrap_or_default()
        );
        writer.write_all(&body).await?;
    }

    writer.flush().await
}
