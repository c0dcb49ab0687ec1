//! HTTP request parsing and representation.

use std::borrow::Cow;
use std::str::FromStr;

use percent_encoding::percent_decode_str;

use crate::parser::error::Error;
use crate::parser::headers::{get_cookie, get_header_value};
use crate::parser::method::Method;

/// Represents an HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request path, percent-decoded up to the first `?`; the query string is kept raw
    pub path: String,
    /// The HTTP version token, e.g. `HTTP/1.1`
    pub version: String,
    /// The raw header lines, in the order they were received
    pub headers: Vec<String>,
    /// The announced body length, if a Content-Length header was sent
    pub content_length: Option<usize>,
    /// The request body, present iff a Content-Length header was sent
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// Create a new HTTP request without a body.
    ///
    /// # Arguments
    ///
    /// * `method` - The HTTP method
    /// * `path` - The request path
    /// * `version` - The HTTP version token
    /// * `headers` - The raw header lines
    pub fn new(method: Method, path: impl Into<String>, version: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            method,
            path: path.into(),
            version: version.into(),
            headers,
            content_length: None,
            body: None,
        }
    }

    /// Attach a body, updating the announced length to match.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        self.content_length = Some(body.len());
        self.body = Some(body);
        self
    }

    /// Get a header value, matching the name case-insensitively.
    pub fn get_header(&self, name: &str) -> Option<&str> {
        get_header_value(&self.headers, name)
    }

    /// Check if a header exists.
    pub fn has_header(&self, name: &str) -> bool {
        self.get_header(name).is_some()
    }

    /// Get the value of a cookie sent in the `Cookie` header.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        get_cookie(&self.headers, name)
    }

    /// The path without its query string.
    pub fn route_path(&self) -> &str {
        self.path.split_once('?').map_or(self.path.as_str(), |(path, _)| path)
    }

    /// The raw query string after the first `?`, if any.
    pub fn query(&self) -> Option<&str> {
        self.path.split_once('?').map(|(_, query)| query)
    }

    /// The body as text, replacing invalid UTF-8 sequences.
    pub fn body_text(&self) -> Option<Cow<'_, str>> {
        self.body.as_deref().map(String::from_utf8_lossy)
    }
}

/// Parse a request head (request line plus header lines, without the
/// terminating blank line) into a [`Request`].
///
/// The body is not read here. When the returned request carries a
/// `content_length`, the caller must read exactly that many bytes and attach
/// them with [`Request::with_body`].
///
/// # Errors
///
/// * [`Error::EmptyRequest`] if there is no request line
/// * [`Error::MalformedRequestLine`] unless the request line has exactly three tokens
/// * [`Error::UnsupportedEncoding`] for `Transfer-Encoding: chunked`
/// * [`Error::InvalidContentLength`] if Content-Length is not a number
pub fn parse_head(head: &str) -> Result<Request, Error> {
    let mut lines = head_lines(head);

    let request_line = lines.next().ok_or(Error::EmptyRequest)?;

    // Split the request line into method, path, and version
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    let &[method, raw_path, version] = parts.as_slice() else {
        return Err(Error::MalformedRequestLine(request_line.to_string()));
    };

    let method = match Method::from_str(method) {
        Ok(method) => method,
        Err(never) => match never {},
    };

    // Only the part before '?' is decoded; the query string is passed on raw
    let path = match raw_path.split_once('?') {
        Some((path, query)) => format!("{}?{query}", percent_decode(path)),
        None => percent_decode(raw_path),
    };

    let headers: Vec<String> = lines.map(str::to_string).collect();
    let mut request = Request::new(method, path, version, headers);

    if let Some(encoding) = request.get_header("Transfer-Encoding") {
        if encoding.trim().eq_ignore_ascii_case("chunked") {
            return Err(Error::UnsupportedEncoding(encoding.to_string()));
        }
    }

    if let Some(length) = request.get_header("Content-Length") {
        let length = length
            .trim()
            .parse::<usize>()
            .map_err(|_| Error::InvalidContentLength(length.to_string()))?;
        request.content_length = Some(length);
    }

    Ok(request)
}

/// Split a request head into lines. `\r\n`, a lone `\n` and a lone `\r`
/// all end a line; a trailing line break does not start an empty line.
fn head_lines(head: &str) -> impl Iterator<Item = &str> {
    let mut rest = head;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let Some(end) = rest.find(['\r', '\n']) else {
            return Some(std::mem::take(&mut rest));
        };
        let line = &rest[..end];
        let skip = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[end + skip..];
        Some(line)
    })
}

/// Decode `%XX` escapes in `input`.
///
/// Malformed escapes are kept literally, `+` is not treated as a space, and
/// decoded bytes that are not valid UTF-8 are replaced with U+FFFD.
pub fn percent_decode(input: &str) -> String {
    percent_decode_str(input).decode_utf8_lossy().into_owned()
}
