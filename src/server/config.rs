//! Server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

use crate::server::error::Error;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address to bind to.
    pub addr: SocketAddr,
    /// How long to wait for a client to send a request head; `None` waits forever.
    pub read_timeout: Option<Duration>,
    /// Directory that static files are served from.
    pub web_root: PathBuf,
    /// File holding the quotes for `/quote`, separated by lines containing only `%`.
    pub quotes_file: PathBuf,
    /// How long shutdown waits for open connections to finish.
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8888),
            read_timeout: None,
            web_root: PathBuf::from("./web_root"),
            quotes_file: PathBuf::from("quotations.txt"),
            shutdown_grace: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    /// Turn a host (an IPv4 literal or a resolvable name) and port into a
    /// listening address, preferring IPv4 results.
    pub fn resolve_addr(host: &str, port: u16) -> Result<SocketAddr, Error> {
        if let Ok(ip) = host.parse::<Ipv4Addr>() {
            return Ok(SocketAddr::new(IpAddr::V4(ip), port));
        }

        let candidates: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|_| Error::InvalidAddress(format!("{host}:{port}")))?
            .collect();

        candidates
            .iter()
            .find(|addr| addr.is_ipv4())
            .or_else(|| candidates.first())
            .copied()
            .ok_or_else(|| Error::InvalidAddress(format!("{host}:{port}")))
    }
}
