//! HTTP server implementation.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use log::{error, info};
use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tokio::task::JoinSet;

use crate::server::config::ServerConfig;
use crate::server::connection::ConnectionSession;
use crate::server::error::Error;
use crate::server::handler::HandlerFn;
use crate::server::stats::StatsAggregator;

/// An HTTP server.
pub struct HttpServer {
    /// The server configuration.
    pub config: ServerConfig,
    stats: Arc<StatsAggregator>,
    handler: HandlerFn,
}

impl HttpServer {
    /// Create a new HTTP server with fresh statistics.
    pub fn new(config: ServerConfig, handler: HandlerFn) -> Self {
        Self::with_stats(config, Arc::new(StatsAggregator::new()), handler)
    }

    /// Create a new HTTP server that records into existing statistics.
    pub fn with_stats(config: ServerConfig, stats: Arc<StatsAggregator>, handler: HandlerFn) -> Self {
        Self { config, stats, handler }
    }

    /// The statistics every connection of this server records into.
    pub fn stats(&self) -> &Arc<StatsAggregator> {
        &self.stats
    }

    /// Set up the TCP listener.
    async fn setup_listener(&self) -> Result<TcpListener, Error> {
        let listener = TcpListener::bind(&self.config.addr).await?;
        let addr = listener.local_addr()?;
        info!("Server can be accessed at URLs such as:");
        info!("    http://{addr}/");
        info!("    http://{addr}/hello");
        info!("    http://{addr}/status");
        info!("Ready for connections...");
        Ok(listener)
    }

    /// Hand an accepted connection to its own task.
    ///
    /// The session is created, and the connection counted, before the task
    /// is spawned; the accept loop never waits on the connection itself.
    fn spawn_session(&self, socket: TcpStream, peer: SocketAddr, tasks: &mut JoinSet<()>) {
        let session = ConnectionSession::new(socket, peer, Arc::clone(&self.stats), Arc::clone(&self.handler))
            .with_read_timeout(self.config.read_timeout);
        tasks.spawn(session.run());
    }

    /// Handle connection errors.
    async fn handle_accept_error(e: std::io::Error) {
        error!("Error accepting connection: {e}");
        // Usually a transient resource shortage; wait a bit before retrying
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    }

    /// Collect finished connection tasks, logging any that panicked.
    fn reap_finished(tasks: &mut JoinSet<()>) {
        while let Some(res) = tasks.try_join_next() {
            if let Err(e) = res {
                error!("Connection task failed: {e}");
            }
        }
    }

    /// Perform graceful shutdown.
    async fn perform_shutdown(&self, tasks: &mut JoinSet<()>) {
        info!("Waiting for {len} active connections to complete...", len = tasks.len());
        let drained = tokio::time::timeout(self.config.shutdown_grace, async {
            while let Some(res) = tasks.join_next().await {
                if let Err(e) = res {
                    error!("Task failed during shutdown: {e}");
                }
            }
        })
        .await;

        if drained.is_err() {
            info!("Aborting {len} connections still open", len = tasks.len());
            tasks.shutdown().await;
        }

        info!("Server shutdown complete");
    }

    /// Start the server and listen for incoming connections until Ctrl+C.
    pub async fn start(&self) -> Result<(), Error> {
        info!("Attempting to listen at {}", self.config.addr);
        let listener = self.setup_listener().await?;
        self.serve(listener, ctrl_c()).await
    }

    /// Accept connections on `listener` until `shutdown` completes.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                // Check for shutdown signal
                () = &mut shutdown => {
                    info!("Shutting down server...");
                    break;
                }

                // Accept new connections
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((socket, peer)) => self.spawn_session(socket, peer, &mut tasks),
                        Err(e) => Self::handle_accept_error(e).await,
                    }
                }
            }

            Self::reap_finished(&mut tasks);
        }

        self.perform_shutdown(&mut tasks).await;

        Ok(())
    }
}

/// Resolve on Ctrl+C. If the handler cannot be installed, never resolve.
async fn ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown"),
        Err(e) => {
            error!("Error setting up Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    }
}
