//! Command-line entry point: serve the bundled pages and a directory of files.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::{error, info};
use webcore_rs::routes::build_router;
use webcore_rs::{HttpServer, ServerConfig, StatsAggregator};

/// A small web server built on a hand-written HTTP/1.1 core.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Host name or IPv4 address to listen on, e.g. localhost or 127.0.0.1
    host: String,

    /// Port to listen on, e.g. 8888
    port: u16,

    /// Directory to serve files from
    #[arg(default_value = "./web_root")]
    root: PathBuf,

    /// Close connections that send no request for this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<f64>,

    /// File with quotes for /quote, separated by lines containing only '%'
    #[arg(long, default_value = "quotations.txt")]
    quotes: PathBuf,
}

/// Drop `.` segments and resolve `..` lexically.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir if normalized.file_name().is_some() => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    normalized
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let read_timeout = match args.timeout {
        Some(secs) => Some(Duration::try_from_secs_f64(secs)?),
        None => None,
    };

    let config = ServerConfig {
        addr: ServerConfig::resolve_addr(&args.host, args.port)?,
        read_timeout,
        web_root: normalize(&args.root),
        quotes_file: args.quotes,
        ..ServerConfig::default()
    };

    info!("Starting web server.");
    info!("Serving files from directory {}", config.web_root.display());

    let stats = Arc::new(StatsAggregator::new());
    let router = build_router(&config, Arc::clone(&stats));
    let server = HttpServer::with_stats(config, stats, router.into_handler());

    if let Err(e) = server.start().await {
        error!("Server failed: {e}");
        return Err(e.into());
    }

    info!("Done");
    Ok(())
}
