//! The pages this server ships with.
//!
//! These handlers sit on top of the protocol engine: each one takes a parsed
//! request and produces a response. [`build_router`] wires them together into
//! the dispatch hook a [`crate::server::HttpServer`] runs with.

mod files;
mod pages;
mod status;
mod tests;

use std::sync::Arc;

use crate::parser::Method;
use crate::server::{Router, ServerConfig, StatsAggregator};

pub use files::{mime_type_for, resolve_file_path, serve_file};
pub use pages::{hello_page, quote_page, split_quotes, FAVORITE_COLORS};
pub use status::{status_json, status_page};

/// Build the router for the bundled pages.
///
/// * `GET /hello`, `GET /quote`, `GET /status`, `GET /status.json`
/// * any other `GET` is looked up as a file under the web root
pub fn build_router(config: &ServerConfig, stats: Arc<StatsAggregator>) -> Router {
    let base_url = format!("http://{}", config.addr);
    let quotes_file = config.quotes_file.clone();
    let web_root = config.web_root.clone();
    let json_stats = Arc::clone(&stats);

    Router::new()
        .route("/status", vec![Method::GET], move |_req, ctx| {
            let stats = Arc::clone(&stats);
            async move { Ok(status_page(&stats, &ctx)) }
        })
        .route("/status.json", vec![Method::GET], move |_req, _ctx| {
            let stats = Arc::clone(&json_stats);
            async move { status_json(&stats) }
        })
        .route("/hello", vec![Method::GET], move |req, _ctx| {
            let base_url = base_url.clone();
            async move { Ok(hello_page(&req, &base_url)) }
        })
        .route("/quote", vec![Method::GET], move |_req, _ctx| {
            let quotes_file = quotes_file.clone();
            async move { quote_page(&quotes_file).await }
        })
        .fallback(vec![Method::GET], move |req, _ctx| {
            let web_root = web_root.clone();
            async move { Ok(serve_file(&web_root, req.route_path()).await) }
        })
}
