//! Server and connection statistics pages.

use crate::server::{ConnectionContext, Error, Response, StatsAggregator, StatusCode};

/// `GET /status`: plain-text statistics for the server and this connection.
pub fn status_page(stats: &StatsAggregator, ctx: &ConnectionContext) -> Response {
    let snapshot = stats.snapshot();

    let mut msg = format!("Web server {}, version {}\n\n", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    msg.push_str("Server Statistics:\n");
    msg.push_str(&snapshot.to_string());
    msg.push_str("\nConnection Statistics:\n");
    msg.push_str(&format!(
        "{} requests handled on this connection so far\n",
        ctx.requests_handled
    ));
    msg.push_str(&format!(
        "{:.3} s elapsed since start of this connection\n",
        ctx.elapsed().as_secs_f64()
    ));

    Response::text(StatusCode::Ok, msg)
}

/// `GET /status.json`: the server statistics as JSON.
pub fn status_json(stats: &StatsAggregator) -> Result<Response, Error> {
    Response::new(StatusCode::Ok).with_json(&stats.snapshot())
}
