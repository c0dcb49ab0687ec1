//! Server-wide statistics shared by every connection.
//!
//! All counters live behind one mutex. Each operation takes the lock, updates
//! the counters it owns and releases it before returning, so readers never see
//! half of an update. The lock is never held across an `.await`.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Serialize, Serializer};

#[derive(Debug, Default)]
struct Counters {
    total_connections: u64,
    active_connections: u64,
    requests: u64,
    errors: u64,
    cumulative: Duration,
    max: Duration,
    average: Duration,
}

/// Lock-protected accumulator of connection and request statistics.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    counters: Mutex<Counters>,
}

impl StatsAggregator {
    /// Create an aggregator with every counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        // The counters stay consistent even if a holder panicked: every
        // update is complete before the guard is released.
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count a newly accepted connection.
    pub fn connection_opened(&self) {
        let mut counters = self.lock();
        counters.total_connections += 1;
        counters.active_connections += 1;
    }

    /// Count a connection whose session has ended.
    pub fn connection_closed(&self) {
        let mut counters = self.lock();
        debug_assert!(counters.active_connections > 0, "connection closed more often than opened");
        counters.active_connections = counters.active_connections.saturating_sub(1);
    }

    /// Record one handled request and how long it took.
    pub fn request_completed(&self, duration: Duration) {
        let mut counters = self.lock();
        counters.requests += 1;
        counters.cumulative += duration;
        counters.max = counters.max.max(duration);

        let average_nanos = counters.cumulative.as_nanos() / u128::from(counters.requests);
        counters.average = Duration::from_nanos(u64::try_from(average_nanos).unwrap_or(u64::MAX));
    }

    /// Count a response with a non-2xx status.
    pub fn error_observed(&self) {
        self.lock().errors += 1;
    }

    /// A consistent copy of every counter.
    pub fn snapshot(&self) -> StatsSnapshot {
        let counters = self.lock();
        StatsSnapshot {
            total_connections: counters.total_connections,
            active_connections: counters.active_connections,
            requests: counters.requests,
            errors: counters.errors,
            cumulative: counters.cumulative,
            average: counters.average,
            max: counters.max,
        }
    }

    /// Count a new connection and return a guard that counts it closed when
    /// dropped.
    pub fn open_connection(self: &Arc<Self>) -> ConnectionGuard {
        self.connection_opened();
        ConnectionGuard {
            stats: Arc::clone(self),
        }
    }
}

/// Keeps a connection counted as active for as long as it lives.
///
/// Dropping the guard (on return, on error, or while unwinding from a panic)
/// calls [`StatsAggregator::connection_closed`] exactly once.
#[derive(Debug)]
pub struct ConnectionGuard {
    stats: Arc<StatsAggregator>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.stats.connection_closed();
    }
}

/// Point-in-time copy of the server statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Connections accepted since startup.
    pub total_connections: u64,
    /// Connections whose session has not ended yet.
    pub active_connections: u64,
    /// Responses written, including 4xx answers to malformed requests.
    pub requests: u64,
    /// Responses with a non-2xx status.
    pub errors: u64,
    /// Total handling time over all requests.
    #[serde(rename = "cumulative_ms", serialize_with = "as_millis")]
    pub cumulative: Duration,
    /// `cumulative` divided by `requests`.
    #[serde(rename = "average_ms", serialize_with = "as_millis")]
    pub average: Duration,
    /// Slowest single request.
    #[serde(rename = "max_ms", serialize_with = "as_millis")]
    pub max: Duration,
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_nanos() as f64 / 1_000_000.0)
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} connections in total", self.total_connections)?;
        writeln!(f, "{} active connections", self.active_connections)?;
        writeln!(f, "{} requests handled", self.requests)?;
        writeln!(f, "{} errors encountered", self.errors)?;
        writeln!(
            f,
            "{:.3} ms average request handling time",
            self.average.as_secs_f64() * 1000.0
        )?;
        writeln!(
            f,
            "{:.3} ms slowest request handling time",
            self.max.as_secs_f64() * 1000.0
        )
    }
}
