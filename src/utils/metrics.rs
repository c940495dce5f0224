//! Observability and Metrics
//!
//! Atomic counters tracking connection and dispatch activity.
//!
//! The server always owns a [`Metrics`] instance for pipeline counters.
//! Because `Metrics` also implements [`Component`], embedders can register
//! an instance under a name (conventionally `"metrics"`) to give handlers
//! an injectable sink of their own.

use crate::error::Result;
use crate::registry::components::Component;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Metrics collector for server operations
#[derive(Debug)]
pub struct Metrics {
    /// Total connections accepted
    pub connections_total: AtomicU64,
    /// Currently open connections
    pub connections_active: AtomicU64,
    /// Packets successfully decoded
    pub packets_received: AtomicU64,
    /// Packets handed to the dispatcher
    pub packets_dispatched: AtomicU64,
    /// Packets dropped because no handler owns their key
    pub packets_unroutable: AtomicU64,
    /// Handler errors and panics caught at the dispatch boundary
    pub handler_failures: AtomicU64,
    /// Responses written back to peers
    pub responses_written: AtomicU64,
    /// Response writes that failed
    pub write_failures: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            connections_total: AtomicU64::new(0),
            connections_active: AtomicU64::new(0),
            packets_received: AtomicU64::new(0),
            packets_dispatched: AtomicU64::new(0),
            packets_unroutable: AtomicU64::new(0),
            handler_failures: AtomicU64::new(0),
            responses_written: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a newly accepted connection
    pub fn connection_opened(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a closed connection
    pub fn connection_closed(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a successfully decoded packet
    pub fn packet_received(&self) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a packet handed to the dispatcher
    pub fn packet_dispatched(&self) {
        self.packets_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a packet dropped for lack of a handler
    pub fn packet_unroutable(&self) {
        self.packets_unroutable.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a handler error or panic caught at the dispatch boundary
    pub fn handler_failed(&self) {
        self.handler_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a response written back to a peer
    pub fn response_written(&self) {
        self.responses_written.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed response write
    pub fn write_failed(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Seconds since this collector was created
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Emit a one-line summary of all counters
    pub fn log_summary(&self) {
        info!(
            uptime_secs = self.uptime_secs(),
            connections_total = self.connections_total.load(Ordering::Relaxed),
            connections_active = self.connections_active.load(Ordering::Relaxed),
            packets_received = self.packets_received.load(Ordering::Relaxed),
            packets_dispatched = self.packets_dispatched.load(Ordering::Relaxed),
            packets_unroutable = self.packets_unroutable.load(Ordering::Relaxed),
            handler_failures = self.handler_failures.load(Ordering::Relaxed),
            responses_written = self.responses_written.load(Ordering::Relaxed),
            write_failures = self.write_failures.load(Ordering::Relaxed),
            "server metrics"
        );
    }
}

impl Component for Metrics {
    fn release(&self) -> Result<()> {
        self.log_summary();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_track_connection_lifecycle() {
        let metrics = Metrics::new();
        metrics.connection_opened();
        metrics.connection_opened();
        metrics.connection_closed();

        assert_eq!(metrics.connections_total.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.connections_active.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn dispatch_counters_are_independent() {
        let metrics = Metrics::new();
        metrics.packet_dispatched();
        metrics.packet_unroutable();
        metrics.handler_failed();

        assert_eq!(metrics.packets_dispatched.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.packets_unroutable.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.handler_failures.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.packets_received.load(Ordering::Relaxed), 0);
    }
}
