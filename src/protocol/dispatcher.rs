//! # Dispatcher
//!
//! Routes each decoded packet to the handler owning its command key.
//!
//! The dispatcher is invoked once per inbound packet, always on the business
//! pool. It is the error boundary between the connection pipeline and
//! arbitrary handler code: handler errors and panics are caught, logged, and
//! answered with silence - the connection is never closed or reset because a
//! handler misbehaved. Unknown keys are dropped at the protocol level with a
//! diagnostic log of the packet's namespace and body.

use crate::core::packet::Packet;
use crate::registry::handlers::HandlerRegistry;
use crate::utils::metrics::Metrics;
use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, warn};

/// Key-based packet router
///
/// Holds the immutable handler table and the server's metrics explicitly;
/// there is no back-reference to the server itself.
pub struct Dispatcher {
    handlers: Arc<HandlerRegistry>,
    metrics: Arc<Metrics>,
}

impl Dispatcher {
    /// Create a dispatcher over a finished handler table
    pub fn new(handlers: Arc<HandlerRegistry>, metrics: Arc<Metrics>) -> Self {
        Self { handlers, metrics }
    }

    /// Route one packet, returning the handler's optional response
    ///
    /// Never fails: unroutable packets and handler failures are logged and
    /// swallowed here so the connection's dispatch lane keeps running.
    pub fn dispatch(&self, packet: Packet, remote: SocketAddr) -> Option<Packet> {
        let key = packet.key;
        self.metrics.packet_dispatched();

        let Some(handler) = self.handlers.lookup(key) else {
            self.metrics.packet_unroutable();
            warn!(
                key,
                namespace = %packet.namespace,
                body = %String::from_utf8_lossy(&packet.body),
                "no handler registered for key, dropping packet"
            );
            return None;
        };

        let handler = Arc::clone(handler);
        match panic::catch_unwind(AssertUnwindSafe(move || handler.on_receive(packet, remote))) {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                self.metrics.handler_failed();
                error!(key, peer = %remote, error = %e, "handler failed");
                None
            }
            Err(payload) => {
                self.metrics.handler_failed();
                error!(
                    key,
                    peer = %remote,
                    panic = %panic_message(payload.as_ref()),
                    "handler panicked"
                );
                None
            }
        }
    }
}

/// Best-effort extraction of a panic payload's message
fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic payload>"
    }
}
