//! # Handler Registry
//!
//! Pluggable business handlers indexed by their one-byte command key.
//!
//! Handlers are supplied as an explicit list of factories rather than
//! discovered at runtime. Each factory constructs one handler instance and
//! resolves its named dependencies through typed [`ComponentRegistry`]
//! lookups, so every dependency is bound before the handler is reachable by
//! dispatch. The finished registry is a fixed 256-slot table: lookup by key
//! is O(1), side-effect-free, and needs no locking because the table never
//! changes after `start()`.

use crate::core::packet::Packet;
use crate::error::{Result, RouterError};
use crate::registry::components::ComponentRegistry;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// A pluggable business-logic unit bound to a one-byte command key
///
/// `on_receive` runs on the business pool and is the only operation in the
/// core that is expected to block or perform downstream I/O.
pub trait Handler: Send + Sync {
    /// The command key this handler owns (stable per handler type)
    fn key(&self) -> u8;

    /// Process one inbound packet, optionally producing a response
    fn on_receive(&self, packet: Packet, remote: SocketAddr) -> Result<Option<Packet>>;

    /// Release any resources held by this handler
    ///
    /// Called at most once per instance during shutdown. Failures are logged
    /// by the registry and never abort shutdown.
    fn release(&self) -> Result<()> {
        Ok(())
    }
}

/// Constructs one handler, resolving its dependencies from the component registry
///
/// Implemented automatically for closures of the matching shape.
pub trait HandlerFactory: Send + Sync {
    /// Build the handler with all declared dependencies bound
    fn build(&self, components: &ComponentRegistry) -> Result<Box<dyn Handler>>;
}

impl<F> HandlerFactory for F
where
    F: Fn(&ComponentRegistry) -> Result<Box<dyn Handler>> + Send + Sync,
{
    fn build(&self, components: &ComponentRegistry) -> Result<Box<dyn Handler>> {
        self(components)
    }
}

/// Fixed-size key → handler table, immutable after construction
pub struct HandlerRegistry {
    slots: [Option<Arc<dyn Handler>>; 256],
    count: usize,
    released: AtomicBool,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("count", &self.count)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl HandlerRegistry {
    /// Build the registry by running every factory against the component registry
    ///
    /// Fails fast on the first handler construction error, unresolved
    /// dependency, or duplicate key.
    pub fn build(
        factories: &[Box<dyn HandlerFactory>],
        components: &ComponentRegistry,
    ) -> Result<Self> {
        let mut slots: [Option<Arc<dyn Handler>>; 256] = std::array::from_fn(|_| None);
        let mut count = 0;

        for factory in factories {
            let handler = factory.build(components)?;
            let key = handler.key();

            let slot = &mut slots[key as usize];
            if slot.is_some() {
                return Err(RouterError::DuplicateHandlerKey(key));
            }
            info!(key, "handler registered");
            *slot = Some(Arc::from(handler));
            count += 1;
        }

        Ok(Self {
            slots,
            count,
            released: AtomicBool::new(false),
        })
    }

    /// O(1) lookup by command key
    pub fn lookup(&self, key: u8) -> Option<&Arc<dyn Handler>> {
        self.slots[key as usize].as_ref()
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether any handlers are registered
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Release every handler, best-effort
    ///
    /// Each handler's `release()` runs exactly once; a failure is logged and
    /// the remaining handlers are still released. Subsequent calls are no-ops.
    pub fn release_all(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }

        for handler in self.slots.iter().flatten() {
            let key = handler.key();
            match handler.release() {
                Ok(()) => debug!(key, "handler released"),
                Err(e) => error!(key, error = %e, "handler release failed"),
            }
        }
    }
}
