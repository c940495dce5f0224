//! # Server Lifecycle
//!
//! Orchestrates init (build registries, size pools), start (bind, wire
//! pipelines), and stop (drain pools, release registries in order).
//!
//! ## States
//! `Uninitialized → Initialized → Running → Stopped` (terminal).
//!
//! ## Ownership
//! The server owns both registries and the three runtimes explicitly; the
//! dispatcher receives the handler table as a constructor argument rather
//! than reaching back into the server. Handlers and components are declared
//! on the builder before `init()`, so the set of routes is fixed for the
//! server's lifetime.
//!
//! ## Runtimes
//! Lifecycle calls are synchronous and drive the server's own runtimes, so
//! they must not be made from inside an async context.

use crate::config::ServerConfig;
use crate::error::{Result, RouterError};
use crate::protocol::dispatcher::Dispatcher;
use crate::registry::components::{Component, ComponentRegistry};
use crate::registry::handlers::{HandlerFactory, HandlerRegistry};
use crate::transport;
use crate::utils::metrics::Metrics;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tracing::info;

/// Server lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Built but not yet initialized
    Uninitialized,
    /// Registries and pools exist; not yet listening
    Initialized,
    /// Listening and dispatching
    Running,
    /// Terminal; all resources released
    Stopped,
}

impl LifecycleState {
    /// Human-readable state name for diagnostics
    pub fn name(self) -> &'static str {
        match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Initialized => "initialized",
            LifecycleState::Running => "running",
            LifecycleState::Stopped => "stopped",
        }
    }
}

/// Deferred component construction, run during `init()` in declaration order
type ComponentInit = Box<dyn FnOnce(&ServerConfig, &mut ComponentRegistry) -> Result<()> + Send>;

/// Declares the components and handlers a [`Server`] will own
#[derive(Default)]
pub struct ServerBuilder {
    components: Vec<ComponentInit>,
    handlers: Vec<Box<dyn HandlerFactory>>,
}

impl ServerBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a named component, built from configuration during `init()`
    ///
    /// Components are constructed in declaration order and released in
    /// reverse order at shutdown.
    pub fn component<C, F>(mut self, name: impl Into<String>, init: F) -> Self
    where
        C: Component,
        F: FnOnce(&ServerConfig) -> Result<C> + Send + 'static,
    {
        let name = name.into();
        self.components.push(Box::new(move |config, registry| {
            let component = init(config)?;
            registry.register(name, component)
        }));
        self
    }

    /// Declare a handler factory
    ///
    /// Factories run during `init()` after all components exist; each
    /// resolves its dependencies through the component registry and claims
    /// its command key.
    pub fn handler<F>(mut self, factory: F) -> Self
    where
        F: HandlerFactory + 'static,
    {
        self.handlers.push(Box::new(factory));
        self
    }

    /// Finish the declaration phase
    pub fn build(self) -> Server {
        Server {
            state: LifecycleState::Uninitialized,
            component_inits: self.components,
            handler_factories: self.handlers,
            metrics: Arc::new(Metrics::new()),
            core: None,
            shutdown_tx: None,
            local_addr: None,
        }
    }
}

/// Everything that exists between `init()` and `stop()`
struct Core {
    config: ServerConfig,
    components: Arc<ComponentRegistry>,
    handlers: Arc<HandlerRegistry>,
    acceptor: Runtime,
    io: Runtime,
    business: Runtime,
}

/// The packet-routing server
pub struct Server {
    state: LifecycleState,
    component_inits: Vec<ComponentInit>,
    handler_factories: Vec<Box<dyn HandlerFactory>>,
    metrics: Arc<Metrics>,
    core: Option<Core>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    local_addr: Option<SocketAddr>,
}

impl Server {
    /// Start declaring a new server
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// The server's metrics counters
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// The bound listen address, available once `start()` succeeds
    ///
    /// Useful with port 0 configurations, where the OS picks the port.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Build registries and pools from configuration
    ///
    /// Component initializers run first, in declaration order; handler
    /// factories run after every component exists. Any failure here is fatal
    /// and leaves the server unable to start.
    ///
    /// A configuration error is reported before anything is built and the
    /// server stays `Uninitialized`, so a corrected config can be retried.
    /// Once construction begins, the one-shot initializers are consumed; a
    /// failure after that point releases whatever was built and moves the
    /// server to `Stopped`, so a retry can never produce a server missing
    /// some of its declared components.
    pub fn init(&mut self, config: ServerConfig) -> Result<()> {
        if self.state != LifecycleState::Uninitialized {
            return Err(RouterError::InvalidState {
                op: "init",
                actual: self.state.name(),
            });
        }

        config.validate_strict()?;

        let mut components = ComponentRegistry::new();
        let inits = std::mem::take(&mut self.component_inits);

        let built = (|| {
            for init in inits {
                init(&config, &mut components)?;
            }
            let handlers = HandlerRegistry::build(&self.handler_factories, &components)?;
            let acceptor = build_runtime("acceptor", config.acceptor_threads)?;
            let io = build_runtime("io", config.io_threads)?;
            let business = build_runtime("business", config.effective_business_threads())?;
            Ok((handlers, acceptor, io, business))
        })();

        let (handlers, acceptor, io, business) = match built {
            Ok(parts) => parts,
            Err(e) => {
                components.release();
                self.state = LifecycleState::Stopped;
                return Err(e);
            }
        };

        info!(
            components = components.len(),
            handlers = handlers.len(),
            "registries initialized"
        );

        self.core = Some(Core {
            config,
            components: Arc::new(components),
            handlers: Arc::new(handlers),
            acceptor,
            io,
            business,
        });
        self.state = LifecycleState::Initialized;
        Ok(())
    }

    /// Bind the listener and begin accepting connections
    ///
    /// Bind failure is fatal and propagated; there is no silent retry.
    pub fn start(&mut self) -> Result<()> {
        let core = match (self.state, self.core.as_ref()) {
            (LifecycleState::Initialized, Some(core)) => core,
            _ => {
                return Err(RouterError::InvalidState {
                    op: "start",
                    actual: self.state.name(),
                })
            }
        };

        let addr = core.config.bind_address();
        let listener = core
            .acceptor
            .block_on(TcpListener::bind(&addr))
            .map_err(|e| RouterError::Bind {
                addr: addr.clone(),
                source: e,
            })?;
        self.local_addr = listener.local_addr().ok();

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&core.handlers),
            Arc::clone(&self.metrics),
        ));

        core.acceptor.spawn(transport::accept_loop(
            listener,
            shutdown_rx,
            core.io.handle().clone(),
            core.business.handle().clone(),
            dispatcher,
            Arc::clone(&self.metrics),
            core.config.queue_depth,
        ));

        self.shutdown_tx = Some(shutdown_tx);
        self.state = LifecycleState::Running;
        info!(addr = %addr, "server started");
        Ok(())
    }

    /// Drain pools and release all resources
    ///
    /// Order: stop accepting, drain acceptor and I/O pools, drain the
    /// business pool, release handlers, release components. Each step
    /// proceeds past earlier failures; release failures never surface as an
    /// error from `stop()`. The drain per pool is bounded by
    /// `shutdown_timeout`, after which remaining work is force-terminated.
    pub fn stop(&mut self) -> Result<()> {
        if !matches!(
            self.state,
            LifecycleState::Initialized | LifecycleState::Running
        ) {
            return Err(RouterError::InvalidState {
                op: "stop",
                actual: self.state.name(),
            });
        }

        info!("stopping server");

        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.try_send(());
        }

        if let Some(core) = self.core.take() {
            let drain = core.config.shutdown_timeout;
            core.acceptor.shutdown_timeout(drain);
            core.io.shutdown_timeout(drain);
            core.business.shutdown_timeout(drain);

            core.handlers.release_all();
            core.components.release();
        }

        self.local_addr = None;
        self.state = LifecycleState::Stopped;
        info!("server stopped");
        Ok(())
    }
}

/// Build one named multi-thread runtime
fn build_runtime(name: &str, worker_threads: usize) -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .thread_name(format!("packet-router-{name}"))
        .enable_all()
        .build()
        .map_err(RouterError::Io)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn start_requires_init() {
        let mut server = Server::builder().build();
        match server.start() {
            Err(RouterError::InvalidState { op, actual }) => {
                assert_eq!(op, "start");
                assert_eq!(actual, "uninitialized");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn init_runs_exactly_once() {
        let mut server = Server::builder().build();
        server.init(ServerConfig::default()).unwrap();
        assert_eq!(server.state(), LifecycleState::Initialized);

        let err = server.init(ServerConfig::default());
        assert!(matches!(err, Err(RouterError::InvalidState { .. })));
        server.stop().unwrap();
    }

    #[test]
    fn invalid_config_fails_init() {
        let mut server = Server::builder().build();
        let config = ServerConfig::default_with_overrides(|c| c.queue_depth = 0);
        assert!(matches!(
            server.init(config),
            Err(RouterError::ConfigError(_))
        ));
        assert_eq!(server.state(), LifecycleState::Uninitialized);
    }

    #[test]
    fn stop_is_terminal() {
        let mut server = Server::builder().build();
        server.init(ServerConfig::default()).unwrap();
        server.stop().unwrap();
        assert_eq!(server.state(), LifecycleState::Stopped);

        assert!(matches!(
            server.stop(),
            Err(RouterError::InvalidState { .. })
        ));
        assert!(matches!(
            server.start(),
            Err(RouterError::InvalidState { .. })
        ));
    }
}
