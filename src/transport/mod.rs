//! # Transport
//!
//! Connection acceptance and the per-connection staged pipeline.
//!
//! The accept loop runs on the acceptor pool and reacts to a shutdown signal
//! so `stop()` can stop new work before draining in-flight connections. Each
//! accepted connection is handed to [`pipeline::install`], which wires the
//! fixed stage order: decode on the I/O pool, dispatch on the business pool,
//! encode/write back on the I/O pool.

pub(crate) mod pipeline;

use crate::protocol::dispatcher::Dispatcher;
use crate::utils::metrics::Metrics;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Accept connections until the shutdown signal arrives
pub(crate) async fn accept_loop(
    listener: TcpListener,
    mut shutdown_rx: mpsc::Receiver<()>,
    io: Handle,
    business: Handle,
    dispatcher: Arc<Dispatcher>,
    metrics: Arc<Metrics>,
    queue_depth: usize,
) {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!("accept loop stopping, no new connections");
                return;
            }

            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        debug!(peer = %peer, "connection accepted");
                        pipeline::install(
                            stream,
                            peer,
                            &io,
                            &business,
                            Arc::clone(&dispatcher),
                            Arc::clone(&metrics),
                            queue_depth,
                        );
                    }
                    Err(e) => {
                        error!(error = %e, "failed to accept connection");
                    }
                }
            }
        }
    }
}
