//! # Connection Pipeline
//!
//! Wires one accepted connection into the fixed stage order
//! [decode → dispatch → encode/write], split across the I/O and business
//! pools.
//!
//! Stage layout per connection:
//! - **read stage** (I/O pool): drives the framed decoder and feeds packets
//!   into a bounded dispatch queue.
//! - **dispatch stage** (business pool): a single task consumes the queue and
//!   invokes the dispatcher. One task per connection is the serial lane that
//!   preserves per-connection packet order while distinct connections
//!   dispatch concurrently on the shared pool.
//! - **write stage** (I/O pool): drains the response queue into the framed
//!   encoder. The dispatch stage only enqueues responses; it never awaits the
//!   socket, and failed writes are logged, not retried.
//!
//! A full dispatch queue backpressures only this connection's read stage.
//! Tearing down is channel-driven: when the read stage ends, the dispatch
//! queue closes, the lane drains and drops the write queue, and the write
//! stage ends.

use crate::core::codec::PacketCodec;
use crate::core::packet::Packet;
use crate::protocol::dispatcher::Dispatcher;
use crate::utils::metrics::Metrics;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

/// Install the staged pipeline for one accepted connection
pub(crate) fn install(
    stream: TcpStream,
    peer: SocketAddr,
    io: &Handle,
    business: &Handle,
    dispatcher: Arc<Dispatcher>,
    metrics: Arc<Metrics>,
    queue_depth: usize,
) {
    let framed = Framed::new(stream, PacketCodec);
    let (sink, packets) = framed.split();

    let (dispatch_tx, dispatch_rx) = mpsc::channel::<Packet>(queue_depth);
    let (write_tx, write_rx) = mpsc::channel::<Packet>(queue_depth);

    metrics.connection_opened();

    io.spawn(read_stage(packets, dispatch_tx, peer, Arc::clone(&metrics)));
    business.spawn(dispatch_stage(dispatch_rx, write_tx, peer, dispatcher));
    io.spawn(write_stage(sink, write_rx, peer, metrics));
}

/// Decode inbound frames and feed the connection's serial dispatch lane
async fn read_stage(
    mut packets: SplitStream<Framed<TcpStream, PacketCodec>>,
    dispatch_tx: mpsc::Sender<Packet>,
    peer: SocketAddr,
    metrics: Arc<Metrics>,
) {
    while let Some(next) = packets.next().await {
        match next {
            Ok(packet) => {
                metrics.packet_received();
                debug!(peer = %peer, key = packet.key, "packet received");
                if dispatch_tx.send(packet).await.is_err() {
                    // Dispatch lane is gone; nothing left to feed
                    break;
                }
            }
            Err(e) => {
                warn!(peer = %peer, error = %e, "failed to decode packet, closing connection");
                break;
            }
        }
    }

    metrics.connection_closed();
    debug!(peer = %peer, "connection closed");
}

/// Serial lane: dispatch this connection's packets in arrival order
async fn dispatch_stage(
    mut dispatch_rx: mpsc::Receiver<Packet>,
    write_tx: mpsc::Sender<Packet>,
    peer: SocketAddr,
    dispatcher: Arc<Dispatcher>,
) {
    while let Some(packet) = dispatch_rx.recv().await {
        if let Some(response) = dispatcher.dispatch(packet, peer) {
            if write_tx.send(response).await.is_err() {
                debug!(peer = %peer, "write stage gone, dropping response");
                break;
            }
        }
    }
}

/// Encode and write responses; failures are logged, never retried
async fn write_stage(
    mut sink: SplitSink<Framed<TcpStream, PacketCodec>, Packet>,
    mut write_rx: mpsc::Receiver<Packet>,
    peer: SocketAddr,
    metrics: Arc<Metrics>,
) {
    while let Some(response) = write_rx.recv().await {
        match sink.send(response).await {
            Ok(()) => metrics.response_written(),
            Err(e) => {
                metrics.write_failed();
                warn!(peer = %peer, error = %e, "failed to write response");
                break;
            }
        }
    }
}
