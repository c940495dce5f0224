#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Wire-level routing tests against a real server on an ephemeral port.
//! The client is a plain blocking `TcpStream` framing with the public codec,
//! so these tests exercise the full pipeline: decode on the I/O pool,
//! dispatch on the business pool, response write-back.

use bytes::BytesMut;
use packet_router::{
    ComponentRegistry, Handler, Packet, PacketCodec, Result, RouterError, Server, ServerConfig,
};
use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;
use tokio_util::codec::{Decoder, Encoder};

const ECHO_KEY: u8 = 0x01;
const FAIL_KEY: u8 = 0x02;
const UPPER_KEY: u8 = 0x03;

struct Echo;

impl Handler for Echo {
    fn key(&self) -> u8 {
        ECHO_KEY
    }

    fn on_receive(&self, packet: Packet, _remote: SocketAddr) -> Result<Option<Packet>> {
        // Small pause so ordering bugs would actually reorder
        std::thread::sleep(Duration::from_millis(1));
        Ok(Some(packet.reply(packet.body.clone())))
    }
}

struct Failing;

impl Handler for Failing {
    fn key(&self) -> u8 {
        FAIL_KEY
    }

    fn on_receive(&self, _packet: Packet, _remote: SocketAddr) -> Result<Option<Packet>> {
        Err(RouterError::Handler("downstream unavailable".into()))
    }
}

struct Upper;

impl Handler for Upper {
    fn key(&self) -> u8 {
        UPPER_KEY
    }

    fn on_receive(&self, packet: Packet, _remote: SocketAddr) -> Result<Option<Packet>> {
        let upper = packet
            .body
            .iter()
            .map(u8::to_ascii_uppercase)
            .collect::<Vec<u8>>();
        Ok(Some(packet.reply(upper)))
    }
}

/// Route server logs through the test harness; honors `RUST_LOG`
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn start_server() -> Server {
    init_tracing();
    let mut server = Server::builder()
        .handler(|_: &ComponentRegistry| Ok(Box::new(Echo) as Box<dyn Handler>))
        .handler(|_: &ComponentRegistry| Ok(Box::new(Failing) as Box<dyn Handler>))
        .handler(|_: &ComponentRegistry| Ok(Box::new(Upper) as Box<dyn Handler>))
        .build();

    let config = ServerConfig::default_with_overrides(|c| {
        c.host = String::from("127.0.0.1");
        c.port = 0;
        c.shutdown_timeout = Duration::from_millis(500);
    });
    server.init(config).unwrap();
    server.start().unwrap();
    server
}

fn connect(server: &Server) -> TcpStream {
    let addr = server.local_addr().expect("server is running");
    TcpStream::connect(addr).expect("connect")
}

fn send(stream: &mut TcpStream, packet: Packet) {
    let mut buf = BytesMut::new();
    PacketCodec.encode(packet, &mut buf).unwrap();
    stream.write_all(&buf).unwrap();
}

/// Read one frame, or None if nothing arrives within `wait`
fn recv(stream: &mut TcpStream, buf: &mut BytesMut, wait: Duration) -> Option<Packet> {
    stream.set_read_timeout(Some(wait)).unwrap();
    let mut chunk = [0u8; 4096];
    loop {
        if let Some(packet) = PacketCodec.decode(buf).unwrap() {
            return Some(packet);
        }
        match stream.read(&mut chunk) {
            Ok(0) => return None,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                return None
            }
            Err(e) => panic!("read failed: {e}"),
        }
    }
}

#[test]
fn ping_round_trip() {
    let mut server = start_server();
    let mut stream = connect(&server);
    let mut rbuf = BytesMut::new();

    send(&mut stream, Packet::new(ECHO_KEY, "test", &b"ping"[..]));
    let response = recv(&mut stream, &mut rbuf, Duration::from_secs(2)).expect("echo response");
    assert_eq!(response.key, ECHO_KEY);
    assert_eq!(response.body.as_ref(), b"ping");

    server.stop().unwrap();
}

#[test]
fn distinct_keys_route_to_distinct_handlers() {
    let mut server = start_server();
    let mut stream = connect(&server);
    let mut rbuf = BytesMut::new();

    send(&mut stream, Packet::new(UPPER_KEY, "test", &b"shout"[..]));
    let response = recv(&mut stream, &mut rbuf, Duration::from_secs(2)).expect("upper response");
    assert_eq!(response.body.as_ref(), b"SHOUT");

    send(&mut stream, Packet::new(ECHO_KEY, "test", &b"shout"[..]));
    let response = recv(&mut stream, &mut rbuf, Duration::from_secs(2)).expect("echo response");
    assert_eq!(response.body.as_ref(), b"shout");

    server.stop().unwrap();
}

#[test]
fn unknown_key_writes_nothing_and_keeps_connection_open() {
    let mut server = start_server();
    let mut stream = connect(&server);
    let mut rbuf = BytesMut::new();

    send(&mut stream, Packet::new(0xFF, "test", &b"x"[..]));
    assert!(recv(&mut stream, &mut rbuf, Duration::from_millis(300)).is_none());

    // The same connection still routes valid keys
    send(&mut stream, Packet::new(ECHO_KEY, "test", &b"alive"[..]));
    let response = recv(&mut stream, &mut rbuf, Duration::from_secs(2)).expect("echo response");
    assert_eq!(response.body.as_ref(), b"alive");

    server.stop().unwrap();
}

#[test]
fn handler_error_leaves_connection_usable() {
    let mut server = start_server();
    let mut stream = connect(&server);
    let mut rbuf = BytesMut::new();

    send(&mut stream, Packet::new(FAIL_KEY, "test", &b"boom"[..]));
    assert!(recv(&mut stream, &mut rbuf, Duration::from_millis(300)).is_none());

    send(&mut stream, Packet::new(ECHO_KEY, "test", &b"next"[..]));
    let response = recv(&mut stream, &mut rbuf, Duration::from_secs(2)).expect("echo response");
    assert_eq!(response.body.as_ref(), b"next");

    server.stop().unwrap();
}

#[test]
fn per_connection_order_is_preserved() {
    let mut server = start_server();
    let mut stream = connect(&server);
    let mut rbuf = BytesMut::new();

    let count = 50u32;
    let mut outbound = BytesMut::new();
    for i in 0..count {
        let body = i.to_be_bytes().to_vec();
        PacketCodec
            .encode(Packet::new(ECHO_KEY, "seq", body), &mut outbound)
            .unwrap();
    }
    stream.write_all(&outbound).unwrap();

    for i in 0..count {
        let response = recv(&mut stream, &mut rbuf, Duration::from_secs(5)).expect("echo response");
        assert_eq!(response.body.as_ref(), i.to_be_bytes());
    }

    server.stop().unwrap();
}

#[test]
fn connections_are_isolated() {
    let mut server = start_server();
    let mut first = connect(&server);
    let mut second = connect(&server);
    let mut first_buf = BytesMut::new();
    let mut second_buf = BytesMut::new();

    // A failing packet on one connection must not disturb the other
    send(&mut first, Packet::new(FAIL_KEY, "test", &b"boom"[..]));
    send(&mut second, Packet::new(ECHO_KEY, "test", &b"two"[..]));

    let response = recv(&mut second, &mut second_buf, Duration::from_secs(2)).expect("echo response");
    assert_eq!(response.body.as_ref(), b"two");

    send(&mut first, Packet::new(ECHO_KEY, "test", &b"one"[..]));
    let response = recv(&mut first, &mut first_buf, Duration::from_secs(2)).expect("echo response");
    assert_eq!(response.body.as_ref(), b"one");

    server.stop().unwrap();
}
