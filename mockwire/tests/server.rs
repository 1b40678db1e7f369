//! Server-Side Integration Tests
//!
//! Exercises the peer half of the simulation: connection notifications,
//! server-to-client delivery, server-initiated closes and forced failures.

use mockwire::ws::prelude::*;
use mockwire::ws::{close, Error};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn connect_open(network: &Network, url: &str) -> WebSocket {
    let socket = WebSocket::connect(network, url, Vec::<String>::new()).unwrap();
    network.run_until_idle();
    assert_eq!(socket.ready_state(), ReadyState::Open);
    socket
}

fn texts(socket: &WebSocket) -> Arc<Mutex<Vec<String>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let l = log.clone();
    socket.add_event_listener(EventKind::Message, move |event| {
        if let Event::Message(message) = event {
            l.lock().push(message.data.as_text().unwrap_or_default().to_string());
        }
    });
    log
}

/// Echo server round trip
#[test]
fn test_echo() {
    mockwire::dev_tracing::init_tracing_for_mockwire();

    let network = Network::new();
    let server = Server::bind(&network, "ws://echo").unwrap();
    let echo = server.clone();
    server.on_message(move |socket, message| echo.send_to(socket, message.data.clone()));

    let socket = connect_open(&network, "ws://echo");
    let received = texts(&socket);
    let origins = Arc::new(Mutex::new(Vec::new()));
    let o = origins.clone();
    socket.add_event_listener(EventKind::Message, move |event| {
        if let Event::Message(message) = event {
            o.lock().push(message.origin.clone());
        }
    });

    socket.send("ping").unwrap();
    network.run_until_idle();

    assert_eq!(*received.lock(), vec!["ping"]);
    assert_eq!(*origins.lock(), vec![server.address().clone()]);
}

/// Broadcast reaches every open client, not the ones still connecting
#[test]
fn test_emit_targets_open_clients() {
    let network = Network::new();
    let server = Server::bind(&network, "ws://broadcast").unwrap();

    let a = connect_open(&network, "ws://broadcast");
    let b = connect_open(&network, "ws://broadcast");
    let pending = WebSocket::connect(&network, "ws://broadcast", Vec::<String>::new()).unwrap();
    let (ra, rb, rp) = (texts(&a), texts(&b), texts(&pending));

    assert_eq!(server.clients().len(), 3);
    assert_eq!(server.emit("news"), 2);
    network.run_until_idle();

    assert_eq!(*ra.lock(), vec!["news"]);
    assert_eq!(*rb.lock(), vec!["news"]);
    assert!(rp.lock().is_empty());
}

/// Messages for a client that closed before delivery are dropped
#[test]
fn test_send_to_closed_client_dropped() {
    let network = Network::new();
    let server = Server::bind(&network, "ws://dropped").unwrap();
    let socket = connect_open(&network, "ws://dropped");
    let received = texts(&socket);

    socket.close().unwrap();
    network.run_until_idle();
    server.send_to(&socket, "too late");
    network.run_until_idle();

    assert!(received.lock().is_empty());
}

/// Server-initiated close reaches both sides with the server's code
#[test]
fn test_server_closes_client() {
    let network = Network::new();
    let server = Server::bind(&network, "ws://kick").unwrap();
    let server_closes = Arc::new(Mutex::new(Vec::new()));
    let sc = server_closes.clone();
    server.on_close(move |socket, event| sc.lock().push((socket.id(), event.code)));

    let socket = connect_open(&network, "ws://kick");
    let client_closes = Arc::new(Mutex::new(Vec::new()));
    let cc = client_closes.clone();
    socket.add_event_listener(EventKind::Close, move |event| cc.lock().push(event.clone()));

    server.close_client(&socket, close::GOING_AWAY, "maintenance");
    assert_eq!(socket.ready_state(), ReadyState::Closing);
    network.run_until_idle();

    assert_eq!(socket.ready_state(), ReadyState::Closed);
    assert_eq!(
        *client_closes.lock(),
        vec![Event::Close(CloseEvent::new(close::GOING_AWAY, "maintenance", true))]
    );
    assert_eq!(*server_closes.lock(), vec![(socket.id(), close::GOING_AWAY)]);
}

/// Concurrent close from both sides: the first frame processed wins
#[test]
fn test_concurrent_close_first_frame_wins() {
    let network = Network::new();
    let server = Server::bind(&network, "ws://race").unwrap();
    let server_closes = Arc::new(Mutex::new(0usize));
    let sc = server_closes.clone();
    server.on_close(move |_, _| *sc.lock() += 1);

    let socket = connect_open(&network, "ws://race");
    let closes = Arc::new(Mutex::new(Vec::new()));
    let c = closes.clone();
    socket.add_event_listener(EventKind::Close, move |event| {
        if let Event::Close(close) = event {
            c.lock().push(close.clone());
        }
    });

    socket.close_with(Some(4001), Some("client")).unwrap();
    server.close_client(&socket, close::GOING_AWAY, "server");
    network.run_until_idle();

    assert_eq!(*closes.lock(), vec![CloseEvent::new(4001, "client", true)]);
    assert_eq!(*server_closes.lock(), 1);
}

/// Server-initiated close first, client close afterwards is a no-op
#[test]
fn test_concurrent_close_server_first() {
    let network = Network::new();
    let server = Server::bind(&network, "ws://race-server").unwrap();
    let socket = connect_open(&network, "ws://race-server");
    let closes = Arc::new(Mutex::new(Vec::new()));
    let c = closes.clone();
    socket.add_event_listener(EventKind::Close, move |event| c.lock().push(event.clone()));

    server.close_client(&socket, close::NORMAL_CLOSE, "server");
    socket.close_with(Some(4001), Some("client")).unwrap();
    network.run_until_idle();

    assert_eq!(
        *closes.lock(),
        vec![Event::Close(CloseEvent::new(close::NORMAL_CLOSE, "server", true))]
    );
}

/// Closing a client still negotiating refuses the handshake
#[test]
fn test_server_close_while_connecting() {
    let network = Network::new();
    let server = Server::bind(&network, "ws://refuse").unwrap();
    let socket = WebSocket::connect(&network, "ws://refuse", Vec::<String>::new()).unwrap();
    let kinds = Arc::new(Mutex::new(Vec::new()));
    for kind in [EventKind::Open, EventKind::Error, EventKind::Close] {
        let k = kinds.clone();
        socket.add_event_listener(kind, move |event| k.lock().push(event.kind()));
    }

    server.close_client(&socket, close::GOING_AWAY, "");
    network.run_until_idle();

    assert_eq!(socket.ready_state(), ReadyState::Closed);
    assert_eq!(*kinds.lock(), vec![EventKind::Error, EventKind::Close]);
}

/// simulate_error fails every client with error then an unclean close
#[test]
fn test_simulate_error() {
    let network = Network::new();
    let server = Server::bind(&network, "ws://faulty").unwrap();
    let server_errors = Arc::new(Mutex::new(0usize));
    let se = server_errors.clone();
    server.on_error(move |_| *se.lock() += 1);

    let a = connect_open(&network, "ws://faulty");
    let b = connect_open(&network, "ws://faulty");
    let events = Arc::new(Mutex::new(Vec::new()));
    for socket in [&a, &b] {
        for kind in [EventKind::Error, EventKind::Close] {
            let e = events.clone();
            let id = socket.id();
            socket.add_event_listener(kind, move |event| e.lock().push((id, event.clone())));
        }
    }

    server.simulate_error();
    assert_eq!(a.ready_state(), ReadyState::Closed);
    assert!(server.clients().is_empty());
    network.run_until_idle();

    let events = events.lock();
    assert_eq!(events.len(), 4);
    for (id, chunk) in [(a.id(), &events[0..2]), (b.id(), &events[2..4])] {
        assert_eq!(chunk[0].0, id);
        assert!(matches!(chunk[0].1, Event::Error(_)));
        assert_eq!(
            chunk[1].1,
            Event::Close(CloseEvent::new(close::ABNORMAL_CLOSE, "", false))
        );
    }
    assert_eq!(*server_errors.lock(), 2);
}

/// stop closes every client and frees the address
#[test]
fn test_stop() {
    let network = Network::new();
    let server = Server::bind(&network, "ws://shutdown").unwrap();
    let a = connect_open(&network, "ws://shutdown");
    let b = connect_open(&network, "ws://shutdown");

    server.stop_with(close::GOING_AWAY, "bye");
    assert!(network.lookup(a.url()).is_none());
    network.run_until_idle();

    assert_eq!(a.ready_state(), ReadyState::Closed);
    assert_eq!(b.ready_state(), ReadyState::Closed);

    let replacement = Server::bind(&network, "ws://shutdown").unwrap();
    let c = connect_open(&network, "ws://shutdown");
    assert_eq!(replacement.clients(), vec![c]);
}

/// A server is found regardless of trailing slash normalization
#[test]
fn test_address_normalization() {
    let network = Network::new();
    let server = Server::bind(&network, "ws://localhost:8080").unwrap();
    let socket = connect_open(&network, "ws://localhost:8080/");
    assert_eq!(server.clients(), vec![socket]);
    assert_eq!(network.addresses(), vec![server.address().clone()]);
}

/// Binding twice on one network is refused; separate networks are isolated
#[test]
fn test_bind_isolation() {
    let first = Network::new();
    let second = Network::new();

    let _a = Server::bind(&first, "ws://shared-name").unwrap();
    assert!(matches!(
        Server::bind(&first, "ws://shared-name"),
        Err(Error::AddressInUse(_))
    ));
    assert!(Server::bind(&second, "ws://shared-name").is_ok());
}

/// Counts how many times it has been dropped.
struct DropCounter(Arc<AtomicUsize>);

impl DropCounter {
    fn touch(&self) {}
}

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Dropping every handle frees the network, its servers and their listeners
#[test]
fn test_dropping_network_frees_listeners() {
    let dropped = Arc::new(AtomicUsize::new(0));

    let network = Network::new();
    let server = Server::bind(&network, "ws://freed").unwrap();
    let counter = DropCounter(dropped.clone());
    server.on_connection(move |_| counter.touch());
    let socket = connect_open(&network, "ws://freed");

    drop(server);
    drop(socket);
    assert_eq!(dropped.load(Ordering::SeqCst), 0);

    drop(network);
    assert_eq!(dropped.load(Ordering::SeqCst), 1);
}

/// Endpoints outliving their network stay inert instead of panicking
#[test]
fn test_socket_outlives_network() {
    let network = Network::new();
    let _server = Server::bind(&network, "ws://orphan").unwrap();
    let socket = connect_open(&network, "ws://orphan");
    assert!(socket.network().is_some());

    drop(network);
    assert!(socket.network().is_none());
    assert!(socket.send("nobody listens").is_ok());
    assert!(socket.close().is_ok());
    assert_eq!(socket.ready_state(), ReadyState::Closing);
}

/// Removing all listeners of one kind leaves the other kinds alone
#[test]
fn test_remove_event_listeners() {
    let network = Network::new();
    let server = Server::bind(&network, "ws://quiet").unwrap();
    let hits = Arc::new(Mutex::new(Vec::new()));
    let (c1, c2, m) = (hits.clone(), hits.clone(), hits.clone());
    server.on_connection(move |_| c1.lock().push("connection 1"));
    server.on_connection(move |_| c2.lock().push("connection 2"));
    server.on_message(move |_, _| m.lock().push("message"));

    assert_eq!(server.remove_event_listeners(ServerEventKind::Connection), 2);
    assert_eq!(server.remove_event_listeners(ServerEventKind::Connection), 0);

    let socket = connect_open(&network, "ws://quiet");
    socket.send("still heard").unwrap();
    network.run_until_idle();

    assert_eq!(*hits.lock(), vec!["message"]);
}
