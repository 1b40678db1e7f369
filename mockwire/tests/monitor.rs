//! Socket Monitor Integration Tests
//!
//! Lifecycle transitions observed through the monitor channel, both
//! synchronously and from an async consumer.

use mockwire::ws::prelude::*;
use mockwire::ws::{Address, SocketEvent};

fn addr(url: &str) -> Address {
    Address::parse(url).unwrap()
}

/// Await the full lifecycle of an accepted connection
#[tokio::test]
async fn test_monitor_async_lifecycle() {
    mockwire::dev_tracing::init_tracing();

    let network = Network::new();
    let options = ServerOptions::new().with_protocol_selector(|_| "chat".to_string());
    let _server = Server::bind_with_options(&network, "ws://monitored", options).unwrap();
    let socket = WebSocket::connect(&network, "ws://monitored", ["chat"]).unwrap();
    let monitor = socket.monitor();

    network.run_until_idle();
    assert_eq!(
        monitor.recv_async().await.unwrap(),
        SocketEvent::Connecting(addr("ws://monitored"))
    );
    assert_eq!(
        monitor.recv_async().await.unwrap(),
        SocketEvent::Connected {
            address: addr("ws://monitored"),
            protocol: "chat".to_string(),
        }
    );

    socket.send("hello").unwrap();
    socket.close_with(Some(NORMAL_CLOSE), Some("done")).unwrap();
    assert_eq!(
        monitor.recv_async().await.unwrap(),
        SocketEvent::Closing(addr("ws://monitored"))
    );

    network.run_until_idle();
    assert_eq!(
        monitor.recv_async().await.unwrap(),
        SocketEvent::MessageSent {
            address: addr("ws://monitored"),
            len: 5,
        }
    );
    assert_eq!(
        monitor.recv_async().await.unwrap(),
        SocketEvent::Closed {
            address: addr("ws://monitored"),
            code: NORMAL_CLOSE,
            reason: "done".to_string(),
            was_clean: true,
        }
    );
    assert!(monitor.is_empty());
}

/// A refused handshake reports the failure and an unclean close
#[test]
fn test_monitor_connect_failed() {
    let network = Network::new();
    let socket = WebSocket::connect(&network, "ws://nobody-home", Vec::<String>::new()).unwrap();
    let monitor = socket.monitor();

    network.run_until_idle();
    let events: Vec<SocketEvent> = monitor.try_iter().collect();
    for event in &events {
        mockwire::tracing::debug!(%event, "monitor");
    }

    assert_eq!(events.len(), 3);
    assert_eq!(events[0], SocketEvent::Connecting(addr("ws://nobody-home")));
    assert!(matches!(&events[1], SocketEvent::ConnectFailed { reason, .. } if !reason.is_empty()));
    assert!(matches!(
        &events[2],
        SocketEvent::Closed { code, was_clean: false, .. } if *code == NORMAL_CLOSE
    ));
}

/// Monitors only see transitions after they subscribe; dropped monitors
/// are pruned without affecting the others
#[test]
fn test_monitor_subscription() {
    let network = Network::new();
    let _server = Server::bind(&network, "ws://late").unwrap();
    let socket = WebSocket::connect(&network, "ws://late", Vec::<String>::new()).unwrap();

    let dropped = socket.monitor();
    drop(dropped);
    network.run_until_idle();

    let late = socket.monitor();
    assert!(late.is_empty());

    socket.close().unwrap();
    network.run_until_idle();
    let events: Vec<SocketEvent> = late.try_iter().collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].to_string(), "Closing ws://late/");
    assert!(matches!(events[1], SocketEvent::Closed { was_clean: true, .. }));
}
