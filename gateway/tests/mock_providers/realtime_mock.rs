//! WebSocket mock of the realtime AI service
//!
//! Each accepted connection is handed to the test as a [`MockConnection`]
//! that records the handshake, yields every frame the bridge sends and lets
//! the test push server events or close the socket.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::HeaderMap;

const WAIT: Duration = Duration::from_secs(5);

/// What the mock saw from the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum Received {
    Event(Value),
    Ping,
    Close,
}

enum Command {
    Send(Value),
    Close,
}

/// Listening mock server.
pub struct RealtimeMockServer {
    pub addr: SocketAddr,
    connections: mpsc::UnboundedReceiver<MockConnection>,
}

impl RealtimeMockServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, connections) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let tx = tx.clone();
                tokio::spawn(async move {
                    if let Some(connection) = handle_connection(stream).await {
                        let _ = tx.send(connection);
                    }
                });
            }
        });

        Self { addr, connections }
    }

    /// Realtime URL to configure on the bridge.
    pub fn url(&self) -> String {
        format!("ws://{}/v1/realtime", self.addr)
    }

    /// Wait for the next bridge connection.
    pub async fn accept(&mut self) -> MockConnection {
        timeout(WAIT, self.connections.recv())
            .await
            .expect("no connection to the realtime mock")
            .expect("mock listener stopped")
    }

    /// Assert that nobody connects within `within`.
    pub async fn expect_no_connection(&mut self, within: Duration) {
        assert!(
            timeout(within, self.connections.recv()).await.is_err(),
            "unexpected connection to the realtime mock"
        );
    }
}

/// One bridge connection to the mock.
pub struct MockConnection {
    pub uri: String,
    pub headers: HeaderMap,
    received: mpsc::UnboundedReceiver<Received>,
    commands: mpsc::UnboundedSender<Command>,
}

impl MockConnection {
    /// Next frame from the bridge, pings included.
    pub async fn next(&mut self) -> Option<Received> {
        timeout(WAIT, self.received.recv())
            .await
            .expect("timed out waiting for the bridge")
    }

    /// Next JSON event, skipping pings. Panics on close.
    pub async fn next_event(&mut self) -> Value {
        loop {
            match self.next().await {
                Some(Received::Event(value)) => return value,
                Some(Received::Ping) => continue,
                other => panic!("expected an event, got {other:?}"),
            }
        }
    }

    /// Next event, asserting its type.
    pub async fn expect_event(&mut self, event_type: &str) -> Value {
        let event = self.next_event().await;
        assert_eq!(event["type"], event_type, "unexpected event {event}");
        event
    }

    /// Wait until the bridge closes the socket.
    pub async fn expect_close(&mut self) {
        loop {
            match self.next().await {
                Some(Received::Close) | None => return,
                Some(Received::Ping) => continue,
                Some(Received::Event(value)) => panic!("expected close, got {value}"),
            }
        }
    }

    /// Assert the bridge sends nothing within `within`.
    pub async fn expect_silence(&mut self, within: Duration) {
        if let Ok(Some(frame)) = timeout(within, self.received.recv()).await {
            panic!("expected silence, got {frame:?}");
        }
    }

    pub fn send(&self, event: Value) {
        let _ = self.commands.send(Command::Send(event));
    }

    pub fn close(&self) {
        let _ = self.commands.send(Command::Close);
    }
}

async fn handle_connection(stream: TcpStream) -> Option<MockConnection> {
    let handshake: Arc<Mutex<Option<(String, HeaderMap)>>> = Arc::new(Mutex::new(None));
    let captured = handshake.clone();

    let callback = move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        *captured.lock().unwrap() = Some((request.uri().to_string(), request.headers().clone()));
        Ok(response)
    };
    let socket = accept_hdr_async(stream, callback)
    .await
    .ok()?;

    let (uri, headers) = handshake.lock().unwrap().take()?;
    let (received_tx, received) = mpsc::unbounded_channel();
    let (commands, mut command_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (mut write, mut read) = socket.split();
        loop {
            tokio::select! {
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        let value = serde_json::from_str(text.as_str()).unwrap_or(Value::Null);
                        let _ = received_tx.send(Received::Event(value));
                    }
                    Some(Ok(Message::Ping(_))) => {
                        let _ = received_tx.send(Received::Ping);
                    }
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => {
                        let _ = received_tx.send(Received::Close);
                        break;
                    }
                    Some(Ok(_)) => {}
                },
                command = command_rx.recv() => match command {
                    Some(Command::Send(value)) => {
                        if write.send(Message::Text(value.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                    Some(Command::Close) | None => {
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                },
            }
        }
    });

    Some(MockConnection {
        uri,
        headers,
        received,
        commands,
    })
}
