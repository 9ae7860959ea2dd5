//! Leg handles and socket pumps
//!
//! A leg is one of the two WebSocket connections of a call. The session never
//! touches a socket directly: each socket is split into a reader task that
//! pushes inbound frames onto the session's event queue, and a writer task
//! that drains a bounded command queue. The session only holds a [`Leg`],
//! whose methods never wait.

use std::fmt;

use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use super::session::SessionEvent;

/// Capacity of each leg's outbound command queue.
pub const LEG_COMMAND_CAPACITY: usize = 256;

/// Which side of the call a leg connects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegKind {
    /// The caller's media stream
    Telephony,
    /// The realtime AI service
    Ai,
}

impl LegKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Telephony => "telephony",
            Self::Ai => "ai",
        }
    }
}

impl fmt::Display for LegKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Work item for a leg's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegCommand {
    /// Send a JSON text frame
    Text(String),
    /// Send a protocol-level ping
    Ping,
    /// Send a close frame and stop
    Close,
}

/// What a leg's reader or writer reports back to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegSignal {
    /// Text frame received
    Text(String),
    /// Peer closed the connection, with the close reason if any
    Closed(Option<String>),
    /// Transport fault
    Error(String),
}

/// Frame classification used by the reader pump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Text(String),
    Binary(usize),
    Close(Option<String>),
    Control,
}

/// Adapter over the WebSocket message type of a particular library.
pub trait WireFrame: Sized {
    fn text(body: String) -> Self;
    fn ping() -> Self;
    fn close() -> Self;
    fn into_inbound(self) -> Inbound;
}

// =============================================================================
// Leg Handle
// =============================================================================

/// Session-owned handle to one connection.
///
/// A leg is open while it still holds its command sender. Closing takes the
/// sender, so a second close finds nothing to do.
pub struct Leg {
    kind: LegKind,
    commands: Option<mpsc::Sender<LegCommand>>,
    reader: Option<AbortHandle>,
}

impl Leg {
    /// Wrap a command queue feeding a writer task.
    pub fn new(kind: LegKind, commands: mpsc::Sender<LegCommand>) -> Self {
        Self {
            kind,
            commands: Some(commands),
            reader: None,
        }
    }

    /// A leg that is not (yet) connected. Every send is dropped.
    pub fn detached(kind: LegKind) -> Self {
        Self {
            kind,
            commands: None,
            reader: None,
        }
    }

    /// Attach the reader task so closing the leg also stops it.
    pub fn with_reader(mut self, reader: AbortHandle) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn kind(&self) -> LegKind {
        self.kind
    }

    pub fn is_open(&self) -> bool {
        self.commands.is_some()
    }

    /// Queue a text frame. Returns false when the frame was dropped.
    pub fn send_text(&mut self, text: String) -> bool {
        self.try_command(LegCommand::Text(text))
    }

    /// Queue a keepalive ping. Returns false when it was dropped.
    pub fn ping(&mut self) -> bool {
        self.try_command(LegCommand::Ping)
    }

    /// Close the leg. Returns true only for the call that actually closed it.
    pub fn close(&mut self) -> bool {
        let Some(commands) = self.commands.take() else {
            return false;
        };

        if let Err(e) = commands.try_send(LegCommand::Close) {
            // The writer closes the sink once the queue is dropped anyway
            debug!(leg = %self.kind, "Close command not queued: {}", e);
        }
        self.stop_reader();
        true
    }

    /// Record that the peer already went away. No close frame is sent.
    pub fn mark_closed(&mut self) {
        self.commands = None;
        self.stop_reader();
    }

    fn stop_reader(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }

    fn try_command(&mut self, command: LegCommand) -> bool {
        let Some(commands) = self.commands.as_ref() else {
            return false;
        };

        match commands.try_send(command) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(leg = %self.kind, "Outbound queue full, dropping frame");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(leg = %self.kind, "Writer task gone, leg is closed");
                self.commands = None;
                false
            }
        }
    }
}

impl Drop for Leg {
    fn drop(&mut self) {
        self.stop_reader();
    }
}

impl fmt::Debug for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Leg")
            .field("kind", &self.kind)
            .field("open", &self.is_open())
            .finish()
    }
}

// =============================================================================
// Socket Pumps
// =============================================================================

/// Split a WebSocket into reader and writer tasks and return its handle.
pub fn spawn_leg<S, M, E>(kind: LegKind, socket: S, events: mpsc::Sender<SessionEvent>) -> Leg
where
    S: Stream<Item = Result<M, E>> + Sink<M, Error = E> + Unpin + Send + 'static,
    M: WireFrame + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let (sink, stream) = socket.split();
    let (tx, rx) = mpsc::channel(LEG_COMMAND_CAPACITY);

    tokio::spawn(write_pump(kind, sink, rx, events.clone()));
    let reader = tokio::spawn(read_pump(kind, stream, events));

    Leg::new(kind, tx).with_reader(reader.abort_handle())
}

async fn write_pump<K, M, E>(
    kind: LegKind,
    mut sink: K,
    mut commands: mpsc::Receiver<LegCommand>,
    events: mpsc::Sender<SessionEvent>,
) where
    K: Sink<M, Error = E> + Unpin,
    M: WireFrame,
    E: fmt::Display,
{
    while let Some(command) = commands.recv().await {
        let closing = matches!(command, LegCommand::Close);

        let frame = match command {
            LegCommand::Text(text) => M::text(text),
            LegCommand::Ping => M::ping(),
            LegCommand::Close => M::close(),
        };

        if let Err(e) = sink.send(frame).await {
            if !closing {
                warn!(leg = %kind, "Failed to send WebSocket message: {}", e);
                let signal = SessionEvent::Leg(kind, LegSignal::Error(e.to_string()));
                if events.send(signal).await.is_err() {
                    debug!(leg = %kind, "Session gone before the send failure was reported");
                }
            }
            return;
        }

        if closing {
            break;
        }
    }

    let _ = sink.close().await;
    debug!(leg = %kind, "Writer task ended");
}

async fn read_pump<St, M, E>(kind: LegKind, mut stream: St, events: mpsc::Sender<SessionEvent>)
where
    St: Stream<Item = Result<M, E>> + Unpin,
    M: WireFrame,
    E: fmt::Display,
{
    let last = loop {
        match stream.next().await {
            Some(Ok(frame)) => match frame.into_inbound() {
                Inbound::Text(text) => {
                    if events
                        .send(SessionEvent::Leg(kind, LegSignal::Text(text)))
                        .await
                        .is_err()
                    {
                        // Session is gone
                        return;
                    }
                }
                Inbound::Binary(len) => {
                    debug!(leg = %kind, "Ignoring binary frame: {} bytes", len);
                }
                Inbound::Close(reason) => break LegSignal::Closed(reason),
                Inbound::Control => {}
            },
            Some(Err(e)) => break LegSignal::Error(e.to_string()),
            None => break LegSignal::Closed(None),
        }
    };

    let _ = events.send(SessionEvent::Leg(kind, last)).await;
    debug!(leg = %kind, "Reader task ended");
}
