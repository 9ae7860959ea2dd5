//! Telephony leg over an axum WebSocket.

use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::bridge::{Inbound, Leg, LegKind, SessionEvent, WireFrame, spawn_leg};

impl WireFrame for Message {
    fn text(body: String) -> Self {
        Message::Text(body.into())
    }

    fn ping() -> Self {
        Message::Ping(Bytes::new())
    }

    fn close() -> Self {
        Message::Close(None)
    }

    fn into_inbound(self) -> Inbound {
        match self {
            Message::Text(text) => Inbound::Text(text.as_str().to_owned()),
            Message::Binary(data) => Inbound::Binary(data.len()),
            Message::Close(frame) => Inbound::Close(frame.map(|f| f.reason.as_str().to_owned())),
            Message::Ping(_) | Message::Pong(_) => Inbound::Control,
        }
    }
}

/// Start pumping an upgraded telephony socket into the session queue.
pub fn attach(socket: WebSocket, events: mpsc::Sender<SessionEvent>) -> Leg {
    spawn_leg(LegKind::Telephony, socket, events)
}
