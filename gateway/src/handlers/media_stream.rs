//! Media-stream acceptor
//!
//! Every request that no other route claims lands here. Requests under the
//! configured media-stream prefix are upgraded to a WebSocket and bridged;
//! anything else is refused without a handshake.

use std::sync::Arc;

use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::{FromRequestParts, Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::bridge::{BridgeMode, BridgeSession, SESSION_EVENT_CAPACITY, open_ai_leg};
use crate::core::telephony;
use crate::state::AppState;

/// Maximum WebSocket frame size (1 MB)
const MAX_WS_FRAME_SIZE: usize = 1024 * 1024;

/// Maximum WebSocket message size (1 MB)
const MAX_WS_MESSAGE_SIZE: usize = 1024 * 1024;

/// Accept or refuse an inbound connection.
pub async fn media_stream_handler(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let path = request.uri().path().to_owned();

    if !matches_media_path(&path, &state.config.media_stream_path) {
        info!(path = %path, "Refusing connection outside the media stream path");
        return refuse();
    }

    let mode = select_mode(request.uri().query(), state.config.loopback_enabled);

    let (mut parts, _body) = request.into_parts();
    let ws = match WebSocketUpgrade::from_request_parts(&mut parts, &state).await {
        Ok(ws) => ws,
        Err(rejection) => {
            warn!(path = %path, "Media stream request is not a WebSocket upgrade: {}", rejection);
            return rejection.into_response();
        }
    };

    let call_id = Uuid::new_v4().to_string();
    info!(call_id = %call_id, path = %path, mode = %mode, "Accepting media stream");

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| run_call(socket, state, call_id, mode))
}

/// Whether a request path belongs to the media stream. Query strings are not
/// part of the path.
pub fn matches_media_path(path: &str, prefix: &str) -> bool {
    path.starts_with(prefix)
}

/// Pick the bridge mode from the query string.
pub fn select_mode(query: Option<&str>, loopback_enabled: bool) -> BridgeMode {
    let requested = query.and_then(|query| {
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "mode")
            .map(|(_, value)| value.into_owned())
    });

    match requested.as_deref() {
        Some("loopback") if loopback_enabled => BridgeMode::Loopback,
        Some("loopback") => {
            warn!("Loopback mode requested but disabled, relaying to the AI service");
            BridgeMode::Relay
        }
        Some(other) => {
            debug!(mode = %other, "Ignoring unknown bridge mode");
            BridgeMode::Relay
        }
        None => BridgeMode::Relay,
    }
}

fn refuse() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONNECTION, "close")],
        "Not Found",
    )
        .into_response()
}

/// Run one call from upgrade to teardown.
async fn run_call(socket: WebSocket, state: Arc<AppState>, call_id: String, mode: BridgeMode) {
    let (events_tx, events_rx) = mpsc::channel(SESSION_EVENT_CAPACITY);
    let telephony = telephony::attach(socket, events_tx.clone());

    let connect = match mode {
        BridgeMode::Relay => Some(open_ai_leg(
            state.connector.clone(),
            call_id.clone(),
            events_tx,
        )),
        BridgeMode::Loopback => {
            drop(events_tx);
            None
        }
    };

    let session = BridgeSession::new(call_id, state.settings.clone(), mode, telephony);
    let summary = session.run(events_rx).await;

    if let Some(connect) = connect {
        connect.abort();
    }
    debug!(call_id = %summary.call_id, "Media stream handler finished");
}
