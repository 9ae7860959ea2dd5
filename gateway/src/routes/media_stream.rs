//! Media-stream WebSocket route configuration

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::media_stream_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the media-stream router
///
/// The acceptor is installed as the fallback so it sees every request no
/// other route claims. It upgrades paths under the configured prefix and
/// refuses the rest with `404` and `Connection: close`.
///
/// # Protocol
///
/// The telephony platform sends JSON text frames tagged by `event`
/// (`connected`, `start`, `media`, `stop`, ...). The bridge answers with
/// `media` frames carrying the assistant's audio.
pub fn create_media_stream_router() -> Router<Arc<AppState>> {
    Router::new()
        .fallback(media_stream_handler)
        .layer(TraceLayer::new_for_http())
}
