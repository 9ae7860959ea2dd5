use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::{info, warn};

use crate::state::AppState;

/// Health check handler
pub async fn health_check() -> &'static str {
    "ok"
}

/// Inbound-call webhook.
///
/// Answers the telephony platform with markup that connects the call's media
/// stream to this server.
pub async fn voice_webhook(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let host = state.config.public_host.clone().or_else(|| {
        headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    });

    let Some(host) = host else {
        warn!("Voice webhook without Host header and no public host configured");
        return (StatusCode::BAD_REQUEST, "missing Host header").into_response();
    };

    info!(host = %host, path = %state.config.media_stream_path, "Answering inbound call");
    (
        [(header::CONTENT_TYPE, "text/xml")],
        connect_stream_markup(&host, &state.config.media_stream_path),
    )
        .into_response()
}

/// Markup that tells the platform to stream call audio to `wss://{host}{path}`.
pub fn connect_stream_markup(host: &str, path: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><Response><Connect><Stream url="wss://{}{}"/></Connect></Response>"#,
        xml_escape(host),
        xml_escape(path)
    )
}

fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}
