//! AI leg connector.
//!
//! Opens the realtime WebSocket for one call and turns it into a bridge
//! [`Leg`]. The session only sees the [`AiConnector`] trait so tests can
//! hand it prepared legs.

use async_trait::async_trait;
use http::HeaderValue;
use http::header::AUTHORIZATION;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tracing::{debug, info};
use url::Url;

use super::config::{AGENT_ID_HEADER, RealtimeLegConfig};
use crate::bridge::{Inbound, Leg, LegKind, SessionEvent, WireFrame, spawn_leg};
use crate::errors::{BridgeError, BridgeResult};

/// Opens the AI leg of a call.
#[async_trait]
pub trait AiConnector: Send + Sync {
    /// Connect and start pumping frames into `events`.
    async fn connect(&self, call_id: &str, events: mpsc::Sender<SessionEvent>)
    -> BridgeResult<Leg>;
}

impl WireFrame for Message {
    fn text(body: String) -> Self {
        Message::Text(body.into())
    }

    fn ping() -> Self {
        Message::Ping(Default::default())
    }

    fn close() -> Self {
        Message::Close(None)
    }

    fn into_inbound(self) -> Inbound {
        match self {
            Message::Text(text) => Inbound::Text(text.as_str().to_owned()),
            Message::Binary(data) => Inbound::Binary(data.len()),
            Message::Close(frame) => Inbound::Close(frame.map(|f| f.reason.as_str().to_owned())),
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Inbound::Control,
        }
    }
}

/// Connector for the OpenAI Realtime API.
#[derive(Debug, Clone)]
pub struct OpenAIRealtimeConnector {
    config: RealtimeLegConfig,
}

impl OpenAIRealtimeConnector {
    pub fn new(config: RealtimeLegConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RealtimeLegConfig {
        &self.config
    }

    /// Endpoint with the model query parameter.
    pub fn endpoint(&self) -> BridgeResult<Url> {
        let mut url = Url::parse(&self.config.url).map_err(|e| connect_error(e.to_string()))?;
        url.query_pairs_mut().append_pair("model", &self.config.model);
        Ok(url)
    }

    /// Handshake request with credentials and beta headers.
    pub fn build_request(&self) -> BridgeResult<Request> {
        let url = self.endpoint()?;
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| connect_error(e.to_string()))?;

        let headers = request.headers_mut();
        headers.insert(
            AUTHORIZATION,
            header_value(&format!("Bearer {}", self.config.api_key))?,
        );
        headers.insert("OpenAI-Beta", HeaderValue::from_static("realtime=v1"));
        if let Some(agent_id) = self.config.agent_id.as_deref() {
            headers.insert(AGENT_ID_HEADER, header_value(agent_id)?);
        }

        Ok(request)
    }
}

#[async_trait]
impl AiConnector for OpenAIRealtimeConnector {
    async fn connect(
        &self,
        call_id: &str,
        events: mpsc::Sender<SessionEvent>,
    ) -> BridgeResult<Leg> {
        let request = self.build_request()?;
        debug!(call_id = %call_id, model = %self.config.model, "Connecting AI leg");

        let handshake = tokio_tungstenite::connect_async(request);
        let (socket, _response) = tokio::time::timeout(self.config.connect_timeout, handshake)
            .await
            .map_err(|_| {
                connect_error(format!(
                    "handshake timed out after {:?}",
                    self.config.connect_timeout
                ))
            })?
            .map_err(|e| connect_error(e.to_string()))?;

        info!(call_id = %call_id, "Connected to realtime AI service");
        Ok(spawn_leg(LegKind::Ai, socket, events))
    }
}

fn header_value(value: &str) -> BridgeResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| connect_error(format!("invalid header value: {e}")))
}

fn connect_error(reason: String) -> BridgeError {
    BridgeError::ConnectFailed {
        leg: LegKind::Ai,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::realtime::config::{DEFAULT_REALTIME_MODEL, OPENAI_REALTIME_URL};
    use std::time::Duration;

    fn connector(agent_id: Option<&str>) -> OpenAIRealtimeConnector {
        OpenAIRealtimeConnector::new(RealtimeLegConfig {
            api_key: "sk-test".to_string(),
            url: OPENAI_REALTIME_URL.to_string(),
            model: DEFAULT_REALTIME_MODEL.to_string(),
            agent_id: agent_id.map(str::to_string),
            connect_timeout: Duration::from_secs(1),
        })
    }

    #[test]
    fn test_endpoint_carries_model() {
        let url = connector(None).endpoint().unwrap();
        assert_eq!(
            url.as_str(),
            "wss://api.openai.com/v1/realtime?model=gpt-4o-realtime-preview"
        );
    }

    #[test]
    fn test_request_headers() {
        let request = connector(Some("agent-42")).build_request().unwrap();
        let headers = request.headers();

        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer sk-test");
        assert_eq!(headers.get("OpenAI-Beta").unwrap(), "realtime=v1");
        assert_eq!(headers.get(AGENT_ID_HEADER).unwrap(), "agent-42");
        assert!(headers.contains_key("sec-websocket-key"));
    }

    #[test]
    fn test_no_agent_header_without_agent() {
        let request = connector(None).build_request().unwrap();
        assert!(!request.headers().contains_key(AGENT_ID_HEADER));
    }

    #[test]
    fn test_invalid_url_is_connect_error() {
        let mut config = connector(None).config().clone();
        config.url = "not a url".to_string();
        let err = OpenAIRealtimeConnector::new(config).build_request().unwrap_err();
        assert!(matches!(err, BridgeError::ConnectFailed { leg: LegKind::Ai, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_service_fails_fast() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut config = connector(None).config().clone();
        config.url = format!("ws://127.0.0.1:{port}/v1/realtime");
        let (events, _rx) = mpsc::channel(1);

        let result = OpenAIRealtimeConnector::new(config)
            .connect("call-1", events)
            .await;
        assert!(matches!(result, Err(BridgeError::ConnectFailed { .. })));
    }
}
