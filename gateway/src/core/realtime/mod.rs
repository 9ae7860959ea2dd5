//! Realtime AI leg.
//!
//! The bridge speaks a small subset of the OpenAI Realtime protocol over a
//! WebSocket:
//!
//! - `config`: endpoint defaults, the shared audio format and AI leg parameters
//! - `messages`: client and server event types
//! - `connector`: handshake and the [`AiConnector`] seam used by sessions
//!
//! # Audio Format
//!
//! Both legs use the same encoding (G.711 u-law at 8kHz by default), so audio
//! is passed through as base64 without transcoding.

pub mod config;
pub mod connector;
pub mod messages;

pub use config::{
    AGENT_ID_HEADER, AudioFormat, DEFAULT_REALTIME_MODEL, OPENAI_REALTIME_URL, RealtimeLegConfig,
};
pub use connector::{AiConnector, OpenAIRealtimeConnector};
pub use messages::{
    ClientEvent, ErrorDetail, ResponseInfo, ServerEvent, SessionConfig, SessionInfo,
};
