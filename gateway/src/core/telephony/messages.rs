//! Telephony media-stream message types.
//!
//! The caller's platform speaks JSON text frames tagged by `event`:
//!
//! Inbound (platform → bridge):
//! - connected - Socket handshake acknowledged
//! - start - Stream metadata, carries the `streamSid`
//! - media - One base64 audio chunk
//! - mark / dtmf - Playback markers and keypad digits
//! - stop - Stream ended
//!
//! Outbound (bridge → platform):
//! - media - Audio for the caller, addressed by `streamSid`

use serde::{Deserialize, Serialize};

// =============================================================================
// Inbound Events
// =============================================================================

/// Stream metadata carried by the `start` event. Other fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StartMetadata {
    pub stream_sid: Option<String>,
    pub call_sid: Option<String>,
    pub media_format: Option<MediaFormat>,
}

/// Audio encoding announced by the platform.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MediaFormat {
    pub encoding: String,
    pub sample_rate: u32,
}

/// One inbound audio chunk.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaChunk {
    /// Base64 audio in the negotiated format
    pub payload: String,
}

/// Events received on the telephony leg.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelephonyEvent {
    /// Handshake acknowledgement
    Connected {
        #[serde(default)]
        protocol: Option<String>,
    },

    /// Stream started
    Start {
        #[serde(default, rename = "streamSid")]
        stream_sid: Option<String>,
        #[serde(default)]
        start: Option<StartMetadata>,
    },

    /// Audio chunk from the caller
    Media { media: MediaChunk },

    /// Playback marker echoed back by the platform
    Mark {
        #[serde(default)]
        mark: Option<serde_json::Value>,
    },

    /// Keypad digit
    Dtmf {
        #[serde(default)]
        dtmf: Option<serde_json::Value>,
    },

    /// Stream ended
    Stop,

    /// Anything else
    #[serde(other)]
    Unknown,
}

impl TelephonyEvent {
    /// Wire name of the event, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Start { .. } => "start",
            Self::Media { .. } => "media",
            Self::Mark { .. } => "mark",
            Self::Dtmf { .. } => "dtmf",
            Self::Stop => "stop",
            Self::Unknown => "unknown",
        }
    }
}

// =============================================================================
// Outbound Events
// =============================================================================

/// Payload wrapper of an outbound media frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMedia {
    pub payload: String,
}

/// Events sent on the telephony leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelephonyOutbound {
    /// Audio for the caller
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        media: OutboundMedia,
    },
}
