//! Stateless mapping between the telephony and realtime vocabularies.
//!
//! Audio payloads are base64 text on both sides and pass through untouched.
//! The translator validates them but never decodes them for forwarding.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::Serialize;

use super::leg::LegKind;
use super::settings::BridgeSettings;
use crate::core::realtime::{ClientEvent, ServerEvent, SessionConfig};
use crate::core::telephony::{OutboundMedia, TelephonyEvent, TelephonyOutbound};
use crate::errors::{BridgeError, BridgeResult};

// =============================================================================
// Audio Frame
// =============================================================================

/// One chunk of encoded audio in transit, in the format shared by both legs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    payload: String,
}

impl AudioFrame {
    /// Accept a base64 payload after checking that it decodes.
    pub fn from_base64(payload: String) -> Result<Self, String> {
        if payload.is_empty() {
            return Err("empty audio payload".to_string());
        }
        BASE64
            .decode(payload.as_bytes())
            .map_err(|e| format!("audio payload is not valid base64: {e}"))?;
        Ok(Self { payload })
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn into_payload(self) -> String {
        self.payload
    }
}

// =============================================================================
// Telephony → AI
// =============================================================================

/// What the session keeps from a `start` event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamStart {
    pub stream_sid: String,
    pub call_sid: Option<String>,
    /// Encoding announced in `mediaFormat`
    pub encoding: Option<String>,
    pub sample_rate: Option<u32>,
}

/// A telephony frame, reduced to what the session acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelephonyInput {
    /// Stream started
    Start(StreamStart),
    /// Caller audio
    Media(AudioFrame),
    /// Stream ended
    Stop,
    /// Tolerated event with no effect (connected, mark, dtmf, unknown)
    Ignored(&'static str),
}

/// Parse one telephony text frame.
pub fn decode_telephony(text: &str) -> BridgeResult<TelephonyInput> {
    let event: TelephonyEvent =
        serde_json::from_str(text).map_err(|e| parse_error(LegKind::Telephony, e))?;

    match event {
        TelephonyEvent::Start { stream_sid, start } => {
            let start = start.unwrap_or_default();
            let stream_sid = start
                .stream_sid
                .or(stream_sid)
                .filter(|sid| !sid.is_empty())
                .ok_or_else(|| BridgeError::Parse {
                    leg: LegKind::Telephony,
                    reason: "start event without streamSid".to_string(),
                })?;
            let media_format = start.media_format.unwrap_or_default();
            Ok(TelephonyInput::Start(StreamStart {
                stream_sid,
                call_sid: start.call_sid.filter(|sid| !sid.is_empty()),
                encoding: Some(media_format.encoding).filter(|e| !e.is_empty()),
                sample_rate: Some(media_format.sample_rate).filter(|rate| *rate > 0),
            }))
        }
        TelephonyEvent::Media { media } => AudioFrame::from_base64(media.payload)
            .map(TelephonyInput::Media)
            .map_err(|reason| BridgeError::Parse {
                leg: LegKind::Telephony,
                reason,
            }),
        TelephonyEvent::Stop => Ok(TelephonyInput::Stop),
        other => Ok(TelephonyInput::Ignored(other.kind())),
    }
}

/// AI events a telephony input translates to.
pub fn to_ai(input: &TelephonyInput) -> Vec<ClientEvent> {
    match input {
        TelephonyInput::Media(frame) => vec![ClientEvent::InputAudioBufferAppend {
            audio: frame.payload().to_owned(),
        }],
        TelephonyInput::Stop => turn_complete().to_vec(),
        TelephonyInput::Start { .. } | TelephonyInput::Ignored(_) => Vec::new(),
    }
}

/// Commit the buffered audio and ask for a response.
pub fn turn_complete() -> [ClientEvent; 2] {
    [ClientEvent::InputAudioBufferCommit, ClientEvent::ResponseCreate]
}

/// Session configuration sent when the AI leg opens.
pub fn session_update(settings: &BridgeSettings) -> ClientEvent {
    let format = settings.audio_format.as_str().to_string();
    ClientEvent::SessionUpdate {
        session: SessionConfig {
            input_audio_format: format.clone(),
            output_audio_format: format,
            voice: settings.voice.clone(),
            instructions: settings.instructions.clone(),
        },
    }
}

// =============================================================================
// AI → Telephony
// =============================================================================

/// Parse one AI text frame.
pub fn decode_ai(text: &str) -> BridgeResult<ServerEvent> {
    serde_json::from_str(text).map_err(|e| parse_error(LegKind::Ai, e))
}

/// Telephony frame for an AI event. Only audio deltas produce one.
pub fn to_telephony(event: &ServerEvent, stream_sid: &str) -> Option<TelephonyOutbound> {
    match event {
        ServerEvent::OutputAudioDelta { audio } => Some(media_frame(stream_sid, audio.clone())),
        _ => None,
    }
}

/// Outbound telephony media frame.
pub fn media_frame(stream_sid: &str, payload: String) -> TelephonyOutbound {
    TelephonyOutbound::Media {
        stream_sid: stream_sid.to_string(),
        media: OutboundMedia { payload },
    }
}

/// Serialize an outbound event to a text frame.
pub fn encode<T: Serialize>(event: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}

fn parse_error(leg: LegKind, e: serde_json::Error) -> BridgeError {
    BridgeError::Parse {
        leg,
        reason: e.to_string(),
    }
}
