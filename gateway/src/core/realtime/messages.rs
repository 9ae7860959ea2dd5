//! Realtime AI WebSocket message types.
//!
//! Only the subset of the realtime vocabulary the bridge speaks is modelled.
//!
//! Client events (sent to the AI service):
//! - session.update - Negotiate audio format, voice and instructions
//! - input_audio_buffer.append - Append caller audio
//! - input_audio_buffer.commit - Mark the buffered audio as a finished utterance
//! - response.create - Ask for a spoken response
//!
//! Server events (received from the AI service):
//! - output_audio_buffer.delta - Audio chunk for the caller
//! - response.completed - Response finished
//! - output_text.delta - Text chunk (logged only)
//! - session.created / session.updated / error - Logged only

use serde::{Deserialize, Serialize};

// =============================================================================
// Session Configuration
// =============================================================================

/// Session parameters sent once when the AI leg opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Input audio format
    pub input_audio_format: String,

    /// Output audio format
    pub output_audio_format: String,

    /// Voice for audio output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    /// System instructions for the assistant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

// =============================================================================
// Client Events (sent to server)
// =============================================================================

/// Events the bridge sends on the AI leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Update session configuration
    #[serde(rename = "session.update")]
    SessionUpdate {
        /// Session configuration
        session: SessionConfig,
    },

    /// Append audio to input buffer
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend {
        /// Base64-encoded audio, passed through untouched
        audio: String,
    },

    /// Commit the input audio buffer
    #[serde(rename = "input_audio_buffer.commit")]
    InputAudioBufferCommit,

    /// Request a response from the model
    #[serde(rename = "response.create")]
    ResponseCreate,
}

impl ClientEvent {
    /// Wire name of the event, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SessionUpdate { .. } => "session.update",
            Self::InputAudioBufferAppend { .. } => "input_audio_buffer.append",
            Self::InputAudioBufferCommit => "input_audio_buffer.commit",
            Self::ResponseCreate => "response.create",
        }
    }
}

// =============================================================================
// Server Events (received from server)
// =============================================================================

/// Session object echoed by `session.created` / `session.updated`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionInfo {
    pub id: Option<String>,
    pub voice: Option<String>,
}

/// Response object carried by `response.completed`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResponseInfo {
    pub id: Option<String>,
    pub status: Option<String>,
}

/// Error details reported by the AI service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
}

/// Events received on the AI leg.
///
/// Newer wire names are accepted as aliases so the bridge keeps working
/// across realtime API revisions.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Session created
    #[serde(rename = "session.created")]
    SessionCreated {
        #[serde(default)]
        session: SessionInfo,
    },

    /// Session configuration applied
    #[serde(rename = "session.updated")]
    SessionUpdated {
        #[serde(default)]
        session: SessionInfo,
    },

    /// Audio chunk for the caller
    #[serde(
        rename = "output_audio_buffer.delta",
        alias = "response.audio.delta",
        alias = "response.output_audio.delta"
    )]
    OutputAudioDelta {
        /// Base64-encoded audio
        #[serde(alias = "delta")]
        audio: String,
    },

    /// Response generation finished
    #[serde(rename = "response.completed", alias = "response.done")]
    ResponseCompleted {
        #[serde(default)]
        response: ResponseInfo,
    },

    /// Text or transcript chunk
    #[serde(
        rename = "output_text.delta",
        alias = "response.text.delta",
        alias = "response.output_text.delta",
        alias = "response.audio_transcript.delta"
    )]
    OutputTextDelta {
        #[serde(default)]
        delta: String,
    },

    /// Error reported by the service
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        error: ErrorDetail,
    },

    /// Anything else
    #[serde(other)]
    Other,
}
