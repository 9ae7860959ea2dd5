//! Realtime AI leg configuration types.
//!
//! - Endpoint and model defaults
//! - The audio format shared by both legs of a call
//! - Connection parameters for the AI leg

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::config::ServerConfig;

/// OpenAI Realtime API WebSocket endpoint.
pub const OPENAI_REALTIME_URL: &str = "wss://api.openai.com/v1/realtime";

/// Model requested when none is configured.
pub const DEFAULT_REALTIME_MODEL: &str = "gpt-4o-realtime-preview";

/// Handshake header carrying the optional agent identifier.
pub const AGENT_ID_HEADER: &str = "OpenAI-Beta-Agent-Id";

// =============================================================================
// Audio Format
// =============================================================================

/// Audio encoding negotiated for both legs.
///
/// The bridge never transcodes, so the telephony stream and the AI session
/// must agree on this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    /// G.711 u-law at 8kHz (telephony default)
    #[default]
    G711Ulaw,
    /// G.711 A-law at 8kHz
    G711Alaw,
    /// PCM 16-bit signed little-endian at 24kHz
    Pcm16,
}

impl AudioFormat {
    /// Convert to the realtime API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::G711Ulaw => "g711_ulaw",
            Self::G711Alaw => "g711_alaw",
            Self::Pcm16 => "pcm16",
        }
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        match self {
            Self::G711Ulaw | Self::G711Alaw => 8000,
            Self::Pcm16 => 24000,
        }
    }

    /// Whether a telephony `mediaFormat.encoding` value describes this format.
    pub fn matches_telephony_encoding(&self, encoding: &str) -> bool {
        let encoding = encoding.to_ascii_lowercase();
        match self {
            Self::G711Ulaw => matches!(encoding.as_str(), "audio/x-mulaw" | "audio/pcmu"),
            Self::G711Alaw => matches!(encoding.as_str(), "audio/x-alaw" | "audio/pcma"),
            Self::Pcm16 => matches!(encoding.as_str(), "audio/l16" | "audio/pcm"),
        }
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "g711_ulaw" | "ulaw" | "mulaw" => Ok(Self::G711Ulaw),
            "g711_alaw" | "alaw" => Ok(Self::G711Alaw),
            "pcm16" => Ok(Self::Pcm16),
            other => Err(format!(
                "unsupported audio format '{other}' (expected g711_ulaw, g711_alaw or pcm16)"
            )),
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// AI Leg Connection
// =============================================================================

/// Parameters for opening the AI leg of a call.
#[derive(Clone)]
pub struct RealtimeLegConfig {
    /// Bearer credential for the realtime service
    pub api_key: String,
    /// Base WebSocket URL (without the model query parameter)
    pub url: String,
    /// Model requested on connect
    pub model: String,
    /// Optional agent identifier sent as a handshake header
    pub agent_id: Option<String>,
    /// Upper bound on the WebSocket handshake
    pub connect_timeout: Duration,
}

impl RealtimeLegConfig {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            api_key: config.openai_api_key.clone(),
            url: config.openai_realtime_url.clone(),
            model: config.openai_model.clone(),
            agent_id: config.agent_id.clone(),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        }
    }
}

impl fmt::Debug for RealtimeLegConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimeLegConfig")
            .field("api_key", &"<redacted>")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("agent_id", &self.agent_id)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl Drop for RealtimeLegConfig {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_format_parsing() {
        assert_eq!("g711_ulaw".parse::<AudioFormat>(), Ok(AudioFormat::G711Ulaw));
        assert_eq!("PCM16".parse::<AudioFormat>(), Ok(AudioFormat::Pcm16));
        assert_eq!("alaw".parse::<AudioFormat>(), Ok(AudioFormat::G711Alaw));
        assert!("opus".parse::<AudioFormat>().is_err());
    }

    #[test]
    fn test_audio_format_sample_rate() {
        assert_eq!(AudioFormat::G711Ulaw.sample_rate(), 8000);
        assert_eq!(AudioFormat::Pcm16.sample_rate(), 24000);
    }

    #[test]
    fn test_telephony_encoding_match() {
        assert!(AudioFormat::G711Ulaw.matches_telephony_encoding("audio/x-mulaw"));
        assert!(!AudioFormat::G711Ulaw.matches_telephony_encoding("audio/x-alaw"));
        assert!(AudioFormat::G711Alaw.matches_telephony_encoding("AUDIO/X-ALAW"));
    }

    #[test]
    fn test_leg_config_debug_redacts_key() {
        let config = RealtimeLegConfig {
            api_key: "sk-secret".to_string(),
            url: OPENAI_REALTIME_URL.to_string(),
            model: DEFAULT_REALTIME_MODEL.to_string(),
            agent_id: None,
            connect_timeout: Duration::from_secs(10),
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
