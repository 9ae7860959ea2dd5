use std::path::Path;

use serde::Deserialize;

use crate::errors::{ConfigError, ConfigResult};

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present
/// here override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3000
///   tls:
///     cert_path: "/etc/bridge/cert.pem"
///     key_path: "/etc/bridge/key.pem"
///
/// openai:
///   api_key: "sk-..."
///   realtime_url: "wss://api.openai.com/v1/realtime"
///   model: "gpt-4o-realtime-preview"
///   agent_id: "agent-123"
///   voice: "alloy"
///   instructions: "You are a friendly receptionist."
///
/// bridge:
///   audio_format: "g711_ulaw"
///   greeting: "when_no_agent"
///   idle_commit_ms: 800
///   keepalive_interval_secs: 15
///   connect_timeout_secs: 10
///   media_stream_path: "/twilio-media-stream"
///   public_host: "bridge.example.com"
///   loopback_enabled: false
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub openai: Option<OpenAIYaml>,
    pub bridge: Option<BridgeYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls: Option<TlsYaml>,
}

/// TLS configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsYaml {
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

/// Realtime AI service configuration from YAML
#[derive(Clone, Deserialize, Default)]
#[serde(default)]
pub struct OpenAIYaml {
    pub api_key: Option<String>,
    pub realtime_url: Option<String>,
    pub model: Option<String>,
    pub agent_id: Option<String>,
    pub voice: Option<String>,
    pub instructions: Option<String>,
}

impl std::fmt::Debug for OpenAIYaml {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIYaml")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("realtime_url", &self.realtime_url)
            .field("model", &self.model)
            .field("agent_id", &self.agent_id)
            .field("voice", &self.voice)
            .field("instructions", &self.instructions)
            .finish()
    }
}

/// Bridge behaviour from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct BridgeYaml {
    pub audio_format: Option<String>,
    pub greeting: Option<String>,
    pub idle_commit_ms: Option<u64>,
    pub keepalive_interval_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub media_stream_path: Option<String>,
    pub public_host: Option<String>,
    pub loopback_enabled: Option<bool>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Required fields have invalid types
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&contents)
    }

    /// Parse configuration from YAML text. An empty document is an empty config.
    pub fn parse(contents: &str) -> ConfigResult<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }
}
