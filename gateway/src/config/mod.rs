//! Configuration module for the call bridge
//!
//! Configuration comes from three sources. Priority: YAML > ENV vars (including
//! `.env` values loaded at startup) > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Applying YAML overrides on top of the environment
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use waav_call_bridge::config::ServerConfig;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable base
//! let config = ServerConfig::from_file(Path::new("config.yaml"))?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

mod env;
mod merge;
mod validation;
mod yaml;

pub use yaml::{BridgeYaml, OpenAIYaml, ServerYaml, TlsYaml, YamlConfig};

use crate::bridge::GreetingPolicy;
use crate::core::realtime::AudioFormat;
use crate::errors::ConfigResult;

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    // Realtime AI service
    /// Bearer credential for the realtime service (required)
    pub openai_api_key: String,
    pub openai_realtime_url: String,
    pub openai_model: String,
    /// Sent as a handshake header when set
    pub agent_id: Option<String>,
    pub voice: Option<String>,
    pub instructions: Option<String>,

    // Bridge behaviour
    /// Encoding shared by both legs
    pub audio_format: AudioFormat,
    pub greeting: GreetingPolicy,
    /// Quiet period before a caller turn is committed
    /// Default: 800
    pub idle_commit_ms: u64,
    /// Keepalive ping period, 0 disables
    /// Default: 15
    pub keepalive_interval_secs: u64,
    /// Upper bound on the AI handshake
    /// Default: 10
    pub connect_timeout_secs: u64,
    /// Path prefix of the media-stream WebSocket
    /// Default: /twilio-media-stream
    pub media_stream_path: String,
    /// Host advertised in the call webhook markup (request Host when unset)
    pub public_host: Option<String>,
    /// Allow `?mode=loopback` self-test calls
    pub loopback_enabled: bool,
}

/// Zeroize the API key when the configuration is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        self.openai_api_key.zeroize();
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.openai_api_key.is_empty() {
            "<unset>"
        } else {
            "<redacted>"
        };

        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("openai_api_key", &api_key)
            .field("openai_realtime_url", &self.openai_realtime_url)
            .field("openai_model", &self.openai_model)
            .field("agent_id", &self.agent_id)
            .field("voice", &self.voice)
            .field("instructions", &self.instructions)
            .field("audio_format", &self.audio_format)
            .field("greeting", &self.greeting)
            .field("idle_commit_ms", &self.idle_commit_ms)
            .field("keepalive_interval_secs", &self.keepalive_interval_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("media_stream_path", &self.media_stream_path)
            .field("public_host", &self.public_host)
            .field("loopback_enabled", &self.loopback_enabled)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// The `.env` file is loaded in `main.rs` before this is called.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_sources(None, |name| std::env::var(name).ok())
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let yaml_config = YamlConfig::from_file(path)?;
        Self::from_sources(Some(yaml_config), |name| std::env::var(name).ok())
    }

    /// Build and validate a configuration from explicit sources.
    ///
    /// `lookup` resolves environment variable names, which keeps tests free of
    /// process-global state.
    pub fn from_sources<F>(yaml: Option<YamlConfig>, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = merge::merge_config(yaml, &lookup)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }
}
