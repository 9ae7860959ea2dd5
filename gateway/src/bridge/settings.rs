//! Immutable per-call settings shared by every session.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::liveness::DEFAULT_KEEPALIVE_INTERVAL;
use super::trigger::DEFAULT_IDLE_COMMIT;
use crate::config::ServerConfig;
use crate::core::realtime::AudioFormat;

/// When the assistant speaks first after the AI leg opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GreetingPolicy {
    /// Always request an opening response
    Always,
    /// Wait for the caller to speak
    Never,
    /// Greet only when no agent id is configured (an agent brings its own opener)
    #[default]
    WhenNoAgent,
}

impl GreetingPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Never => "never",
            Self::WhenNoAgent => "when_no_agent",
        }
    }

    /// Whether to send `response.create` right after `session.update`.
    pub fn greets_on_open(&self, has_agent: bool) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::WhenNoAgent => !has_agent,
        }
    }
}

impl FromStr for GreetingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            "when_no_agent" | "auto" => Ok(Self::WhenNoAgent),
            other => Err(format!(
                "unknown greeting policy '{other}' (expected always, never or when_no_agent)"
            )),
        }
    }
}

impl fmt::Display for GreetingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a session needs to know about the call it bridges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSettings {
    /// Format of both legs
    pub audio_format: AudioFormat,
    pub voice: Option<String>,
    pub instructions: Option<String>,
    /// Agent id, only consulted by the greeting policy here
    pub agent_id: Option<String>,
    pub greeting: GreetingPolicy,
    /// Quiet period before a turn is committed
    pub idle_commit: Duration,
    /// Ping period for both legs, `None` when disabled
    pub keepalive_interval: Option<Duration>,
}

impl BridgeSettings {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            audio_format: config.audio_format,
            voice: config.voice.clone(),
            instructions: config.instructions.clone(),
            agent_id: config.agent_id.clone(),
            greeting: config.greeting,
            idle_commit: Duration::from_millis(config.idle_commit_ms),
            keepalive_interval: match config.keepalive_interval_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }

    pub fn greets_on_open(&self) -> bool {
        self.greeting.greets_on_open(self.agent_id.is_some())
    }
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            audio_format: AudioFormat::default(),
            voice: None,
            instructions: None,
            agent_id: None,
            greeting: GreetingPolicy::default(),
            idle_commit: DEFAULT_IDLE_COMMIT,
            keepalive_interval: Some(DEFAULT_KEEPALIVE_INTERVAL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_policy_parsing() {
        assert_eq!("always".parse::<GreetingPolicy>(), Ok(GreetingPolicy::Always));
        assert_eq!(" NEVER ".parse::<GreetingPolicy>(), Ok(GreetingPolicy::Never));
        assert_eq!(
            "when_no_agent".parse::<GreetingPolicy>(),
            Ok(GreetingPolicy::WhenNoAgent)
        );
        assert!("sometimes".parse::<GreetingPolicy>().is_err());
    }

    #[test]
    fn test_greets_on_open() {
        assert!(GreetingPolicy::Always.greets_on_open(true));
        assert!(!GreetingPolicy::Never.greets_on_open(false));
        assert!(GreetingPolicy::WhenNoAgent.greets_on_open(false));
        assert!(!GreetingPolicy::WhenNoAgent.greets_on_open(true));
    }

    fn config_from_env(vars: &'static [(&'static str, &'static str)]) -> ServerConfig {
        ServerConfig::from_sources(None, |name| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
                .or_else(|| (name == "OPENAI_API_KEY").then(|| "sk-test".to_string()))
        })
        .unwrap()
    }

    #[test]
    fn test_zero_keepalive_disables_pings() {
        let settings = BridgeSettings::from_config(&config_from_env(&[(
            "KEEPALIVE_INTERVAL_SECS",
            "0",
        )]));
        assert_eq!(settings.keepalive_interval, None);
    }

    #[test]
    fn test_from_config_durations() {
        let settings = BridgeSettings::from_config(&config_from_env(&[
            ("KEEPALIVE_INTERVAL_SECS", "3600"),
            ("COMMIT_IDLE_MS", "250"),
            ("AGENT_ID", "agent-7"),
        ]));
        assert_eq!(settings.keepalive_interval, Some(Duration::from_secs(3600)));
        assert_eq!(settings.idle_commit, Duration::from_millis(250));
        assert!(!settings.greets_on_open());
    }

    #[test]
    fn test_default_settings() {
        let settings = BridgeSettings::default();
        assert_eq!(settings.idle_commit, Duration::from_millis(800));
        assert_eq!(settings.keepalive_interval, Some(Duration::from_secs(15)));
        assert!(settings.greets_on_open());
    }
}
