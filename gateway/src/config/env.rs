use std::path::PathBuf;
use std::str::FromStr;

use crate::bridge::{DEFAULT_IDLE_COMMIT, DEFAULT_KEEPALIVE_INTERVAL};
use crate::core::realtime::{DEFAULT_REALTIME_MODEL, OPENAI_REALTIME_URL};
use crate::errors::{ConfigError, ConfigResult};

use super::{ServerConfig, TlsConfig, validation};

pub(crate) const DEFAULT_HOST: &str = "0.0.0.0";
pub(crate) const DEFAULT_PORT: u16 = 3000;
pub(crate) const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub(crate) const DEFAULT_MEDIA_STREAM_PATH: &str = "/twilio-media-stream";

/// Build a configuration from environment variables, falling back to defaults.
///
/// The API key may still be empty here; YAML can supply it and validation
/// rejects it afterwards if neither source did.
pub(crate) fn load_from_env(
    lookup: &dyn Fn(&str) -> Option<String>,
) -> ConfigResult<ServerConfig> {
    let var = |name: &str| {
        lookup(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let tls = validation::validate_tls_paths(
        var("TLS_CERT_PATH").map(PathBuf::from),
        var("TLS_KEY_PATH").map(PathBuf::from),
    )?
    .map(|(cert_path, key_path)| TlsConfig {
        cert_path,
        key_path,
    });

    Ok(ServerConfig {
        host: var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: parse_var(&var, "PORT")?.unwrap_or(DEFAULT_PORT),
        tls,
        openai_api_key: var("OPENAI_API_KEY").unwrap_or_default(),
        openai_realtime_url: var("OPENAI_REALTIME_URL")
            .unwrap_or_else(|| OPENAI_REALTIME_URL.to_string()),
        openai_model: var("OPENAI_REALTIME_MODEL")
            .unwrap_or_else(|| DEFAULT_REALTIME_MODEL.to_string()),
        agent_id: var("AGENT_ID"),
        voice: var("OPENAI_VOICE"),
        instructions: var("BRIDGE_INSTRUCTIONS"),
        audio_format: parse_var(&var, "AUDIO_FORMAT")?.unwrap_or_default(),
        greeting: parse_var(&var, "GREETING_POLICY")?.unwrap_or_default(),
        idle_commit_ms: parse_var(&var, "COMMIT_IDLE_MS")?
            .unwrap_or(DEFAULT_IDLE_COMMIT.as_millis() as u64),
        keepalive_interval_secs: parse_var(&var, "KEEPALIVE_INTERVAL_SECS")?
            .unwrap_or(DEFAULT_KEEPALIVE_INTERVAL.as_secs()),
        connect_timeout_secs: parse_var(&var, "AI_CONNECT_TIMEOUT_SECS")?
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        media_stream_path: var("MEDIA_STREAM_PATH")
            .unwrap_or_else(|| DEFAULT_MEDIA_STREAM_PATH.to_string()),
        public_host: var("PUBLIC_HOST"),
        loopback_enabled: match var("LOOPBACK_ENABLED") {
            Some(value) => parse_bool(&value).ok_or_else(|| {
                ConfigError::invalid("LOOPBACK_ENABLED", format!("'{value}' is not a boolean"))
            })?,
            None => false,
        },
    })
}

fn parse_var<T, F>(var: &F, name: &'static str) -> ConfigResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    var(name)
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|e| ConfigError::invalid(name, format!("'{value}': {e}")))
        })
        .transpose()
}

/// Parse the usual spellings of a boolean flag.
pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("on"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = load_from_env(&|name| match name {
            "HOST" => Some("   ".to_string()),
            "AGENT_ID" => Some(String::new()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.agent_id, None);
    }

    #[test]
    fn test_half_tls_config_rejected() {
        let result = load_from_env(&|name| {
            (name == "TLS_CERT_PATH").then(|| "/etc/ssl/cert.pem".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_tls_pair() {
        let config = load_from_env(&|name| match name {
            "TLS_CERT_PATH" => Some("/etc/ssl/cert.pem".to_string()),
            "TLS_KEY_PATH" => Some("/etc/ssl/key.pem".to_string()),
            _ => None,
        })
        .unwrap();

        let tls = config.tls.clone().unwrap();
        assert_eq!(tls.cert_path, PathBuf::from("/etc/ssl/cert.pem"));
        assert_eq!(tls.key_path, PathBuf::from("/etc/ssl/key.pem"));
    }

    #[test]
    fn test_invalid_audio_format() {
        let err = load_from_env(&|name| (name == "AUDIO_FORMAT").then(|| "opus".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("AUDIO_FORMAT"));
    }

    #[test]
    fn test_invalid_loopback_flag() {
        let err = load_from_env(&|name| (name == "LOOPBACK_ENABLED").then(|| "sure".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("LOOPBACK_ENABLED"));
    }
}
