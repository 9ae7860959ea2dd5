use std::path::PathBuf;

use url::Url;

use crate::errors::{ConfigError, ConfigResult};

use super::ServerConfig;

/// Longest accepted quiet period before a turn is committed.
pub(crate) const MAX_IDLE_COMMIT_MS: u64 = 60_000;

/// Longest accepted keepalive period.
pub(crate) const MAX_KEEPALIVE_INTERVAL_SECS: u64 = 3600;

/// Longest accepted AI handshake timeout.
pub(crate) const MAX_CONNECT_TIMEOUT_SECS: u64 = 300;

/// Validate a fully merged configuration.
pub(crate) fn validate(config: &ServerConfig) -> ConfigResult<()> {
    validate_api_key(&config.openai_api_key)?;
    validate_realtime_url(&config.openai_realtime_url)?;
    validate_non_empty("openai_model", &config.openai_model)?;
    validate_media_stream_path(&config.media_stream_path)?;
    validate_public_host(config.public_host.as_deref())?;

    validate_range("idle_commit_ms", config.idle_commit_ms, 1, MAX_IDLE_COMMIT_MS)?;
    validate_range(
        "keepalive_interval_secs",
        config.keepalive_interval_secs,
        0,
        MAX_KEEPALIVE_INTERVAL_SECS,
    )?;
    validate_range(
        "connect_timeout_secs",
        config.connect_timeout_secs,
        1,
        MAX_CONNECT_TIMEOUT_SECS,
    )?;

    Ok(())
}

fn validate_range(field: &'static str, value: u64, min: u64, max: u64) -> ConfigResult<()> {
    if !(min..=max).contains(&value) {
        return Err(ConfigError::invalid(
            field,
            format!("{value} is outside {min}..={max}"),
        ));
    }
    Ok(())
}

/// Certificate and key must be configured together.
pub(crate) fn validate_tls_paths(
    cert_path: Option<PathBuf>,
    key_path: Option<PathBuf>,
) -> ConfigResult<Option<(PathBuf, PathBuf)>> {
    match (cert_path, key_path) {
        (Some(cert), Some(key)) => Ok(Some((cert, key))),
        (None, None) => Ok(None),
        (Some(_), None) => Err(ConfigError::invalid(
            "tls",
            "certificate path set without a key path",
        )),
        (None, Some(_)) => Err(ConfigError::invalid(
            "tls",
            "key path set without a certificate path",
        )),
    }
}

fn validate_api_key(api_key: &str) -> ConfigResult<()> {
    if api_key.trim().is_empty() {
        return Err(ConfigError::MissingCredential {
            name: "OPENAI_API_KEY",
        });
    }
    Ok(())
}

fn validate_realtime_url(url: &str) -> ConfigResult<()> {
    let parsed = Url::parse(url)
        .map_err(|e| ConfigError::invalid("openai_realtime_url", format!("'{url}': {e}")))?;

    match parsed.scheme() {
        "ws" | "wss" => Ok(()),
        other => Err(ConfigError::invalid(
            "openai_realtime_url",
            format!("scheme must be ws or wss, got '{other}'"),
        )),
    }
}

fn validate_media_stream_path(path: &str) -> ConfigResult<()> {
    if !path.starts_with('/') {
        return Err(ConfigError::invalid(
            "media_stream_path",
            format!("'{path}' must start with '/'"),
        ));
    }
    Ok(())
}

fn validate_public_host(host: Option<&str>) -> ConfigResult<()> {
    match host {
        Some(host) if host.contains("://") || host.contains('/') => Err(ConfigError::invalid(
            "public_host",
            format!("'{host}' must be a bare host name without scheme or path"),
        )),
        _ => Ok(()),
    }
}

fn validate_non_empty(field: &'static str, value: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::invalid(field, "must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_api_key() {
        assert!(validate_api_key("sk-123").is_ok());
        assert!(matches!(
            validate_api_key("  "),
            Err(ConfigError::MissingCredential { .. })
        ));
    }

    #[test]
    fn test_validate_realtime_url() {
        assert!(validate_realtime_url("wss://api.openai.com/v1/realtime").is_ok());
        assert!(validate_realtime_url("ws://localhost:9000/realtime").is_ok());
        assert!(validate_realtime_url("https://api.openai.com/v1/realtime").is_err());
        assert!(validate_realtime_url("not a url").is_err());
    }

    #[test]
    fn test_validate_media_stream_path() {
        assert!(validate_media_stream_path("/twilio-media-stream").is_ok());
        assert!(validate_media_stream_path("twilio-media-stream").is_err());
    }

    #[test]
    fn test_validate_public_host() {
        assert!(validate_public_host(None).is_ok());
        assert!(validate_public_host(Some("bridge.example.com:8443")).is_ok());
        assert!(validate_public_host(Some("https://bridge.example.com")).is_err());
    }

    #[test]
    fn test_validate_range_bounds() {
        assert!(validate_range("idle_commit_ms", 1, 1, MAX_IDLE_COMMIT_MS).is_ok());
        assert!(validate_range("idle_commit_ms", 0, 1, MAX_IDLE_COMMIT_MS).is_err());
        assert!(
            validate_range("idle_commit_ms", MAX_IDLE_COMMIT_MS + 1, 1, MAX_IDLE_COMMIT_MS)
                .is_err()
        );
    }

    fn config_with(lookup: &[(&str, &str)]) -> ConfigResult<ServerConfig> {
        let vars: Vec<(String, String)> = lookup
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_sources(None, move |name| {
            vars.iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
                .or_else(|| (name == "OPENAI_API_KEY").then(|| "sk-test".to_string()))
        })
    }

    #[test]
    fn test_huge_keepalive_interval_rejected() {
        let err = config_with(&[("KEEPALIVE_INTERVAL_SECS", "18446744073709551615")]).unwrap_err();
        assert!(err.to_string().contains("keepalive_interval_secs"), "{err}");

        assert!(config_with(&[("KEEPALIVE_INTERVAL_SECS", "3600")]).is_ok());
        assert!(config_with(&[("KEEPALIVE_INTERVAL_SECS", "3601")]).is_err());
    }

    #[test]
    fn test_keepalive_zero_is_accepted() {
        let config = config_with(&[("KEEPALIVE_INTERVAL_SECS", "0")]).unwrap();
        assert_eq!(config.keepalive_interval_secs, 0);
    }

    #[test]
    fn test_idle_commit_bounds() {
        assert!(config_with(&[("COMMIT_IDLE_MS", "0")]).is_err());
        assert!(config_with(&[("COMMIT_IDLE_MS", "60000")]).is_ok());
        assert!(config_with(&[("COMMIT_IDLE_MS", "18446744073709551615")]).is_err());
    }

    #[test]
    fn test_connect_timeout_bounds() {
        assert!(config_with(&[("AI_CONNECT_TIMEOUT_SECS", "0")]).is_err());
        assert!(config_with(&[("AI_CONNECT_TIMEOUT_SECS", "301")]).is_err());
    }

    #[test]
    fn test_validate_tls_paths() {
        let cert = Some(PathBuf::from("/c.pem"));
        let key = Some(PathBuf::from("/k.pem"));
        assert!(validate_tls_paths(cert.clone(), key.clone()).unwrap().is_some());
        assert!(validate_tls_paths(None, None).unwrap().is_none());
        assert!(validate_tls_paths(cert, None).is_err());
        assert!(validate_tls_paths(None, key).is_err());
    }
}
