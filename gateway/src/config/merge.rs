use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::{ConfigError, ConfigResult};

use super::env::load_from_env;
use super::validation::validate_tls_paths;
use super::yaml::YamlConfig;
use super::{ServerConfig, TlsConfig};

/// Load the environment layer, then apply every value the YAML file sets.
pub(crate) fn merge_config(
    yaml: Option<YamlConfig>,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> ConfigResult<ServerConfig> {
    let mut config = load_from_env(lookup)?;
    let Some(yaml) = yaml else {
        return Ok(config);
    };

    if let Some(server) = yaml.server {
        if let Some(host) = server.host {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
        if let Some(tls) = server.tls {
            let current = config.tls.take();
            let cert = tls
                .cert_path
                .map(PathBuf::from)
                .or_else(|| current.as_ref().map(|t| t.cert_path.clone()));
            let key = tls
                .key_path
                .map(PathBuf::from)
                .or_else(|| current.as_ref().map(|t| t.key_path.clone()));
            config.tls = validate_tls_paths(cert, key)?.map(|(cert_path, key_path)| TlsConfig {
                cert_path,
                key_path,
            });
        }
    }

    if let Some(openai) = yaml.openai {
        if let Some(api_key) = openai.api_key {
            config.openai_api_key = api_key;
        }
        if let Some(url) = openai.realtime_url {
            config.openai_realtime_url = url;
        }
        if let Some(model) = openai.model {
            config.openai_model = model;
        }
        if let Some(agent_id) = openai.agent_id {
            config.agent_id = Some(agent_id);
        }
        if let Some(voice) = openai.voice {
            config.voice = Some(voice);
        }
        if let Some(instructions) = openai.instructions {
            config.instructions = Some(instructions);
        }
    }

    if let Some(bridge) = yaml.bridge {
        if let Some(format) = bridge.audio_format {
            config.audio_format = parse_yaml("bridge.audio_format", &format)?;
        }
        if let Some(greeting) = bridge.greeting {
            config.greeting = parse_yaml("bridge.greeting", &greeting)?;
        }
        if let Some(ms) = bridge.idle_commit_ms {
            config.idle_commit_ms = ms;
        }
        if let Some(secs) = bridge.keepalive_interval_secs {
            config.keepalive_interval_secs = secs;
        }
        if let Some(secs) = bridge.connect_timeout_secs {
            config.connect_timeout_secs = secs;
        }
        if let Some(path) = bridge.media_stream_path {
            config.media_stream_path = path;
        }
        if let Some(host) = bridge.public_host {
            config.public_host = Some(host);
        }
        if let Some(enabled) = bridge.loopback_enabled {
            config.loopback_enabled = enabled;
        }
    }

    Ok(config)
}

fn parse_yaml<T>(field: &'static str, value: &str) -> ConfigResult<T>
where
    T: FromStr<Err = String>,
{
    value.parse().map_err(|reason| ConfigError::invalid(field, reason))
}
