use std::sync::Arc;

use crate::bridge::BridgeSettings;
use crate::config::ServerConfig;
use crate::core::realtime::{AiConnector, OpenAIRealtimeConnector, RealtimeLegConfig};

/// Shared state for all requests and calls.
pub struct AppState {
    pub config: ServerConfig,
    /// Settings handed to every bridge session
    pub settings: Arc<BridgeSettings>,
    /// Opens the AI leg of each relayed call
    pub connector: Arc<dyn AiConnector>,
}

impl AppState {
    /// Build the state with the OpenAI Realtime connector.
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let connector = Arc::new(OpenAIRealtimeConnector::new(
            RealtimeLegConfig::from_config(&config),
        ));
        Self::with_connector(config, connector)
    }

    /// Build the state around a specific connector.
    pub fn with_connector(config: ServerConfig, connector: Arc<dyn AiConnector>) -> Arc<Self> {
        let settings = Arc::new(BridgeSettings::from_config(&config));
        Arc::new(Self {
            config,
            settings,
            connector,
        })
    }
}
