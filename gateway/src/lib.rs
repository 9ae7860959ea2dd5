pub mod bridge;
pub mod config;
pub mod core;
pub mod errors;
pub mod handlers;
pub mod routes;
pub mod state;

// Re-export commonly used items for convenience
pub use bridge::{BridgeMode, BridgeSession, BridgeSettings, GreetingPolicy};
pub use config::ServerConfig;
pub use errors::{BridgeError, BridgeResult, ConfigError, ConfigResult};
pub use routes::create_app;
pub use state::AppState;
