//! Error types for the call bridge
//!
//! - `bridge_error`: per-call faults (parse, transport, peer closed)
//! - `config_error`: startup configuration faults

pub mod bridge_error;
pub mod config_error;

pub use bridge_error::{BridgeError, BridgeResult};
pub use config_error::{ConfigError, ConfigResult};
