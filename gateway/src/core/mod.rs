pub mod realtime;
pub mod telephony;

// Re-export commonly used types for convenience
pub use realtime::{AiConnector, AudioFormat, ClientEvent, OpenAIRealtimeConnector, ServerEvent};
pub use telephony::{TelephonyEvent, TelephonyOutbound};
