//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check and the inbound-call webhook
//! - `media_stream` - Media-stream acceptor that spawns bridge sessions

pub mod api;
pub mod media_stream;

pub use media_stream::media_stream_handler;
