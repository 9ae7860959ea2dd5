//! Telephony media-stream leg
//!
//! Message vocabulary of the caller's media stream and the adapter that turns
//! an upgraded axum WebSocket into a bridge [`Leg`](crate::bridge::Leg).

pub mod messages;
mod socket;

pub use messages::{MediaChunk, MediaFormat, OutboundMedia, StartMetadata, TelephonyEvent, TelephonyOutbound};
pub use socket::attach;
