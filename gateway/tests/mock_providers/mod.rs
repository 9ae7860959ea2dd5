//! Mock provider servers for integration tests
//!
//! - `realtime_mock`: a scripted realtime AI WebSocket endpoint

// Not every test binary uses every helper
#![allow(dead_code)]

pub mod realtime_mock;

pub use realtime_mock::{MockConnection, Received, RealtimeMockServer};
