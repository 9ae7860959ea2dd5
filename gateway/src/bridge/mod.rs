//! Per-call bridge between the telephony media stream and the realtime AI service
//!
//! # Modules
//! - `leg`: leg handles and the reader/writer pumps behind them
//! - `session`: the per-call actor and its state machine
//! - `translator`: stateless mapping between the two message vocabularies
//! - `trigger`: silence-based turn-taking debounce
//! - `liveness`: keepalive pings
//! - `settings`: immutable settings shared by all sessions

pub mod leg;
pub mod liveness;
pub mod session;
pub mod settings;
pub mod translator;
pub mod trigger;

pub use leg::{Inbound, LEG_COMMAND_CAPACITY, Leg, LegCommand, LegKind, LegSignal, WireFrame, spawn_leg};
pub use liveness::{DEFAULT_KEEPALIVE_INTERVAL, Keepalive};
pub use session::{
    BridgeMode, BridgeSession, CallState, SESSION_EVENT_CAPACITY, SessionEvent, SessionStats,
    SessionSummary, TeardownReason, open_ai_leg,
};
pub use settings::{BridgeSettings, GreetingPolicy};
pub use translator::{AudioFrame, StreamStart, TelephonyInput};
pub use trigger::{DEFAULT_IDLE_COMMIT, TurnTrigger};
