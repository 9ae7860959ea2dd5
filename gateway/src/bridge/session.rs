//! Per-call bridge session
//!
//! One session bridges one phone call. It runs as a single task that owns
//! both legs, the turn-taking trigger and the keepalive, and serializes every
//! event source through one `select!` loop:
//!
//! - the event queue fed by both legs' reader tasks and the AI connect task
//! - idle-commit expiry
//! - keepalive ticks
//!
//! State machine:
//!
//! ```text
//! CONNECTING --(AI open + streamSid known)--> ACTIVE
//!     |                                          |
//!     +----(stop / leg closed / leg error)-------+--> DRAINING --> CLOSED
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendError;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::leg::{Leg, LegKind, LegSignal};
use super::liveness::Keepalive;
use super::settings::BridgeSettings;
use super::translator::{self, StreamStart, TelephonyInput};
use super::trigger::TurnTrigger;
use crate::core::realtime::{AiConnector, ClientEvent, ServerEvent};
use crate::core::telephony::TelephonyOutbound;
use crate::errors::BridgeError;

/// Capacity of a session's inbound event queue.
pub const SESSION_EVENT_CAPACITY: usize = 512;

/// Everything that can happen to a session from outside its own timers.
#[derive(Debug)]
pub enum SessionEvent {
    /// Frame, close or fault reported by a leg's pump tasks
    Leg(LegKind, LegSignal),
    /// The AI leg finished its handshake
    AiOpened(Leg),
    /// The AI leg could not be established
    AiFailed(BridgeError),
}

/// Lifecycle of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// AI leg not open yet or streamSid unknown
    Connecting,
    /// Both sides ready
    Active,
    /// Terminal signal received, legs closing
    Draining,
    /// Both legs released
    Closed,
}

impl CallState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "CONNECTING",
            Self::Active => "ACTIVE",
            Self::Draining => "DRAINING",
            Self::Closed => "CLOSED",
        }
    }

    fn is_terminating(&self) -> bool {
        matches!(self, Self::Draining | Self::Closed)
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a session treats caller audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BridgeMode {
    /// Relay to the AI leg
    #[default]
    Relay,
    /// Echo back to the caller without an AI leg
    Loopback,
}

impl BridgeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relay => "relay",
            Self::Loopback => "loopback",
        }
    }
}

impl fmt::Display for BridgeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardownReason {
    /// Telephony sent `stop`
    Stop,
    /// A leg closed, failed or never connected
    Leg(BridgeError),
    /// Every event producer went away
    EventQueueClosed,
}

impl fmt::Display for TeardownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stop => f.write_str("stream stopped"),
            Self::Leg(e) => write!(f, "{e}"),
            Self::EventQueueClosed => f.write_str("event queue closed"),
        }
    }
}

/// Per-call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Caller audio frames received
    pub frames_in: u64,
    /// Audio frames sent to the caller
    pub frames_out: u64,
    /// Turns committed to the AI leg
    pub commits: u64,
    /// Frames dropped (no streamSid, leg not open, queue full)
    pub dropped: u64,
    /// Inbound frames discarded as malformed
    pub malformed: u64,
}

/// Outcome of a finished session.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub call_id: String,
    pub stream_sid: Option<String>,
    pub mode: BridgeMode,
    pub state: CallState,
    pub duration: Duration,
    pub stats: SessionStats,
    pub reason: TeardownReason,
}

// =============================================================================
// Session
// =============================================================================

/// Owner of one call's legs, timers and state.
pub struct BridgeSession {
    call_id: String,
    settings: Arc<BridgeSettings>,
    mode: BridgeMode,
    state: CallState,
    stream_sid: Option<String>,
    started_at: Instant,
    telephony: Leg,
    ai: Leg,
    ai_configured: bool,
    trigger: TurnTrigger,
    keepalive: Keepalive,
    stats: SessionStats,
    reason: Option<TeardownReason>,
}

impl BridgeSession {
    pub fn new(
        call_id: impl Into<String>,
        settings: Arc<BridgeSettings>,
        mode: BridgeMode,
        telephony: Leg,
    ) -> Self {
        let trigger = TurnTrigger::new(settings.idle_commit);
        let keepalive = Keepalive::new(settings.keepalive_interval);

        Self {
            call_id: call_id.into(),
            settings,
            mode,
            state: CallState::Connecting,
            stream_sid: None,
            started_at: Instant::now(),
            telephony,
            ai: Leg::detached(LegKind::Ai),
            ai_configured: false,
            trigger,
            keepalive,
            stats: SessionStats::default(),
            reason: None,
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn stream_sid(&self) -> Option<&str> {
        self.stream_sid.as_deref()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Drive the session until both legs are released.
    pub async fn run(mut self, mut events: mpsc::Receiver<SessionEvent>) -> SessionSummary {
        info!(
            call_id = %self.call_id,
            mode = %self.mode,
            keepalive = self.keepalive.is_running(),
            "Bridge session started"
        );

        while self.state != CallState::Closed {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => self.teardown(TeardownReason::EventQueueClosed),
                },
                () = self.trigger.expired() => self.on_turn_idle(),
                () = self.keepalive.tick() => self.on_keepalive(),
            }
        }

        let summary = self.summary();
        info!(
            call_id = %summary.call_id,
            stream_sid = summary.stream_sid.as_deref().unwrap_or("-"),
            mode = %summary.mode,
            duration_ms = summary.duration.as_millis() as u64,
            frames_in = summary.stats.frames_in,
            frames_out = summary.stats.frames_out,
            commits = summary.stats.commits,
            dropped = summary.stats.dropped,
            malformed = summary.stats.malformed,
            reason = %summary.reason,
            "Call ended"
        );
        summary
    }

    /// Apply one queued event.
    pub fn handle_event(&mut self, event: SessionEvent) {
        if self.state == CallState::Closed {
            if let SessionEvent::AiOpened(mut leg) = event {
                leg.close();
            }
            return;
        }

        match event {
            SessionEvent::Leg(LegKind::Telephony, LegSignal::Text(text)) => {
                self.on_telephony_text(&text)
            }
            SessionEvent::Leg(LegKind::Ai, LegSignal::Text(text)) => self.on_ai_text(&text),
            SessionEvent::Leg(leg, LegSignal::Closed(reason)) => {
                self.on_error(BridgeError::PeerClosed { leg, reason })
            }
            SessionEvent::Leg(leg, LegSignal::Error(reason)) => {
                self.on_error(BridgeError::Transport { leg, reason })
            }
            SessionEvent::AiOpened(leg) => self.on_ai_opened(leg),
            SessionEvent::AiFailed(e) => self.on_error(e),
        }
    }

    /// Discard the frame behind a recoverable error, end the call on any other.
    fn on_error(&mut self, e: BridgeError) {
        let leg = e.leg();

        if !e.is_fatal() {
            self.stats.malformed += 1;
            warn!(call_id = %self.call_id, leg = %leg, "Discarding frame: {}", e);
            return;
        }

        match &e {
            BridgeError::PeerClosed { .. } => {
                info!(call_id = %self.call_id, leg = %leg, "Leg closed by peer")
            }
            _ => error!(call_id = %self.call_id, leg = %leg, "Leg failed: {}", e),
        }
        self.leg_mut(leg).mark_closed();
        self.teardown(TeardownReason::Leg(e));
    }

    /// Release both legs. Safe to call from every exit path, any number of times.
    pub fn teardown(&mut self, reason: TeardownReason) {
        if self.state.is_terminating() {
            return;
        }

        self.state = CallState::Draining;
        info!(call_id = %self.call_id, reason = %reason, "Draining call");

        self.trigger.cancel();
        self.keepalive.cancel();

        if self.telephony.close() {
            debug!(call_id = %self.call_id, "Telephony leg closed");
        }
        if self.ai.close() {
            debug!(call_id = %self.call_id, "AI leg closed");
        }

        self.reason = Some(reason);
        self.state = CallState::Closed;
    }

    // -------------------------------------------------------------------------
    // Telephony leg
    // -------------------------------------------------------------------------

    fn on_telephony_text(&mut self, text: &str) {
        match translator::decode_telephony(text) {
            Ok(input) => self.on_telephony_input(input),
            Err(e) => self.on_error(e),
        }
    }

    fn on_telephony_input(&mut self, input: TelephonyInput) {
        match input {
            TelephonyInput::Start(start) => self.on_stream_start(start),
            TelephonyInput::Media(frame) => {
                self.stats.frames_in += 1;
                match self.mode {
                    BridgeMode::Relay => {
                        for event in translator::to_ai(&TelephonyInput::Media(frame)) {
                            self.send_ai(&event);
                        }
                        self.trigger.arm();
                    }
                    BridgeMode::Loopback => {
                        let Some(sid) = self.stream_sid.as_deref() else {
                            self.stats.dropped += 1;
                            debug!(call_id = %self.call_id, "Dropping echo before streamSid");
                            return;
                        };
                        let echo = translator::media_frame(sid, frame.into_payload());
                        self.send_telephony(&echo);
                    }
                }
            }
            TelephonyInput::Stop => {
                info!(
                    call_id = %self.call_id,
                    stream_sid = self.stream_sid.as_deref().unwrap_or("-"),
                    pending_turn = self.trigger.is_armed(),
                    "Stream stopped"
                );
                if self.mode == BridgeMode::Relay && self.ai.is_open() {
                    self.trigger.cancel();
                    self.commit_turn(&translator::to_ai(&TelephonyInput::Stop));
                }
                self.teardown(TeardownReason::Stop);
            }
            TelephonyInput::Ignored(kind) => {
                debug!(call_id = %self.call_id, event = kind, "Ignoring telephony event");
            }
        }
    }

    fn on_stream_start(&mut self, start: StreamStart) {
        let StreamStart {
            stream_sid,
            call_sid,
            encoding,
            sample_rate,
        } = start;

        if let Some(previous) = &self.stream_sid {
            warn!(
                call_id = %self.call_id,
                previous = %previous,
                "Repeated start event, replacing streamSid"
            );
        }

        if let Some(encoding) = encoding.as_deref()
            && !self.settings.audio_format.matches_telephony_encoding(encoding)
        {
            warn!(
                call_id = %self.call_id,
                encoding = %encoding,
                expected = %self.settings.audio_format,
                "Telephony media format differs from configured format, audio is not transcoded"
            );
        }
        if let Some(rate) = sample_rate
            && rate != self.settings.audio_format.sample_rate()
        {
            warn!(
                call_id = %self.call_id,
                sample_rate = rate,
                expected = self.settings.audio_format.sample_rate(),
                "Telephony sample rate differs from configured format, audio is not resampled"
            );
        }

        info!(
            call_id = %self.call_id,
            stream_sid = %stream_sid,
            call_sid = call_sid.as_deref().unwrap_or("-"),
            "Stream started"
        );
        self.stream_sid = Some(stream_sid);
        self.refresh_state();
    }

    fn send_telephony(&mut self, frame: &TelephonyOutbound) {
        match translator::encode(frame) {
            Ok(text) => {
                if self.telephony.send_text(text) {
                    self.stats.frames_out += 1;
                } else {
                    self.stats.dropped += 1;
                }
            }
            Err(e) => {
                self.stats.dropped += 1;
                error!(call_id = %self.call_id, "Failed to encode telephony frame: {}", e);
            }
        }
    }

    // -------------------------------------------------------------------------
    // AI leg
    // -------------------------------------------------------------------------

    fn on_ai_opened(&mut self, mut leg: Leg) {
        if self.state.is_terminating() || self.mode == BridgeMode::Loopback {
            debug!(call_id = %self.call_id, "Closing unneeded AI leg");
            leg.close();
            return;
        }

        info!(call_id = %self.call_id, "AI leg open");
        self.ai = leg;

        if !self.ai_configured {
            self.ai_configured = true;
            self.send_ai(&translator::session_update(&self.settings));
            if self.settings.greets_on_open() {
                debug!(call_id = %self.call_id, "Requesting greeting");
                self.send_ai(&ClientEvent::ResponseCreate);
            }
        }

        self.refresh_state();
    }

    fn on_ai_text(&mut self, text: &str) {
        let event = match translator::decode_ai(text) {
            Ok(event) => event,
            Err(e) => return self.on_error(e),
        };

        match &event {
            ServerEvent::OutputAudioDelta { .. } => self.forward_to_caller(&event),
            ServerEvent::ResponseCompleted { response } => {
                debug!(
                    call_id = %self.call_id,
                    response_id = ?response.id,
                    status = ?response.status,
                    "Response completed"
                );
            }
            ServerEvent::OutputTextDelta { delta } => {
                debug!(call_id = %self.call_id, "AI text: {}", delta);
            }
            ServerEvent::SessionCreated { session } | ServerEvent::SessionUpdated { session } => {
                debug!(
                    call_id = %self.call_id,
                    session_id = ?session.id,
                    voice = ?session.voice,
                    "AI session acknowledged"
                );
            }
            ServerEvent::Error { error } => {
                warn!(
                    call_id = %self.call_id,
                    error_type = ?error.error_type,
                    code = ?error.code,
                    "AI service error: {}",
                    error.message.as_deref().unwrap_or("unknown")
                );
            }
            ServerEvent::Other => {}
        }
    }

    fn forward_to_caller(&mut self, event: &ServerEvent) {
        let Some(sid) = self.stream_sid.as_deref() else {
            self.stats.dropped += 1;
            debug!(call_id = %self.call_id, "Dropping AI audio before streamSid");
            return;
        };
        if !self.telephony.is_open() {
            self.stats.dropped += 1;
            debug!(call_id = %self.call_id, "Dropping AI audio, telephony leg closed");
            return;
        }

        if let Some(frame) = translator::to_telephony(event, sid) {
            self.send_telephony(&frame);
        }
    }

    fn send_ai(&mut self, event: &ClientEvent) -> bool {
        if !self.ai.is_open() {
            self.stats.dropped += 1;
            debug!(call_id = %self.call_id, event = event.kind(), "AI leg not open, dropping");
            return false;
        }

        match translator::encode(event) {
            Ok(text) => {
                let sent = self.ai.send_text(text);
                if !sent {
                    self.stats.dropped += 1;
                }
                sent
            }
            Err(e) => {
                error!(
                    call_id = %self.call_id,
                    event = event.kind(),
                    "Failed to encode AI event: {}",
                    e
                );
                false
            }
        }
    }

    fn commit_turn(&mut self, events: &[ClientEvent]) {
        if events.iter().all(|event| self.send_ai(event)) {
            self.stats.commits += 1;
            debug!(call_id = %self.call_id, "Turn committed");
        }
    }

    // -------------------------------------------------------------------------
    // Timers
    // -------------------------------------------------------------------------

    fn on_turn_idle(&mut self) {
        if !self.ai.is_open() {
            debug!(call_id = %self.call_id, "Caller went quiet before AI leg opened");
            return;
        }
        self.commit_turn(&translator::turn_complete());
    }

    fn on_keepalive(&mut self) {
        let telephony = self.telephony.ping();
        let ai = self.ai.ping();
        debug!(call_id = %self.call_id, telephony, ai, "Keepalive");
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn refresh_state(&mut self) {
        if self.state != CallState::Connecting || self.stream_sid.is_none() {
            return;
        }
        if self.mode == BridgeMode::Loopback || self.ai.is_open() {
            self.state = CallState::Active;
            info!(call_id = %self.call_id, mode = %self.mode, "Call active");
        }
    }

    fn leg_mut(&mut self, kind: LegKind) -> &mut Leg {
        match kind {
            LegKind::Telephony => &mut self.telephony,
            LegKind::Ai => &mut self.ai,
        }
    }

    fn summary(&mut self) -> SessionSummary {
        SessionSummary {
            call_id: self.call_id.clone(),
            stream_sid: self.stream_sid.clone(),
            mode: self.mode,
            state: self.state,
            duration: self.started_at.elapsed(),
            stats: self.stats,
            reason: self.reason.take().unwrap_or(TeardownReason::EventQueueClosed),
        }
    }
}

/// Connect the AI leg in the background and hand it to the session.
///
/// If the session is already gone when the handshake completes, the new leg
/// is closed on the spot.
pub fn open_ai_leg(
    connector: Arc<dyn AiConnector>,
    call_id: String,
    events: mpsc::Sender<SessionEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match connector.connect(&call_id, events.clone()).await {
            Ok(leg) => {
                if let Err(SendError(SessionEvent::AiOpened(mut leg))) =
                    events.send(SessionEvent::AiOpened(leg)).await
                {
                    debug!(call_id = %call_id, "Session ended during AI handshake, closing leg");
                    leg.close();
                }
            }
            Err(e) => {
                error!(call_id = %call_id, "Failed to open AI leg: {}", e);
                let _ = events.send(SessionEvent::AiFailed(e)).await;
            }
        }
    })
}
