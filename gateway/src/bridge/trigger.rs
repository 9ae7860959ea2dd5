//! Silence-triggered turn taking
//!
//! The telephony stream carries no end-of-utterance marker, so the bridge
//! treats a quiet period after the last inbound audio frame as the end of the
//! caller's turn. [`TurnTrigger`] is a debounce timer: every `arm` pushes the
//! deadline out, and expiry fires once per arming cycle.

use std::time::Duration;

use tokio::time::{Instant, sleep_until};

/// Default quiet period before committing the caller's audio.
pub const DEFAULT_IDLE_COMMIT: Duration = Duration::from_millis(800);

/// Rearmable single-shot timer owned by one session.
#[derive(Debug)]
pub struct TurnTrigger {
    quiet_period: Duration,
    deadline: Option<Instant>,
}

impl TurnTrigger {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            deadline: None,
        }
    }

    /// Schedule expiry one quiet period from now, replacing any pending one.
    /// A period too large to schedule leaves the trigger disarmed.
    pub fn arm(&mut self) {
        self.deadline = Instant::now().checked_add(self.quiet_period);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolves when the armed deadline passes; pending forever while disarmed.
    ///
    /// Cancel safe: dropping the future before expiry leaves the deadline
    /// untouched, so it can be polled again from a `select!` loop.
    pub async fn expired(&mut self) {
        match self.deadline {
            Some(deadline) => {
                sleep_until(deadline).await;
                self.deadline = None;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

impl Default for TurnTrigger {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_COMMIT)
    }
}
