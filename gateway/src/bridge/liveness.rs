//! Keepalive pings for both legs of a call.
//!
//! Load balancers and proxies drop WebSocket connections that look idle. A
//! call with a silent caller and a silent model would trip that, so the
//! session pings both legs on a fixed interval.

use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

/// Default keepalive period.
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug)]
pub struct Keepalive {
    interval: Option<Interval>,
}

impl Keepalive {
    /// Start ticking one `period` from now. `None`, zero, or a period too
    /// large to schedule disables the monitor.
    pub fn new(period: Option<Duration>) -> Self {
        let interval = period.filter(|p| !p.is_zero()).and_then(|period| {
            let start = Instant::now().checked_add(period)?;
            let mut interval = interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            Some(interval)
        });
        Self { interval }
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    pub fn cancel(&mut self) {
        self.interval = None;
    }

    /// Resolves on the next tick; pending forever once cancelled.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
