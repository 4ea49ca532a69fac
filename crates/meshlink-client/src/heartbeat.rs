use std::time::Duration;

/// Decides when the next keepalive envelope is due.
///
/// The radio drops serial API sessions that stay silent for too long, so a
/// heartbeat goes out on the first step and then once per interval. The
/// timestamp only advances when a heartbeat was actually handed to the
/// transport; a failed send is retried on the next step.
#[derive(Debug, Clone)]
pub struct HeartbeatScheduler {
    interval: Duration,
    last_sent_at: Option<Duration>,
}

impl HeartbeatScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_sent_at: None,
        }
    }

    /// Whether a heartbeat should be sent at `now`.
    pub fn is_due(&self, now: Duration) -> bool {
        match self.last_sent_at {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.interval,
        }
    }

    /// Record a successful heartbeat send.
    pub fn record_sent(&mut self, now: Duration) {
        self.last_sent_at = Some(now);
    }

    pub fn last_sent_at(&self) -> Option<Duration> {
        self.last_sent_at
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
