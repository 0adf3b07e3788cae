//! Rate limiting for connection failure logs.
//!
//! Every `ensure_connected` call still attempts a connection; this only
//! decides whether the failure gets logged. The window starts at
//! [`LOG_BACKOFF_BASE`] and doubles after each logged failure, with no cap.
//! A successful connect resets it.

use std::time::Duration;

use tokio::time::Instant;

use hassbridge_protocol::constants::LOG_BACKOFF_BASE;

#[derive(Debug, Clone)]
pub(crate) struct LogBackoff {
    base: Duration,
    window: Duration,
    next_log_at: Option<Instant>,
    /// Set once the window no longer fits in an `Instant`.
    silenced: bool,
}

impl Default for LogBackoff {
    fn default() -> Self {
        Self::new(LOG_BACKOFF_BASE)
    }
}

impl LogBackoff {
    pub(crate) fn new(base: Duration) -> Self {
        Self {
            base,
            window: base,
            next_log_at: None,
            silenced: false,
        }
    }

    /// Whether a failure observed at `now` should be logged.
    pub(crate) fn should_log(&self, now: Instant) -> bool {
        !self.silenced && self.next_log_at.is_none_or(|at| now >= at)
    }

    /// Opens a new window after a failure was logged at `now`.
    pub(crate) fn record_logged_failure(&mut self, now: Instant) {
        match now.checked_add(self.window) {
            Some(at) => self.next_log_at = Some(at),
            None => self.silenced = true,
        }
        self.window = self.window.saturating_mul(2);
    }

    pub(crate) fn reset(&mut self) {
        self.window = self.base;
        self.next_log_at = None;
        self.silenced = false;
    }

    pub(crate) fn window(&self) -> Duration {
        self.window
    }
}
