//! Debounced "style changed" notification.
//!
//! Source loads, `idle` and manual toggles all call [`StyleChangeSignal::notify`];
//! the owner polls once per frame and refreshes the legend when a burst of
//! notifications has gone quiet.

use instant::Instant;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct StyleChangeSignal {
    debounce: Duration,
    last_notice: Option<Instant>,
    fired: u64,
}

impl StyleChangeSignal {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            last_notice: None,
            fired: 0,
        }
    }

    pub fn notify(&mut self, now: Instant) {
        self.last_notice = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.last_notice.is_some()
    }

    /// True once per burst, when `debounce` has passed since the last notice
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.last_notice {
            Some(last) if now >= last && now.duration_since(last) >= self.debounce => {
                self.last_notice = None;
                self.fired += 1;
                true
            }
            _ => false,
        }
    }

    /// Drops a pending notice, e.g. after a refresh that already ran
    pub fn clear(&mut self) {
        self.last_notice = None;
    }

    /// Number of times the signal has fired
    pub fn fired(&self) -> u64 {
        self.fired
    }
}

impl Default for StyleChangeSignal {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}
