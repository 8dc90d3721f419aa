//! System clock adapter

use chrono::{DateTime, Utc};
use runi_application::ports::Clock;

/// Wall clock backed by the operating system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Creates a new system clock.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_millis_tracks_now() {
        let clock = SystemClock::new();
        let before = Utc::now().timestamp_millis();
        let millis = clock.now_millis();
        let after = Utc::now().timestamp_millis();

        assert!(before <= millis && millis <= after);
    }
}
