//! # Logging
//!
//! The driver logs through the `log` facade. Binaries call [`init_logger`]
//! to install `env_logger` (`RUST_LOG=rfm69_radio=debug` shows mode changes
//! and fragments). Code that may log from interrupt context goes through a
//! [`LogThrottle`] so a wedged bus cannot flood the output.

use std::time::{Duration, Instant};

/// Initializes the logger with the `env_logger` crate.
pub fn init_logger() {
    env_logger::init();
}

/// Initializes `env_logger` with `default_filter` unless `RUST_LOG` is set.
///
/// Returns false if a logger was already installed.
pub fn init_logger_with_default(default_filter: &str) -> bool {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .try_init()
        .is_ok()
}

/// Caps the number of messages emitted per time window
#[derive(Debug, Clone)]
pub struct LogThrottle {
    window: Duration,
    cap: u32,
    count: u32,
    suppressed: u32,
    t0: Instant,
}

impl LogThrottle {
    /// Create new throttle with window and message cap
    pub fn new(window_ms: u64, cap: u32) -> Self {
        Self {
            window: Duration::from_millis(window_ms),
            cap,
            count: 0,
            suppressed: 0,
            t0: Instant::now(),
        }
    }

    /// Check if logging is allowed (resets counter after window expires)
    pub fn allow(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.t0) > self.window {
            self.t0 = now;
            self.count = 0;
        }

        self.count = self.count.saturating_add(1);
        let allowed = self.count <= self.cap;
        if !allowed {
            self.suppressed = self.suppressed.saturating_add(1);
        }
        allowed
    }

    /// Messages dropped since the throttle was created
    pub fn suppressed(&self) -> u32 {
        self.suppressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttle_caps_messages_per_window() {
        let mut throttle = LogThrottle::new(1000, 3);

        assert!(throttle.allow());
        assert!(throttle.allow());
        assert!(throttle.allow());
        assert!(!throttle.allow());
        assert_eq!(throttle.suppressed(), 1);
    }

    #[test]
    fn throttle_reopens_after_window() {
        let mut throttle = LogThrottle::new(5, 1);
        assert!(throttle.allow());
        assert!(!throttle.allow());

        std::thread::sleep(Duration::from_millis(20));
        assert!(throttle.allow());
    }
}
