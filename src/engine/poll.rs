use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// Fixed-delay polling: up to `max_attempts` status checks, `delay` apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl PollPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), delay }
    }

    /// No waiting between checks.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_DELAY)
    }
}
