pub mod waiter;

use std::time::Duration;

/// How confirmations of submitted transactions are awaited.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TxnConfig {
    /// Delay between two receipt polls.
    pub poll_interval: Duration,
    /// Give up waiting after this long. The transaction itself stays submitted.
    pub timeout: Duration,
}

impl TxnConfig {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(250);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for TxnConfig {
    fn default() -> Self {
        Self { poll_interval: Self::DEFAULT_INTERVAL, timeout: Self::DEFAULT_TIMEOUT }
    }
}
