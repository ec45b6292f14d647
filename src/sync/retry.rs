use std::time::Duration;

/// When a failed send is retried without a reconnect signal
///
/// Delays grow as `base_delay * 2^(attempt - 1)` up to `max_delay`. Once
/// `max_attempts` consecutive failures have been seen only a reconnect or an
/// explicit retry unblocks the queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// `Some(0)` disables timed retries entirely
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
            max_attempts: Some(5),
        }
    }
}

impl RetryPolicy {
    /// Retry only when connectivity is reported back, never on a timer
    pub fn reconnect_only() -> Self {
        Self {
            max_attempts: Some(0),
            ..Self::default()
        }
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_max_attempts(mut self, attempts: Option<u32>) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Delay before the timed retry following the `consecutive_failures`-th failure
    pub fn delay_for(&self, consecutive_failures: u32) -> Option<Duration> {
        if consecutive_failures == 0 {
            return None;
        }
        if let Some(max) = self.max_attempts {
            if consecutive_failures > max {
                return None;
            }
        }

        let exponent = (consecutive_failures - 1).min(16);
        let delay = self.base_delay.saturating_mul(1u32 << exponent);
        Some(delay.min(self.max_delay))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base_delay.is_zero() && self.max_attempts != Some(0) {
            return Err("Retry base delay must be greater than 0".to_string());
        }
        if self.max_delay < self.base_delay {
            return Err("Retry max delay must not be below the base delay".to_string());
        }
        Ok(())
    }
}
