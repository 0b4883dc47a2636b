use std::time::Duration;

/// Exponential backoff retry policy of a step.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Multiplier applied to the interval after each failed attempt.
    pub backoff_coefficient: f64,
    /// Delay before the second attempt.
    pub initial_interval: Duration,
    /// Upper bound on any single delay.
    pub maximum_interval: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            backoff_coefficient: 2.0,
            initial_interval: Duration::from_secs(1),
            maximum_interval: Some(Duration::from_secs(100)),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (1-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.backoff_coefficient.powi(exponent);
        let delay = Duration::try_from_secs_f64(self.initial_interval.as_secs_f64() * factor)
            .unwrap_or(Duration::MAX);

        match self.maximum_interval {
            Some(max) => delay.min(max),
            None => delay,
        }
    }
}

/// Execution options of a single step.
#[derive(Debug, Clone)]
pub struct StepOptions {
    /// Name recorded in the step history and logs.
    pub name: String,
    pub retry: RetryPolicy,
    /// Limit applied to each attempt.
    pub timeout: Duration,
    pub heartbeat_interval: Duration,
}

impl StepOptions {
    /// Creates options for step `name` with the default retry policy and
    /// heartbeat interval.
    pub fn new(name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            retry: RetryPolicy::default(),
            timeout,
            heartbeat_interval: Duration::from_secs(10),
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets how often a running attempt emits a heartbeat.
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }
}
