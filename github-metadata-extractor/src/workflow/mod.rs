//! In-process step execution engine.
//!
//! Every unit of work in a run is executed as a named step. The executor
//! bounds each attempt by a timeout, retries failures with exponential
//! backoff, emits periodic heartbeats while the step is running, and records
//! the outcome of every step in a history that the caller can inspect.

mod error;
mod policy;

pub use error::{BoxError, Retryable, StepError};
pub use policy::{RetryPolicy, StepOptions};

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info_span, warn, Instrument};

/// Final outcome of a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Failed { error: String },
}

/// History entry of one executed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    /// Attempts made, including the last one.
    pub attempts: u32,
    /// Heartbeats emitted across all attempts.
    pub heartbeats: u32,
    /// Wall time from the first attempt to the outcome, backoff included.
    pub elapsed_ms: u64,
    #[serde(flatten)]
    pub status: StepStatus,
}

/// Result of a single attempt.
enum Attempt<T, E> {
    Finished(Result<T, E>),
    TimedOut,
}

/// Executes steps and keeps their history.
///
/// Clones share the same history, so concurrently running branches of a
/// run report into one place.
#[derive(Debug, Clone, Default)]
pub struct StepExecutor {
    history: Arc<Mutex<Vec<StepRecord>>>,
}

impl StepExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all recorded steps in completion order.
    pub fn history(&self) -> Vec<StepRecord> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Runs `operation` under the given options.
    ///
    /// `operation` is invoked once per attempt. Each attempt is cancelled
    /// when it exceeds `options.timeout`; timeouts and retryable errors
    /// consume an attempt, non-retryable errors fail the step immediately.
    pub async fn execute<T, E, F, Fut>(
        &self,
        options: &StepOptions,
        mut operation: F,
    ) -> Result<T, StepError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: StdError + Retryable + Send + Sync + 'static,
    {
        let span = info_span!("step", step = %options.name);
        let started = Instant::now();
        let max_attempts = options.retry.max_attempts.max(1);
        let heartbeat_period = options.heartbeat_interval.max(Duration::from_millis(1));
        let mut heartbeats = 0u32;
        let mut attempt = 0u32;

        let result = async {
            loop {
                attempt += 1;
                debug!(attempt, "Starting attempt");

                let outcome = {
                    let work = operation();
                    tokio::pin!(work);
                    let deadline = tokio::time::sleep(options.timeout);
                    tokio::pin!(deadline);
                    let mut ticker = tokio::time::interval_at(
                        tokio::time::Instant::now() + heartbeat_period,
                        heartbeat_period,
                    );

                    loop {
                        tokio::select! {
                            biased;
                            result = &mut work => break Attempt::Finished(result),
                            () = &mut deadline => break Attempt::TimedOut,
                            _ = ticker.tick() => {
                                heartbeats += 1;
                                debug!(attempt, heartbeats, "Heartbeat");
                            }
                        }
                    }
                };

                let exhausted = attempt >= max_attempts;
                match outcome {
                    Attempt::Finished(Ok(value)) => return Ok(value),
                    Attempt::Finished(Err(error)) if !error.is_retryable() => {
                        return Err(StepError::NonRetryable {
                            step: options.name.clone(),
                            source: Box::new(error),
                        });
                    }
                    Attempt::Finished(Err(error)) if exhausted => {
                        return Err(StepError::RetriesExhausted {
                            step: options.name.clone(),
                            attempts: attempt,
                            source: Box::new(error),
                        });
                    }
                    Attempt::TimedOut if exhausted => {
                        return Err(StepError::TimeoutExceeded {
                            step: options.name.clone(),
                            timeout: options.timeout,
                            attempts: attempt,
                        });
                    }
                    Attempt::Finished(Err(error)) => {
                        warn!(attempt, error = %error, "Attempt failed, retrying");
                    }
                    Attempt::TimedOut => {
                        warn!(attempt, timeout = ?options.timeout, "Attempt timed out, retrying");
                    }
                }

                tokio::time::sleep(options.retry.delay_for_attempt(attempt)).await;
            }
        }
        .instrument(span)
        .await;

        let status = match &result {
            Ok(_) => StepStatus::Completed,
            Err(error) => StepStatus::Failed {
                error: error.to_string(),
            },
        };
        self.record(StepRecord {
            name: options.name.clone(),
            attempts: attempt,
            heartbeats,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            status,
        });

        result
    }

    fn record(&self, record: StepRecord) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, thiserror::Error)]
    #[error("flaky ({retryable})")]
    struct Flaky {
        retryable: bool,
    }

    impl Retryable for Flaky {
        fn is_retryable(&self) -> bool {
            self.retryable
        }
    }

    fn fast_options(name: &str, max_attempts: u32) -> StepOptions {
        StepOptions::new(name, Duration::from_secs(5))
            .with_retry(RetryPolicy {
                max_attempts,
                backoff_coefficient: 2.0,
                initial_interval: Duration::from_millis(1),
                maximum_interval: None,
            })
            .with_heartbeat_interval(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let executor = StepExecutor::new();
        let calls = AtomicU32::new(0);

        let value = executor
            .execute(&fast_options("flaky", 6), || {
                let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if call < 3 {
                        Err(Flaky { retryable: true })
                    } else {
                        Ok(call)
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 3);
        let history = executor.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].attempts, 3);
        assert_eq!(history[0].status, StepStatus::Completed);
    }

    #[tokio::test]
    async fn exhausts_retries() {
        let executor = StepExecutor::new();
        let calls = AtomicU32::new(0);

        let error = executor
            .execute(&fast_options("always_fails", 4), || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(Flaky { retryable: true }) }
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(matches!(
            error,
            StepError::RetriesExhausted { attempts: 4, .. }
        ));
        assert!(error.downcast_source::<Flaky>().is_some());
        assert!(matches!(
            executor.history()[0].status,
            StepStatus::Failed { .. }
        ));
    }

    #[tokio::test]
    async fn non_retryable_errors_fail_immediately() {
        let executor = StepExecutor::new();
        let calls = AtomicU32::new(0);

        let error = executor
            .execute(&fast_options("fatal", 6), || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(Flaky { retryable: false }) }
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(error, StepError::NonRetryable { .. }));
        assert_eq!(error.step(), "fatal");
    }

    #[tokio::test]
    async fn timeouts_consume_attempts() {
        let executor = StepExecutor::new();
        let calls = AtomicU32::new(0);
        let options = StepOptions {
            timeout: Duration::from_millis(20),
            ..fast_options("slow", 2)
        };

        let error = executor
            .execute(&options, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok::<(), Flaky>(())
                }
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(matches!(
            error,
            StepError::TimeoutExceeded { attempts: 2, .. }
        ));
    }

    #[tokio::test]
    async fn counts_heartbeats_of_long_steps() {
        let executor = StepExecutor::new();

        executor
            .execute(&fast_options("heartbeat", 1), || async {
                tokio::time::sleep(Duration::from_millis(55)).await;
                Ok::<(), Flaky>(())
            })
            .await
            .unwrap();

        let record = &executor.history()[0];
        assert!(record.heartbeats >= 1, "heartbeats: {}", record.heartbeats);
    }

    #[tokio::test]
    async fn clones_share_history() {
        let executor = StepExecutor::new();
        let clone = executor.clone();

        clone
            .execute(&fast_options("one", 1), || async { Ok::<_, Flaky>(1) })
            .await
            .unwrap();

        assert_eq!(executor.history().len(), 1);
        assert_eq!(executor.history()[0].name, "one");
    }
}
