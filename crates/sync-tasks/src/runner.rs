use std::time::Duration;

use sync_core::Error;
use tracing::{debug, warn};

use crate::policy::RetryPolicy;
use crate::task::Task;

/// Runs `Task`s to completion with exponential-backoff retry, the same
/// policy the original request queue applies to every outbound task:
/// retry only on `Error::is_retryable`, give up after `max_attempts`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskRunner {
    policy: RetryPolicy,
}

impl TaskRunner {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub async fn run_with_retry(&self, task: &dyn Task) -> Result<(), Error> {
        let mut attempt = 0;
        loop {
            match task.run().await {
                Ok(()) => return Ok(()),
                Err(err) if err.is_retryable() && attempt + 1 < self.policy.max_attempts => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        task = task.name(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "task failed, retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(task = task.name(), attempt, error = %err, "task failed, giving up");
                    return Err(err);
                }
            }
        }
    }

    /// Runs a sequence of tasks, each with its own retry budget, halting at
    /// the first task that ultimately fails. Later tasks are never
    /// attempted once an earlier one fails — mirrors the chain-abort
    /// behavior of aborting a request chain on first failure.
    pub async fn chain(&self, tasks: &[Box<dyn Task>]) -> Result<(), Error> {
        for task in tasks {
            debug!(task = task.name(), "running chained task");
            self.run_with_retry(task.as_ref()).await?;
        }
        Ok(())
    }

    /// Runs a future to completion, failing with `Error::Other` if it does
    /// not complete within `deadline`.
    pub async fn spawn_with_deadline<F, T>(&self, deadline: Duration, fut: F) -> Result<T, Error>
    where
        F: std::future::Future<Output = Result<T, Error>>,
    {
        match tokio::time::timeout(deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::Other(anyhow::anyhow!(
                "task did not complete within {deadline:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct FlakyTask {
        fails_remaining: Arc<AtomicU32>,
    }

    #[async_trait]
    impl Task for FlakyTask {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn run(&self) -> Result<(), Error> {
            if self.fails_remaining.fetch_sub(1, Ordering::SeqCst) > 0 {
                return Err(Error::Remote {
                    component: "test".into(),
                    source: anyhow::anyhow!("not yet"),
                });
            }
            Ok(())
        }
    }

    struct AlwaysFailsTask;

    #[async_trait]
    impl Task for AlwaysFailsTask {
        fn name(&self) -> &str {
            "doomed"
        }

        async fn run(&self) -> Result<(), Error> {
            Err(Error::validation("x", "always fails"))
        }
    }

    #[tokio::test]
    async fn retries_until_success() {
        let runner = TaskRunner::new(RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            jitter: false,
        });
        let task = FlakyTask {
            fails_remaining: Arc::new(AtomicU32::new(2)),
        };
        runner.run_with_retry(&task).await.unwrap();
    }

    #[tokio::test]
    async fn non_retryable_error_fails_immediately() {
        let runner = TaskRunner::new(RetryPolicy::default());
        let err = runner.run_with_retry(&AlwaysFailsTask).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[tokio::test]
    async fn chain_halts_on_first_failure() {
        let runner = TaskRunner::new(RetryPolicy {
            max_attempts: 1,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
            jitter: false,
        });
        let ran_second = Arc::new(AtomicU32::new(0));
        struct Recording(Arc<AtomicU32>);
        #[async_trait]
        impl Task for Recording {
            fn name(&self) -> &str {
                "recorder"
            }
            async fn run(&self) -> Result<(), Error> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let tasks: Vec<Box<dyn Task>> = vec![
            Box::new(AlwaysFailsTask),
            Box::new(Recording(ran_second.clone())),
        ];
        let err = runner.chain(&tasks).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(ran_second.load(Ordering::SeqCst), 0);
    }
}
