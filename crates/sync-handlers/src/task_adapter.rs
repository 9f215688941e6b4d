//! Adapts an adapter's outbound network call into a `sync_tasks::Task` so it
//! can be run through `TaskRunner::run_with_retry` without a distinct struct
//! per call site.

use std::future::Future;
use std::sync::Mutex;

use async_trait::async_trait;
use sync_core::Error;
use sync_tasks::{Task, TaskRunner};

struct ClosureTask<F> {
    name: String,
    make: F,
}

#[async_trait]
impl<F, Fut> Task for ClosureTask<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), Error>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> Result<(), Error> {
        (self.make)().await
    }
}

/// Runs a fallible, retryable call to a remote component through
/// `runner`'s retry-with-backoff policy, returning the value it produces.
/// `make` may be invoked more than once, so it must build and send a fresh
/// request on every call.
pub async fn call_with_retry<F, Fut, T>(
    runner: &TaskRunner,
    name: impl Into<String>,
    make: F,
) -> Result<T, Error>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, Error>> + Send,
    T: Send,
{
    let slot: Mutex<Option<T>> = Mutex::new(None);
    let task = ClosureTask {
        name: name.into(),
        make: || async {
            let value = make().await?;
            *slot.lock().expect("mutex never poisoned") = Some(value);
            Ok(())
        },
    };
    runner.run_with_retry(&task).await?;
    Ok(slot
        .into_inner()
        .expect("mutex never poisoned")
        .expect("run_with_retry returned Ok without producing a value"))
}
