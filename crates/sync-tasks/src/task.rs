use async_trait::async_trait;
use sync_core::Error;

/// One retryable unit of work dispatched to a remote component — a
/// permission push, a workspace filesystem operation, a catalog reindex.
/// `name` is used only for logging and error messages.
#[async_trait]
pub trait Task: Send + Sync {
    fn name(&self) -> &str;
    async fn run(&self) -> Result<(), Error>;
}
