use async_trait::async_trait;
use sync_core::{Error, Permission};

/// Notified of user and permission lifecycle events mirrored from the
/// authoritative permission component into this handler's own component.
/// Every active handler implements all five operations; handlers for
/// which an operation is a no-op (e.g. a proxy with nothing to mirror for
/// `user_deleted`) simply return `Ok(())`.
#[async_trait]
pub trait Handler: Send + Sync {
    fn name(&self) -> &str;

    /// Sort key for dispatch ordering — lower runs first. Handlers with no
    /// configured priority sort last (`HandlerConfig::sort_priority`).
    fn priority(&self) -> u32;

    /// Resolves (creating if necessary) this handler's resource id for a
    /// slash-separated resource path, using the handler's own knowledge of
    /// its component's resource type hierarchy.
    async fn get_resource_id(&self, resource_full_name: &str) -> Result<String, Error>;

    async fn user_created(&self, user_name: &str) -> Result<(), Error>;
    async fn user_deleted(&self, user_name: &str) -> Result<(), Error>;
    async fn permission_created(&self, permission: &Permission) -> Result<(), Error>;
    async fn permission_deleted(&self, permission: &Permission) -> Result<(), Error>;
}
