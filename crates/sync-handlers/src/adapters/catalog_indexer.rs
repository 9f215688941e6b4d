use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, Weak};

use async_trait::async_trait;
use sync_core::{Error, HandlerConfig, Permission};
use sync_monitor::{FsCallback, FsMonitorRegistry};
use tracing::info;

use crate::dispatcher::Dispatcher;
use crate::handler::Handler;

/// Keeps a search index in sync with a user's workspace: registers a
/// recursive filesystem monitor on each user's directory as it is
/// created, and tears it down when the user is deleted. `self_ref` exists
/// purely so the handler can hand a `Weak<Self>` to the monitor registry
/// from inside `&self` methods (the registry stores callbacks by `Arc`).
pub struct CatalogIndexer {
    name: String,
    priority: u32,
    workspace_dir: PathBuf,
    registry: Arc<FsMonitorRegistry>,
    #[allow(dead_code)]
    dispatcher: Arc<Dispatcher>,
    self_ref: OnceLock<Weak<CatalogIndexer>>,
}

impl CatalogIndexer {
    /// Unlike the other adapters, returns an `Arc` directly: the monitor
    /// registry needs to hold this handler as an `Arc<dyn FsCallback>`,
    /// and that can only be produced from an `Arc` this type already owns
    /// a weak handle into.
    pub fn new_arc(
        name: &str,
        cfg: &HandlerConfig,
        registry: Arc<FsMonitorRegistry>,
        dispatcher: Arc<Dispatcher>,
    ) -> Result<Arc<Self>, Error> {
        let workspace_dir = cfg.workspace_dir.clone().ok_or_else(|| {
            Error::validation("workspace_dir", "the catalog indexer requires a `workspace_dir`")
        })?;
        let indexer = Arc::new(Self {
            name: name.to_string(),
            priority: cfg.sort_priority(),
            workspace_dir: PathBuf::from(workspace_dir),
            registry,
            dispatcher,
            self_ref: OnceLock::new(),
        });
        let _ = indexer.self_ref.set(Arc::downgrade(&indexer));
        Ok(indexer)
    }

    fn user_workspace_dir(&self, user_name: &str) -> PathBuf {
        self.workspace_dir.join(user_name)
    }

    fn as_callback(&self) -> Arc<dyn FsCallback> {
        self.self_ref
            .get()
            .and_then(Weak::upgrade)
            .expect("self_ref is set immediately after construction")
    }
}

#[async_trait]
impl Handler for CatalogIndexer {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    async fn get_resource_id(&self, _resource_full_name: &str) -> Result<String, Error> {
        Err(Error::Other(anyhow::anyhow!(
            "the catalog indexer has no resource id concept of its own"
        )))
    }

    async fn user_created(&self, user_name: &str) -> Result<(), Error> {
        info!(user = user_name, "start monitoring workspace of created user");
        let dir = self.user_workspace_dir(user_name);
        self.registry
            .register(&dir, true, sync_core::CallbackKind::CatalogIndexer, self.as_callback())?;
        Ok(())
    }

    async fn user_deleted(&self, user_name: &str) -> Result<(), Error> {
        info!(user = user_name, "stop monitoring workspace of removed user");
        let dir = self.user_workspace_dir(user_name);
        self.registry.unregister(&dir, sync_core::CallbackKind::CatalogIndexer)?;
        Ok(())
    }

    async fn permission_created(&self, _permission: &Permission) -> Result<(), Error> {
        Err(Error::Other(anyhow::anyhow!(
            "the catalog indexer does not synchronize permissions"
        )))
    }

    async fn permission_deleted(&self, _permission: &Permission) -> Result<(), Error> {
        Err(Error::Other(anyhow::anyhow!(
            "the catalog indexer does not synchronize permissions"
        )))
    }
}

impl FsCallback for CatalogIndexer {
    fn on_created(&self, path: &Path) -> Result<(), Error> {
        info!(path = %path.display(), "file added to the catalog index");
        Ok(())
    }

    fn on_deleted(&self, path: &Path) -> Result<(), Error> {
        info!(path = %path.display(), "file removed from the catalog index");
        Ok(())
    }

    fn on_modified(&self, path: &Path) -> Result<(), Error> {
        info!(path = %path.display(), "file reindexed");
        Ok(())
    }
}
