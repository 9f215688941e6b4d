use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use sync_core::{Error, HandlerConfig, Permission};
use sync_monitor::FsCallback;
use tracing::info;

use crate::dispatcher::Dispatcher;
use crate::handler::Handler;

const NOTEBOOKS_DIR_NAME: &str = "notebooks";

/// Keeps each user's workspace directory in sync with the platform: one
/// directory per user, with a symlink into the JupyterHub user-data
/// directory when configured. Does not participate in permission
/// synchronization — the filesystem has no access-control model of its
/// own for this to attach to.
pub struct WorkspaceFilesystem {
    name: String,
    priority: u32,
    workspace_dir: PathBuf,
    jupyterhub_user_data_dir: Option<PathBuf>,
    #[allow(dead_code)]
    dispatcher: Arc<Dispatcher>,
}

impl WorkspaceFilesystem {
    pub fn new(name: &str, cfg: &HandlerConfig, dispatcher: Arc<Dispatcher>) -> Result<Self, Error> {
        let workspace_dir = cfg.workspace_dir.clone().ok_or_else(|| {
            Error::validation("workspace_dir", "the filesystem handler requires a `workspace_dir`")
        })?;
        Ok(Self {
            name: name.to_string(),
            priority: cfg.sort_priority(),
            workspace_dir: PathBuf::from(workspace_dir),
            jupyterhub_user_data_dir: cfg.get_str("jupyterhub_user_data_dir").map(PathBuf::from),
            dispatcher,
        })
    }

    fn user_workspace_dir(&self, user_name: &str) -> PathBuf {
        self.workspace_dir.join(user_name)
    }

    fn jupyterhub_user_dir(&self, user_name: &str) -> Option<PathBuf> {
        self.jupyterhub_user_data_dir.as_ref().map(|base| base.join(user_name))
    }
}

#[async_trait]
impl Handler for WorkspaceFilesystem {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    async fn get_resource_id(&self, _resource_full_name: &str) -> Result<String, Error> {
        Err(Error::Other(anyhow::anyhow!(
            "the filesystem handler has no resource id concept of its own"
        )))
    }

    async fn user_created(&self, user_name: &str) -> Result<(), Error> {
        let dir = self.user_workspace_dir(user_name);
        match tokio::fs::create_dir(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                info!(path = %dir.display(), "user workspace directory already exists, skipping creation");
            }
            Err(e) => {
                return Err(Error::Other(anyhow::anyhow!(e).context(format!(
                    "failed to create user workspace directory {}",
                    dir.display()
                ))))
            }
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o755);
            tokio::fs::set_permissions(&dir, perms)
                .await
                .map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
        }

        if let Some(source) = self.jupyterhub_user_dir(user_name) {
            let link = dir.join(NOTEBOOKS_DIR_NAME);
            let existing_target = tokio::fs::read_link(&link).await.ok();
            let needs_link = match &existing_target {
                Some(target) => target != &source,
                None => !link.exists(),
            };
            if needs_link {
                if link.exists() || existing_target.is_some() {
                    tokio::fs::remove_file(&link).await.ok();
                }
                symlink_dir(&source, &link)
                    .await
                    .map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
            }
        }
        Ok(())
    }

    async fn user_deleted(&self, user_name: &str) -> Result<(), Error> {
        let dir = self.user_workspace_dir(user_name);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %dir.display(), "user workspace directory not found, skipping removal");
                Ok(())
            }
            Err(e) => Err(Error::Other(anyhow::anyhow!(e))),
        }
    }

    async fn permission_created(&self, _permission: &Permission) -> Result<(), Error> {
        Err(Error::Other(anyhow::anyhow!(
            "the filesystem handler does not synchronize permissions"
        )))
    }

    async fn permission_deleted(&self, _permission: &Permission) -> Result<(), Error> {
        Err(Error::Other(anyhow::anyhow!(
            "the filesystem handler does not synchronize permissions"
        )))
    }
}

#[cfg(unix)]
async fn symlink_dir(source: &Path, link: &Path) -> std::io::Result<()> {
    tokio::fs::symlink(source, link).await
}

#[cfg(not(unix))]
async fn symlink_dir(_source: &Path, _link: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "symlinking a user workspace is only supported on unix",
    ))
}

impl FsCallback for WorkspaceFilesystem {
    fn on_created(&self, path: &Path) -> Result<(), Error> {
        info!(path = %path.display(), handler = %self.name, "workspace path created");
        Ok(())
    }

    fn on_deleted(&self, path: &Path) -> Result<(), Error> {
        info!(path = %path.display(), handler = %self.name, "workspace path deleted");
        Ok(())
    }

    fn on_modified(&self, path: &Path) -> Result<(), Error> {
        info!(path = %path.display(), handler = %self.name, "workspace path modified");
        Ok(())
    }
}
