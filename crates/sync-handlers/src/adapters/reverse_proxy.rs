use std::sync::Arc;

use async_trait::async_trait;
use sync_core::{Error, HandlerConfig, Permission};
use tracing::info;

use crate::dispatcher::Dispatcher;
use crate::handler::Handler;

/// Reverse-proxy routing has nothing to mirror today: every event is
/// logged and acknowledged as a no-op. Kept as an explicit handler (rather
/// than omitted) so its priority still participates in dispatch ordering
/// once routing rules do need to react to user/permission events.
pub struct ReverseProxy {
    name: String,
    priority: u32,
    #[allow(dead_code)]
    dispatcher: Arc<Dispatcher>,
}

impl ReverseProxy {
    pub fn new(name: &str, cfg: &HandlerConfig, dispatcher: Arc<Dispatcher>) -> Result<Self, Error> {
        Ok(Self {
            name: name.to_string(),
            priority: cfg.sort_priority(),
            dispatcher,
        })
    }
}

#[async_trait]
impl Handler for ReverseProxy {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    async fn get_resource_id(&self, _resource_full_name: &str) -> Result<String, Error> {
        Err(Error::Other(anyhow::anyhow!(
            "the reverse proxy handler has no resource id concept of its own"
        )))
    }

    async fn user_created(&self, _user_name: &str) -> Result<(), Error> {
        info!(handler = %self.name, "event [user_created] is a no-op for this handler");
        Ok(())
    }

    async fn user_deleted(&self, _user_name: &str) -> Result<(), Error> {
        info!(handler = %self.name, "event [user_deleted] is a no-op for this handler");
        Ok(())
    }

    async fn permission_created(&self, _permission: &Permission) -> Result<(), Error> {
        info!(handler = %self.name, "event [permission_created] is a no-op for this handler");
        Ok(())
    }

    async fn permission_deleted(&self, _permission: &Permission) -> Result<(), Error> {
        info!(handler = %self.name, "event [permission_deleted] is a no-op for this handler");
        Ok(())
    }
}
