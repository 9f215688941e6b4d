use std::sync::Arc;

use async_trait::async_trait;
use sync_core::{Error, HandlerConfig, Permission};

use crate::dispatcher::Dispatcher;
use crate::handler::Handler;

fn unimplemented(name: &str, op: &str) -> Error {
    Error::Other(anyhow::anyhow!(
        "handler [{name}] has no implementation for event [{op}] yet"
    ))
}

/// Data-service integration has no concrete behavior defined yet — every
/// operation fails loudly rather than silently succeeding, so a
/// misconfigured `active: true` entry surfaces immediately in dispatch
/// results instead of masquerading as a working handler.
pub struct DataService {
    name: String,
    priority: u32,
    #[allow(dead_code)]
    dispatcher: Arc<Dispatcher>,
}

impl DataService {
    pub fn new(name: &str, cfg: &HandlerConfig, dispatcher: Arc<Dispatcher>) -> Result<Self, Error> {
        Ok(Self {
            name: name.to_string(),
            priority: cfg.sort_priority(),
            dispatcher,
        })
    }
}

#[async_trait]
impl Handler for DataService {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    async fn get_resource_id(&self, _resource_full_name: &str) -> Result<String, Error> {
        Err(unimplemented(&self.name, "get_resource_id"))
    }

    async fn user_created(&self, _user_name: &str) -> Result<(), Error> {
        Err(unimplemented(&self.name, "user_created"))
    }

    async fn user_deleted(&self, _user_name: &str) -> Result<(), Error> {
        Err(unimplemented(&self.name, "user_deleted"))
    }

    async fn permission_created(&self, _permission: &Permission) -> Result<(), Error> {
        Err(unimplemented(&self.name, "permission_created"))
    }

    async fn permission_deleted(&self, _permission: &Permission) -> Result<(), Error> {
        Err(unimplemented(&self.name, "permission_deleted"))
    }
}
