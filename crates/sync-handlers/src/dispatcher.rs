use std::sync::Arc;

use sync_core::{Error, HandlerError, Permission};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::handler::Handler;

/// Fans webhook events out to every active handler. Every handler is
/// always attempted regardless of earlier failures within the same
/// dispatch round; failures are collected and surfaced together so one
/// broken downstream component never silently swallows another's update.
pub struct Dispatcher {
    handlers: RwLock<Vec<Arc<dyn Handler>>>,
}

macro_rules! dispatch_round {
    ($self:ident, $op_name:literal, $method:ident($($arg:expr),*)) => {{
        let handlers = $self.handlers.read().await.clone();
        let mut errors = Vec::new();
        for handler in handlers {
            let handler_name = handler.name().to_string();
            match handler.$method($($arg),*).await {
                Ok(()) => info!(handler = %handler_name, op = $op_name, "handler dispatch succeeded"),
                Err(source) => {
                    warn!(handler = %handler_name, op = $op_name, error = %source, "handler dispatch failed");
                    errors.push(HandlerError {
                        handler: handler_name,
                        source: source.into(),
                    });
                }
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Dispatch(errors))
        }
    }};
}

impl Dispatcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            handlers: RwLock::new(Vec::new()),
        })
    }

    /// Installs the active handler set, sorted ascending by priority
    /// (stable, so handlers sharing a priority keep their config order).
    pub async fn set_handlers(&self, mut handlers: Vec<Arc<dyn Handler>>) {
        handlers.sort_by_key(|h| h.priority());
        *self.handlers.write().await = handlers;
    }

    /// The currently installed handler set, in dispatch order. Used by the
    /// HTTP layer's introspection routes (`/handlers`, `/handlers/:name`).
    pub async fn handlers(&self) -> Vec<Arc<dyn Handler>> {
        self.handlers.read().await.clone()
    }

    pub async fn dispatch_user_created(&self, user_name: &str) -> Result<(), Error> {
        dispatch_round!(self, "user_created", user_created(user_name))
    }

    pub async fn dispatch_user_deleted(&self, user_name: &str) -> Result<(), Error> {
        dispatch_round!(self, "user_deleted", user_deleted(user_name))
    }

    pub async fn dispatch_permission_created(&self, permission: &Permission) -> Result<(), Error> {
        dispatch_round!(self, "permission_created", permission_created(permission))
    }

    pub async fn dispatch_permission_deleted(&self, permission: &Permission) -> Result<(), Error> {
        dispatch_round!(self, "permission_deleted", permission_deleted(permission))
    }
}
