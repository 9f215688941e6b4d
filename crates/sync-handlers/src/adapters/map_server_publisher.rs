use std::sync::Arc;

use async_trait::async_trait;
use sync_core::{Access, Error, HandlerConfig, Permission};
use sync_tasks::TaskRunner;

use crate::dispatcher::Dispatcher;
use crate::handler::Handler;
use crate::task_adapter::call_with_retry;

/// Publishes workspaces/layers on a map server and mirrors permission
/// decisions onto its own access-control layer. Resource creation is
/// idempotent: publishing an already-published layer is a no-op.
pub struct MapServerPublisher {
    name: String,
    priority: u32,
    url: String,
    client: reqwest::Client,
    #[allow(dead_code)]
    dispatcher: Arc<Dispatcher>,
    task_runner: Arc<TaskRunner>,
}

impl MapServerPublisher {
    pub fn new(
        name: &str,
        cfg: &HandlerConfig,
        dispatcher: Arc<Dispatcher>,
        task_runner: Arc<TaskRunner>,
    ) -> Result<Self, Error> {
        Ok(Self {
            name: name.to_string(),
            priority: cfg.sort_priority(),
            url: cfg
                .url
                .clone()
                .ok_or_else(|| Error::validation("url", "the map server handler requires a `url`"))?,
            client: reqwest::Client::new(),
            dispatcher,
            task_runner,
        })
    }
}

#[async_trait]
impl Handler for MapServerPublisher {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    async fn get_resource_id(&self, resource_full_name: &str) -> Result<String, Error> {
        call_with_retry(
            &self.task_runner,
            format!("{}:publish_workspace", self.name),
            || async {
                let resp = self
                    .client
                    .post(format!("{}/workspaces", self.url))
                    .json(&serde_json::json!({ "path": resource_full_name }))
                    .send()
                    .await
                    .map_err(|e| Error::Remote {
                        component: self.name.clone(),
                        source: e.into(),
                    })?;
                if !resp.status().is_success() {
                    return Err(Error::Remote {
                        component: self.name.clone(),
                        source: anyhow::anyhow!("workspace publish returned {}", resp.status()),
                    });
                }
                Ok(resource_full_name.replace('/', "."))
            },
        )
        .await
    }

    async fn user_created(&self, _user_name: &str) -> Result<(), Error> {
        Ok(())
    }

    async fn user_deleted(&self, _user_name: &str) -> Result<(), Error> {
        Ok(())
    }

    async fn permission_created(&self, permission: &Permission) -> Result<(), Error> {
        let resource_id = self.get_resource_id(&permission.resource_full_name).await?;
        let allow = matches!(permission.access, Access::Allow);
        call_with_retry(
            &self.task_runner,
            format!("{}:update_security_rule", self.name),
            || async {
                let resp = self
                    .client
                    .put(format!("{}/layers/{resource_id}/security", self.url))
                    .json(&serde_json::json!({
                        "rule": permission.name,
                        "allow": allow,
                    }))
                    .send()
                    .await
                    .map_err(|e| Error::Remote {
                        component: self.name.clone(),
                        source: e.into(),
                    })?;
                if resp.status().is_success() {
                    Ok(())
                } else {
                    Err(Error::Remote {
                        component: self.name.clone(),
                        source: anyhow::anyhow!("security rule update returned {}", resp.status()),
                    })
                }
            },
        )
        .await
    }

    async fn permission_deleted(&self, permission: &Permission) -> Result<(), Error> {
        let resource_id = self.get_resource_id(&permission.resource_full_name).await?;
        call_with_retry(
            &self.task_runner,
            format!("{}:remove_security_rule", self.name),
            || async {
                let resp = self
                    .client
                    .delete(format!(
                        "{}/layers/{resource_id}/security/{}",
                        self.url, permission.name
                    ))
                    .send()
                    .await
                    .map_err(|e| Error::Remote {
                        component: self.name.clone(),
                        source: e.into(),
                    })?;
                if resp.status().is_success() || resp.status() == reqwest::StatusCode::NOT_FOUND {
                    Ok(())
                } else {
                    Err(Error::Remote {
                        component: self.name.clone(),
                        source: anyhow::anyhow!("security rule removal returned {}", resp.status()),
                    })
                }
            },
        )
        .await
    }
}
