use std::sync::Arc;

use async_trait::async_trait;
use sync_core::{Error, HandlerConfig, Permission, ResourceTreeNode, SyncPoint, TargetSegment};
use sync_engine::SyncPointEngine;
use sync_tasks::TaskRunner;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::dispatcher::Dispatcher;
use crate::handler::Handler;
use crate::task_adapter::call_with_retry;

/// Mirrors the permission authority itself (the component webhook events
/// originate from). Keeps an admin session cookie and re-authenticates on
/// 401/403, and is the one handler whose `permission_created`/
/// `permission_deleted` also drives sync-point propagation, since every
/// other component's mirrored permission is itself sourced from here: the
/// permission tree for every mirrored component is held inside this
/// component's own resource tree, so propagating a permission to another
/// component means creating or deleting a permission on one of this
/// component's own resources.
pub struct AuthoritativeMirror {
    name: String,
    priority: u32,
    url: String,
    admin_user: String,
    admin_password: String,
    client: reqwest::Client,
    cookie: Mutex<Option<String>>,
    #[allow(dead_code)]
    dispatcher: Arc<Dispatcher>,
    sync_points: Arc<Vec<SyncPoint>>,
    task_runner: Arc<TaskRunner>,
}

impl AuthoritativeMirror {
    pub fn new(
        name: &str,
        cfg: &HandlerConfig,
        dispatcher: Arc<Dispatcher>,
        sync_points: Arc<Vec<SyncPoint>>,
        task_runner: Arc<TaskRunner>,
    ) -> Result<Self, Error> {
        Ok(Self {
            name: name.to_string(),
            priority: cfg.sort_priority(),
            url: cfg.url.clone().ok_or_else(|| {
                Error::validation("url", "the authoritative mirror handler requires a `url`")
            })?,
            admin_user: cfg.require_str("admin_user")?,
            admin_password: cfg.require_str("admin_password")?,
            client: reqwest::Client::new(),
            cookie: Mutex::new(None),
            dispatcher,
            sync_points,
            task_runner,
        })
    }

    async fn login(&self) -> Result<String, Error> {
        {
            let guard = self.cookie.lock().await;
            if let Some(cookie) = guard.as_ref() {
                return Ok(cookie.clone());
            }
        }
        let cookie = call_with_retry(&self.task_runner, format!("{}:login", self.name), || async {
            let resp = self
                .client
                .post(format!("{}/signin", self.url))
                .json(&serde_json::json!({
                    "user_name": self.admin_user,
                    "password": self.admin_password,
                }))
                .send()
                .await
                .map_err(|e| Error::Remote {
                    component: self.name.clone(),
                    source: e.into(),
                })?;
            Ok(resp
                .headers()
                .get(reqwest::header::SET_COOKIE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string())
        })
        .await?;
        *self.cookie.lock().await = Some(cookie.clone());
        Ok(cookie)
    }

    /// Looks up the resource lookup endpoint's full body for a slash path,
    /// shared by `get_resource_id` (which only needs the id) and
    /// `resource_tree` (which needs the nested name/type tree).
    async fn lookup_resource(&self, resource_full_name: &str) -> Result<serde_json::Value, Error> {
        let cookie = self.login().await?;
        call_with_retry(
            &self.task_runner,
            format!("{}:get_resource", self.name),
            || async {
                let resp = self
                    .client
                    .get(format!("{}/resources", self.url))
                    .query(&[("path", resource_full_name)])
                    .header(reqwest::header::COOKIE, cookie.clone())
                    .send()
                    .await
                    .map_err(|e| Error::Remote {
                        component: self.name.clone(),
                        source: e.into(),
                    })?;
                if !resp.status().is_success() {
                    return Err(Error::Remote {
                        component: self.name.clone(),
                        source: anyhow::anyhow!("resource lookup returned {}", resp.status()),
                    });
                }
                resp.json::<serde_json::Value>().await.map_err(|e| Error::Remote {
                    component: self.name.clone(),
                    source: e.into(),
                })
            },
        )
        .await
    }

    /// Fetches the flattened (name, type) resource tree leading to
    /// `resource_full_name`, used as the engine's source tree.
    async fn resource_tree(&self, resource_full_name: &str) -> Result<Vec<ResourceTreeNode>, Error> {
        let body = self.lookup_resource(resource_full_name).await?;
        let tree = body
            .get("resource_tree")
            .and_then(|v| v.as_array())
            .ok_or_else(|| Error::NotFound(resource_full_name.to_string()))?;
        tree.iter()
            .map(|node| {
                let resource_name = node
                    .get("resource_name")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| Error::NotFound(resource_full_name.to_string()))?
                    .to_string();
                let resource_type = node
                    .get("resource_type")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| Error::NotFound(resource_full_name.to_string()))?
                    .to_string();
                Ok(ResourceTreeNode {
                    resource_name,
                    resource_type,
                })
            })
            .collect()
    }

    /// Runs every sync-point that declares `permission.component_name` as a
    /// member against the incoming event, collecting every propagated
    /// target before applying any of them (the engine's callback is
    /// synchronous; the network calls are not).
    async fn synchronize(&self, permission: &Permission, created: bool) -> Result<(), Error> {
        let relevant: Vec<&SyncPoint> = self
            .sync_points
            .iter()
            .filter(|point| point.services.contains_key(&permission.component_name))
            .collect();
        if relevant.is_empty() {
            return Ok(());
        }

        let source_tree = self.resource_tree(&permission.resource_full_name).await?;

        let mut pending: Vec<Vec<TargetSegment>> = Vec::new();
        for point in relevant {
            let engine = SyncPointEngine::new(point);
            engine.sync(
                &mut |_target_component, segments| {
                    pending.push(segments);
                    Ok(())
                },
                permission,
                &source_tree,
            )?;
        }

        for segments in pending {
            self.apply_target_permission(segments, created).await?;
        }
        Ok(())
    }

    async fn apply_target_permission(
        &self,
        segments: Vec<TargetSegment>,
        created: bool,
    ) -> Result<(), Error> {
        let leaf = segments.last().ok_or_else(|| {
            Error::Other(anyhow::anyhow!("propagated target resolved to zero segments"))
        })?;
        let permission_name = leaf.permission.clone().ok_or_else(|| {
            Error::Other(anyhow::anyhow!("propagated target leaf carries no permission name"))
        })?;
        let full_name = segments
            .iter()
            .map(|s| s.resource_name.as_str())
            .collect::<Vec<_>>()
            .join("/");
        let res_id = self.get_resource_id(&full_name).await?;
        let cookie = self.login().await?;

        if created {
            let (path, json) = match (&leaf.user, &leaf.group) {
                (Some(user), _) => (
                    format!("{}/users/{user}/resources/{res_id}/permissions", self.url),
                    serde_json::json!({"permission_name": permission_name}),
                ),
                (None, Some(group)) => (
                    format!("{}/groups/{group}/resources/{res_id}/permissions", self.url),
                    serde_json::json!({"permission_name": permission_name}),
                ),
                (None, None) => {
                    return Err(Error::Other(anyhow::anyhow!(
                        "propagated permission has neither a user nor a group"
                    )))
                }
            };
            let status = call_with_retry(
                &self.task_runner,
                format!("{}:create_permission", self.name),
                || async {
                    let resp = self
                        .client
                        .post(&path)
                        .header(reqwest::header::COOKIE, cookie.clone())
                        .json(&json)
                        .send()
                        .await
                        .map_err(|e| Error::Remote {
                            component: self.name.clone(),
                            source: e.into(),
                        })?;
                    Ok(resp.status().as_u16())
                },
            )
            .await?;
            match status {
                201 => info!(resource = %full_name, "propagated permission created"),
                409 => info!(resource = %full_name, "propagated permission already existed"),
                code => {
                    return Err(Error::Remote {
                        component: self.name.clone(),
                        source: anyhow::anyhow!("permission creation returned {code}"),
                    })
                }
            }
        } else {
            let path = match (&leaf.user, &leaf.group) {
                (Some(user), _) => format!(
                    "{}/users/{user}/resources/{res_id}/permissions/{permission_name}",
                    self.url
                ),
                (None, Some(group)) => format!(
                    "{}/groups/{group}/resources/{res_id}/permissions/{permission_name}",
                    self.url
                ),
                (None, None) => {
                    return Err(Error::Other(anyhow::anyhow!(
                        "propagated permission has neither a user nor a group"
                    )))
                }
            };
            let status = call_with_retry(
                &self.task_runner,
                format!("{}:delete_permission", self.name),
                || async {
                    let resp = self
                        .client
                        .delete(&path)
                        .header(reqwest::header::COOKIE, cookie.clone())
                        .send()
                        .await
                        .map_err(|e| Error::Remote {
                            component: self.name.clone(),
                            source: e.into(),
                        })?;
                    Ok(resp.status().as_u16())
                },
            )
            .await?;
            match status {
                200 => info!(resource = %full_name, "propagated permission deleted"),
                404 => warn!(resource = %full_name, "no propagated permission found to delete"),
                code => {
                    return Err(Error::Remote {
                        component: self.name.clone(),
                        source: anyhow::anyhow!("permission deletion returned {code}"),
                    })
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Handler for AuthoritativeMirror {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    async fn get_resource_id(&self, resource_full_name: &str) -> Result<String, Error> {
        let body = self.lookup_resource(resource_full_name).await?;
        body.get("resource_id")
            .and_then(|v| v.as_str().map(str::to_string).or_else(|| v.as_i64().map(|n| n.to_string())))
            .ok_or_else(|| Error::NotFound(resource_full_name.to_string()))
    }

    async fn user_created(&self, _user_name: &str) -> Result<(), Error> {
        // Magpie is the origin of user-creation events, not a mirror target.
        Ok(())
    }

    async fn user_deleted(&self, _user_name: &str) -> Result<(), Error> {
        Ok(())
    }

    async fn permission_created(&self, permission: &Permission) -> Result<(), Error> {
        self.synchronize(permission, true).await
    }

    async fn permission_deleted(&self, permission: &Permission) -> Result<(), Error> {
        self.synchronize(permission, false).await
    }
}
