//! `/webhooks/users` and `/webhooks/permissions`: the two routes the
//! authoritative permission component calls to notify this service of
//! user and permission lifecycle events.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{Method, Uri};
use axum::Json;
use serde::{Deserialize, Serialize};
use sync_core::{Access, Error, Permission, Scope};
use tracing::warn;

use crate::app::AppState;
use crate::http::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum WebhookEvent {
    Created,
    Deleted,
}

#[derive(Debug, Deserialize)]
pub struct UserWebhookRequest {
    event: WebhookEvent,
    user_name: String,
    /// Present only for `created` events: called back, best-effort, if
    /// dispatch fails, so the permission authority can flag the user as
    /// erroneous rather than assume success from the HTTP 200.
    callback_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    detail: &'static str,
}

const OK_USER: WebhookResponse = WebhookResponse {
    detail: "user webhook processed",
};
const OK_PERMISSION: WebhookResponse = WebhookResponse {
    detail: "permission webhook processed",
};

pub async fn post_user_webhook(
    method: Method,
    uri: Uri,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UserWebhookRequest>,
) -> Result<Json<WebhookResponse>, ApiError> {
    match req.event {
        WebhookEvent::Created => {
            if let Err(err) = state.dispatcher.dispatch_user_created(&req.user_name).await {
                warn!(
                    user = %req.user_name,
                    error = %err,
                    "dispatching user_created failed, notifying callback url if provided"
                );
                if let Some(url) = &req.callback_url {
                    // Best-effort: the webhook still returns 200 below even
                    // though dispatch failed, matching the original's
                    // behavior (flagged, not fixed, in the design notes).
                    let client = reqwest::Client::new();
                    if let Err(get_err) = client.get(url).send().await {
                        warn!(url, error = %get_err, "callback url request also failed");
                    }
                }
            }
        }
        WebhookEvent::Deleted => {
            state
                .dispatcher
                .dispatch_user_deleted(&req.user_name)
                .await
                .map_err(|e| ApiError::new(e, &method, &uri))?;
        }
    }
    Ok(Json(OK_USER))
}

#[derive(Debug, Deserialize)]
pub struct PermissionWebhookRequest {
    event: WebhookEvent,
    component_name: String,
    resource_id: String,
    resource_full_name: String,
    name: String,
    access: Access,
    scope: Scope,
    user: Option<String>,
    group: Option<String>,
}

pub async fn post_permission_webhook(
    method: Method,
    uri: Uri,
    State(state): State<Arc<AppState>>,
    Json(req): Json<PermissionWebhookRequest>,
) -> Result<Json<WebhookResponse>, ApiError> {
    let permission = Permission::new(
        req.component_name,
        req.resource_id,
        req.resource_full_name,
        req.name,
        req.access,
        req.scope,
        req.user,
        req.group,
    )
    .map_err(|e| ApiError::new(e, &method, &uri))?;

    match req.event {
        WebhookEvent::Created => {
            dispatch_permission_sync(&state, &permission, true)
                .await
                .map_err(|e| ApiError::new(e, &method, &uri))?;
        }
        WebhookEvent::Deleted => {
            dispatch_permission_sync(&state, &permission, false)
                .await
                .map_err(|e| ApiError::new(e, &method, &uri))?;
        }
    }
    Ok(Json(OK_PERMISSION))
}

async fn dispatch_permission_sync(
    state: &AppState,
    permission: &Permission,
    created: bool,
) -> Result<(), Error> {
    if created {
        state.dispatcher.dispatch_permission_created(permission).await
    } else {
        state.dispatcher.dispatch_permission_deleted(permission).await
    }
}
