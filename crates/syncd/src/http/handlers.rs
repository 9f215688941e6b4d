//! Introspection routes: `/`, `/version`, `/handlers`, `/handlers/:name`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{Method, Uri};
use axum::Json;
use serde::Serialize;

use crate::app::{not_found, AppState};
use crate::http::error::ApiError;

#[derive(Debug, Serialize)]
pub struct RootInfo {
    name: &'static str,
    version: &'static str,
    description: &'static str,
}

pub async fn root() -> Json<RootInfo> {
    Json(RootInfo {
        name: "syncd",
        version: env!("CARGO_PKG_VERSION"),
        description: "propagates user and permission events across registered platform components",
    })
}

#[derive(Debug, Serialize)]
pub struct VersionInfo {
    name: &'static str,
    version: &'static str,
}

pub async fn version() -> Json<VersionInfo> {
    Json(VersionInfo {
        name: "syncd",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Serialize)]
pub struct HandlerSummary {
    name: String,
    priority: u32,
}

pub async fn list_handlers(State(state): State<Arc<AppState>>) -> Json<Vec<HandlerSummary>> {
    let handlers = state.dispatcher.handlers().await;
    Json(
        handlers
            .iter()
            .map(|h| HandlerSummary {
                name: h.name().to_string(),
                priority: h.priority(),
            })
            .collect(),
    )
}

#[derive(Debug, Serialize)]
pub struct HandlerDetail {
    name: String,
    priority: u32,
}

pub async fn get_handler(
    method: Method,
    uri: Uri,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<HandlerDetail>, ApiError> {
    let handler = state
        .find_handler(&name)
        .await
        .ok_or_else(|| not_found(format!("no handler named [{name}]")))
        .map_err(|e| ApiError::new(e, &method, &uri))?;
    Ok(Json(HandlerDetail {
        name: handler.name().to_string(),
        priority: handler.priority(),
    }))
}
