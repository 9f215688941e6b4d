use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Stable identifier of a handler kind that can receive filesystem
/// callbacks. Resolved through a registration table rather than language
/// reflection — this is the thing persisted in the monitor store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallbackKind {
    WorkspaceFilesystem,
    CatalogIndexer,
}

impl fmt::Display for CallbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CallbackKind::WorkspaceFilesystem => "workspace_filesystem",
            CallbackKind::CatalogIndexer => "catalog_indexer",
        };
        f.write_str(s)
    }
}

impl FromStr for CallbackKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "workspace_filesystem" => Ok(CallbackKind::WorkspaceFilesystem),
            "catalog_indexer" => Ok(CallbackKind::CatalogIndexer),
            other => Err(format!("unknown monitor callback kind: {other}")),
        }
    }
}

/// A persisted directory watch: `(path, recursive, callback_kind)` is the
/// subscription; `(callback_kind, path)` is the store's unique key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Monitor {
    pub path: PathBuf,
    pub recursive: bool,
    pub callback: CallbackKind,
}

impl Monitor {
    pub fn new(path: PathBuf, recursive: bool, callback: CallbackKind) -> Self {
        Self {
            path,
            recursive,
            callback,
        }
    }

    pub fn key(&self) -> (CallbackKind, PathBuf) {
        (self.callback, self.path.clone())
    }
}

/// On-disk record shape for the monitor store, matching the document shape
/// described for the persistent-state collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorRecord {
    pub callback: String,
    pub path: String,
    pub recursive: bool,
}

impl From<&Monitor> for MonitorRecord {
    fn from(m: &Monitor) -> Self {
        MonitorRecord {
            callback: m.callback.to_string(),
            path: m.path.to_string_lossy().to_string(),
            recursive: m.recursive,
        }
    }
}

impl TryFrom<&MonitorRecord> for Monitor {
    type Error = String;

    fn try_from(r: &MonitorRecord) -> Result<Self, Self::Error> {
        Ok(Monitor {
            path: PathBuf::from(&r.path),
            recursive: r.recursive,
            callback: r.callback.parse()?,
        })
    }
}
