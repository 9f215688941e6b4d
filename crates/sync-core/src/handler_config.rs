use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// `{active, priority, url?, workspace_dir?, ...component-specific}` as
/// loaded from the `handlers` config section. Extra, handler-specific keys
/// (admin_user, jupyterhub_user_data_dir, etc.) land in `extra` and are
/// picked up by the owning adapter's constructor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerConfig {
    #[serde(default)]
    pub active: bool,
    /// Absent means "last" — handlers without an explicit priority sort
    /// after every handler that declares one.
    pub priority: Option<u32>,
    pub url: Option<String>,
    pub workspace_dir: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl HandlerConfig {
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(|v| v.as_str())
    }

    pub fn require_str(&self, key: &str) -> Result<String, crate::error::Error> {
        self.get_str(key)
            .map(|s| s.to_string())
            .ok_or_else(|| crate::error::Error::validation(key, "missing required handler parameter"))
    }

    /// Priority used for dispatch ordering: absent priority sorts after
    /// every declared one (i.e. "last"), matching the default-to-infinity
    /// semantics of the original handler priority field.
    pub fn sort_priority(&self) -> u32 {
        self.priority.unwrap_or(u32::MAX)
    }
}
