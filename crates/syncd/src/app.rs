//! Wires the library crates together into one running instance: loads
//! configuration, builds the handler set and monitor registry, and hands
//! back the shared state the HTTP and CLI surfaces both operate on.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use sync_core::{Error, HandlerConfig, Settings, SyncPoint};
use sync_handlers::{Dispatcher, Handler, HandlerFactory};
use sync_monitor::{FsMonitorRegistry, MonitorStore};
use sync_tasks::{RetryPolicy, TaskRunner};
use tracing::info;

pub struct AppState {
    pub settings: Settings,
    pub dispatcher: Arc<Dispatcher>,
    pub monitors: Arc<FsMonitorRegistry>,
    pub sync_points: HashMap<String, SyncPoint>,
    pub task_runner: Arc<TaskRunner>,
}

impl AppState {
    /// Loads configuration from `settings.config_path` (a file or
    /// directory, as `sync-config` accepts), builds every active handler,
    /// and bootstraps the filesystem monitor registry from whatever was
    /// persisted by a previous run.
    pub async fn bootstrap(settings: Settings) -> anyhow::Result<Self> {
        let config_path = Path::new(&settings.config_path);
        let handler_configs: HashMap<String, HandlerConfig> =
            sync_config::load_handlers(config_path)?;
        let sync_points = sync_config::load_sync_points(config_path)?;
        let sync_point_list = Arc::new(sync_points.values().cloned().collect::<Vec<_>>());

        let store_path = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .join("monitors.json");
        let monitors = Arc::new(FsMonitorRegistry::new(MonitorStore::new(store_path)));

        let dispatcher = Dispatcher::new();
        let task_runner = Arc::new(TaskRunner::new(RetryPolicy::default()));
        let factory = HandlerFactory::new();
        let (handlers, callbacks) = factory.build(
            &handler_configs,
            &monitors,
            Arc::clone(&dispatcher),
            &sync_point_list,
            &task_runner,
        )?;
        let handler_count = handlers.len();
        dispatcher.set_handlers(handlers).await;

        monitors.bootstrap(&callbacks)?;

        info!(
            handlers = handler_count,
            sync_points = sync_points.len(),
            "application state bootstrapped"
        );

        Ok(Self {
            settings,
            dispatcher,
            monitors,
            sync_points,
            task_runner,
        })
    }

    pub async fn handler_names(&self) -> Vec<String> {
        self.dispatcher
            .handlers()
            .await
            .iter()
            .map(|h| h.name().to_string())
            .collect()
    }

    pub async fn find_handler(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.dispatcher
            .handlers()
            .await
            .into_iter()
            .find(|h| h.name() == name)
    }
}

pub fn not_found(detail: impl Into<String>) -> Error {
    Error::NotFound(detail.into())
}
