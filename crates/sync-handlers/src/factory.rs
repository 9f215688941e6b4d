use std::collections::HashMap;
use std::sync::Arc;

use sync_core::{CallbackKind, Error, HandlerConfig, SyncPoint};
use sync_monitor::{FsCallback, FsMonitorRegistry};
use sync_tasks::TaskRunner;
use tracing::{info, warn};

use crate::adapters::{
    authoritative_mirror::AuthoritativeMirror, catalog_indexer::CatalogIndexer,
    data_service::DataService, map_server_publisher::MapServerPublisher,
    reverse_proxy::ReverseProxy, workspace_filesystem::WorkspaceFilesystem,
};
use crate::dispatcher::Dispatcher;
use crate::handler::Handler;

/// A handler plus, for the handful of adapters that also react to raw
/// filesystem events, the `(CallbackKind, Arc<dyn FsCallback>)` the monitor
/// registry's bootstrap needs to resume a persisted watch. Most handlers
/// carry no callback.
type Built = (Arc<dyn Handler>, Option<(CallbackKind, Arc<dyn FsCallback>)>);

type Constructor = fn(
    &str,
    &HandlerConfig,
    &Arc<FsMonitorRegistry>,
    Arc<Dispatcher>,
    &Arc<Vec<SyncPoint>>,
    Arc<TaskRunner>,
) -> Result<Built, Error>;

/// Builds the active `Handler` set from configuration, using a closed
/// registration table keyed by handler name instead of reflection-based
/// module loading. Adding a new adapter means adding one entry here.
pub struct HandlerFactory {
    registry: HashMap<&'static str, Constructor>,
}

impl Default for HandlerFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerFactory {
    pub fn new() -> Self {
        let mut registry: HashMap<&'static str, Constructor> = HashMap::new();
        registry.insert("Magpie", |name, cfg, _monitors, dispatcher, sync_points, task_runner| {
            let handler = Arc::new(AuthoritativeMirror::new(
                name,
                cfg,
                dispatcher,
                Arc::clone(sync_points),
                task_runner,
            )?);
            Ok((handler, None))
        });
        registry.insert(
            "Geoserver",
            |name, cfg, _monitors, dispatcher, _sync_points, task_runner| {
                let handler = Arc::new(MapServerPublisher::new(name, cfg, dispatcher, task_runner)?);
                Ok((handler, None))
            },
        );
        registry.insert(
            "FileSystem",
            |name, cfg, _monitors, dispatcher, _sync_points, _task_runner| {
                let handler = Arc::new(WorkspaceFilesystem::new(name, cfg, dispatcher)?);
                let callback: Arc<dyn FsCallback> = handler.clone();
                Ok((handler, Some((CallbackKind::WorkspaceFilesystem, callback))))
            },
        );
        registry.insert(
            "Catalog",
            |name, cfg, monitors, dispatcher, _sync_points, _task_runner| {
                let indexer = CatalogIndexer::new_arc(name, cfg, Arc::clone(monitors), dispatcher)?;
                let callback: Arc<dyn FsCallback> = indexer.clone();
                Ok((indexer as Arc<dyn Handler>, Some((CallbackKind::CatalogIndexer, callback))))
            },
        );
        registry.insert(
            "Nginx",
            |name, cfg, _monitors, dispatcher, _sync_points, _task_runner| {
                Ok((Arc::new(ReverseProxy::new(name, cfg, dispatcher)?), None))
            },
        );
        registry.insert(
            "Thredds",
            |name, cfg, _monitors, dispatcher, _sync_points, _task_runner| {
                Ok((Arc::new(DataService::new(name, cfg, dispatcher)?), None))
            },
        );
        Self { registry }
    }

    /// Builds every configured, active, known handler. Unknown handler
    /// names are logged and skipped rather than treated as fatal, matching
    /// the original factory's tolerance for extra config entries. Alongside
    /// the handler list, returns the `FsCallback` map that the monitor
    /// registry's `bootstrap` needs to resume watches persisted by a
    /// previous run.
    pub fn build(
        &self,
        configs: &HashMap<String, HandlerConfig>,
        monitors: &Arc<FsMonitorRegistry>,
        dispatcher: Arc<Dispatcher>,
        sync_points: &Arc<Vec<SyncPoint>>,
        task_runner: &Arc<TaskRunner>,
    ) -> Result<(Vec<Arc<dyn Handler>>, HashMap<CallbackKind, Arc<dyn FsCallback>>), Error> {
        let mut handlers = Vec::new();
        let mut callbacks = HashMap::new();
        for (name, cfg) in configs {
            if !cfg.active {
                continue;
            }
            let Some(constructor) = self.registry.get(name.as_str()) else {
                warn!(handler = %name, "ignoring active config for an unknown handler name");
                continue;
            };
            let (handler, callback) = constructor(
                name,
                cfg,
                monitors,
                Arc::clone(&dispatcher),
                sync_points,
                Arc::clone(task_runner),
            )?;
            if let Some((kind, callback)) = callback {
                callbacks.insert(kind, callback);
            }
            info!(handler = %name, "handler activated");
            handlers.push(handler);
        }
        Ok((handlers, callbacks))
    }
}
