//! The filesystem-monitor registry: tracks one `notify` watch per path,
//! fans raw filesystem events out to every registered callback for that
//! path, and translates `moved` events into `deleted`+`created` per the
//! watched-root containment rule.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use sync_core::{CallbackKind, Error, Monitor, MonitorRecord};
use tracing::{error, warn};

use crate::store::MonitorStore;

/// Receives filesystem events for one registered callback kind. Registered
/// once per `CallbackKind` with the registry; implementations live in the
/// handler adapters that own a watched resource (the workspace filesystem
/// adapter, the catalog indexer).
pub trait FsCallback: Send + Sync {
    fn on_created(&self, path: &Path) -> Result<(), Error>;
    fn on_deleted(&self, path: &Path) -> Result<(), Error>;
    fn on_modified(&self, path: &Path) -> Result<(), Error>;
}

struct WatchEntry {
    recursive: bool,
    watcher: RecommendedWatcher,
    listeners: HashMap<CallbackKind, Arc<dyn FsCallback>>,
}

/// Central registry of active filesystem watches, keyed by watched path.
/// Each path may have more than one callback registered against it; each
/// callback kind may watch more than one path.
pub struct FsMonitorRegistry {
    watches: Arc<Mutex<HashMap<PathBuf, WatchEntry>>>,
    store: MonitorStore,
}

impl FsMonitorRegistry {
    pub fn new(store: MonitorStore) -> Self {
        Self {
            watches: Arc::new(Mutex::new(HashMap::new())),
            store,
        }
    }

    /// Evicts stale persisted monitors (paths gone missing since last run)
    /// and restarts watches for everything that survives. Call once at
    /// startup before serving any traffic.
    pub fn bootstrap(
        &self,
        callbacks: &HashMap<CallbackKind, Arc<dyn FsCallback>>,
    ) -> Result<(), Error> {
        let records = self
            .store
            .evict_stale()
            .map_err(Error::Config)?;
        for record in records {
            let monitor: Monitor = (&record)
                .try_into()
                .map_err(|e: String| Error::Other(anyhow::anyhow!(e)))?;
            let Some(callback) = callbacks.get(&monitor.callback).cloned() else {
                warn!(callback = %monitor.callback, "no handler registered for this monitor kind, skipping");
                continue;
            };
            self.start_watch(&monitor.path, monitor.recursive, monitor.callback, callback)?;
        }
        Ok(())
    }

    /// Registers a watch. If `(path, callback_kind)` already exists, merges
    /// by OR-ing the recursive flag (never downgrading an existing
    /// recursive watch), persists, and returns without re-registering the
    /// watcher unless the effective recursive flag changed.
    pub fn register(
        &self,
        path: &Path,
        recursive: bool,
        callback_kind: CallbackKind,
        callback: Arc<dyn FsCallback>,
    ) -> Result<Monitor, Error> {
        let mut watches = self.watches.lock().expect("watch map mutex poisoned");
        let needs_rewatch;
        let effective_recursive;

        if let Some(entry) = watches.get_mut(path) {
            effective_recursive = entry.recursive || recursive;
            needs_rewatch = effective_recursive != entry.recursive;
            entry.recursive = effective_recursive;
            entry.listeners.insert(callback_kind, callback);
            if needs_rewatch {
                let mode = recursive_mode(effective_recursive);
                let _ = entry.watcher.unwatch(path);
                entry
                    .watcher
                    .watch(path, mode)
                    .map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
            }
        } else {
            drop(watches);
            self.start_watch(path, recursive, callback_kind, callback)?;
            effective_recursive = recursive;
        }

        let monitor = Monitor::new(path.to_path_buf(), effective_recursive, callback_kind);
        self.store
            .save(MonitorRecord::from(&monitor))
            .map_err(Error::Config)?;
        Ok(monitor)
    }

    fn start_watch(
        &self,
        path: &Path,
        recursive: bool,
        callback_kind: CallbackKind,
        callback: Arc<dyn FsCallback>,
    ) -> Result<(), Error> {
        let watches = Arc::clone(&self.watches);
        let watched_root = path.to_path_buf();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => dispatch_event(&watches, &watched_root, event),
                Err(err) => error!(error = %err, "filesystem watcher error"),
            }
        })
        .map_err(|e| Error::Other(anyhow::anyhow!(e)))?;

        watcher
            .watch(path, recursive_mode(recursive))
            .map_err(|e| Error::Other(anyhow::anyhow!(e)))?;

        let mut listeners = HashMap::new();
        listeners.insert(callback_kind, callback);
        self.watches.lock().expect("watch map mutex poisoned").insert(
            path.to_path_buf(),
            WatchEntry {
                recursive,
                watcher,
                listeners,
            },
        );
        Ok(())
    }

    /// Removes one callback's subscription to a path. If it was the last
    /// listener for that path, the watcher is torn down entirely. Returns
    /// `true` if a monitor was found and removed.
    pub fn unregister(&self, path: &Path, callback_kind: CallbackKind) -> Result<bool, Error> {
        let mut watches = self.watches.lock().expect("watch map mutex poisoned");
        let Some(entry) = watches.get_mut(path) else {
            return Ok(false);
        };
        if entry.listeners.remove(&callback_kind).is_none() {
            return Ok(false);
        }
        let empty = entry.listeners.is_empty();
        if empty {
            let mut entry = watches.remove(path).expect("just looked up");
            let _ = entry.watcher.unwatch(path);
        }
        drop(watches);

        self.store
            .delete(&callback_kind.to_string(), &path.to_string_lossy())
            .map_err(Error::Config)?;
        Ok(true)
    }
}

fn recursive_mode(recursive: bool) -> RecursiveMode {
    if recursive {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    }
}

fn entries_matching<'a>(
    watches: &'a HashMap<PathBuf, WatchEntry>,
    event_path: &Path,
) -> Vec<(&'a PathBuf, &'a WatchEntry)> {
    watches
        .iter()
        .filter(|(watched_path, entry)| {
            event_path == watched_path.as_path()
                || (entry.recursive && event_path.starts_with(watched_path))
                || (!entry.recursive && event_path.parent() == Some(watched_path.as_path()))
        })
        .collect()
}

fn notify_all(listeners: &HashMap<CallbackKind, Arc<dyn FsCallback>>, action: Action, path: &Path) {
    for callback in listeners.values() {
        let result = match action {
            Action::Created => callback.on_created(path),
            Action::Deleted => callback.on_deleted(path),
            Action::Modified => callback.on_modified(path),
        };
        if let Err(err) = result {
            error!(path = %path.display(), ?action, error = %err, "filesystem callback failed");
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Created,
    Deleted,
    Modified,
}

fn dispatch_event(watches: &Mutex<HashMap<PathBuf, WatchEntry>>, watched_root: &Path, event: notify::Event) {
    let watches = watches.lock().expect("watch map mutex poisoned");

    match event.kind {
        EventKind::Create(_) => {
            for path in &event.paths {
                for (_, entry) in entries_matching(&watches, path) {
                    notify_all(&entry.listeners, Action::Created, path);
                }
            }
        }
        EventKind::Remove(_) => {
            for path in &event.paths {
                for (_, entry) in entries_matching(&watches, path) {
                    notify_all(&entry.listeners, Action::Deleted, path);
                }
            }
        }
        EventKind::Modify(notify::event::ModifyKind::Name(notify::event::RenameMode::Both)) => {
            if event.paths.len() == 2 {
                let (src, dst) = (&event.paths[0], &event.paths[1]);
                for (watched_path, entry) in entries_matching(&watches, src) {
                    notify_all(&entry.listeners, Action::Deleted, src);
                    let inside_root = dst.starts_with(watched_root);
                    let sibling_of_root = dst.parent() == watched_root.parent();
                    if inside_root && (entry.recursive || sibling_of_root) {
                        notify_all(&entry.listeners, Action::Created, dst);
                    }
                }
            }
        }
        EventKind::Modify(_) => {
            for path in &event.paths {
                for (_, entry) in entries_matching(&watches, path) {
                    notify_all(&entry.listeners, Action::Modified, path);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCallback {
        created: AtomicUsize,
        deleted: AtomicUsize,
    }

    impl FsCallback for CountingCallback {
        fn on_created(&self, _path: &Path) -> Result<(), Error> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn on_deleted(&self, _path: &Path) -> Result<(), Error> {
            self.deleted.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn on_modified(&self, _path: &Path) -> Result<(), Error> {
            Ok(())
        }
    }

    #[test]
    fn register_then_unregister_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = MonitorStore::new(dir.path().join("monitors.json"));
        let registry = FsMonitorRegistry::new(store);
        let callback = Arc::new(CountingCallback {
            created: AtomicUsize::new(0),
            deleted: AtomicUsize::new(0),
        });

        let watch_dir = dir.path().join("watched");
        std::fs::create_dir_all(&watch_dir).unwrap();

        registry
            .register(&watch_dir, false, CallbackKind::WorkspaceFilesystem, callback.clone())
            .unwrap();
        assert!(registry
            .unregister(&watch_dir, CallbackKind::WorkspaceFilesystem)
            .unwrap());
        assert!(!registry
            .unregister(&watch_dir, CallbackKind::WorkspaceFilesystem)
            .unwrap());
    }

    #[test]
    fn re_register_merges_recursive_flag() {
        let dir = tempfile::tempdir().unwrap();
        let store = MonitorStore::new(dir.path().join("monitors.json"));
        let registry = FsMonitorRegistry::new(store);
        let callback = Arc::new(CountingCallback {
            created: AtomicUsize::new(0),
            deleted: AtomicUsize::new(0),
        });
        let watch_dir = dir.path().join("watched");
        std::fs::create_dir_all(&watch_dir).unwrap();

        let m1 = registry
            .register(&watch_dir, false, CallbackKind::WorkspaceFilesystem, callback.clone())
            .unwrap();
        assert!(!m1.recursive);
        let m2 = registry
            .register(&watch_dir, true, CallbackKind::WorkspaceFilesystem, callback)
            .unwrap();
        assert!(m2.recursive);

        let records = registry.store.list().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].recursive);
    }
}
