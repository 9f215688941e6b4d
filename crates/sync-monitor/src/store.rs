//! JSON-file persistence for registered monitors, standing in for the
//! document-store collection the original keeps monitors in. One record
//! per `(callback, path)` pair, unique by that composite key.

use std::path::{Path, PathBuf};

use sync_core::{ConfigError, MonitorRecord};
use tracing::warn;

/// Loads and saves `MonitorRecord`s to a single JSON file, upserting by
/// `(callback, path)` and rewriting the whole file on every mutation — the
/// expected record count is small (one per registered watch), so this
/// trades a little I/O for a trivially-correct store.
pub struct MonitorStore {
    file: PathBuf,
}

impl MonitorStore {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    pub fn list(&self) -> Result<Vec<MonitorRecord>, ConfigError> {
        if !self.file.exists() {
            return Ok(Vec::new());
        }
        let text = std::fs::read_to_string(&self.file).map_err(|source| ConfigError::Io {
            path: self.file.display().to_string(),
            source,
        })?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&text).map_err(|err| ConfigError::Generic(format!(
            "failed to parse monitor store {}: {err}",
            self.file.display()
        )))
    }

    fn write_all(&self, records: &[MonitorRecord]) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(records).expect("MonitorRecord always serializes");
        if let Some(parent) = self.file.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        std::fs::write(&self.file, text).map_err(|source| ConfigError::Io {
            path: self.file.display().to_string(),
            source,
        })
    }

    /// Upserts one record: any existing record with the same `(callback,
    /// path)` is deleted first, then the new one is inserted.
    pub fn save(&self, record: MonitorRecord) -> Result<(), ConfigError> {
        let mut records = self.list()?;
        records.retain(|r| !(r.callback == record.callback && r.path == record.path));
        records.push(record);
        self.write_all(&records)
    }

    pub fn delete(&self, callback: &str, path: &str) -> Result<(), ConfigError> {
        let mut records = self.list()?;
        records.retain(|r| !(r.callback == callback && r.path == path));
        self.write_all(&records)
    }

    /// Drops every record whose path no longer exists on disk, warning for
    /// each one removed. Call once at startup before re-registering the
    /// surviving monitors, mirroring the original's tolerance for monitors
    /// that failed to start because their path vanished between runs.
    pub fn evict_stale(&self) -> Result<Vec<MonitorRecord>, ConfigError> {
        let records = self.list()?;
        let mut survivors = Vec::with_capacity(records.len());
        for record in records {
            if Path::new(&record.path).exists() {
                survivors.push(record);
            } else {
                warn!(
                    path = %record.path,
                    callback = %record.callback,
                    "dropping monitor for a path that no longer exists"
                );
            }
        }
        self.write_all(&survivors)?;
        Ok(survivors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_core::MonitorRecord;

    fn rec(callback: &str, path: &str, recursive: bool) -> MonitorRecord {
        MonitorRecord {
            callback: callback.to_string(),
            path: path.to_string(),
            recursive,
        }
    }

    #[test]
    fn save_upserts_by_callback_and_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = MonitorStore::new(dir.path().join("monitors.json"));
        store.save(rec("workspace_filesystem", "/a", false)).unwrap();
        store.save(rec("workspace_filesystem", "/a", true)).unwrap();
        let records = store.list().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].recursive);
    }

    #[test]
    fn evict_stale_drops_missing_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = MonitorStore::new(dir.path().join("monitors.json"));
        store.save(rec("workspace_filesystem", "/does/not/exist", false)).unwrap();
        store.save(rec("workspace_filesystem", dir.path().to_str().unwrap(), false)).unwrap();
        let survivors = store.evict_stale().unwrap();
        assert_eq!(survivors.len(), 1);
    }
}
