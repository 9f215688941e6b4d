//! Loads `handlers` and `sync_permissions` config sections from a file or a
//! directory of files (merged in alphabetical filename order, matching the
//! original multi-file deployment layout), expanding environment variables
//! before anything is deserialized.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::Value;
use sync_core::{ConfigError, HandlerConfig, RawSegment, SyncPoint};
use tracing::warn;

use crate::env::expand_all;
use crate::validate::{parse_mapping, resource_token_info, validate_bidirectional, validate_unidirectional};

const KNOWN_EXTENSIONS: &[&str] = &[".cfg", ".yml", ".yaml", ".json"];

/// Loads and merges every config file section named `section`, from either
/// a single file or a directory (files visited in alphabetical order, later
/// files overriding keys from earlier ones within the same section).
pub fn load_section(path: &Path, section: &str, allow_missing: bool) -> Result<Value, ConfigError> {
    let mut merged = Value::Mapping(serde_yaml::Mapping::new());
    for file in config_files(path)? {
        let text = std::fs::read_to_string(&file).map_err(|source| ConfigError::Io {
            path: file.display().to_string(),
            source,
        })?;
        let doc: Value = serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
            path: file.display().to_string(),
            source,
        })?;
        let doc = expand_all(doc);
        let Value::Mapping(top) = doc else {
            continue;
        };
        let key = Value::String(section.to_string());
        if let Some(section_value) = top.get(&key) {
            merge_mapping(&mut merged, section_value.clone());
        } else if !allow_missing {
            warn!(path = %file.display(), section, "config file does not declare this section");
        }
    }
    Ok(merged)
}

fn merge_mapping(into: &mut Value, from: Value) {
    match (into, from) {
        (Value::Mapping(into_map), Value::Mapping(from_map)) => {
            for (k, v) in from_map {
                into_map.insert(k, v);
            }
        }
        (slot, from) => *slot = from,
    }
}

fn config_files(path: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    if path.is_dir() {
        let mut names: Vec<PathBuf> = std::fs::read_dir(path)
            .map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| {
                KNOWN_EXTENSIONS
                    .iter()
                    .any(|ext| p.to_string_lossy().ends_with(ext))
            })
            .collect();
        names.sort();
        Ok(names)
    } else {
        Ok(vec![path.to_path_buf()])
    }
}

/// Deserializes the `handlers` section into a name-keyed map of configs.
pub fn load_handlers(path: &Path) -> Result<HashMap<String, HandlerConfig>, ConfigError> {
    let section = load_section(path, "handlers", true)?;
    serde_yaml::from_value(section).map_err(|source| ConfigError::Yaml {
        path: path.display().to_string(),
        source,
    })
}

#[derive(Debug, Deserialize)]
struct RawSyncPointConfig {
    services: HashMap<String, HashMap<String, Vec<RawSegment>>>,
    permissions_mapping: Vec<String>,
}

/// Loads, parses and validates the `sync_permissions` section into a
/// name-keyed map of fully-built `SyncPoint`s. Validation enforces:
/// resource-key global uniqueness, per-resource token rules, and
/// direction-appropriate mapping compatibility.
pub fn load_sync_points(path: &Path) -> Result<HashMap<String, SyncPoint>, ConfigError> {
    let section = load_section(path, "sync_permissions", true)?;
    let raw: HashMap<String, RawSyncPointConfig> =
        serde_yaml::from_value(section).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })?;

    let mut out = HashMap::new();
    for (point_id, cfg) in raw {
        out.insert(point_id.clone(), build_sync_point(point_id, cfg)?);
    }
    Ok(out)
}

fn build_sync_point(id: String, cfg: RawSyncPointConfig) -> Result<SyncPoint, ConfigError> {
    let mut token_info = HashMap::new();
    for resources in cfg.services.values() {
        for (res_key, segments) in resources {
            if token_info.contains_key(res_key) {
                return Err(ConfigError::InvalidResourceKey(format!(
                    "duplicate resource key [{res_key}]: resource keys must be unique across all services in sync-point [{id}]"
                )));
            }
            token_info.insert(res_key.clone(), resource_token_info(res_key, segments)?);
        }
    }

    let mut mappings = Vec::with_capacity(cfg.permissions_mapping.len());
    for raw_mapping in &cfg.permissions_mapping {
        let mapping = parse_mapping(raw_mapping)?;
        for key in [&mapping.left_key, &mapping.right_key] {
            if !token_info.contains_key(key) {
                return Err(ConfigError::InvalidResourceKey(format!(
                    "mapping `{raw_mapping}` references resource key [{key}] which is not declared in any service"
                )));
            }
        }
        let left = &token_info[&mapping.left_key];
        let right = &token_info[&mapping.right_key];
        match mapping.direction {
            sync_core::MappingDirection::Bidirectional => {
                validate_bidirectional(raw_mapping, left, right)?;
            }
            sync_core::MappingDirection::LeftToRight => {
                validate_unidirectional(raw_mapping, left, right)?;
            }
            sync_core::MappingDirection::RightToLeft => {
                validate_unidirectional(raw_mapping, right, left)?;
            }
        }
        mappings.push(mapping);
    }

    Ok(SyncPoint {
        id,
        services: cfg.services,
        mappings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_and_validates_a_sync_point() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
sync_permissions:
  sp1:
    services:
      geoserver:
        geo_data:
          - {{name: catalog, type: service}}
          - {{name: "{{ws}}", type: workspace}}
          - {{name: "**", type: file}}
      filesystem:
        fs_data:
          - {{name: root, type: service}}
          - {{name: "{{ws}}", type: workspace}}
          - {{name: "**", type: file}}
    permissions_mapping:
      - "geo_data : read <-> fs_data : read"
"#
        )
        .unwrap();

        let points = load_sync_points(file.path()).unwrap();
        let point = points.get("sp1").unwrap();
        assert_eq!(point.mappings.len(), 1);
        assert_eq!(point.component_for_key("geo_data"), Some("geoserver"));
    }

    #[test]
    fn rejects_duplicate_resource_key_across_services() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
sync_permissions:
  sp1:
    services:
      a:
        shared:
          - {{name: x, type: t}}
      b:
        shared:
          - {{name: y, type: t}}
    permissions_mapping: []
"#
        )
        .unwrap();

        let err = load_sync_points(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidResourceKey(_)));
    }
}
