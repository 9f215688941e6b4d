//! Token-compatibility and mapping-grammar validation, each rule its own
//! small, independently testable function — mirroring the five checks the
//! original config validator runs before a sync-point is ever used.

use std::collections::HashSet;

use regex::Regex;
use sync_core::{ConfigError, MappingDirection, PermissionMapping, RawSegment, SegmentName};

/// What a resource key's segment list implies for token-compatibility
/// checks: whether it carries a `MULTI_TOKEN`, and the set of named tokens
/// (`{ident}`) it binds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceTokenInfo {
    pub has_multi_token: bool,
    pub named_tokens: HashSet<String>,
}

/// Rule 1 & 2: at most one `MULTI_TOKEN` per resource path, and no named
/// token repeated within the same path.
pub fn resource_token_info(
    resource_key: &str,
    segments: &[RawSegment],
) -> Result<ResourceTokenInfo, ConfigError> {
    let mut info = ResourceTokenInfo::default();
    for seg in segments {
        match SegmentName::parse(&seg.name) {
            SegmentName::Multi => {
                if info.has_multi_token {
                    return Err(ConfigError::InvalidTokens {
                        resource_key: resource_key.to_string(),
                        detail: "only one MULTI_TOKEN is permitted per resource".into(),
                    });
                }
                info.has_multi_token = true;
            }
            SegmentName::Named(ident) => {
                if !info.named_tokens.insert(ident.clone()) {
                    return Err(ConfigError::InvalidTokens {
                        resource_key: resource_key.to_string(),
                        detail: format!(
                            "named token {{{ident}}} appears more than once in this resource path"
                        ),
                    });
                }
            }
            SegmentName::Single | SegmentName::Literal(_) => {}
        }
    }
    Ok(info)
}

/// Rule 3: a bidirectional mapping's two resources must agree on whether
/// they carry a `MULTI_TOKEN`, and must bind exactly the same named tokens.
pub fn validate_bidirectional(
    raw: &str,
    left: &ResourceTokenInfo,
    right: &ResourceTokenInfo,
) -> Result<(), ConfigError> {
    if left.has_multi_token != right.has_multi_token {
        return Err(ConfigError::InvalidMapping {
            rule: raw.to_string(),
            detail: "a bidirectional mapping requires both resources to agree on using a MULTI_TOKEN".into(),
        });
    }
    if left.named_tokens != right.named_tokens {
        return Err(ConfigError::InvalidMapping {
            rule: raw.to_string(),
            detail: format!(
                "a bidirectional mapping requires identical named tokens on both sides (left: {:?}, right: {:?})",
                left.named_tokens, right.named_tokens
            ),
        });
    }
    Ok(())
}

/// Rule 4 & 5: for a unidirectional mapping, the source may carry a
/// `MULTI_TOKEN` only if the target does too (never the reverse), and every
/// named token the target binds must already be bound by the source.
pub fn validate_unidirectional(
    raw: &str,
    source: &ResourceTokenInfo,
    target: &ResourceTokenInfo,
) -> Result<(), ConfigError> {
    if !source.has_multi_token && target.has_multi_token {
        return Err(ConfigError::InvalidMapping {
            rule: raw.to_string(),
            detail: "the source resource must use a MULTI_TOKEN if the target resource uses one".into(),
        });
    }
    let missing: HashSet<&String> = target.named_tokens.difference(&source.named_tokens).collect();
    if !missing.is_empty() {
        return Err(ConfigError::InvalidMapping {
            rule: raw.to_string(),
            detail: format!(
                "named tokens {missing:?} appear in the target resource but not in the source"
            ),
        });
    }
    Ok(())
}

fn mapping_regex() -> Regex {
    let permission = r"[\w-]+";
    let permissions = format!(r"({permission}|\[\s*{permission}(?:\s*,\s*{permission})*\s*\])");
    let direction = r"(<->|<-|->)";
    let pattern = format!(
        r"^(\w+)\s*:\s*{permissions}\s*{direction}\s*(\w+)\s*:\s*{permissions}$"
    );
    Regex::new(&pattern).expect("mapping regex is well-formed")
}

fn split_permission_list(raw: &str) -> Vec<String> {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parses one `permissions_mapping` rule string into a structured mapping,
/// e.g. `"geoserver_data : [read, write] <-> fs_workspace : [read, write]"`.
pub fn parse_mapping(raw: &str) -> Result<PermissionMapping, ConfigError> {
    let re = mapping_regex();
    let caps = re.captures(raw.trim()).ok_or_else(|| ConfigError::InvalidMapping {
        rule: raw.to_string(),
        detail: "does not match the `key : perms <dir> key : perms` grammar".to_string(),
    })?;

    let left_key = caps[1].to_string();
    let left_perms = split_permission_list(&caps[2]);
    let direction = MappingDirection::parse(&caps[3]).ok_or_else(|| ConfigError::InvalidMapping {
        rule: raw.to_string(),
        detail: format!("unknown direction arrow `{}`", &caps[3]),
    })?;
    let right_key = caps[4].to_string();
    let right_perms = split_permission_list(&caps[5]);

    Ok(PermissionMapping {
        left_key,
        left_perms,
        direction,
        right_key,
        right_perms,
        raw: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(name: &str, kind: &str) -> RawSegment {
        RawSegment {
            name: name.to_string(),
            kind: kind.to_string(),
        }
    }

    #[test]
    fn rejects_two_multi_tokens() {
        let err = resource_token_info(
            "k",
            &[seg("**", "file"), seg("{x}", "dir"), seg("**", "file")],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTokens { .. }));
    }

    #[test]
    fn rejects_duplicate_named_token() {
        let err = resource_token_info("k", &[seg("{x}", "dir"), seg("{x}", "dir")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTokens { .. }));
    }

    #[test]
    fn parses_list_and_bidirectional_arrow() {
        let mapping = parse_mapping("geoserver_data : [read, write] <-> fs_workspace : read").unwrap();
        assert_eq!(mapping.left_key, "geoserver_data");
        assert_eq!(mapping.left_perms, vec!["read", "write"]);
        assert_eq!(mapping.direction, MappingDirection::Bidirectional);
        assert_eq!(mapping.right_key, "fs_workspace");
        assert_eq!(mapping.right_perms, vec!["read"]);
    }

    #[test]
    fn unidirectional_rejects_missing_named_token() {
        let source = ResourceTokenInfo {
            has_multi_token: false,
            named_tokens: HashSet::new(),
        };
        let mut target = source.clone();
        target.named_tokens.insert("ws".to_string());
        let err = validate_unidirectional("rule", &source, &target).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMapping { .. }));
    }
}
