//! The permission sync-point engine: given a permission event on one
//! component's resource, compute and dispatch the equivalent permissions on
//! every other component that, by configuration, shares that resource.
//!
//! This is a direct, typed port of the resource-path matching algorithm:
//! build a regex from each configured resource key's segment list, find the
//! longest literal match, then walk the configured `permissions_mapping`
//! rules to emit target resource paths.

use std::collections::HashSet;

use regex::Regex;
use sync_core::{
    Error, MappingDirection, Permission, RawSegment, ResourceTreeNode, SegmentName, SyncPoint,
    TargetSegment,
};
use tracing::{debug, warn};

/// Build the `/name:type/name:type/...` string used for matching, from a
/// live resource tree.
fn nametype_path(tree: &[ResourceTreeNode]) -> String {
    let mut s = String::new();
    for node in tree {
        s.push('/');
        s.push_str(&node.resource_name);
        s.push(':');
        s.push_str(&node.resource_type);
    }
    s
}

/// Synthesizes a regex matching a resource-nametype path against one
/// resource key's configured segment list, and returns the number of
/// literal (non-token) segments — used for match-length tie-breaking.
fn segment_regex(segments: &[RawSegment]) -> (Regex, usize) {
    let mut pattern = String::from("^");
    let mut literal_len = 0usize;
    for seg in segments {
        match SegmentName::parse(&seg.name) {
            SegmentName::Single | SegmentName::Named(_) => {
                pattern.push_str(&format!(r"/\w+:{}", regex::escape(&seg.kind)));
            }
            SegmentName::Multi => {
                pattern.push_str(&format!(r"(?:/\w+:{})*", regex::escape(&seg.kind)));
            }
            SegmentName::Literal(name) => {
                pattern.push('/');
                pattern.push_str(&regex::escape(&name));
                pattern.push(':');
                pattern.push_str(&regex::escape(&seg.kind));
                literal_len += 1;
            }
        }
    }
    pattern.push('$');
    (
        Regex::new(&pattern).expect("segment regex is always well-formed"),
        literal_len,
    )
}

/// Finds the index in `segments` of the first token (Single, Multi or
/// Named) — everything from there on is the "tokenized suffix".
fn first_token_index(segments: &[RawSegment]) -> Option<usize> {
    segments
        .iter()
        .position(|seg| SegmentName::parse(&seg.name).is_token())
}

/// Step 1: identify which resource_key of `permission.component_name` the
/// source resource tree belongs to, and the index at which its own
/// tokenized suffix begins (needed for step 3's suffix alignment).
fn find_matching_resource(
    point: &SyncPoint,
    component_name: &str,
    source_path: &str,
) -> Result<(String, usize), Error> {
    let resources = point.services.get(component_name).ok_or_else(|| {
        Error::NotFound(format!(
            "component [{component_name}] is not declared in sync-point [{}]",
            point.id
        ))
    })?;

    let mut best: Option<(String, usize)> = None;
    let mut tie = false;
    for (res_key, segments) in resources {
        let (re, literal_len) = segment_regex(segments);
        if !re.is_match(source_path) {
            continue;
        }
        match &best {
            None => best = Some((res_key.clone(), literal_len)),
            Some((_, best_len)) if literal_len > *best_len => {
                best = Some((res_key.clone(), literal_len));
                tie = false;
            }
            Some((_, best_len)) if literal_len == *best_len => {
                tie = true;
            }
            _ => {}
        }
    }

    match best {
        None => Err(Error::Ambiguous(format!(
            "no resource key in sync-point [{}] matches path [{source_path}]",
            point.id
        ))),
        Some((_, _)) if tie => Err(Error::Ambiguous(format!(
            "two or more resource keys in sync-point [{}] match path [{source_path}] with equal literal length",
            point.id
        ))),
        Some((res_key, literal_len)) => {
            let segments = point.segments_for_key(&res_key).expect("key just matched");
            let suffix_idx = first_token_index(segments).unwrap_or(segments.len());
            debug!(resource_key = %res_key, literal_len, "matched source resource key");
            Ok((res_key, suffix_idx))
        }
    }
}

/// Step 2: enumerate `(target_resource_key, target_permission_name)` pairs
/// that the given permission, matched against `source_key`, should
/// propagate to.
fn targets_for(point: &SyncPoint, source_key: &str, permission_name: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for mapping in &point.mappings {
        for (side_key, side_perms, target_key, target_perms) in mapping.source_sides() {
            if side_key != source_key {
                continue;
            }
            if !side_perms.iter().any(|p| p == permission_name) {
                continue;
            }
            if target_key == source_key {
                continue;
            }
            for perm_name in target_perms {
                let pair = (target_key.to_string(), perm_name.clone());
                if seen.insert(pair.clone()) {
                    out.push(pair);
                }
            }
        }
    }
    out
}

/// Step 3: build the full target resource path segments for one target
/// resource key, aligning its tokenized suffix (if any) against the
/// source tree's own tokenized suffix.
fn build_target_segments(
    target_segments: &[RawSegment],
    source_suffix: &[ResourceTreeNode],
) -> Result<Vec<TargetSegment>, Error> {
    let mut out = Vec::new();
    let mut suffix_start = target_segments.len();
    for (i, seg) in target_segments.iter().enumerate() {
        if SegmentName::parse(&seg.name).is_token() {
            suffix_start = i;
            break;
        }
        out.push(TargetSegment::plain(
            match SegmentName::parse(&seg.name) {
                SegmentName::Literal(name) => name,
                _ => unreachable!(),
            },
            seg.kind.clone(),
        ));
    }

    let suffix = &target_segments[suffix_start..];
    if suffix.is_empty() {
        return Ok(out);
    }

    let mut pattern = String::from("^");
    for seg in suffix {
        match SegmentName::parse(&seg.name) {
            SegmentName::Single | SegmentName::Named(_) => pattern.push_str(r"(/\w+)"),
            SegmentName::Multi => pattern.push_str(r"((?:/\w+)*)"),
            SegmentName::Literal(_) => {
                return Err(Error::Other(anyhow::anyhow!(
                    "tokenized suffix contains a literal segment after the first token"
                )))
            }
        }
    }
    pattern.push('$');
    let re = Regex::new(&pattern).expect("suffix regex is always well-formed");

    let joined: String = source_suffix
        .iter()
        .map(|n| format!("/{}", n.resource_name))
        .collect();

    let caps = re.captures(&joined).ok_or_else(|| {
        Error::Other(anyhow::anyhow!(
            "tokenized suffix [{pattern}] does not match source suffix [{joined}]"
        ))
    })?;

    if caps.len() - 1 != suffix.len() {
        return Err(Error::Other(anyhow::anyhow!(
            "matched {} group(s) but target suffix declares {} token(s)",
            caps.len() - 1,
            suffix.len()
        )));
    }

    for (i, seg) in suffix.iter().enumerate() {
        let group = caps.get(i + 1).map(|m| m.as_str()).unwrap_or("");
        for fragment in group.split('/') {
            if fragment.is_empty() {
                continue;
            }
            out.push(TargetSegment::plain(fragment, seg.kind.clone()));
        }
    }

    Ok(out)
}

/// The sync-point engine itself: a thin wrapper borrowing one configured
/// `SyncPoint` for the duration of a `sync` call.
pub struct SyncPointEngine<'a> {
    point: &'a SyncPoint,
}

impl<'a> SyncPointEngine<'a> {
    pub fn new(point: &'a SyncPoint) -> Self {
        Self { point }
    }

    /// Runs the full four-step algorithm, invoking `perm_operation` once
    /// per target resource key that the permission should propagate to.
    /// Returns the first error encountered (ambiguity, no-match, or a
    /// malformed tokenized suffix) without attempting later targets.
    pub fn sync(
        &self,
        perm_operation: &mut dyn FnMut(&str, Vec<TargetSegment>) -> Result<(), Error>,
        permission: &Permission,
        source_tree: &[ResourceTreeNode],
    ) -> Result<(), Error> {
        let source_path = nametype_path(source_tree);
        let (source_key, suffix_idx) =
            find_matching_resource(self.point, &permission.component_name, &source_path)?;

        for (target_key, perm_name) in targets_for(self.point, &source_key, &permission.name) {
            let target_component = self.point.component_for_key(&target_key).ok_or_else(|| {
                Error::Validation {
                    param: "permissions_mapping".into(),
                    detail: format!(
                        "resource key [{target_key}] in a mapping has no owning component"
                    ),
                }
            })?;
            let target_segments = self
                .point
                .segments_for_key(&target_key)
                .expect("key came from this sync-point's services");

            let mut segments =
                build_target_segments(target_segments, &source_tree[suffix_idx.min(source_tree.len())..])?;

            if let Some(leaf) = segments.last_mut() {
                leaf.permission = Some(perm_name);
                leaf.user = permission.user().map(|s| s.to_string());
                leaf.group = permission.group().map(|s| s.to_string());
            } else {
                warn!(target = %target_key, "target resource path resolved to zero segments, skipping");
                continue;
            }

            perm_operation(target_component, segments)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_core::{Access, RawSegment, Scope, SyncPoint};
    use std::collections::HashMap;

    fn seg(name: &str, kind: &str) -> RawSegment {
        RawSegment {
            name: name.to_string(),
            kind: kind.to_string(),
        }
    }

    fn tree(pairs: &[(&str, &str)]) -> Vec<ResourceTreeNode> {
        pairs
            .iter()
            .map(|(n, t)| ResourceTreeNode {
                resource_name: n.to_string(),
                resource_type: t.to_string(),
            })
            .collect()
    }

    fn bidirectional_point() -> SyncPoint {
        let mut services: HashMap<String, HashMap<String, Vec<RawSegment>>> = HashMap::new();
        services.insert(
            "A".into(),
            HashMap::from([(
                "A".into(),
                vec![
                    seg("catalog", "service"),
                    seg("{ws}", "workspace"),
                    seg("**", "file"),
                ],
            )]),
        );
        services.insert(
            "B".into(),
            HashMap::from([(
                "B".into(),
                vec![
                    seg("root", "service"),
                    seg("{ws}", "workspace"),
                    seg("**", "file"),
                ],
            )]),
        );
        SyncPoint {
            id: "sp1".into(),
            services,
            mappings: vec![sync_core::PermissionMapping {
                left_key: "A".into(),
                left_perms: vec!["read".into()],
                direction: sync_core::MappingDirection::Bidirectional,
                right_key: "B".into(),
                right_perms: vec!["read".into()],
                raw: "A:[read] <-> B:[read]".into(),
            }],
        }
    }

    #[test]
    fn token_expansion_bidirectional() {
        let point = bidirectional_point();
        let engine = SyncPointEngine::new(&point);
        let permission = Permission::new(
            "A",
            "rid",
            "catalog/alice/a/b/c.nc",
            "read",
            Access::Allow,
            Scope::Match,
            Some("u1".into()),
            None,
        )
        .unwrap();
        let source_tree = tree(&[
            ("catalog", "service"),
            ("alice", "workspace"),
            ("a", "file"),
            ("b", "file"),
            ("c.nc", "file"),
        ]);

        let mut calls: Vec<(String, Vec<TargetSegment>)> = Vec::new();
        engine
            .sync(
                &mut |component, segments| {
                    calls.push((component.to_string(), segments));
                    Ok(())
                },
                &permission,
                &source_tree,
            )
            .unwrap();

        assert_eq!(calls.len(), 1);
        let (component, segments) = &calls[0];
        assert_eq!(component, "B");
        let names: Vec<&str> = segments.iter().map(|s| s.resource_name.as_str()).collect();
        assert_eq!(names, vec!["root", "alice", "a", "b", "c.nc"]);
        let leaf = segments.last().unwrap();
        assert_eq!(leaf.permission.as_deref(), Some("read"));
        assert_eq!(leaf.user.as_deref(), Some("u1"));
    }

    #[test]
    fn ambiguous_match_is_rejected() {
        let mut services: HashMap<String, HashMap<String, Vec<RawSegment>>> = HashMap::new();
        services.insert(
            "A".into(),
            HashMap::from([
                ("K1".to_string(), vec![seg("catalog", "service"), seg("foo", "file")]),
                ("K2".to_string(), vec![seg("catalog", "service"), seg("foo", "file")]),
            ]),
        );
        let point = SyncPoint {
            id: "sp2".into(),
            services,
            mappings: vec![],
        };
        let err = find_matching_resource(&point, "A", "/catalog:service/foo:file").unwrap_err();
        assert!(matches!(err, Error::Ambiguous(_)));
    }

    #[test]
    fn no_match_is_rejected() {
        let mut services: HashMap<String, HashMap<String, Vec<RawSegment>>> = HashMap::new();
        services.insert(
            "A".into(),
            HashMap::from([("K1".to_string(), vec![seg("catalog", "service")])]),
        );
        let point = SyncPoint {
            id: "sp3".into(),
            services,
            mappings: vec![],
        };
        let err = find_matching_resource(&point, "A", "/other:service").unwrap_err();
        assert!(matches!(err, Error::Ambiguous(_)));
    }
}
