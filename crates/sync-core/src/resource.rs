use serde::{Deserialize, Serialize};

pub const MULTI_TOKEN: &str = "**";
pub const SINGLE_TOKEN: &str = "*";

/// The name half of a configured resource segment. Literal names, the two
/// sentinel tokens, and named tokens (`{ident}`) are distinguished up front
/// at config-parse time so the engine and validator never string-compare
/// sentinels again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentName {
    Literal(String),
    Single,
    Multi,
    Named(String),
}

impl SegmentName {
    pub fn parse(raw: &str) -> Self {
        if raw == MULTI_TOKEN {
            SegmentName::Multi
        } else if raw == SINGLE_TOKEN {
            SegmentName::Single
        } else if let Some(ident) = raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            SegmentName::Named(ident.trim().to_string())
        } else {
            SegmentName::Literal(raw.to_string())
        }
    }

    pub fn is_token(&self) -> bool {
        !matches!(self, SegmentName::Literal(_))
    }
}

/// A single (name, type) pair as configured in a sync-point's resource path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSegment {
    pub name: SegmentName,
    pub kind: String,
}

/// Raw, wire-level segment shape used when (de)serializing config files,
/// before `SegmentName::parse` classifies the name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSegment {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<&RawSegment> for ResourceSegment {
    fn from(raw: &RawSegment) -> Self {
        ResourceSegment {
            name: SegmentName::parse(&raw.name),
            kind: raw.kind.clone(),
        }
    }
}

/// One segment of a live resource path (no tokens — this is what an
/// inbound event's resource tree is made of).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTreeNode {
    pub resource_name: String,
    pub resource_type: String,
}

/// One segment of a computed target resource path, with permission details
/// attached to the leaf segment only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSegment {
    pub resource_name: String,
    pub resource_type: String,
    pub permission: Option<String>,
    pub user: Option<String>,
    pub group: Option<String>,
}

impl TargetSegment {
    pub fn plain(resource_name: impl Into<String>, resource_type: impl Into<String>) -> Self {
        TargetSegment {
            resource_name: resource_name.into(),
            resource_type: resource_type.into(),
            permission: None,
            user: None,
            group: None,
        }
    }
}
