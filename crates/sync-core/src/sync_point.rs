use std::collections::HashMap;

use crate::resource::RawSegment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingDirection {
    LeftToRight,
    RightToLeft,
    Bidirectional,
}

impl MappingDirection {
    pub fn parse(arrow: &str) -> Option<Self> {
        match arrow {
            "->" => Some(MappingDirection::LeftToRight),
            "<-" => Some(MappingDirection::RightToLeft),
            "<->" => Some(MappingDirection::Bidirectional),
            _ => None,
        }
    }
}

/// One parsed `permissions_mapping` rule:
/// `left_key : [perms] <dir> right_key : [perms]`.
#[derive(Debug, Clone)]
pub struct PermissionMapping {
    pub left_key: String,
    pub left_perms: Vec<String>,
    pub direction: MappingDirection,
    pub right_key: String,
    pub right_perms: Vec<String>,
    /// The original mapping string, kept for error messages.
    pub raw: String,
}

impl PermissionMapping {
    /// Yields (resource_key, permission_name) sides that act as a *source*
    /// for propagation (i.e. the sides the engine checks incoming events
    /// against), paired with their corresponding *target* side.
    pub fn source_sides(&self) -> Vec<(&str, &[String], &str, &[String])> {
        match self.direction {
            MappingDirection::Bidirectional => vec![
                (
                    self.left_key.as_str(),
                    self.left_perms.as_slice(),
                    self.right_key.as_str(),
                    self.right_perms.as_slice(),
                ),
                (
                    self.right_key.as_str(),
                    self.right_perms.as_slice(),
                    self.left_key.as_str(),
                    self.left_perms.as_slice(),
                ),
            ],
            MappingDirection::LeftToRight => vec![(
                self.left_key.as_str(),
                self.left_perms.as_slice(),
                self.right_key.as_str(),
                self.right_perms.as_slice(),
            )],
            MappingDirection::RightToLeft => vec![(
                self.right_key.as_str(),
                self.right_perms.as_slice(),
                self.left_key.as_str(),
                self.left_perms.as_slice(),
            )],
        }
    }
}

/// `{component_name -> {resource_key -> segments}}`, as loaded from config.
pub type ServicesMap = HashMap<String, HashMap<String, Vec<RawSegment>>>;

/// A configured sync-point: the set of components that share resources and
/// the rules translating permissions among them.
#[derive(Debug, Clone)]
pub struct SyncPoint {
    pub id: String,
    pub services: ServicesMap,
    pub mappings: Vec<PermissionMapping>,
}

impl SyncPoint {
    /// The component owning a given resource key, if any (resource keys are
    /// globally unique within one sync-point, so the first match is the
    /// only one).
    pub fn component_for_key(&self, resource_key: &str) -> Option<&str> {
        self.services
            .iter()
            .find(|(_, resources)| resources.contains_key(resource_key))
            .map(|(component, _)| component.as_str())
    }

    pub fn segments_for_key(&self, resource_key: &str) -> Option<&[RawSegment]> {
        self.services
            .values()
            .find_map(|resources| resources.get(resource_key))
            .map(|segs| segs.as_slice())
    }
}
