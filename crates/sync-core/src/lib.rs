//! Shared data model and error taxonomy for the permission-propagation and
//! file-event coordination engine: `Permission`, resource-path segments,
//! `SyncPoint` configuration, `Monitor` subscriptions, `HandlerConfig`, and
//! the crate-wide `Error` enum. No component in this workspace retains a
//! `Permission` beyond the event that produced it — these are value types.

pub mod error;
pub mod handler_config;
pub mod monitor;
pub mod permission;
pub mod resource;
pub mod settings;
pub mod sync_point;

pub use error::{ConfigError, Error, HandlerError};
pub use handler_config::HandlerConfig;
pub use monitor::{CallbackKind, Monitor, MonitorRecord};
pub use permission::{Access, Permission, Scope, Subject};
pub use resource::{RawSegment, ResourceSegment, ResourceTreeNode, SegmentName, TargetSegment};
pub use settings::Settings;
pub use sync_point::{MappingDirection, PermissionMapping, ServicesMap, SyncPoint};
