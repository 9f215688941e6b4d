//! Filesystem-monitor registry: wraps `notify` watches behind the
//! `(path, recursive, callback_kind)` subscription model, persists
//! registrations to a JSON store, and translates raw OS events into the
//! created/deleted/modified vocabulary handler adapters expect.

pub mod registry;
pub mod store;

pub use registry::{FsCallback, FsMonitorRegistry};
pub use store::MonitorStore;
