//! Config loading and validation: YAML/JSON files or directories (merged in
//! alphabetical order), environment-variable expansion, and the token and
//! mapping-grammar rules a `sync_permissions` section must satisfy before
//! any `SyncPoint` is handed to the engine.

pub mod env;
pub mod loader;
pub mod validate;

pub use loader::{load_handlers, load_section, load_sync_points};
pub use validate::{parse_mapping, resource_token_info, validate_bidirectional, validate_unidirectional, ResourceTokenInfo};
