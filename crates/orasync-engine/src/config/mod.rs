//! Sync configuration: YAML parsing, typed sections, validation.

pub mod parser;
pub mod types;
pub mod validator;

pub use parser::{parse_config, parse_config_str};
pub use types::{CommandConfig, ConnectionConfig, DiscoveryConfig, ResourceConfig, SyncConfig};
pub use validator::validate_config;
