pub mod check;
pub mod ddl;
pub mod discover;
pub mod sync;

use std::path::Path;

use anyhow::{Context, Result};
use orasync_engine::config::{parse_config, validate_config, SyncConfig};

/// Load and validate the sync config, shared by every command.
fn load_config(config_path: &Path) -> Result<SyncConfig> {
    let config = parse_config(config_path)
        .with_context(|| format!("Failed to load sync config: {}", config_path.display()))?;
    validate_config(&config)?;
    Ok(config)
}
