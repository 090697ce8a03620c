use std::path::Path;

use anyhow::Result;
use orasync_engine::ddl::synthesize;
use orasync_engine::discover::{
    default_strategies, discover_entity, DiscoveryStrategy, FallbackStrategy,
};
use orasync_types::RuleSet;

/// Execute the `ddl` command: print the DDL that would be applied.
pub async fn execute(config_path: &Path, entity: &str, offline: bool) -> Result<()> {
    let config = super::load_config(config_path)?;

    let discovery = config.discovery.clone();
    let name = entity.to_string();
    let schema = tokio::task::spawn_blocking(move || {
        let strategies: Vec<Box<dyn DiscoveryStrategy>> = if offline {
            vec![Box::new(FallbackStrategy)]
        } else {
            default_strategies(&discovery)
        };
        discover_entity(&name, &strategies)
    })
    .await??;

    let script = synthesize(&schema, RuleSet::builtin(), &config.naming)?;

    println!("-- {} (source: {})", entity, schema.source);
    println!("{}", script.text());

    Ok(())
}
