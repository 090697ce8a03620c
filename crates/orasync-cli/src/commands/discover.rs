use std::path::Path;

use anyhow::Result;
use orasync_engine::discover::{default_strategies, discover_entity};

/// Execute the `discover` command: resolve and print one entity's schema.
pub async fn execute(config_path: &Path, entity: &str) -> Result<()> {
    let config = super::load_config(config_path)?;

    let discovery = config.discovery.clone();
    let name = entity.to_string();
    let schema = tokio::task::spawn_blocking(move || {
        let strategies = default_strategies(&discovery);
        discover_entity(&name, &strategies)
    })
    .await??;

    println!("Entity: {} (source: {})", schema.entity, schema.source);
    if schema.source.is_degraded() {
        println!("WARNING: static fallback schema; columns may not match the live source");
    }

    println!("  Columns:");
    for field in &schema.fields {
        let bound = field
            .max_length
            .map(|len| format!(", max {len}"))
            .unwrap_or_default();
        let nullable = if field.nullable { "NULL" } else { "NOT NULL" };
        println!(
            "    - {} ({}{}, {})",
            field.name, field.declared_type, bound, nullable
        );
    }

    let json = serde_json::to_string(&schema)?;
    println!("\n@@SCHEMA_JSON@@{json}");

    Ok(())
}
