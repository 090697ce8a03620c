use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use orasync_engine::config::SyncConfig;
use orasync_engine::ddl::synthesize;
use orasync_engine::discover::{default_strategies, discover_entity};
use orasync_engine::sync::sync_all;
use orasync_types::RuleSet;

/// Execute the `sync` command: synchronize every selected entity.
pub async fn execute(config_path: &Path, entity: Option<&str>, dry_run: bool) -> Result<()> {
    let mut config = super::load_config(config_path)?;

    if let Some(entity) = entity {
        if !config.entities.iter().any(|e| e == entity) {
            anyhow::bail!("Entity '{entity}' is not in the configured entity list");
        }
        config.entities = vec![entity.to_string()];
    }

    if dry_run {
        return plan_only(&config).await;
    }

    let reports = sync_all(Arc::new(config)).await?;

    println!("Synchronized {} entit(y/ies):\n", reports.len());
    for report in &reports {
        let flag = if report.degraded {
            "  [DEGRADED SCHEMA]"
        } else {
            ""
        };
        println!(
            "  {:24} -> {} (source: {}, {:.1}s){}",
            report.entity, report.table, report.source, report.duration_secs, flag
        );
    }

    let json = serde_json::to_string(&reports)?;
    println!("\n@@REPORT_JSON@@{json}");

    Ok(())
}

/// Dry run: resolve schemas and print the DDL without touching the database.
async fn plan_only(config: &SyncConfig) -> Result<()> {
    for entity in &config.entities {
        let discovery = config.discovery.clone();
        let name = entity.clone();
        let schema = tokio::task::spawn_blocking(move || {
            let strategies = default_strategies(&discovery);
            discover_entity(&name, &strategies)
        })
        .await??;

        let script = synthesize(&schema, RuleSet::builtin(), &config.naming)?;

        let flag = if schema.source.is_degraded() {
            " [DEGRADED SCHEMA]"
        } else {
            ""
        };
        println!("-- {} (source: {}){}", entity, schema.source, flag);
        println!("{}\n", script.text());
    }
    Ok(())
}
