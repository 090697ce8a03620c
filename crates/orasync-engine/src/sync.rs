//! Per-entity sync driver and the bounded multi-entity runner.
//!
//! One entity's pipeline is strictly sequential: discover, synthesize,
//! acquire a connection, apply DDL. Entities share no mutable state
//! (the rule table is read-only), so `sync_all` fans out across a
//! bounded worker pool and aborts the remainder on the first failure.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use orasync_types::{DiscoverySource, EntityError, RuleSet};

use crate::config::SyncConfig;
use crate::connect::{acquire, OracleDialer};
use crate::ddl::{apply_ddl, build_table, render};
use crate::discover::{default_strategies, discover_entity};
use crate::errors::{compute_backoff, SyncError};

/// Result of one entity's synchronization, for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct EntityReport {
    pub entity: String,
    /// Target table that was recreated.
    pub table: String,
    /// Strategy that resolved the schema.
    pub source: DiscoverySource,
    /// True when the schema came from the static fallback table.
    pub degraded: bool,
    pub dropped: bool,
    pub created: bool,
    pub duration_secs: f64,
}

/// Synchronize one entity end to end.
///
/// # Errors
///
/// Fails with the first unrecoverable step error: discovery
/// exhaustion, synthesis failure, connection failure, or DDL failure.
pub async fn sync_entity(config: &SyncConfig, entity: &str) -> Result<EntityReport, SyncError> {
    let started = std::time::Instant::now();
    let deadline = config
        .resources
        .deadline_seconds
        .map(|secs| Instant::now() + Duration::from_secs(secs));

    // Discovery shells out with blocking process calls.
    let discovery_config = config.discovery.clone();
    let entity_name = entity.to_string();
    let schema = tokio::task::spawn_blocking(move || {
        let strategies = default_strategies(&discovery_config);
        discover_entity(&entity_name, &strategies)
    })
    .await
    .map_err(|e| SyncError::Infrastructure(anyhow::anyhow!("discovery task failed: {e}")))??;

    let table = build_table(&schema, RuleSet::builtin(), &config.naming)?;
    let script = render(&table);
    debug!(entity, table = %table.table_name, columns = table.columns.len(), "DDL synthesized");

    let mut dialer = OracleDialer;
    let acquired = acquire(&mut dialer, config.connection.target(), &config.retry, deadline)
        .await
        .map_err(SyncError::Entity)?;

    if deadline.is_some_and(|d| Instant::now() >= d) {
        return Err(EntityError::cancelled(format!(
            "deadline expired before DDL for entity '{entity}' was applied"
        ))
        .into());
    }

    let table_name = table.table_name.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let conn = acquired.handle;
        let result = apply_ddl(&conn, &table_name, &script);
        if let Err(e) = conn.close() {
            debug!("Connection close failed: {e}");
        }
        result
    })
    .await
    .map_err(|e| SyncError::Infrastructure(anyhow::anyhow!("DDL task failed: {e}")))??;

    Ok(EntityReport {
        entity: entity.to_string(),
        table: table.table_name,
        source: schema.source,
        degraded: schema.source.is_degraded(),
        dropped: outcome.dropped,
        created: outcome.created,
        duration_secs: started.elapsed().as_secs_f64(),
    })
}

/// Run an entity operation with whole-entity retries on retryable errors.
async fn with_entity_retries<T, F, Fut>(
    entity: &str,
    max_retries: u32,
    op: F,
) -> Result<T, SyncError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, SyncError>>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt <= max_retries => {
                let delay = err
                    .as_entity_error()
                    .map(|e| compute_backoff(e, attempt))
                    .unwrap_or_default();
                warn!(entity, attempt, ?delay, "Retrying entity sync: {err}");
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Synchronize every configured entity across a bounded worker pool.
///
/// The first failed entity aborts the remaining in-flight work; reports
/// come back in configuration order.
///
/// # Errors
///
/// Returns the first entity failure, or an infrastructure error if a
/// worker task dies.
pub async fn sync_all(config: Arc<SyncConfig>) -> Result<Vec<EntityReport>, SyncError> {
    let parallelism = config.resources.parallelism as usize;
    let semaphore = Arc::new(Semaphore::new(parallelism));
    let mut join_set: JoinSet<Result<EntityReport, SyncError>> = JoinSet::new();

    info!(
        entities = config.entities.len(),
        parallelism, "Starting sync run"
    );

    for entity in config.entities.clone() {
        let semaphore = Arc::clone(&semaphore);
        let config = Arc::clone(&config);
        join_set.spawn(async move {
            let _permit = semaphore.acquire_owned().await.map_err(|e| {
                SyncError::Infrastructure(anyhow::anyhow!("worker pool closed: {e}"))
            })?;
            with_entity_retries(&entity, config.resources.max_retries, || {
                sync_entity(&config, &entity)
            })
            .await
        });
    }

    let mut reports = Vec::with_capacity(config.entities.len());
    while let Some(joined) = join_set.join_next().await {
        let result = joined
            .map_err(|e| SyncError::Infrastructure(anyhow::anyhow!("entity task failed: {e}")))?;
        match result {
            Ok(report) => {
                if report.degraded {
                    warn!(
                        entity = %report.entity,
                        table = %report.table,
                        source = %report.source,
                        "Entity synchronized from a DEGRADED static fallback schema"
                    );
                } else {
                    info!(
                        entity = %report.entity,
                        table = %report.table,
                        source = %report.source,
                        "Entity synchronized"
                    );
                }
                reports.push(report);
            }
            Err(err) => {
                join_set.abort_all();
                return Err(err);
            }
        }
    }

    // Report in configuration order, not completion order.
    reports.sort_by_key(|r| {
        config
            .entities
            .iter()
            .position(|e| *e == r.entity)
            .unwrap_or(usize::MAX)
    });
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn report(entity: &str) -> EntityReport {
        EntityReport {
            entity: entity.into(),
            table: format!("WMS_{}", entity.to_uppercase()),
            source: DiscoverySource::Orchestrated,
            degraded: false,
            dropped: true,
            created: true,
            duration_secs: 0.5,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retryable_error_is_retried() {
        let calls = AtomicU32::new(0);
        let result = with_entity_retries("allocation", 2, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(SyncError::Entity(EntityError::transient_db(
                        "DROP_FAILED",
                        "ORA-00054: resource busy",
                    )))
                } else {
                    Ok(report("allocation"))
                }
            }
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<EntityReport, _> = with_entity_retries("allocation", 3, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(SyncError::Entity(EntityError::synthesis(
                    "EMPTY_FIELD_NAME",
                    "field 2 has an empty name",
                )))
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_are_bounded() {
        let calls = AtomicU32::new(0);
        let result: Result<EntityReport, _> = with_entity_retries("allocation", 2, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(SyncError::Entity(EntityError::transient_network(
                    "ORA-12170",
                    "connect timeout",
                )))
            }
        })
        .await;
        assert!(result.is_err());
        // Initial attempt plus two retries.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn report_serializes_with_source_tag() {
        let json = serde_json::to_value(report("order")).unwrap();
        assert_eq!(json["source"], "orchestrated");
        assert_eq!(json["table"], "WMS_ORDER");
        assert_eq!(json["degraded"], false);
    }
}
