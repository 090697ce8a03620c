//! Schema discovery coordinator.
//!
//! Resolves an [`EntitySchema`] by trying strategies in strict priority
//! order: orchestrated discovery, then direct extractor invocation,
//! then the static fallback table. The first success is authoritative;
//! later strategies are never consulted after one succeeds and results
//! are never merged across strategies.
//!
//! Strategies are synchronous (they shell out with blocking process
//! calls); callers on the async runtime run `discover_entity` under
//! `spawn_blocking`.

mod direct;
mod fallback;
mod orchestrated;
mod singer;

pub use direct::DirectStrategy;
pub use fallback::{FallbackStrategy, FALLBACK_SCHEMA_VERSION};
pub use orchestrated::OrchestratedStrategy;
pub use singer::parse_discovery_output;

use orasync_types::{DiscoverySource, EntityError, EntitySchema, FieldSchema};
use tracing::{info, warn};

use crate::config::DiscoveryConfig;

/// One discovery strategy: a cheap eligibility check plus an attempt.
///
/// `preflight` failures mean "not worth trying" (a configuration gap,
/// not a transient error) and skip straight to the next strategy
/// without invoking anything.
pub trait DiscoveryStrategy: Send {
    fn source(&self) -> DiscoverySource;

    fn preflight(&self) -> Result<(), String> {
        Ok(())
    }

    fn attempt(&self, entity: &str) -> Result<Vec<FieldSchema>, String>;
}

/// The production strategy chain, in priority order.
pub fn default_strategies(config: &DiscoveryConfig) -> Vec<Box<dyn DiscoveryStrategy>> {
    vec![
        Box::new(OrchestratedStrategy::new(config)),
        Box::new(DirectStrategy::new(config)),
        Box::new(FallbackStrategy),
    ]
}

/// Resolve the schema for one entity through the strategy chain.
///
/// # Errors
///
/// Fails with a schema error listing every strategy's reason when the
/// whole chain is exhausted. An empty field list from a strategy counts
/// as a failure; the engine never proceeds with an empty schema.
pub fn discover_entity(
    entity: &str,
    strategies: &[Box<dyn DiscoveryStrategy>],
) -> Result<EntitySchema, EntityError> {
    let mut reasons: Vec<String> = Vec::new();

    for strategy in strategies {
        let source = strategy.source();

        if let Err(reason) = strategy.preflight() {
            info!(entity, strategy = %source, reason, "Skipping discovery strategy");
            reasons.push(format!("{source}: skipped ({reason})"));
            continue;
        }

        match strategy.attempt(entity) {
            Ok(fields) if fields.is_empty() => {
                warn!(entity, strategy = %source, "Discovery strategy produced no fields");
                reasons.push(format!("{source}: produced an empty schema"));
            }
            Ok(fields) => {
                info!(
                    entity,
                    strategy = %source,
                    field_count = fields.len(),
                    degraded = source.is_degraded(),
                    "Schema resolved"
                );
                return Ok(EntitySchema::new(entity, fields, source));
            }
            Err(reason) => {
                warn!(entity, strategy = %source, reason, "Discovery strategy failed");
                reasons.push(format!("{source}: {reason}"));
            }
        }
    }

    Err(EntityError::schema(
        "ALL_STRATEGIES_FAILED",
        format!(
            "could not resolve a schema for entity '{entity}': {}",
            reasons.join("; ")
        ),
    ))
}
