//! Applying a synthesized DDL script to the target database.

use orasync_types::EntityError;
use tracing::info;

use crate::ddl::synth::DdlScript;

/// Statement execution seam; implemented by the Oracle connection and
/// by test doubles.
pub trait DdlExecutor {
    /// Execute one DDL statement or PL/SQL block.
    ///
    /// # Errors
    ///
    /// Returns the database's error text on failure.
    fn execute_ddl(&self, sql: &str) -> Result<(), String>;
}

impl DdlExecutor for oracle::Connection {
    fn execute_ddl(&self, sql: &str) -> Result<(), String> {
        self.execute(sql, &[]).map(|_| ()).map_err(|e| e.to_string())
    }
}

/// What actually happened against the database.
///
/// `dropped && !created` is the state the drop/create boundary exists
/// to surface: the old table is gone and nothing replaced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub dropped: bool,
    pub created: bool,
}

/// Execute the script: guarded drop, then create.
///
/// # Errors
///
/// `DROP_FAILED` when the guarded drop block itself errors (the table,
/// if it existed, is untouched). `CREATE_AFTER_DROP_FAILED` when the
/// create fails after a successful drop, which leaves the entity with
/// no table; both are retryable since the script is idempotent.
pub fn apply_ddl<E: DdlExecutor>(
    executor: &E,
    table_name: &str,
    script: &DdlScript,
) -> Result<ApplyOutcome, EntityError> {
    executor.execute_ddl(&script.drop_stmt).map_err(|reason| {
        EntityError::transient_db(
            "DROP_FAILED",
            format!("guarded drop of {table_name} failed: {reason}"),
        )
    })?;

    executor.execute_ddl(&script.create_stmt).map_err(|reason| {
        EntityError::transient_db(
            "CREATE_AFTER_DROP_FAILED",
            format!("create of {table_name} failed after a successful drop; the table is currently absent: {reason}"),
        )
    })?;

    info!(table = table_name, "Table recreated");
    Ok(ApplyOutcome {
        dropped: true,
        created: true,
    })
}
