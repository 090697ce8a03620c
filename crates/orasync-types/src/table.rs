//! Derived Oracle table definitions.
//!
//! A [`TableDefinition`] is a pure function of an entity schema, the
//! rule set, and the naming policy; it is never mutated in place. A
//! schema change produces a new definition and the caller decides what
//! to do with the old table.

use serde::{Deserialize, Serialize};

/// Table-naming configuration for the target schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingPolicy {
    /// Target schema/owner the tables are created under.
    pub owner: String,
    /// Prefix prepended to every table name (e.g. `allocation` -> `WMS_ALLOCATION`).
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Replication/version key appended to the primary key when present.
    #[serde(default = "default_replication_key")]
    pub replication_key: String,
}

fn default_prefix() -> String {
    "WMS".to_string()
}

fn default_replication_key() -> String {
    "mod_ts".to_string()
}

impl NamingPolicy {
    /// Uppercase, prefixed table name for an entity.
    pub fn table_name(&self, entity: &str) -> String {
        if self.prefix.is_empty() {
            entity.to_uppercase()
        } else {
            format!("{}_{}", self.prefix.to_uppercase(), entity.to_uppercase())
        }
    }
}

/// One resolved column of a table definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Uppercase-normalized column name.
    pub name: String,
    /// Resolved Oracle type text, emitted verbatim.
    pub oracle_type: String,
    pub nullable: bool,
    pub primary_key: bool,
}

/// Complete, ordered definition of one target table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Uppercase owner/schema.
    pub owner: String,
    /// Uppercase, prefixed table name.
    pub table_name: String,
    /// Columns in entity-schema order.
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    /// `"OWNER"."TABLE"` with quoted identifiers.
    pub fn qualified_name(&self) -> String {
        format!("\"{}\".\"{}\"", self.owner, self.table_name)
    }

    /// Primary-key column names in column order.
    pub fn primary_key_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }
}
