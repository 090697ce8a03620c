//! Entity schemas and their discovery provenance.
//!
//! An [`EntitySchema`] is the authoritative column-level description of
//! one upstream entity for one discovery cycle. It always records which
//! strategy produced it so degraded (static-fallback) schemas stay
//! distinguishable from live ones all the way to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of logical column types the upstream source can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclaredType {
    String,
    Integer,
    Number,
    Boolean,
    Date,
    Timestamp,
    /// Source declared nothing usable; mapped to the default text type.
    Unknown,
}

impl std::fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Timestamp => "timestamp",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Column definition within an entity schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Field name as declared by the source.
    pub name: String,
    /// Logical type declared by the source.
    pub declared_type: DeclaredType,
    /// Declared maximum length for string fields, when the source knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    /// Whether the field permits null values.
    pub nullable: bool,
}

impl FieldSchema {
    /// Convenience constructor for a nullable field with no length bound.
    pub fn new(name: impl Into<String>, declared_type: DeclaredType) -> Self {
        Self {
            name: name.into(),
            declared_type,
            max_length: None,
            nullable: true,
        }
    }
}

/// Which discovery strategy resolved a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    /// Strategy A: the orchestrator's discovery command.
    Orchestrated,
    /// Strategy B: the extractor invoked directly with an inline config.
    Direct,
    /// Strategy C: the static last-resort schema table.
    StaticFallback,
}

impl DiscoverySource {
    /// True only for the static fallback, which is a degraded outcome
    /// even though it "succeeds".
    pub fn is_degraded(self) -> bool {
        matches!(self, Self::StaticFallback)
    }
}

impl std::fmt::Display for DiscoverySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Orchestrated => "orchestrated",
            Self::Direct => "direct",
            Self::StaticFallback => "static_fallback",
        };
        f.write_str(s)
    }
}

/// Resolved column schema for one entity, one discovery cycle.
///
/// A new discovery run replaces the previous schema wholesale; there is
/// no merging and no historical versioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    /// Upstream entity name (e.g. `"allocation"`).
    pub entity: String,
    /// Ordered field list; column order in DDL follows this order.
    pub fields: Vec<FieldSchema>,
    /// Strategy that produced this schema.
    pub source: DiscoverySource,
    /// When discovery resolved it.
    pub discovered_at: DateTime<Utc>,
}

impl EntitySchema {
    pub fn new(entity: impl Into<String>, fields: Vec<FieldSchema>, source: DiscoverySource) -> Self {
        Self {
            entity: entity.into(),
            fields,
            source,
            discovered_at: Utc::now(),
        }
    }
}
