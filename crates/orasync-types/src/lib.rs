//! Shared data model for the orasync schema-synchronization engine.
//!
//! Everything that crosses a component boundary lives here: entity
//! schemas produced by discovery, connection targets and attempt
//! records from the resilience layer, the field-pattern rule table,
//! and the typed error taxonomy.

pub mod connect;
pub mod error;
pub mod rules;
pub mod schema;
pub mod table;

pub use connect::{
    AttemptOutcome, AttemptRecord, ConnectTarget, Protocol, RetryPolicy, DEFAULT_LISTENER_PORT,
};
pub use error::{BackoffClass, EntityError, ErrorCategory};
pub use rules::{FieldPatternRule, RuleSet};
pub use schema::{DeclaredType, DiscoverySource, EntitySchema, FieldSchema};
pub use table::{ColumnDefinition, NamingPolicy, TableDefinition};
