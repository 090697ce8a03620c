//! Core engine crate for orasync schema synchronization.
//!
//! Owns the three real pieces of logic in the system: the connection
//! resilience layer ([`connect`]), the schema discovery coordinator
//! ([`discover`]), and the type-mapping/DDL-synthesis engine ([`ddl`]),
//! plus the per-entity sync driver ([`sync`]) and config loading.

pub mod config;
pub mod connect;
pub mod ddl;
pub mod discover;
pub mod errors;
pub mod sync;

pub use errors::SyncError;
pub use sync::{sync_all, sync_entity, EntityReport};
