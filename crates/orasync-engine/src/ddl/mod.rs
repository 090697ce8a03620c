//! Type mapping and DDL synthesis.
//!
//! Turns an entity schema into a table definition and an idempotent
//! drop/create script, then applies it. Mapping consults the shared
//! field-pattern rule table first and declared types second; synthesis
//! is deterministic by construction.

mod apply;
mod map;
mod synth;

pub use apply::{apply_ddl, ApplyOutcome, DdlExecutor};
pub use map::map_field;
pub use synth::{build_table, render, synthesize, DdlScript};
