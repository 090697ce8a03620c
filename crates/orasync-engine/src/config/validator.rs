//! Semantic validation for parsed sync configuration values.

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

use crate::config::types::SyncConfig;

/// Oracle identifiers are limited to 30 bytes on the databases this
/// engine targets.
const MAX_IDENTIFIER_LEN: usize = 30;

static ENTITY_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid entity name regex"));

static ORACLE_IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("valid identifier regex"));

fn validate_identifier(value: &str, context: &str, errors: &mut Vec<String>) {
    if value.trim().is_empty() {
        errors.push(format!("{context} must not be empty"));
        return;
    }
    if !ORACLE_IDENT_RE.is_match(value) {
        errors.push(format!(
            "{context} '{value}' is not a legal Oracle identifier"
        ));
    }
    if value.len() > MAX_IDENTIFIER_LEN {
        errors.push(format!(
            "{context} '{value}' exceeds the {MAX_IDENTIFIER_LEN}-byte identifier limit"
        ));
    }
}

/// Validate a parsed sync configuration.
///
/// # Errors
///
/// Returns an error listing all validation failures found in the config.
pub fn validate_config(config: &SyncConfig) -> Result<()> {
    let mut errors = Vec::new();

    if config.project.trim().is_empty() {
        errors.push("Project name must not be empty".to_string());
    }

    if config.connection.host.trim().is_empty() {
        errors.push("Connection host must not be empty".to_string());
    }
    if config.connection.port == 0 {
        errors.push("Connection port must not be 0".to_string());
    }
    if config.connection.service.trim().is_empty() {
        errors.push("Connection service must not be empty".to_string());
    }
    if config.connection.username.trim().is_empty() {
        errors.push("Connection username must not be empty".to_string());
    }

    if config.retry.max_attempts == 0 {
        errors.push("retry.max_attempts must be at least 1".to_string());
    }
    if config.retry.backoff_multiplier < 1.0 {
        errors.push("retry.backoff_multiplier must be >= 1.0".to_string());
    }

    validate_identifier(&config.naming.owner, "naming.owner", &mut errors);
    if !config.naming.prefix.is_empty() {
        validate_identifier(&config.naming.prefix, "naming.prefix", &mut errors);
    }

    if config.entities.is_empty() {
        errors.push("At least one entity must be configured".to_string());
    }
    for entity in &config.entities {
        if !ENTITY_NAME_RE.is_match(entity) {
            errors.push(format!(
                "Entity '{entity}' must be a lowercase identifier ([a-z][a-z0-9_]*)"
            ));
            continue;
        }
        let table = config.naming.table_name(entity);
        if table.len() > MAX_IDENTIFIER_LEN {
            errors.push(format!(
                "Table name '{table}' for entity '{entity}' exceeds the \
                 {MAX_IDENTIFIER_LEN}-byte identifier limit"
            ));
        }
    }

    if config.resources.parallelism == 0 {
        errors.push("resources.parallelism must be at least 1".to_string());
    }

    if config.discovery.orchestrator.program.trim().is_empty() {
        errors.push("discovery.orchestrator.program must not be empty".to_string());
    }
    if config.discovery.extractor.program.trim().is_empty() {
        errors.push("discovery.extractor.program must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Invalid sync configuration:\n  - {}", errors.join("\n  - "))
    }
}
