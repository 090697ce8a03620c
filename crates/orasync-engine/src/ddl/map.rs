//! Field-to-Oracle-type mapping.

use orasync_types::{DeclaredType, EntityError, FieldSchema, RuleSet};
use tracing::debug;

/// Widest bound for a derived VARCHAR2 column.
const MAX_VARCHAR_CHARS: u32 = 4000;

/// Resolve the Oracle type for one field.
///
/// Pattern rules are consulted first, in rank order, and the first
/// match is used verbatim. Only when no rule matches does the declared
/// type decide. A field with an empty name is unmappable.
///
/// # Errors
///
/// Fails with a synthesis error for an empty field name.
pub fn map_field(field: &FieldSchema, rules: &RuleSet) -> Result<String, EntityError> {
    if field.name.trim().is_empty() {
        return Err(EntityError::synthesis(
            "EMPTY_FIELD_NAME",
            "field with an empty name cannot be mapped to a column",
        ));
    }

    if let Some(rule) = rules.match_field(&field.name) {
        debug!(
            field = %field.name,
            rule = %rule.name,
            oracle_type = %rule.oracle_type,
            "Pattern rule matched"
        );
        return Ok(rule.oracle_type.clone());
    }

    Ok(declared_type_mapping(field))
}

fn declared_type_mapping(field: &FieldSchema) -> String {
    match field.declared_type {
        DeclaredType::String => match field.max_length {
            Some(len) if len > 255 => format!("VARCHAR2({} CHAR)", len.min(MAX_VARCHAR_CHARS)),
            _ => "VARCHAR2(255 CHAR)".to_string(),
        },
        DeclaredType::Integer | DeclaredType::Number => "NUMBER".to_string(),
        DeclaredType::Boolean => "NUMBER(1,0)".to_string(),
        DeclaredType::Date => "DATE".to_string(),
        DeclaredType::Timestamp => "TIMESTAMP(6)".to_string(),
        DeclaredType::Unknown => "VARCHAR2(255 CHAR)".to_string(),
    }
}
