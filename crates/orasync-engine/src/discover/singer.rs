//! Parsing of extractor discovery output.
//!
//! Both live strategies shell out to a tap-style program whose stdout
//! mixes log noise with JSON lines. The schema can arrive as a
//! `SCHEMA` message, as a catalog document with a `streams` array, or
//! as a bare JSON-Schema object; the first schema-bearing line wins.
//! Property order in the schema dictates column order downstream.

use orasync_types::{DeclaredType, FieldSchema};
use serde_json::Value;

/// Extract the field list for `entity` from raw discovery output.
///
/// # Errors
///
/// Returns a human-readable reason when no schema-bearing line is
/// found or the schema has no usable `properties` object.
pub fn parse_discovery_output(output: &str, entity: &str) -> Result<Vec<FieldSchema>, String> {
    for line in output.lines() {
        let line = line.trim();
        if !line.starts_with('{') {
            continue;
        }
        let Ok(value) = serde_json::from_str::<Value>(line) else {
            continue;
        };
        if let Some(schema) = schema_payload(&value, entity) {
            return fields_from_schema(schema);
        }
    }
    Err(format!(
        "no schema message for entity '{entity}' in discovery output"
    ))
}

/// Locate the JSON-Schema object inside one parsed output line.
fn schema_payload<'a>(value: &'a Value, entity: &str) -> Option<&'a Value> {
    // Singer SCHEMA message: {"type": "SCHEMA", "schema": {...}}
    if value.get("type").and_then(Value::as_str) == Some("SCHEMA") {
        return value.get("schema");
    }
    // Catalog document: {"streams": [{"tap_stream_id": ..., "schema": {...}}]}
    if let Some(streams) = value.get("streams").and_then(Value::as_array) {
        let matching = streams.iter().find(|s| {
            s.get("tap_stream_id").and_then(Value::as_str) == Some(entity)
                || s.get("stream").and_then(Value::as_str) == Some(entity)
        });
        return matching.or_else(|| streams.first())?.get("schema");
    }
    // Bare JSON-Schema object.
    if value.get("type").and_then(Value::as_str) == Some("object") && value.get("properties").is_some()
    {
        return Some(value);
    }
    None
}

fn fields_from_schema(schema: &Value) -> Result<Vec<FieldSchema>, String> {
    let props = schema
        .get("properties")
        .and_then(Value::as_object)
        .ok_or_else(|| "schema has no properties object".to_string())?;

    Ok(props
        .iter()
        .map(|(name, prop)| field_from_property(name, prop))
        .collect())
}

fn field_from_property(name: &str, prop: &Value) -> FieldSchema {
    let (declared_type, nullable) = declared_type_of(prop);
    let max_length = prop
        .get("maxLength")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok());
    FieldSchema {
        name: name.to_string(),
        declared_type,
        max_length,
        nullable,
    }
}

/// Resolve the declared type and nullability of one property.
///
/// The JSON-Schema `type` may be a string or a list; `"null"` in a list
/// marks the field nullable. A `format` of `date-time` or `date`
/// refines string types. Anything unrecognized is [`DeclaredType::Unknown`].
fn declared_type_of(prop: &Value) -> (DeclaredType, bool) {
    let mut nullable = false;
    let mut primary: Option<&str> = None;

    match prop.get("type") {
        Some(Value::String(s)) => primary = Some(s),
        Some(Value::Array(items)) => {
            for item in items.iter().filter_map(Value::as_str) {
                if item == "null" {
                    nullable = true;
                } else if primary.is_none() {
                    primary = Some(item);
                }
            }
        }
        _ => nullable = true,
    }

    let declared = match primary {
        Some("string") => match prop.get("format").and_then(Value::as_str) {
            Some("date-time") => DeclaredType::Timestamp,
            Some("date") => DeclaredType::Date,
            _ => DeclaredType::String,
        },
        Some("integer") => DeclaredType::Integer,
        Some("number") => DeclaredType::Number,
        Some("boolean") => DeclaredType::Boolean,
        Some(_) | None => DeclaredType::Unknown,
    };
    (declared, nullable)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA_LINE: &str = concat!(
        r#"{"type": "SCHEMA", "stream": "allocation", "schema": {"type": "object", "#,
        r#""properties": {"#,
        r#""id": {"type": "integer"}, "#,
        r#""alloc_qty": {"type": ["null", "number"]}, "#,
        r#""status": {"type": ["null", "string"], "maxLength": 40}, "#,
        r#""mod_ts": {"type": "string", "format": "date-time"}, "#,
        r#""ship_date": {"type": ["null", "string"], "format": "date"}, "#,
        r#""payload": {}"#,
        r#"}}}"#
    );

    #[test]
    fn schema_message_among_log_noise() {
        let output = format!(
            "INFO starting discovery\n{SCHEMA_LINE}\nINFO discovery complete\n"
        );
        let fields = parse_discovery_output(&output, "allocation").unwrap();
        assert_eq!(fields.len(), 6);
        // Property order is preserved, not sorted.
        assert_eq!(fields[0].name, "id");
        assert_eq!(fields[1].name, "alloc_qty");
        assert_eq!(fields[4].name, "ship_date");
    }

    #[test]
    fn types_and_nullability() {
        let fields = parse_discovery_output(SCHEMA_LINE, "allocation").unwrap();
        let by_name = |n: &str| fields.iter().find(|f| f.name == n).unwrap();

        let id = by_name("id");
        assert_eq!(id.declared_type, DeclaredType::Integer);
        assert!(!id.nullable);

        let qty = by_name("alloc_qty");
        assert_eq!(qty.declared_type, DeclaredType::Number);
        assert!(qty.nullable);

        let status = by_name("status");
        assert_eq!(status.declared_type, DeclaredType::String);
        assert_eq!(status.max_length, Some(40));

        assert_eq!(by_name("mod_ts").declared_type, DeclaredType::Timestamp);
        assert_eq!(by_name("ship_date").declared_type, DeclaredType::Date);

        let payload = by_name("payload");
        assert_eq!(payload.declared_type, DeclaredType::Unknown);
        assert!(payload.nullable);
    }

    #[test]
    fn catalog_selects_matching_stream() {
        let catalog = r#"{"streams": [
            {"tap_stream_id": "order", "schema": {"type": "object", "properties": {"order_no": {"type": "string"}}}},
            {"tap_stream_id": "pick", "schema": {"type": "object", "properties": {"pick_id": {"type": "integer"}}}}
        ]}"#
        .replace('\n', " ");
        let fields = parse_discovery_output(&catalog, "pick").unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "pick_id");
    }

    #[test]
    fn bare_json_schema_object() {
        let raw = r#"{"type": "object", "properties": {"id": {"type": "integer"}}}"#;
        let fields = parse_discovery_output(raw, "allocation").unwrap();
        assert_eq!(fields[0].name, "id");
    }

    #[test]
    fn no_schema_line_is_an_error() {
        let err = parse_discovery_output("INFO nothing here\n", "allocation").unwrap_err();
        assert!(err.contains("no schema message"));
        assert!(err.contains("allocation"));
    }

    #[test]
    fn missing_properties_is_an_error() {
        let raw = r#"{"type": "SCHEMA", "schema": {"type": "object"}}"#;
        let err = parse_discovery_output(raw, "allocation").unwrap_err();
        assert!(err.contains("properties"));
    }
}
