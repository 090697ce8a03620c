//! Table definition and DDL text synthesis.
//!
//! `synthesize` is a pure function of (schema, rules, naming): the same
//! inputs always yield byte-identical DDL text. Nothing here touches a
//! clock, a connection, or process state.

use orasync_types::{
    ColumnDefinition, EntityError, EntitySchema, NamingPolicy, RuleSet, TableDefinition,
};

use crate::ddl::map::map_field;

/// Oracle identifier limit; constraint names are clamped to it.
const MAX_IDENTIFIER_LEN: usize = 30;

/// Rendered two-statement DDL sequence for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdlScript {
    /// Guarded drop: ignores "table does not exist" (ORA-00942), raises
    /// everything else.
    pub drop_stmt: String,
    pub create_stmt: String,
}

impl DdlScript {
    /// Full script text, drop first.
    pub fn text(&self) -> String {
        format!("{}\n{}", self.drop_stmt, self.create_stmt)
    }
}

/// Derive the table definition for an entity schema.
///
/// Column order follows the schema's field order. A field named `id`
/// (case-insensitive) becomes the primary key; when the naming policy's
/// replication key is also present it is appended, making the key
/// composite. Primary-key columns are always NOT NULL.
///
/// # Errors
///
/// Propagates mapping failures; each is fatal for the entity.
pub fn build_table(
    schema: &EntitySchema,
    rules: &RuleSet,
    naming: &NamingPolicy,
) -> Result<TableDefinition, EntityError> {
    let has_id = schema
        .fields
        .iter()
        .any(|f| f.name.eq_ignore_ascii_case("id"));

    let mut columns = Vec::with_capacity(schema.fields.len());
    for field in &schema.fields {
        let oracle_type = map_field(field, rules)?;
        let is_id = field.name.eq_ignore_ascii_case("id");
        let is_replication_key = has_id
            && field.name.eq_ignore_ascii_case(&naming.replication_key);
        let primary_key = is_id || is_replication_key;
        columns.push(ColumnDefinition {
            name: field.name.to_uppercase(),
            oracle_type,
            nullable: field.nullable && !primary_key,
            primary_key,
        });
    }

    Ok(TableDefinition {
        owner: naming.owner.to_uppercase(),
        table_name: naming.table_name(&schema.entity),
        columns,
    })
}

/// Render the idempotent DDL sequence for an entity schema.
///
/// # Errors
///
/// Propagates mapping failures from [`build_table`].
pub fn synthesize(
    schema: &EntitySchema,
    rules: &RuleSet,
    naming: &NamingPolicy,
) -> Result<DdlScript, EntityError> {
    let table = build_table(schema, rules, naming)?;
    Ok(render(&table))
}

/// Render DDL text from an already-built table definition.
pub fn render(table: &TableDefinition) -> DdlScript {
    DdlScript {
        drop_stmt: render_drop(table),
        create_stmt: render_create(table),
    }
}

fn render_drop(table: &TableDefinition) -> String {
    format!(
        "BEGIN\n  \
           EXECUTE IMMEDIATE 'DROP TABLE {} CASCADE CONSTRAINTS';\n\
         EXCEPTION\n  \
           WHEN OTHERS THEN\n    \
             IF SQLCODE != -942 THEN\n      \
               RAISE;\n    \
             END IF;\n\
         END;",
        table.qualified_name()
    )
}

fn render_create(table: &TableDefinition) -> String {
    let mut lines: Vec<String> = table
        .columns
        .iter()
        .map(|col| {
            let nullability = if col.nullable { "" } else { " NOT NULL" };
            format!("  \"{}\" {}{}", col.name, col.oracle_type, nullability)
        })
        .collect();

    // The key column leads the constraint even when discovery listed
    // the replication key ahead of it.
    let mut pk = table.primary_key_columns();
    pk.sort_by_key(|name| *name != "ID");
    if !pk.is_empty() {
        let quoted: Vec<String> = pk.iter().map(|c| format!("\"{c}\"")).collect();
        lines.push(format!(
            "  CONSTRAINT \"{}\" PRIMARY KEY ({})",
            constraint_name(&table.table_name),
            quoted.join(", ")
        ));
    }

    format!(
        "CREATE TABLE {} (\n{}\n)",
        table.qualified_name(),
        lines.join(",\n")
    )
}

fn constraint_name(table_name: &str) -> String {
    let mut name = format!("PK_{table_name}");
    name.truncate(MAX_IDENTIFIER_LEN);
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use orasync_types::{DeclaredType, DiscoverySource, FieldSchema};

    fn naming() -> NamingPolicy {
        NamingPolicy {
            owner: "STAGE".into(),
            prefix: "WMS".into(),
            replication_key: "mod_ts".into(),
        }
    }

    fn allocation_schema() -> EntitySchema {
        EntitySchema::new(
            "allocation",
            vec![
                FieldSchema {
                    name: "id".into(),
                    declared_type: DeclaredType::Integer,
                    max_length: None,
                    nullable: false,
                },
                FieldSchema::new("alloc_qty", DeclaredType::Number),
                FieldSchema::new("order_instructions_set", DeclaredType::String),
            ],
            DiscoverySource::Orchestrated,
        )
    }

    #[test]
    fn idempotent_allocation_ddl() {
        let script = synthesize(&allocation_schema(), RuleSet::builtin(), &naming()).unwrap();

        assert!(script
            .drop_stmt
            .contains("DROP TABLE \"STAGE\".\"WMS_ALLOCATION\" CASCADE CONSTRAINTS"));
        assert!(script.drop_stmt.contains("SQLCODE != -942"));

        assert!(script
            .create_stmt
            .starts_with("CREATE TABLE \"STAGE\".\"WMS_ALLOCATION\" ("));
        assert!(script.create_stmt.contains("\"ID\" NUMBER NOT NULL"));
        assert!(script.create_stmt.contains("\"ALLOC_QTY\" NUMBER"));
        assert!(script
            .create_stmt
            .contains("\"ORDER_INSTRUCTIONS_SET\" VARCHAR2(4000 CHAR)"));
        assert!(script
            .create_stmt
            .contains("CONSTRAINT \"PK_WMS_ALLOCATION\" PRIMARY KEY (\"ID\")"));
    }

    #[test]
    fn replication_key_makes_composite_primary_key() {
        let mut schema = allocation_schema();
        schema
            .fields
            .push(FieldSchema::new("mod_ts", DeclaredType::Timestamp));
        let script = synthesize(&schema, RuleSet::builtin(), &naming()).unwrap();
        assert!(script.create_stmt.contains("PRIMARY KEY (\"ID\", \"MOD_TS\")"));
        // Composite key members are forced NOT NULL.
        assert!(script.create_stmt.contains("\"MOD_TS\" TIMESTAMP(6) NOT NULL"));
    }

    #[test]
    fn key_column_leads_composite_key_whatever_the_field_order() {
        let schema = EntitySchema::new(
            "allocation",
            vec![
                FieldSchema::new("mod_ts", DeclaredType::Timestamp),
                FieldSchema {
                    name: "id".into(),
                    declared_type: DeclaredType::Integer,
                    max_length: None,
                    nullable: false,
                },
                FieldSchema::new("alloc_qty", DeclaredType::Number),
            ],
            DiscoverySource::Direct,
        );
        let script = synthesize(&schema, RuleSet::builtin(), &naming()).unwrap();
        // Column order still follows the schema...
        let mod_ts_pos = script.create_stmt.find("\"MOD_TS\"").unwrap();
        let id_pos = script.create_stmt.find("\"ID\" NUMBER").unwrap();
        assert!(mod_ts_pos < id_pos);
        // ...but the constraint puts the key column first.
        assert!(script.create_stmt.contains("PRIMARY KEY (\"ID\", \"MOD_TS\")"));
    }

    #[test]
    fn replication_key_without_id_is_not_a_key() {
        let schema = EntitySchema::new(
            "audit_trail",
            vec![
                FieldSchema::new("event", DeclaredType::String),
                FieldSchema::new("mod_ts", DeclaredType::Timestamp),
            ],
            DiscoverySource::Direct,
        );
        let table = build_table(&schema, RuleSet::builtin(), &naming()).unwrap();
        assert!(table.primary_key_columns().is_empty());
        let script = render(&table);
        assert!(!script.create_stmt.contains("PRIMARY KEY"));
    }

    #[test]
    fn column_order_follows_schema_order() {
        let script = synthesize(&allocation_schema(), RuleSet::builtin(), &naming()).unwrap();
        let id_pos = script.create_stmt.find("\"ID\"").unwrap();
        let qty_pos = script.create_stmt.find("\"ALLOC_QTY\"").unwrap();
        let set_pos = script.create_stmt.find("\"ORDER_INSTRUCTIONS_SET\"").unwrap();
        assert!(id_pos < qty_pos && qty_pos < set_pos);
    }

    #[test]
    fn synthesis_is_deterministic() {
        let schema = allocation_schema();
        let a = synthesize(&schema, RuleSet::builtin(), &naming()).unwrap();
        let b = synthesize(&schema, RuleSet::builtin(), &naming()).unwrap();
        assert_eq!(a.text(), b.text());
    }

    #[test]
    fn unmappable_field_fails_synthesis() {
        let schema = EntitySchema::new(
            "allocation",
            vec![FieldSchema::new("", DeclaredType::String)],
            DiscoverySource::Orchestrated,
        );
        let err = synthesize(&schema, RuleSet::builtin(), &naming()).unwrap_err();
        assert_eq!(err.code.as_str(), "EMPTY_FIELD_NAME");
    }

    #[test]
    fn constraint_name_is_clamped() {
        assert_eq!(
            constraint_name("WMS_A_VERY_LONG_TABLE_NAME_XYZ"),
            "PK_WMS_A_VERY_LONG_TABLE_NAME_"
        );
        assert_eq!(constraint_name("WMS_PICK"), "PK_WMS_PICK");
    }
}
