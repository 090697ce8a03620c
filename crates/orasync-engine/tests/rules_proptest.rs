//! Property tests for field mapping and synthesis determinism.

use orasync_engine::ddl::{map_field, synthesize};
use orasync_types::{
    DeclaredType, DiscoverySource, EntitySchema, FieldSchema, NamingPolicy, RuleSet,
};
use proptest::prelude::*;

fn declared_type() -> impl Strategy<Value = DeclaredType> {
    prop_oneof![
        Just(DeclaredType::String),
        Just(DeclaredType::Integer),
        Just(DeclaredType::Number),
        Just(DeclaredType::Boolean),
        Just(DeclaredType::Date),
        Just(DeclaredType::Timestamp),
        Just(DeclaredType::Unknown),
    ]
}

fn naming() -> NamingPolicy {
    NamingPolicy {
        owner: "STAGE".into(),
        prefix: "WMS".into(),
        replication_key: "mod_ts".into(),
    }
}

proptest! {
    /// The collection override holds for every declared type and any stem.
    #[test]
    fn trailing_set_always_maps_to_large_text(
        stem in "[a-z][a-z0-9_]{0,20}",
        declared in declared_type(),
    ) {
        let field = FieldSchema {
            name: format!("{stem}_set"),
            declared_type: declared,
            max_length: None,
            nullable: true,
        };
        let mapped = map_field(&field, RuleSet::builtin()).unwrap();
        prop_assert_eq!(mapped, "VARCHAR2(4000 CHAR)");
    }

    /// Mapping never panics, whatever the field name looks like.
    #[test]
    fn mapping_total_over_printable_names(
        name in "\\PC{0,40}",
        declared in declared_type(),
    ) {
        let field = FieldSchema {
            name,
            declared_type: declared,
            max_length: None,
            nullable: true,
        };
        let _ = map_field(&field, RuleSet::builtin());
    }

    /// Same schema, same rules, same naming: byte-identical DDL, even
    /// across separately-constructed schema values.
    #[test]
    fn synthesis_is_deterministic(
        fields in proptest::collection::vec(
            ("[a-z][a-z0-9_]{0,15}", declared_type()),
            1..8,
        ),
    ) {
        let field_schemas: Vec<FieldSchema> = fields
            .iter()
            .map(|(name, declared)| FieldSchema::new(name.clone(), *declared))
            .collect();
        // Two schema values with different discovery timestamps.
        let first = EntitySchema::new("allocation", field_schemas.clone(), DiscoverySource::Direct);
        let second = EntitySchema::new("allocation", field_schemas, DiscoverySource::Direct);

        let a = synthesize(&first, RuleSet::builtin(), &naming()).unwrap();
        let b = synthesize(&second, RuleSet::builtin(), &naming()).unwrap();
        prop_assert_eq!(a.text(), b.text());
    }
}
