use crossdump_core::{
    ColumnDefault, ColumnDefinition, Literal, PortableType, PrimaryKey, TableSchema, TypeOverride,
};
use serde_json::json;

#[test]
fn serializes_table_deterministically() {
    let mut table = TableSchema::new("m_agents");
    table.columns = vec![
        ColumnDefinition::new("id", PortableType::Integer)
            .not_null()
            .auto_increment(),
    ];
    table.primary_key = Some(PrimaryKey {
        columns: vec!["id".to_string()],
    });

    let json = serde_json::to_string_pretty(&table).expect("serialize table");
    let expected = r#"{
  "name": "m_agents",
  "columns": [
    {
      "name": "id",
      "portable_type": "integer",
      "nullable": false,
      "default_value": null,
      "is_auto_increment": true
    }
  ],
  "primary_key": {
    "columns": [
      "id"
    ]
  },
  "foreign_keys": [],
  "unique_constraints": []
}"#;
    assert_eq!(json, expected);
}

#[test]
fn defaults_and_widths_are_tagged() {
    let column = ColumnDefinition::new("title", PortableType::VarChar(32))
        .with_default(ColumnDefault::Literal(Literal::Text("untitled".into())));
    let value = serde_json::to_value(&column).expect("serialize column");
    assert_eq!(
        value,
        json!({
            "name": "title",
            "portable_type": { "varchar": 32 },
            "nullable": true,
            "default_value": {
                "kind": "literal",
                "value": { "kind": "text", "value": "untitled" }
            },
            "is_auto_increment": false
        })
    );
}

#[test]
fn type_overrides_read_from_json() {
    let overrides: Vec<TypeOverride> = serde_json::from_value(json!([
        { "table": "m_agents", "column": "in_use", "portable_type": "boolean" }
    ]))
    .expect("deserialize overrides");
    let found = TypeOverride::lookup(&overrides, "m_agents", "in_use").expect("override");
    assert_eq!(found.portable_type, PortableType::Boolean);
    assert!(TypeOverride::lookup(&overrides, "m_agents", "id").is_none());
}
