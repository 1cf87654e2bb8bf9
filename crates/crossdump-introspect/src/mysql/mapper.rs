use crossdump_core::{
    ColumnDefault, ColumnDefinition, Dialect, Literal, Location, ParsedDefault, PortableType,
    Relation, Result, TableSchema, parse_default,
};
use sqlx::Row;
use sqlx::mysql::MySqlRow;

use crate::adapter::{IntrospectedTable, UnsupportedItem};
use crate::grouping::{RawConstraint, group_constraints};
use crate::mapping::{ResolvedDefault, resolve_default, resolve_type};
use crate::options::IntrospectOptions;

use super::queries::{RawColumn, RawRelation};

pub fn map_relations(raw: Vec<RawRelation>) -> Vec<Relation> {
    raw.into_iter()
        .map(|relation| {
            if relation.kind.to_ascii_uppercase().contains("VIEW") {
                Relation::view(relation.name)
            } else {
                Relation::table(relation.name)
            }
        })
        .collect()
}

pub fn map_table(
    name: &str,
    raw_columns: Vec<RawColumn>,
    raw_constraints: Vec<RawConstraint>,
    opts: &IntrospectOptions,
) -> Result<IntrospectedTable> {
    let mut unsupported = Vec::new();
    let mut columns = Vec::with_capacity(raw_columns.len());

    for column in &raw_columns {
        let location = Location::column(name, &column.name);
        let extra = column.extra.as_deref().unwrap_or_default().to_ascii_lowercase();
        if extra.contains("virtual generated") || extra.contains("stored generated") {
            unsupported.push(UnsupportedItem::new(
                location.clone(),
                "generated column is exported as a plain column",
            ));
        }
        if extra.contains("on update") {
            unsupported.push(UnsupportedItem::new(
                location.clone(),
                "ON UPDATE clause is dropped",
            ));
        }

        let portable_type = resolve_type(Dialect::Mysql, opts, name, &column.name, &column.column_type)?;
        let default = column_default(
            column.column_default.as_deref(),
            extra.contains("default_generated"),
            location,
            &mut unsupported,
        );

        let mut definition = ColumnDefinition::new(&column.name, portable_type);
        definition.nullable = column.is_nullable.eq_ignore_ascii_case("yes");
        definition.default_value = default.value;
        definition.is_auto_increment = default.sequence || extra.contains("auto_increment");
        columns.push(definition);
    }

    let grouped = group_constraints(name, raw_constraints);
    unsupported.extend(grouped.unsupported);

    Ok(IntrospectedTable {
        table: TableSchema {
            name: name.to_string(),
            columns,
            primary_key: grouped.primary_key,
            foreign_keys: grouped.foreign_keys,
            unique_constraints: grouped.unique_constraints,
        },
        unsupported,
    })
}

/// MySQL reports literal defaults unquoted, MariaDB quotes them; both
/// report expressions verbatim.
fn column_default(
    raw: Option<&str>,
    expression: bool,
    location: Location,
    unsupported: &mut Vec<UnsupportedItem>,
) -> ResolvedDefault {
    let Some(raw) = raw else {
        return ResolvedDefault::default();
    };
    match parse_default(raw) {
        ParsedDefault::Unrecognized(text) if !expression && !text.starts_with('\'') => {
            ResolvedDefault {
                value: Some(ColumnDefault::Literal(Literal::Text(text))),
                sequence: false,
            }
        }
        parsed => resolve_default(parsed, location, unsupported),
    }
}

/// Select expression normalizing a column to a type the driver decodes
/// uniformly.
pub fn select_expression(quoted: &str, portable: &PortableType) -> String {
    match portable {
        PortableType::Integer | PortableType::BigInt | PortableType::Boolean => {
            format!("CAST({quoted} AS SIGNED)")
        }
        PortableType::Real => format!("({quoted} + 0E0)"),
        PortableType::Text | PortableType::VarChar(_) | PortableType::Timestamp => {
            format!("CAST({quoted} AS CHAR)")
        }
        PortableType::Blob => quoted.to_string(),
    }
}

pub fn decode_value(
    row: &MySqlRow,
    index: usize,
    portable: &PortableType,
) -> std::result::Result<Literal, sqlx::Error> {
    let value = match portable {
        PortableType::Integer | PortableType::BigInt | PortableType::Boolean => {
            row.try_get::<Option<i64>, _>(index)?.into()
        }
        PortableType::Real => row.try_get::<Option<f64>, _>(index)?.into(),
        PortableType::Text | PortableType::VarChar(_) | PortableType::Timestamp => {
            row.try_get::<Option<String>, _>(index)?.into()
        }
        PortableType::Blob => row.try_get::<Option<Vec<u8>>, _>(index)?.into(),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossdump_core::{FkAction, PrimaryKey};

    fn column(name: &str, column_type: &str) -> RawColumn {
        RawColumn {
            name: name.to_string(),
            column_type: column_type.to_string(),
            is_nullable: "YES".to_string(),
            ..RawColumn::default()
        }
    }

    fn constraint(name: &str, kind: &str, position: i64, column: &str) -> RawConstraint {
        RawConstraint {
            name: name.to_string(),
            kind: kind.to_string(),
            position: Some(position),
            column_name: Some(column.to_string()),
            ..RawConstraint::default()
        }
    }

    fn opts() -> IntrospectOptions {
        IntrospectOptions::new(Dialect::Sqlite)
    }

    #[test]
    fn views_are_told_apart_from_base_tables() {
        let relations = map_relations(vec![
            RawRelation {
                name: "m_agents".to_string(),
                kind: "BASE TABLE".to_string(),
            },
            RawRelation {
                name: "v_active".to_string(),
                kind: "VIEW".to_string(),
            },
        ]);
        assert_eq!(
            relations,
            vec![Relation::table("m_agents"), Relation::view("v_active")]
        );
    }

    #[test]
    fn maps_auto_increment_keys_and_flags() {
        let mut id = column("id", "int(11)");
        id.is_nullable = "NO".to_string();
        id.extra = Some("auto_increment".to_string());
        let mut in_use = column("in_use", "tinyint(1)");
        in_use.column_default = Some("0".to_string());

        let mapped = map_table(
            "m_agents",
            vec![id, in_use],
            vec![constraint("PRIMARY", "PRIMARY KEY", 1, "id")],
            &opts(),
        )
        .unwrap();

        let table = mapped.table;
        assert_eq!(
            table.primary_key,
            Some(PrimaryKey {
                columns: vec!["id".to_string()]
            })
        );
        assert!(table.columns[0].is_auto_increment);
        assert!(!table.columns[0].nullable);
        assert_eq!(table.columns[1].portable_type, PortableType::Boolean);
        assert_eq!(
            table.columns[1].default_value,
            Some(ColumnDefault::Literal(Literal::Int(0)))
        );
    }

    #[test]
    fn reads_unquoted_and_quoted_text_defaults() {
        let mut mysql_style = column("status", "varchar(20)");
        mysql_style.column_default = Some("pending review".to_string());
        let mut mariadb_style = column("kind", "varchar(20)");
        mariadb_style.column_default = Some("'it''s'".to_string());
        let mut created = column("created_at", "datetime");
        created.column_default = Some("CURRENT_TIMESTAMP".to_string());
        created.extra = Some("DEFAULT_GENERATED".to_string());

        let mapped = map_table(
            "t_tasks",
            vec![mysql_style, mariadb_style, created],
            Vec::new(),
            &opts(),
        )
        .unwrap();
        let defaults: Vec<_> = mapped
            .table
            .columns
            .iter()
            .map(|column| column.default_value.clone())
            .collect();
        assert_eq!(
            defaults,
            vec![
                Some(ColumnDefault::Literal(Literal::Text("pending review".to_string()))),
                Some(ColumnDefault::Literal(Literal::Text("it's".to_string()))),
                Some(ColumnDefault::CurrentTimestamp),
            ]
        );
        assert!(mapped.unsupported.is_empty());
    }

    #[test]
    fn expression_defaults_are_unsupported() {
        let mut token = column("token", "varchar(36)");
        token.column_default = Some("uuid()".to_string());
        token.extra = Some("DEFAULT_GENERATED".to_string());
        let mapped = map_table("t_sessions", vec![token], Vec::new(), &opts()).unwrap();
        assert_eq!(mapped.table.columns[0].default_value, None);
        assert_eq!(mapped.unsupported.len(), 1);
        assert!(mapped.unsupported[0].detail.contains("uuid()"));
    }

    #[test]
    fn on_update_and_generated_columns_are_flagged() {
        let mut touched = column("updated_at", "timestamp");
        touched.column_default = Some("current_timestamp()".to_string());
        touched.extra = Some("on update current_timestamp()".to_string());
        let mut total = column("total", "int(11)");
        total.extra = Some("STORED GENERATED".to_string());

        let mapped = map_table("orders", vec![touched, total], Vec::new(), &opts()).unwrap();
        assert_eq!(
            mapped.table.columns[0].default_value,
            Some(ColumnDefault::CurrentTimestamp)
        );
        let locations: Vec<_> = mapped
            .unsupported
            .iter()
            .map(|item| item.location.to_string())
            .collect();
        assert_eq!(locations, vec!["orders.updated_at", "orders.total"]);
    }

    #[test]
    fn foreign_keys_carry_referential_rules() {
        let fk = RawConstraint {
            referenced_table: Some("m_agents".to_string()),
            referenced_column: Some("id".to_string()),
            on_delete: Some("SET NULL".to_string()),
            on_update: Some("RESTRICT".to_string()),
            ..constraint("fk_agent", "FOREIGN KEY", 1, "agent_id")
        };
        let mapped = map_table(
            "t_tasks",
            vec![column("agent_id", "int(11)")],
            vec![fk],
            &opts(),
        )
        .unwrap();
        let fk = &mapped.table.foreign_keys[0];
        assert_eq!(fk.on_delete, FkAction::SetNull);
        assert_eq!(fk.on_update, FkAction::Restrict);
    }

    #[test]
    fn select_expressions_normalize_storage() {
        assert_eq!(
            select_expression("`in_use`", &PortableType::Boolean),
            "CAST(`in_use` AS SIGNED)"
        );
        assert_eq!(select_expression("`score`", &PortableType::Real), "(`score` + 0E0)");
        assert_eq!(
            select_expression("`created_at`", &PortableType::Timestamp),
            "CAST(`created_at` AS CHAR)"
        );
        assert_eq!(select_expression("`data`", &PortableType::Blob), "`data`");
    }
}
