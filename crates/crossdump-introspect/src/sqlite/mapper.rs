use crossdump_core::{
    ColumnDefinition, Dialect, Literal, Location, Relation, Result, TableSchema,
};
use sqlparser::ast::{ColumnOption, Statement, TableConstraint};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, TypeInfo, ValueRef};

use crate::adapter::{IntrospectedTable, UnsupportedItem};
use crate::grouping::{RawConstraint, group_constraints};
use crate::mapping::{resolve_raw_default, resolve_type};
use crate::options::IntrospectOptions;

use super::queries::{RawColumn, RawForeignKey, RawRelation, RawUniqueColumn};

pub fn map_relations(raw: Vec<RawRelation>) -> Vec<Relation> {
    raw.into_iter()
        .map(|relation| match relation.kind.as_str() {
            "view" => Relation::view(relation.name),
            _ => Relation::table(relation.name),
        })
        .collect()
}

/// Catalog rows for one table.
#[derive(Debug, Default)]
pub struct RawTable {
    pub columns: Vec<RawColumn>,
    pub foreign_keys: Vec<RawForeignKey>,
    pub unique_columns: Vec<RawUniqueColumn>,
    pub create_sql: Option<String>,
}

pub fn map_table(name: &str, raw: RawTable, opts: &IntrospectOptions) -> Result<IntrospectedTable> {
    let mut unsupported = Vec::new();
    let mut constraint_rows = Vec::new();

    let pk_columns: Vec<&RawColumn> = raw.columns.iter().filter(|col| col.pk > 0).collect();
    // Only a lone INTEGER key aliases the rowid.
    let rowid_alias = match pk_columns.as_slice() {
        [only] if only.declared_type.trim().eq_ignore_ascii_case("integer") => {
            Some(only.name.clone())
        }
        _ => None,
    };
    for column in &pk_columns {
        constraint_rows.push(RawConstraint {
            name: "primary".to_string(),
            kind: "PRIMARY KEY".to_string(),
            position: Some(column.pk),
            column_name: Some(column.name.clone()),
            ..RawConstraint::default()
        });
    }

    let mut columns = Vec::with_capacity(raw.columns.len());
    for column in &raw.columns {
        if column.hidden == 1 {
            continue;
        }
        let location = Location::column(name, &column.name);
        if column.hidden >= 2 {
            unsupported.push(UnsupportedItem::new(
                location.clone(),
                "generated column is exported as a plain column",
            ));
        }

        let portable_type = resolve_type(
            Dialect::Sqlite,
            opts,
            name,
            &column.name,
            &column.declared_type,
        )?;
        let default = resolve_raw_default(column.default_value.as_deref(), location, &mut unsupported);

        let mut definition = ColumnDefinition::new(&column.name, portable_type);
        definition.nullable = column.not_null == 0;
        definition.default_value = default.value;
        definition.is_auto_increment =
            default.sequence || rowid_alias.as_deref() == Some(column.name.as_str());
        columns.push(definition);
    }

    for fk in raw.foreign_keys {
        constraint_rows.push(RawConstraint {
            name: format!("fk_{:04}", fk.id),
            kind: "FOREIGN KEY".to_string(),
            position: Some(fk.seq),
            column_name: Some(fk.from_column),
            referenced_table: Some(fk.parent),
            referenced_column: fk.to_column,
            on_delete: Some(fk.on_delete),
            on_update: Some(fk.on_update),
            definition: None,
        });
    }

    for unique in raw.unique_columns {
        constraint_rows.push(RawConstraint {
            name: unique.index_name,
            kind: "UNIQUE".to_string(),
            position: Some(unique.seqno),
            column_name: unique.column_name,
            ..RawConstraint::default()
        });
    }

    if let Some(sql) = raw.create_sql.as_deref() {
        match check_clauses(sql) {
            Ok(clauses) => unsupported.extend(clauses.into_iter().map(|clause| {
                UnsupportedItem::new(Location::table(name), format!("CHECK constraint: {clause}"))
            })),
            Err(err) => unsupported.push(UnsupportedItem::new(
                Location::table(name),
                format!("CHECK constraints could not be read: {err}"),
            )),
        }
    }

    let grouped = group_constraints(name, constraint_rows);
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

/// Decode one value by its storage class.
pub fn decode_value(row: &SqliteRow, index: usize) -> std::result::Result<Literal, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Literal::Null);
    }
    let storage = raw.type_info().name().to_string();
    match storage.as_str() {
        "INTEGER" => Ok(Literal::Int(row.try_get::<i64, _>(index)?)),
        "REAL" => Ok(Literal::Float(row.try_get::<f64, _>(index)?)),
        "BLOB" => Ok(Literal::Blob(row.try_get::<Vec<u8>, _>(index)?)),
        _ => Ok(Literal::Text(row.try_get::<String, _>(index)?)),
    }
}

/// Column list and SELECT body of a stored `CREATE VIEW` statement.
pub fn parse_view(sql: &str) -> std::result::Result<(Vec<String>, String), String> {
    let statements = Parser::parse_sql(&SQLiteDialect {}, sql).map_err(|err| err.to_string())?;
    match statements.as_slice() {
        [Statement::CreateView { columns, query, .. }] => Ok((
            columns.iter().map(|column| column.name.value.clone()).collect(),
            query.to_string(),
        )),
        _ => Err("stored SQL is not a single CREATE VIEW statement".to_string()),
    }
}

/// `CHECK (...)` clauses of a stored `CREATE TABLE` statement, from both
/// column options and table constraints.
pub fn check_clauses(sql: &str) -> std::result::Result<Vec<String>, String> {
    if !sql.to_ascii_lowercase().contains("check") {
        return Ok(Vec::new());
    }
    let statements = Parser::parse_sql(&SQLiteDialect {}, sql).map_err(|err| err.to_string())?;
    let [Statement::CreateTable(create)] = statements.as_slice() else {
        return Err("stored SQL is not a single CREATE TABLE statement".to_string());
    };

    let column_checks = create
        .columns
        .iter()
        .flat_map(|column| &column.options)
        .filter_map(|option| match &option.option {
            ColumnOption::Check(expr) => Some(format!("CHECK ({expr})")),
            _ => None,
        });
    let table_checks = create.constraints.iter().filter_map(|constraint| match constraint {
        TableConstraint::Check { expr, .. } => Some(format!("CHECK ({expr})")),
        _ => None,
    });
    Ok(column_checks.chain(table_checks).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossdump_core::{ColumnDefault, FkAction, PortableType, PrimaryKey};

    fn column(name: &str, declared_type: &str) -> RawColumn {
        RawColumn {
            name: name.to_string(),
            declared_type: declared_type.to_string(),
            ..RawColumn::default()
        }
    }

    fn opts() -> IntrospectOptions {
        IntrospectOptions::new(Dialect::Postgresql)
    }

    #[test]
    fn integer_primary_key_is_auto_increment() {
        let mut id = column("id", "INTEGER");
        id.pk = 1;
        let mut in_use = column("in_use", "INTEGER");
        in_use.default_value = Some("0".to_string());

        let mapped = map_table(
            "m_agents",
            RawTable {
                columns: vec![id, in_use],
                ..RawTable::default()
            },
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
        assert!(!table.columns[1].is_auto_increment);
        assert_eq!(
            table.columns[1].default_value,
            Some(ColumnDefault::Literal(Literal::Int(0)))
        );
        assert!(mapped.unsupported.is_empty());
    }

    #[test]
    fn composite_keys_are_not_auto_increment() {
        let mut col1 = column("col1", "INTEGER");
        col1.pk = 2;
        let mut col2 = column("col2", "TEXT");
        col2.pk = 1;
        let mapped = map_table(
            "pairs",
            RawTable {
                columns: vec![col1, col2],
                ..RawTable::default()
            },
            &opts(),
        )
        .unwrap();
        assert_eq!(
            mapped.table.primary_key.unwrap().columns,
            vec!["col2", "col1"]
        );
        assert!(mapped.table.columns.iter().all(|col| !col.is_auto_increment));
    }

    #[test]
    fn foreign_keys_and_checks() {
        let mut id = column("id", "INTEGER");
        id.pk = 1;
        let raw = RawTable {
            columns: vec![id, column("agent_id", "INTEGER"), column("priority", "INTEGER")],
            foreign_keys: vec![RawForeignKey {
                id: 0,
                seq: 0,
                parent: "m_agents".to_string(),
                from_column: "agent_id".to_string(),
                to_column: Some("id".to_string()),
                on_update: "NO ACTION".to_string(),
                on_delete: "CASCADE".to_string(),
            }],
            unique_columns: Vec::new(),
            create_sql: Some(
                "CREATE TABLE t_tasks (id INTEGER PRIMARY KEY, agent_id INTEGER REFERENCES m_agents(id) ON DELETE CASCADE, priority INTEGER CHECK (priority > 0))"
                    .to_string(),
            ),
        };
        let mapped = map_table("t_tasks", raw, &opts()).unwrap();
        let fk = &mapped.table.foreign_keys[0];
        assert_eq!(fk.referenced_table, "m_agents");
        assert_eq!(fk.on_delete, FkAction::Cascade);
        assert_eq!(fk.on_update, FkAction::NoAction);
        assert_eq!(mapped.unsupported.len(), 1);
        assert_eq!(
            mapped.unsupported[0].detail,
            "CHECK constraint: CHECK (priority > 0)"
        );
    }

    #[test]
    fn generated_columns_are_flagged() {
        let mut total = column("total", "INTEGER");
        total.hidden = 3;
        let mapped = map_table(
            "orders",
            RawTable {
                columns: vec![column("qty", "INTEGER"), total],
                ..RawTable::default()
            },
            &opts(),
        )
        .unwrap();
        assert_eq!(mapped.table.columns.len(), 2);
        assert_eq!(mapped.unsupported[0].location, Location::column("orders", "total"));
    }

    #[test]
    fn unknown_declared_type_fails() {
        let err = map_table(
            "odd",
            RawTable {
                columns: vec![column("shape", "GEOMETRY")],
                ..RawTable::default()
            },
            &opts(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("GEOMETRY"));
    }

    #[test]
    fn booleans_declared_natively_map_to_boolean() {
        let mapped = map_table(
            "flags",
            RawTable {
                columns: vec![column("enabled", "BOOLEAN")],
                ..RawTable::default()
            },
            &opts(),
        )
        .unwrap();
        assert_eq!(mapped.table.columns[0].portable_type, PortableType::Boolean);
    }

    #[test]
    fn parses_view_columns_and_body() {
        assert_eq!(
            parse_view("CREATE VIEW v_active AS SELECT * FROM t_tasks WHERE status = 'as'").unwrap(),
            (Vec::new(), "SELECT * FROM t_tasks WHERE status = 'as'".to_string())
        );
        assert_eq!(
            parse_view("CREATE VIEW \"as\" (a, b) AS\n  SELECT 1, 2;").unwrap(),
            (vec!["a".to_string(), "b".to_string()], "SELECT 1, 2".to_string())
        );
        assert!(parse_view("CREATE TABLE t (a INTEGER)").is_err());
    }

    #[test]
    fn checks_come_from_columns_and_constraints() {
        let sql = "CREATE TABLE t (note TEXT DEFAULT 'check (x)', \"check\" INTEGER CHECK (\"check\" >= 0), CONSTRAINT ck CHECK(length(note) < 10))";
        assert_eq!(
            check_clauses(sql).unwrap(),
            vec!["CHECK (\"check\" >= 0)", "CHECK (length(note) < 10)"]
        );
        assert!(check_clauses("CREATE TABLE t (a INTEGER)").unwrap().is_empty());
    }
}
