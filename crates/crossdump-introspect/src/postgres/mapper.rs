use crossdump_core::{
    ColumnDefinition, Dialect, Literal, Location, PortableType, Relation, Result, TableSchema,
};
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::adapter::{IntrospectedTable, UnsupportedItem};
use crate::grouping::{RawConstraint, group_constraints};
use crate::mapping::{ResolvedDefault, resolve_raw_default, resolve_type};
use crate::options::IntrospectOptions;

use super::queries::{RawColumn, RawRelation};

pub fn map_relations(raw: Vec<RawRelation>) -> Vec<Relation> {
    raw.into_iter()
        .map(|relation| match relation.kind.as_str() {
            "view" => Relation::view(relation.name),
            _ => Relation::table(relation.name),
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
        let portable_type =
            resolve_type(Dialect::Postgresql, opts, name, &column.name, &column.data_type)?;

        // The default slot of a generated column holds its expression.
        let default = if column.generated.is_empty() {
            resolve_raw_default(column.default_expression.as_deref(), location, &mut unsupported)
        } else {
            unsupported.push(UnsupportedItem::new(
                location,
                "generated column is exported as a plain column",
            ));
            ResolvedDefault::default()
        };

        let mut definition = ColumnDefinition::new(&column.name, portable_type);
        definition.nullable = !column.not_null;
        definition.default_value = default.value;
        definition.is_auto_increment =
            default.sequence || matches!(column.identity.as_str(), "a" | "d");
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

/// Select expression casting a column to the type it is decoded as.
///
/// Booleans travel as text so that overridden integer columns decode too.
pub fn select_expression(quoted: &str, portable: &PortableType) -> String {
    let cast = match portable {
        PortableType::Integer | PortableType::BigInt => "int8",
        PortableType::Real => "float8",
        PortableType::Boolean
        | PortableType::Text
        | PortableType::VarChar(_)
        | PortableType::Timestamp => "text",
        PortableType::Blob => "bytea",
    };
    format!("{quoted}::{cast}")
}

pub fn decode_value(
    row: &PgRow,
    index: usize,
    portable: &PortableType,
) -> std::result::Result<Literal, sqlx::Error> {
    let value = match portable {
        PortableType::Integer | PortableType::BigInt => row.try_get::<Option<i64>, _>(index)?.into(),
        PortableType::Real => row.try_get::<Option<f64>, _>(index)?.into(),
        PortableType::Boolean
        | PortableType::Text
        | PortableType::VarChar(_)
        | PortableType::Timestamp => row.try_get::<Option<String>, _>(index)?.into(),
        PortableType::Blob => row.try_get::<Option<Vec<u8>>, _>(index)?.into(),
    };
    Ok(value)
}

/// View definition as stored by `pg_views`, without the trailing semicolon.
pub fn view_body(definition: &str) -> Option<String> {
    let body = definition.trim().trim_end_matches(';').trim_end();
    (!body.is_empty()).then(|| body.to_string())
}
