use sqlx::MySqlPool;
use sqlx::mysql::MySqlRow;

use crossdump_core::{Error, Result, Route};

use crate::grouping::RawConstraint;

// information_schema columns are cast to CHAR/SIGNED: their declared
// charset and signedness differ between MySQL and MariaDB releases.

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RawRelation {
    pub name: String,
    pub kind: String,
}

pub async fn list_relations(pool: &MySqlPool, route: Route) -> Result<Vec<RawRelation>> {
    sqlx::query_as::<_, RawRelation>(
        r#"
        select
          cast(TABLE_NAME as char) as name,
          cast(TABLE_TYPE as char) as kind
        from information_schema.TABLES
        where TABLE_SCHEMA = database()
        order by TABLE_NAME
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|err| Error::introspection(route, "information_schema.TABLES", err))
}

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct RawColumn {
    pub name: String,
    /// Full type such as `int(10) unsigned` or `varchar(255)`.
    pub column_type: String,
    pub is_nullable: String,
    pub column_default: Option<String>,
    pub extra: Option<String>,
}

pub async fn list_columns(pool: &MySqlPool, route: Route, table: &str) -> Result<Vec<RawColumn>> {
    sqlx::query_as::<_, RawColumn>(
        r#"
        select
          cast(COLUMN_NAME as char) as name,
          cast(COLUMN_TYPE as char) as column_type,
          cast(IS_NULLABLE as char) as is_nullable,
          cast(COLUMN_DEFAULT as char) as column_default,
          cast(EXTRA as char) as extra
        from information_schema.COLUMNS
        where TABLE_SCHEMA = database()
          and TABLE_NAME = ?
        order by ORDINAL_POSITION
        "#,
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(|err| Error::introspection(route, table, err))
}

pub async fn list_constraints(
    pool: &MySqlPool,
    route: Route,
    table: &str,
) -> Result<Vec<RawConstraint>> {
    sqlx::query_as::<_, RawConstraint>(
        r#"
        select
          cast(tc.CONSTRAINT_NAME as char) as name,
          cast(tc.CONSTRAINT_TYPE as char) as kind,
          cast(kcu.ORDINAL_POSITION as signed) as position,
          cast(kcu.COLUMN_NAME as char) as column_name,
          cast(kcu.REFERENCED_TABLE_NAME as char) as referenced_table,
          cast(kcu.REFERENCED_COLUMN_NAME as char) as referenced_column,
          cast(rc.DELETE_RULE as char) as on_delete,
          cast(rc.UPDATE_RULE as char) as on_update,
          cast(null as char) as definition
        from information_schema.TABLE_CONSTRAINTS tc
        left join information_schema.KEY_COLUMN_USAGE kcu
          on kcu.CONSTRAINT_SCHEMA = tc.CONSTRAINT_SCHEMA
         and kcu.CONSTRAINT_NAME = tc.CONSTRAINT_NAME
         and kcu.TABLE_NAME = tc.TABLE_NAME
        left join information_schema.REFERENTIAL_CONSTRAINTS rc
          on rc.CONSTRAINT_SCHEMA = tc.CONSTRAINT_SCHEMA
         and rc.CONSTRAINT_NAME = tc.CONSTRAINT_NAME
         and rc.TABLE_NAME = tc.TABLE_NAME
        where tc.TABLE_SCHEMA = database()
          and tc.TABLE_NAME = ?
        order by tc.CONSTRAINT_NAME, kcu.ORDINAL_POSITION
        "#,
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(|err| Error::introspection(route, table, err))
}

pub async fn view_definition(
    pool: &MySqlPool,
    route: Route,
    name: &str,
) -> Result<Option<String>> {
    let row = sqlx::query_scalar::<_, Option<String>>(
        r#"
        select cast(VIEW_DEFINITION as char)
        from information_schema.VIEWS
        where TABLE_SCHEMA = database()
          and TABLE_NAME = ?
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await
    .map_err(|err| Error::introspection(route, name, err))?;

    Ok(row.flatten())
}

pub async fn fetch_page(
    pool: &MySqlPool,
    route: Route,
    table: &str,
    sql: &str,
) -> Result<Vec<MySqlRow>> {
    sqlx::query(sql)
        .fetch_all(pool)
        .await
        .map_err(|err| Error::introspection(route, table, err))
}
