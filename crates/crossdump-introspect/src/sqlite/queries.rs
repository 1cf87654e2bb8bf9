use sqlx::SqlitePool;
use sqlx::sqlite::SqliteRow;

use crossdump_core::{Error, Result, Route};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RawRelation {
    pub name: String,
    pub kind: String,
}

pub async fn list_relations(pool: &SqlitePool, route: Route) -> Result<Vec<RawRelation>> {
    sqlx::query_as::<_, RawRelation>(
        r#"
        select name, type as kind
        from sqlite_master
        where type in ('table', 'view')
          and name not like 'sqlite\_%' escape '\'
        order by name
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|err| Error::introspection(route, "sqlite_master", err))
}

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct RawColumn {
    pub name: String,
    pub declared_type: String,
    pub not_null: i64,
    pub default_value: Option<String>,
    /// 1-based position in the primary key, 0 when not part of it.
    pub pk: i64,
    /// 0 normal, 1 hidden, 2 and 3 generated.
    pub hidden: i64,
}

pub async fn list_columns(pool: &SqlitePool, route: Route, table: &str) -> Result<Vec<RawColumn>> {
    sqlx::query_as::<_, RawColumn>(
        r#"
        select
          name,
          coalesce(type, '') as declared_type,
          "notnull" as not_null,
          dflt_value as default_value,
          pk,
          hidden
        from pragma_table_xinfo(?1)
        order by cid
        "#,
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(|err| Error::introspection(route, table, err))
}

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct RawForeignKey {
    pub id: i64,
    pub seq: i64,
    pub parent: String,
    pub from_column: String,
    /// `NULL` when the reference targets the parent's primary key implicitly.
    pub to_column: Option<String>,
    pub on_update: String,
    pub on_delete: String,
}

pub async fn list_foreign_keys(
    pool: &SqlitePool,
    route: Route,
    table: &str,
) -> Result<Vec<RawForeignKey>> {
    sqlx::query_as::<_, RawForeignKey>(
        r#"
        select
          id,
          seq,
          "table" as parent,
          "from" as from_column,
          "to" as to_column,
          on_update,
          on_delete
        from pragma_foreign_key_list(?1)
        order by id, seq
        "#,
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(|err| Error::introspection(route, table, err))
}

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct RawUniqueColumn {
    pub index_name: String,
    pub seqno: i64,
    pub column_name: Option<String>,
}

/// Columns of `UNIQUE` constraints declared in `CREATE TABLE`.
pub async fn list_unique_columns(
    pool: &SqlitePool,
    route: Route,
    table: &str,
) -> Result<Vec<RawUniqueColumn>> {
    sqlx::query_as::<_, RawUniqueColumn>(
        r#"
        select
          il.name as index_name,
          ii.seqno as seqno,
          ii.name as column_name
        from pragma_index_list(?1) as il, pragma_index_info(il.name) as ii
        where il."unique" = 1
          and il.origin = 'u'
        order by il.name, ii.seqno
        "#,
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(|err| Error::introspection(route, table, err))
}

pub async fn primary_key_columns(
    pool: &SqlitePool,
    route: Route,
    table: &str,
) -> Result<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        r#"
        select name
        from pragma_table_info(?1)
        where pk > 0
        order by pk
        "#,
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(|err| Error::introspection(route, table, err))
}

/// Stored `CREATE` statement of a table or view.
pub async fn object_sql(
    pool: &SqlitePool,
    route: Route,
    kind: &str,
    name: &str,
) -> Result<Option<String>> {
    let row = sqlx::query_scalar::<_, Option<String>>(
        r#"
        select sql
        from sqlite_master
        where type = ?1 and name = ?2
        "#,
    )
    .bind(kind)
    .bind(name)
    .fetch_optional(pool)
    .await
    .map_err(|err| Error::introspection(route, name, err))?;

    Ok(row.flatten())
}

pub async fn fetch_page(
    pool: &SqlitePool,
    route: Route,
    table: &str,
    sql: &str,
) -> Result<Vec<SqliteRow>> {
    sqlx::query(sql)
        .fetch_all(pool)
        .await
        .map_err(|err| Error::introspection(route, table, err))
}
