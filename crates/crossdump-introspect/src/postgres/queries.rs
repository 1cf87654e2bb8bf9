use sqlx::PgPool;
use sqlx::postgres::PgRow;

use crossdump_core::{Error, Result, Route};

use crate::grouping::RawConstraint;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RawRelation {
    pub name: String,
    pub kind: String,
}

pub async fn list_relations(pool: &PgPool, route: Route) -> Result<Vec<RawRelation>> {
    sqlx::query_as::<_, RawRelation>(
        r#"
        select
          c.relname::text as name,
          case when c.relkind = 'v' then 'view' else 'table' end as kind
        from pg_class c
        join pg_namespace n on n.oid = c.relnamespace
        where n.nspname = current_schema()
          and c.relkind in ('r', 'p', 'v')
        order by c.relname
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|err| Error::introspection(route, "pg_class", err))
}

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct RawColumn {
    pub name: String,
    /// Output of `format_type`, e.g. `character varying(255)`.
    pub data_type: String,
    pub not_null: bool,
    pub default_expression: Option<String>,
    /// `a` (always), `d` (by default) or empty.
    pub identity: String,
    /// `s` for stored generated columns, otherwise empty.
    pub generated: String,
}

pub async fn list_columns(pool: &PgPool, route: Route, table: &str) -> Result<Vec<RawColumn>> {
    sqlx::query_as::<_, RawColumn>(
        r#"
        select
          a.attname::text as name,
          pg_catalog.format_type(a.atttypid, a.atttypmod) as data_type,
          a.attnotnull as not_null,
          pg_get_expr(ad.adbin, ad.adrelid) as default_expression,
          a.attidentity::text as identity,
          a.attgenerated::text as generated
        from pg_attribute a
        join pg_class c on c.oid = a.attrelid
        join pg_namespace n on n.oid = c.relnamespace
        left join pg_attrdef ad on ad.adrelid = a.attrelid and ad.adnum = a.attnum
        where n.nspname = current_schema()
          and c.relname = $1
          and a.attnum > 0
          and not a.attisdropped
        order by a.attnum
        "#,
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(|err| Error::introspection(route, table, err))
}

pub async fn list_constraints(
    pool: &PgPool,
    route: Route,
    table: &str,
) -> Result<Vec<RawConstraint>> {
    sqlx::query_as::<_, RawConstraint>(
        r#"
        select
          con.conname::text as name,
          con.contype::text as kind,
          k.ord::int8 as position,
          att.attname::text as column_name,
          ref_rel.relname::text as referenced_table,
          ref_att.attname::text as referenced_column,
          case con.confdeltype
            when 'a' then 'NO ACTION'
            when 'r' then 'RESTRICT'
            when 'c' then 'CASCADE'
            when 'n' then 'SET NULL'
            when 'd' then 'SET DEFAULT'
          end as on_delete,
          case con.confupdtype
            when 'a' then 'NO ACTION'
            when 'r' then 'RESTRICT'
            when 'c' then 'CASCADE'
            when 'n' then 'SET NULL'
            when 'd' then 'SET DEFAULT'
          end as on_update,
          pg_get_constraintdef(con.oid) as definition
        from pg_constraint con
        join pg_class rel on rel.oid = con.conrelid
        join pg_namespace nsp on nsp.oid = rel.relnamespace
        left join lateral unnest(con.conkey) with ordinality as k(attnum, ord) on true
        left join pg_attribute att
          on att.attrelid = con.conrelid and att.attnum = k.attnum
        left join pg_class ref_rel on ref_rel.oid = con.confrelid
        left join pg_attribute ref_att
          on ref_att.attrelid = con.confrelid and ref_att.attnum = con.confkey[k.ord::int]
        where nsp.nspname = current_schema()
          and rel.relname = $1
          and con.contype in ('p', 'u', 'f', 'c', 'x')
        order by con.conname, k.ord
        "#,
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(|err| Error::introspection(route, table, err))
}

pub async fn view_definition(pool: &PgPool, route: Route, name: &str) -> Result<Option<String>> {
    let row = sqlx::query_scalar::<_, Option<String>>(
        r#"
        select definition
        from pg_views
        where schemaname = current_schema()
          and viewname = $1
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await
    .map_err(|err| Error::introspection(route, name, err))?;

    Ok(row.flatten())
}

pub async fn fetch_page(pool: &PgPool, route: Route, table: &str, sql: &str) -> Result<Vec<PgRow>> {
    sqlx::query(sql)
        .fetch_all(pool)
        .await
        .map_err(|err| Error::introspection(route, table, err))
}
