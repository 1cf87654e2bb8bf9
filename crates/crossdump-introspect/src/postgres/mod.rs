use async_trait::async_trait;
use sqlx::PgPool;

use crossdump_core::{Dialect, Error, Literal, Relation, Result, TableSchema, ViewDefinition};

use crate::adapter::{IntrospectedTable, RowPage, SourceAdapter};
use crate::options::IntrospectOptions;
use crate::paging::page_query;

mod mapper;
mod queries;

/// Adapter for PostgreSQL databases, scoped to `current_schema()`.
#[derive(Debug, Clone)]
pub struct PostgresAdapter {
    pool: PgPool,
}

impl PostgresAdapter {
    /// Create a new adapter using a pre-configured pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SourceAdapter for PostgresAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::Postgresql
    }

    async fn list_relations(&self, opts: &IntrospectOptions) -> Result<Vec<Relation>> {
        let route = opts.route(Dialect::Postgresql);
        let raw = queries::list_relations(&self.pool, route).await?;
        Ok(mapper::map_relations(raw))
    }

    async fn introspect_table(
        &self,
        name: &str,
        opts: &IntrospectOptions,
    ) -> Result<IntrospectedTable> {
        let route = opts.route(Dialect::Postgresql);
        let columns = queries::list_columns(&self.pool, route, name).await?;
        if columns.is_empty() {
            return Err(Error::introspection(route, name, "table not found"));
        }
        let constraints = queries::list_constraints(&self.pool, route, name).await?;
        mapper::map_table(name, columns, constraints, opts)
    }

    async fn introspect_view(
        &self,
        name: &str,
        opts: &IntrospectOptions,
    ) -> Result<ViewDefinition> {
        let route = opts.route(Dialect::Postgresql);
        let definition = queries::view_definition(&self.pool, route, name)
            .await?
            .ok_or_else(|| Error::introspection(route, name, "view not found"))?;
        let body = mapper::view_body(&definition)
            .ok_or_else(|| Error::introspection(route, name, "view definition is empty"))?;

        Ok(ViewDefinition {
            name: name.to_string(),
            columns: Vec::new(),
            source_select_text: body,
        })
    }

    async fn fetch_rows(
        &self,
        table: &TableSchema,
        page: RowPage,
        opts: &IntrospectOptions,
    ) -> Result<Vec<Vec<Literal>>> {
        let route = opts.route(Dialect::Postgresql);
        let strategy = Dialect::Postgresql.strategy();
        let expressions: Vec<String> = table
            .columns
            .iter()
            .map(|column| {
                mapper::select_expression(
                    &strategy.quote_identifier(&column.name),
                    &column.portable_type,
                )
            })
            .collect();
        let sql = page_query(strategy, table, &expressions, page);

        let rows = queries::fetch_page(&self.pool, route, &table.name, &sql).await?;
        rows.iter()
            .map(|row| {
                table
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(index, column)| mapper::decode_value(row, index, &column.portable_type))
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|err| Error::introspection(route, &table.name, err))
            })
            .collect()
    }
}
