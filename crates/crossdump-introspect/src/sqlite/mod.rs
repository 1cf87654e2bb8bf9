use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crossdump_core::{
    Dialect, Error, Literal, Relation, Result, Route, TableSchema, ViewDefinition,
};

use crate::adapter::{IntrospectedTable, RowPage, SourceAdapter};
use crate::options::IntrospectOptions;
use crate::paging::page_query;

mod mapper;
mod queries;

use queries::RawForeignKey;

/// Adapter for SQLite databases.
#[derive(Debug, Clone)]
pub struct SqliteAdapter {
    pool: SqlitePool,
}

impl SqliteAdapter {
    /// Create a new adapter using a pre-configured pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fill in foreign keys that reference the parent's primary key implicitly.
    async fn resolve_implicit_targets(
        &self,
        route: Route,
        foreign_keys: &mut [RawForeignKey],
    ) -> Result<()> {
        let mut parent_keys: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for fk in foreign_keys.iter_mut().filter(|fk| fk.to_column.is_none()) {
            if !parent_keys.contains_key(&fk.parent) {
                let key = queries::primary_key_columns(&self.pool, route, &fk.parent).await?;
                parent_keys.insert(fk.parent.clone(), key);
            }
            fk.to_column = parent_keys
                .get(&fk.parent)
                .and_then(|key| usize::try_from(fk.seq).ok().and_then(|seq| key.get(seq)))
                .cloned();
        }
        Ok(())
    }
}

#[async_trait]
impl SourceAdapter for SqliteAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn list_relations(&self, opts: &IntrospectOptions) -> Result<Vec<Relation>> {
        let route = opts.route(Dialect::Sqlite);
        let raw = queries::list_relations(&self.pool, route).await?;
        Ok(mapper::map_relations(raw))
    }

    async fn introspect_table(
        &self,
        name: &str,
        opts: &IntrospectOptions,
    ) -> Result<IntrospectedTable> {
        let route = opts.route(Dialect::Sqlite);
        let columns = queries::list_columns(&self.pool, route, name).await?;
        if columns.is_empty() {
            return Err(Error::introspection(route, name, "table not found"));
        }

        let mut foreign_keys = queries::list_foreign_keys(&self.pool, route, name).await?;
        self.resolve_implicit_targets(route, &mut foreign_keys)
            .await?;
        let unique_columns = queries::list_unique_columns(&self.pool, route, name).await?;
        let create_sql = queries::object_sql(&self.pool, route, "table", name).await?;

        mapper::map_table(
            name,
            mapper::RawTable {
                columns,
                foreign_keys,
                unique_columns,
                create_sql,
            },
            opts,
        )
    }

    async fn introspect_view(
        &self,
        name: &str,
        opts: &IntrospectOptions,
    ) -> Result<ViewDefinition> {
        let route = opts.route(Dialect::Sqlite);
        let sql = queries::object_sql(&self.pool, route, "view", name)
            .await?
            .ok_or_else(|| Error::introspection(route, name, "view not found"))?;
        let (columns, body) =
            mapper::parse_view(&sql).map_err(|err| Error::introspection(route, name, err))?;

        Ok(ViewDefinition {
            name: name.to_string(),
            columns,
            source_select_text: body,
        })
    }

    async fn fetch_rows(
        &self,
        table: &TableSchema,
        page: RowPage,
        opts: &IntrospectOptions,
    ) -> Result<Vec<Vec<Literal>>> {
        let route = opts.route(Dialect::Sqlite);
        let strategy = Dialect::Sqlite.strategy();
        let expressions: Vec<String> = table
            .columns
            .iter()
            .map(|column| strategy.quote_identifier(&column.name))
            .collect();
        let sql = page_query(strategy, table, &expressions, page);

        let rows = queries::fetch_page(&self.pool, route, &table.name, &sql).await?;
        rows.iter()
            .map(|row| {
                (0..expressions.len())
                    .map(|index| mapper::decode_value(row, index))
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|err| Error::introspection(route, &table.name, err))
            })
            .collect()
    }
}
