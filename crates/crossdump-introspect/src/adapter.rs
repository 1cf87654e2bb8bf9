use async_trait::async_trait;

use crossdump_core::{Dialect, Literal, Location, Relation, Result, TableSchema, ViewDefinition};

use crate::options::IntrospectOptions;

/// A constraint, default or column attribute the model cannot carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedItem {
    pub location: Location,
    pub detail: String,
}

impl UnsupportedItem {
    pub fn new(location: Location, detail: impl Into<String>) -> Self {
        Self {
            location,
            detail: detail.into(),
        }
    }
}

/// Introspected table plus everything dropped while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct IntrospectedTable {
    pub table: TableSchema,
    pub unsupported: Vec<UnsupportedItem>,
}

/// One batch of rows, `limit` rows starting at `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPage {
    pub offset: u64,
    pub limit: u64,
}

impl RowPage {
    pub fn first(limit: u64) -> Self {
        Self { offset: 0, limit }
    }

    pub fn next(self) -> Self {
        Self {
            offset: self.offset + self.limit,
            limit: self.limit,
        }
    }
}

/// Read-only access to a source database.
///
/// Implementations never mutate the source and issue one query at a time.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Dialect of the connected database.
    fn dialect(&self) -> Dialect;

    /// Tables and views in the current schema, sorted by name.
    async fn list_relations(&self, opts: &IntrospectOptions) -> Result<Vec<Relation>>;

    /// Build the normalized model of one table.
    async fn introspect_table(
        &self,
        name: &str,
        opts: &IntrospectOptions,
    ) -> Result<IntrospectedTable>;

    /// Fetch a view's SELECT text verbatim.
    async fn introspect_view(
        &self,
        name: &str,
        opts: &IntrospectOptions,
    ) -> Result<ViewDefinition>;

    /// Fetch one page of rows, ordered by primary key (or all columns).
    ///
    /// Values come back in column order, decoded per the column's
    /// portable type.
    async fn fetch_rows(
        &self,
        table: &TableSchema,
        page: RowPage,
        opts: &IntrospectOptions,
    ) -> Result<Vec<Vec<Literal>>>;
}
