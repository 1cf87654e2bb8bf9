//! Batched INSERT rendering.

use tracing::debug;

use crossdump_core::{
    ConflictMode, DialectStrategy, Error, Literal, Location, Result, Route, TableSchema,
};
use crossdump_introspect::{IntrospectOptions, RowPage, SourceAdapter};

/// Statement head and tail for one table's data batches.
#[derive(Debug)]
pub struct InsertRenderer<'a> {
    strategy: &'a dyn DialectStrategy,
    table: &'a TableSchema,
    route: Route,
    head: String,
    tail: String,
}

impl<'a> InsertRenderer<'a> {
    /// Fails with `UnsupportedConstraint` when `mode` cannot be expressed
    /// for this table in the target dialect.
    pub fn new(
        strategy: &'a dyn DialectStrategy,
        table: &'a TableSchema,
        mode: ConflictMode,
        route: Route,
    ) -> Result<Self> {
        let columns = table.column_names();
        let key = table.conflict_key().unwrap_or_default();
        let clause = strategy
            .conflict_clause(mode, key, &columns)
            .ok_or_else(|| {
                Error::unsupported_constraint(
                    route,
                    Location::table(&table.name),
                    format!(
                        "conflict mode `{}` needs a primary key or unique constraint",
                        mode_name(mode)
                    ),
                )
            })?;

        let head = format!(
            "{} {} ({}) VALUES",
            strategy.insert_prefix(mode),
            strategy.quote_identifier(&table.name),
            columns
                .iter()
                .map(|name| strategy.quote_identifier(name))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let tail = if clause.is_empty() {
            ";".to_string()
        } else {
            format!(" {clause};")
        };

        Ok(Self {
            strategy,
            table,
            route,
            head,
            tail,
        })
    }

    /// Render `rows` as one multi-row INSERT. Returns `None` for an empty batch.
    pub fn render(&self, rows: &[Vec<Literal>]) -> Result<Option<String>> {
        if rows.is_empty() {
            return Ok(None);
        }

        let mut tuples = Vec::with_capacity(rows.len());
        for row in rows {
            if row.len() != self.table.columns.len() {
                return Err(Error::InvalidSchema {
                    route: self.route,
                    location: Location::table(&self.table.name),
                    message: format!(
                        "row has {} values for {} columns",
                        row.len(),
                        self.table.columns.len()
                    ),
                });
            }
            let mut values = Vec::with_capacity(row.len());
            for (value, column) in row.iter().zip(&self.table.columns) {
                let rendered = self
                    .strategy
                    .escape_value(value, &column.portable_type)
                    .map_err(|err| Error::Escaping {
                        route: self.route,
                        location: Location::column(&self.table.name, &column.name),
                        reason: err.to_string(),
                    })?;
                values.push(rendered);
            }
            tuples.push(format!("({})", values.join(", ")));
        }

        Ok(Some(format!(
            "{}\n{}{}",
            self.head,
            tuples.join(",\n"),
            self.tail
        )))
    }
}

fn mode_name(mode: ConflictMode) -> &'static str {
    match mode {
        ConflictMode::Ignore => "ignore",
        ConflictMode::Replace => "replace",
        ConflictMode::None => "none",
    }
}

/// Data statements for one table.
#[derive(Debug, Default)]
pub(crate) struct TableData {
    pub statements: Vec<String>,
    pub rows: u64,
}

/// Page through `table` and render every batch, followed by the
/// sequence realignment statements the target needs.
pub(crate) async fn emit_table_data(
    adapter: &dyn SourceAdapter,
    strategy: &dyn DialectStrategy,
    table: &TableSchema,
    chunk_size: u64,
    mode: ConflictMode,
    introspect: &IntrospectOptions,
    route: Route,
) -> Result<TableData> {
    let renderer = InsertRenderer::new(strategy, table, mode, route)?;
    let mut data = TableData::default();
    let mut page = RowPage::first(chunk_size);

    loop {
        let rows = adapter.fetch_rows(table, page, introspect).await?;
        let fetched = rows.len() as u64;
        debug!(table = %table.name, offset = page.offset, rows = fetched, "fetched batch");
        if let Some(statement) = renderer.render(&rows)? {
            data.statements.push(statement);
        }
        data.rows += fetched;
        if fetched < chunk_size {
            break;
        }
        page = page.next();
    }

    if data.rows > 0 {
        for column in table.columns.iter().filter(|column| column.is_auto_increment) {
            if let Some(statement) = strategy.sequence_reset(&table.name, &column.name) {
                data.statements.push(statement);
            }
        }
    }

    Ok(data)
}
