use crossdump_core::{DialectStrategy, TableSchema};

use crate::adapter::RowPage;

/// `SELECT` for one page of `table`, with one expression per column.
///
/// Rows are ordered by the primary key. Without one, the first unique
/// constraint leads and the remaining columns break ties between rows whose
/// key is NULL. A keyless table is ordered by every selected expression.
/// `ORDER BY` is positional so the ordering applies to the (possibly cast)
/// selected values.
pub(crate) fn page_query(
    strategy: &dyn DialectStrategy,
    table: &TableSchema,
    expressions: &[String],
    page: RowPage,
) -> String {
    let mut order: Vec<usize> = table
        .conflict_key()
        .unwrap_or_default()
        .iter()
        .filter_map(|key| table.columns.iter().position(|column| &column.name == key))
        .collect();
    let has_primary_key = table
        .primary_key
        .as_ref()
        .is_some_and(|pk| !pk.columns.is_empty());
    if order.is_empty() || !has_primary_key {
        for index in 0..expressions.len() {
            if !order.contains(&index) {
                order.push(index);
            }
        }
    }
    let positions: Vec<String> = order.iter().map(|index| (index + 1).to_string()).collect();

    format!(
        "SELECT {} FROM {} ORDER BY {} LIMIT {} OFFSET {}",
        expressions.join(", "),
        strategy.quote_identifier(&table.name),
        positions.join(", "),
        page.limit,
        page.offset
    )
}
