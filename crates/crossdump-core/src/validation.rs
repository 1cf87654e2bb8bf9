use std::collections::BTreeSet;

use crate::error::{Error, Location, Result, Route};
use crate::schema::TableSchema;

/// Validate internal consistency of an introspected table.
///
/// This checks:
/// - the table has columns and no duplicate column names
/// - primary key and unique columns exist and are not repeated
/// - foreign key columns exist and match the referenced column count
pub fn validate_table(table: &TableSchema, route: Route) -> Result<()> {
    let invalid = |column: Option<&str>, message: String| Error::InvalidSchema {
        route,
        location: match column {
            Some(column) => Location::column(&table.name, column),
            None => Location::table(&table.name),
        },
        message,
    };

    if table.columns.is_empty() {
        return Err(invalid(None, "table has no columns".to_string()));
    }

    let mut columns = BTreeSet::new();
    for column in &table.columns {
        if !columns.insert(column.name.as_str()) {
            return Err(invalid(
                Some(column.name.as_str()),
                "duplicate column name".to_string(),
            ));
        }
    }

    let check_key = |kind: &str, key: &[String]| -> Result<()> {
        if key.is_empty() {
            return Err(invalid(None, format!("{kind} has no columns")));
        }
        let mut seen = BTreeSet::new();
        for column in key {
            if !columns.contains(column.as_str()) {
                return Err(invalid(
                    Some(column.as_str()),
                    format!("{kind} column not found"),
                ));
            }
            if !seen.insert(column.as_str()) {
                return Err(invalid(
                    Some(column.as_str()),
                    format!("{kind} repeats a column"),
                ));
            }
        }
        Ok(())
    };

    if let Some(pk) = &table.primary_key {
        check_key("primary key", &pk.columns)?;
    }
    for unique in &table.unique_constraints {
        check_key("unique constraint", &unique.columns)?;
    }
    for fk in &table.foreign_keys {
        check_key("foreign key", &fk.columns)?;
        if fk.referenced_columns.len() != fk.columns.len() {
            return Err(invalid(
                None,
                format!(
                    "foreign key to {} lists {} columns but references {}",
                    fk.referenced_table,
                    fk.columns.len(),
                    fk.referenced_columns.len()
                ),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{FkAction, ForeignKey, PrimaryKey};
    use crate::dialect::Dialect;
    use crate::schema::ColumnDefinition;
    use crate::types::PortableType;

    fn route() -> Route {
        Route::new(Dialect::Sqlite, Dialect::Postgresql)
    }

    fn agents() -> TableSchema {
        let mut table = TableSchema::new("m_agents");
        table.columns = vec![
            ColumnDefinition::new("id", PortableType::Integer).not_null(),
            ColumnDefinition::new("in_use", PortableType::Integer),
        ];
        table.primary_key = Some(PrimaryKey {
            columns: vec!["id".to_string()],
        });
        table
    }

    #[test]
    fn accepts_consistent_table() {
        validate_table(&agents(), route()).unwrap();
    }

    #[test]
    fn rejects_missing_primary_key_column() {
        let mut table = agents();
        table.primary_key = Some(PrimaryKey {
            columns: vec!["agent_id".to_string()],
        });
        let err = validate_table(&table, route()).unwrap_err();
        match err {
            Error::InvalidSchema { location, .. } => {
                assert_eq!(location, Location::column("m_agents", "agent_id"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_duplicate_columns() {
        let mut table = agents();
        table
            .columns
            .push(ColumnDefinition::new("in_use", PortableType::Boolean));
        assert!(validate_table(&table, route()).is_err());
    }

    #[test]
    fn rejects_mismatched_foreign_key_arity() {
        let mut table = agents();
        table.foreign_keys.push(ForeignKey {
            name: None,
            columns: vec!["id".to_string()],
            referenced_table: "m_projects".to_string(),
            referenced_columns: vec!["id".to_string(), "tenant".to_string()],
            on_delete: FkAction::Cascade,
            on_update: FkAction::NoAction,
        });
        let err = validate_table(&table, route()).unwrap_err();
        assert!(err.to_string().contains("m_projects"));
    }
}
