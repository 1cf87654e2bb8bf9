use crate::literal::EscapeError;
use crate::types::PortableType;

use super::{ConflictMode, Dialect, DialectStrategy, join_quoted, quote_double, quote_standard};

/// PostgreSQL rendering rules. String literals assume
/// `standard_conforming_strings = on`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresStrategy;

impl DialectStrategy for PostgresStrategy {
    fn dialect(&self) -> Dialect {
        Dialect::Postgresql
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_double(name)
    }

    fn quote_text(&self, text: &str) -> Result<String, EscapeError> {
        quote_standard(text, Dialect::Postgresql)
    }

    fn blob_literal(&self, bytes: &[u8]) -> String {
        format!("'\\x{}'::bytea", hex::encode(bytes))
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        if value { "TRUE" } else { "FALSE" }
    }

    fn date_function(&self, column: &str) -> String {
        format!("to_timestamp({column})")
    }

    fn string_agg(&self, column: &str, separator: &str) -> String {
        let separator = quote_standard(&separator.replace('\0', ""), Dialect::Postgresql)
            .unwrap_or_else(|_| "''".to_string());
        format!("string_agg({column}, {separator})")
    }

    fn create_view_prefix(&self, name: &str) -> String {
        format!("CREATE OR REPLACE VIEW {}", self.quote_identifier(name))
    }

    fn insert_prefix(&self, _mode: ConflictMode) -> &'static str {
        "INSERT INTO"
    }

    fn conflict_clause(
        &self,
        mode: ConflictMode,
        key_columns: &[String],
        columns: &[String],
    ) -> Option<String> {
        match mode {
            ConflictMode::None => Some(String::new()),
            ConflictMode::Ignore => Some("ON CONFLICT DO NOTHING".to_string()),
            ConflictMode::Replace => {
                if key_columns.is_empty() {
                    return None;
                }
                let target = join_quoted(self, key_columns);
                let updates: Vec<String> = columns
                    .iter()
                    .filter(|column| !key_columns.contains(column))
                    .map(|column| {
                        let quoted = self.quote_identifier(column);
                        format!("{quoted} = EXCLUDED.{quoted}")
                    })
                    .collect();
                if updates.is_empty() {
                    Some(format!("ON CONFLICT ({target}) DO NOTHING"))
                } else {
                    Some(format!(
                        "ON CONFLICT ({target}) DO UPDATE SET {}",
                        updates.join(", ")
                    ))
                }
            }
        }
    }

    fn unix_epoch_now(&self) -> &'static str {
        "(EXTRACT(EPOCH FROM CURRENT_TIMESTAMP)::BIGINT)"
    }

    fn float_literal(&self, value: f64) -> Result<String, EscapeError> {
        if value.is_nan() {
            Ok("'NaN'".to_string())
        } else if value.is_infinite() {
            Ok(if value > 0.0 { "'Infinity'" } else { "'-Infinity'" }.to_string())
        } else {
            Ok(format!("{value:?}"))
        }
    }

    fn timestamp_from_epoch(&self, number: &str) -> String {
        format!("(to_timestamp({number}) AT TIME ZONE 'UTC')")
    }

    fn column_type(&self, portable: &PortableType, auto_increment: bool) -> String {
        match (portable, auto_increment) {
            (PortableType::Integer, true) => "SERIAL".to_string(),
            (PortableType::BigInt, true) => "BIGSERIAL".to_string(),
            _ => crate::typemap::portable_to_native(Dialect::Postgresql, portable),
        }
    }

    fn session_preamble(&self) -> Option<&'static str> {
        Some("SET standard_conforming_strings = on;")
    }

    fn sequence_reset(&self, table: &str, column: &str) -> Option<String> {
        let table_ident = self.quote_identifier(table);
        let column_ident = self.quote_identifier(column);
        Some(format!(
            "SELECT setval(pg_get_serial_sequence('{}', '{}'), (SELECT MAX({column_ident}) FROM {table_ident}));",
            table_ident.replace('\'', "''"),
            column.replace('\'', "''"),
        ))
    }
}
