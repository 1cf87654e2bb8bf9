use crate::literal::EscapeError;

use super::{ConflictMode, Dialect, DialectStrategy, quote_double, quote_standard};

/// SQLite rendering rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteStrategy;

impl DialectStrategy for SqliteStrategy {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_double(name)
    }

    fn quote_text(&self, text: &str) -> Result<String, EscapeError> {
        quote_standard(text, Dialect::Sqlite)
    }

    fn blob_literal(&self, bytes: &[u8]) -> String {
        format!("X'{}'", hex::encode_upper(bytes))
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        if value { "1" } else { "0" }
    }

    fn date_function(&self, column: &str) -> String {
        format!("datetime({column}, 'unixepoch')")
    }

    fn string_agg(&self, column: &str, separator: &str) -> String {
        let separator = quote_standard(&separator.replace('\0', ""), Dialect::Sqlite)
            .unwrap_or_else(|_| "''".to_string());
        format!("group_concat({column}, {separator})")
    }

    fn create_view_prefix(&self, name: &str) -> String {
        format!("CREATE VIEW IF NOT EXISTS {}", self.quote_identifier(name))
    }

    fn insert_prefix(&self, mode: ConflictMode) -> &'static str {
        match mode {
            ConflictMode::Ignore => "INSERT OR IGNORE INTO",
            ConflictMode::Replace => "INSERT OR REPLACE INTO",
            ConflictMode::None => "INSERT INTO",
        }
    }

    fn conflict_clause(
        &self,
        _mode: ConflictMode,
        _key_columns: &[String],
        _columns: &[String],
    ) -> Option<String> {
        Some(String::new())
    }

    fn unix_epoch_now(&self) -> &'static str {
        "(strftime('%s', 'now'))"
    }

    // SQLite stores epoch numbers as-is; converting would change the stored form.
    fn timestamp_from_epoch(&self, number: &str) -> String {
        number.to_string()
    }
}
