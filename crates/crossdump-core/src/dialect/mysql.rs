use crate::literal::EscapeError;
use crate::schema::ColumnDefault;
use crate::types::PortableType;

use super::{ConflictMode, Dialect, DialectStrategy};

/// MySQL / MariaDB rendering rules.
///
/// String literals use backslash escapes, so output assumes the default
/// `sql_mode` (no `NO_BACKSLASH_ESCAPES`).
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlStrategy;

impl MySqlStrategy {
    fn quote_mysql(text: &str) -> String {
        let mut out = String::with_capacity(text.len() + 2);
        out.push('\'');
        for ch in text.chars() {
            match ch {
                '\'' => out.push_str("''"),
                '\\' => out.push_str("\\\\"),
                '\0' => out.push_str("\\0"),
                '\u{1a}' => out.push_str("\\Z"),
                other => out.push(other),
            }
        }
        out.push('\'');
        out
    }
}

impl DialectStrategy for MySqlStrategy {
    fn dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn quote_text(&self, text: &str) -> Result<String, EscapeError> {
        Ok(Self::quote_mysql(text))
    }

    fn blob_literal(&self, bytes: &[u8]) -> String {
        format!("X'{}'", hex::encode_upper(bytes))
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        if value { "1" } else { "0" }
    }

    fn date_function(&self, column: &str) -> String {
        format!("FROM_UNIXTIME({column})")
    }

    fn string_agg(&self, column: &str, separator: &str) -> String {
        format!(
            "GROUP_CONCAT({column} SEPARATOR {})",
            Self::quote_mysql(separator)
        )
    }

    fn create_view_prefix(&self, name: &str) -> String {
        format!("CREATE OR REPLACE VIEW {}", self.quote_identifier(name))
    }

    fn insert_prefix(&self, mode: ConflictMode) -> &'static str {
        match mode {
            ConflictMode::Ignore => "INSERT IGNORE INTO",
            ConflictMode::Replace => "REPLACE INTO",
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
        "(UNIX_TIMESTAMP())"
    }

    fn auto_increment_suffix(&self) -> Option<&'static str> {
        Some("AUTO_INCREMENT")
    }

    // InnoDB cannot index unbounded TEXT.
    fn key_column_type(&self, portable: PortableType) -> PortableType {
        match portable {
            PortableType::Text => PortableType::VarChar(255),
            other => other,
        }
    }

    fn table_options(&self) -> Option<&'static str> {
        Some("ENGINE=InnoDB DEFAULT CHARSET=utf8mb4")
    }

    fn session_preamble(&self) -> Option<&'static str> {
        Some("SET NAMES utf8mb4;")
    }

    // TEXT/BLOB columns only accept parenthesized expression defaults.
    fn render_default(
        &self,
        default: &ColumnDefault,
        portable: &PortableType,
    ) -> Result<String, EscapeError> {
        let rendered = match default {
            ColumnDefault::Literal(value) => self.escape_value(value, portable)?,
            ColumnDefault::CurrentTimestamp => self.current_timestamp().to_string(),
            ColumnDefault::UnixEpochNow => return Ok(self.unix_epoch_now().to_string()),
        };
        match (default, portable) {
            (ColumnDefault::Literal(value), PortableType::Text | PortableType::Blob)
                if !value.is_null() =>
            {
                Ok(format!("({rendered})"))
            }
            _ => Ok(rendered),
        }
    }
}
