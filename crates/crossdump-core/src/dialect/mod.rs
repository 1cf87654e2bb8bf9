//! Per-dialect SQL rendering rules.
//!
//! Every call site works against [`DialectStrategy`]; the [`Dialect`] enum
//! only selects which strategy to use.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::literal::{EscapeError, Literal};
use crate::schema::ColumnDefault;
use crate::typemap::portable_to_native;
use crate::types::PortableType;

mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MySqlStrategy;
pub use postgres::PostgresStrategy;
pub use sqlite::SqliteStrategy;

/// Supported relational engines. MariaDB is accepted as a MySQL alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Sqlite,
    #[serde(alias = "mariadb")]
    Mysql,
    #[serde(alias = "postgres")]
    Postgresql,
}

impl Dialect {
    pub const ALL: [Dialect; 3] = [Dialect::Sqlite, Dialect::Mysql, Dialect::Postgresql];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::Mysql => "mysql",
            Dialect::Postgresql => "postgresql",
        }
    }

    /// Strategy implementing this dialect's rendering rules.
    pub fn strategy(&self) -> &'static dyn DialectStrategy {
        match self {
            Dialect::Sqlite => &SqliteStrategy,
            Dialect::Mysql => &MySqlStrategy,
            Dialect::Postgresql => &PostgresStrategy,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown dialect name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dialect `{0}` (expected sqlite, mysql, mariadb or postgresql)")]
pub struct ParseDialectError(pub String);

impl FromStr for Dialect {
    type Err = ParseDialectError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "mysql" | "mariadb" => Ok(Dialect::Mysql),
            "postgresql" | "postgres" | "pg" => Ok(Dialect::Postgresql),
            _ => Err(ParseDialectError(value.to_string())),
        }
    }
}

/// How generated INSERT statements react to key conflicts at import time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictMode {
    /// Skip rows whose key already exists.
    Ignore,
    /// Overwrite rows whose key already exists.
    Replace,
    /// Plain INSERT; a conflict aborts the import.
    #[default]
    None,
}

impl FromStr for ConflictMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(ConflictMode::Ignore),
            "replace" => Ok(ConflictMode::Replace),
            "none" => Ok(ConflictMode::None),
            other => Err(format!(
                "unknown conflict mode `{other}` (expected ignore, replace or none)"
            )),
        }
    }
}

/// Rendering rules for one dialect. All methods are pure.
pub trait DialectStrategy: Send + Sync + fmt::Debug {
    fn dialect(&self) -> Dialect;

    fn quote_identifier(&self, name: &str) -> String;

    /// Render `text` as a string literal.
    fn quote_text(&self, text: &str) -> Result<String, EscapeError>;

    fn blob_literal(&self, bytes: &[u8]) -> String;

    fn bool_literal(&self, value: bool) -> &'static str;

    /// Convert a column holding Unix epoch seconds into a timestamp.
    fn date_function(&self, column: &str) -> String;

    fn string_agg(&self, column: &str, separator: &str) -> String;

    /// `CREATE VIEW` statement head up to and including the view name.
    fn create_view_prefix(&self, name: &str) -> String;

    /// Statement head for a data batch, e.g. `INSERT OR IGNORE INTO`.
    fn insert_prefix(&self, mode: ConflictMode) -> &'static str;

    /// Trailing conflict clause of a data batch (empty when the dialect
    /// expresses the mode in [`insert_prefix`](Self::insert_prefix)).
    ///
    /// Returns `None` when the mode cannot be expressed for a table with
    /// the given key.
    fn conflict_clause(
        &self,
        mode: ConflictMode,
        key_columns: &[String],
        columns: &[String],
    ) -> Option<String>;

    /// Expression for "now, as Unix epoch seconds" in a column default.
    fn unix_epoch_now(&self) -> &'static str;

    fn current_timestamp(&self) -> &'static str {
        "CURRENT_TIMESTAMP"
    }

    fn float_literal(&self, value: f64) -> Result<String, EscapeError> {
        if value.is_finite() {
            Ok(format!("{value:?}"))
        } else {
            Err(EscapeError::new(format!(
                "non-finite float {value} has no {} literal",
                self.dialect()
            )))
        }
    }

    /// Render an epoch number bound for a timestamp column.
    fn timestamp_from_epoch(&self, number: &str) -> String {
        self.date_function(number)
    }

    /// Native column type, honoring auto-increment where the dialect
    /// encodes it in the type itself.
    fn column_type(&self, portable: &PortableType, _auto_increment: bool) -> String {
        portable_to_native(self.dialect(), portable)
    }

    /// Keyword appended to an auto-increment column definition.
    fn auto_increment_suffix(&self) -> Option<&'static str> {
        None
    }

    /// Type used when the column participates in a key or reference.
    fn key_column_type(&self, portable: PortableType) -> PortableType {
        portable
    }

    /// Trailing table options after the closing parenthesis of `CREATE TABLE`.
    fn table_options(&self) -> Option<&'static str> {
        None
    }

    /// Session settings emitted once before the first data statement.
    fn session_preamble(&self) -> Option<&'static str> {
        None
    }

    /// Statement realigning an auto-increment sequence after explicit inserts.
    fn sequence_reset(&self, _table: &str, _column: &str) -> Option<String> {
        None
    }

    /// Render `value` as a literal for a column of type `portable`.
    fn escape_value(&self, value: &Literal, portable: &PortableType) -> Result<String, EscapeError> {
        match (portable, value) {
            (_, Literal::Null) => Ok("NULL".to_string()),
            (PortableType::Boolean, value) => {
                truthiness(value).map(|flag| self.bool_literal(flag).to_string())
            }
            (_, Literal::Blob(bytes)) if !portable.is_textual() && *portable != PortableType::Timestamp => {
                Ok(self.blob_literal(bytes))
            }
            (PortableType::Blob, Literal::Text(text)) => Ok(self.blob_literal(text.as_bytes())),
            (PortableType::Integer | PortableType::BigInt, value) => self.escape_integral(value),
            (PortableType::Real | PortableType::Blob, value) => self.escape_numeric(value),
            (PortableType::Text | PortableType::VarChar(_), value) => self.escape_textual(value),
            (PortableType::Timestamp, value) => self.escape_timestamp(value),
        }
    }

    fn escape_integral(&self, value: &Literal) -> Result<String, EscapeError> {
        match value {
            Literal::Int(number) => Ok(number.to_string()),
            Literal::Bool(flag) => Ok(if *flag { "1" } else { "0" }.to_string()),
            Literal::Float(number) if number.fract() == 0.0 && number.abs() < 9.0e18 => {
                Ok((*number as i64).to_string())
            }
            Literal::Float(number) => self.float_literal(*number),
            Literal::Text(text) => text
                .trim()
                .parse::<i64>()
                .map(|number| number.to_string())
                .map_err(|_| EscapeError::new(format!("text `{text}` is not an integer"))),
            Literal::Blob(bytes) => Ok(self.blob_literal(bytes)),
            Literal::Null => Ok("NULL".to_string()),
        }
    }

    fn escape_numeric(&self, value: &Literal) -> Result<String, EscapeError> {
        match value {
            Literal::Int(number) => Ok(number.to_string()),
            Literal::Float(number) => self.float_literal(*number),
            Literal::Bool(flag) => Ok(if *flag { "1" } else { "0" }.to_string()),
            Literal::Text(text) => match text.trim().parse::<f64>() {
                Ok(number) if number.is_finite() => self.float_literal(number),
                _ => Err(EscapeError::new(format!("text `{text}` is not a number"))),
            },
            Literal::Blob(bytes) => Ok(self.blob_literal(bytes)),
            Literal::Null => Ok("NULL".to_string()),
        }
    }

    fn escape_textual(&self, value: &Literal) -> Result<String, EscapeError> {
        match value {
            Literal::Text(text) => self.quote_text(text),
            Literal::Int(number) => self.quote_text(&number.to_string()),
            Literal::Float(number) => self.quote_text(&format!("{number:?}")),
            Literal::Bool(flag) => self.quote_text(if *flag { "true" } else { "false" }),
            Literal::Blob(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => self.quote_text(text),
                Err(_) => Err(EscapeError::new(
                    "binary value in a text column is not valid UTF-8",
                )),
            },
            Literal::Null => Ok("NULL".to_string()),
        }
    }

    fn escape_timestamp(&self, value: &Literal) -> Result<String, EscapeError> {
        match value {
            Literal::Text(text) => self.quote_text(text),
            Literal::Int(number) => Ok(self.timestamp_from_epoch(&number.to_string())),
            Literal::Float(number) if number.is_finite() => {
                Ok(self.timestamp_from_epoch(&format!("{number:?}")))
            }
            Literal::Float(number) => Err(EscapeError::new(format!(
                "non-finite float {number} is not a timestamp"
            ))),
            Literal::Bool(_) => Err(EscapeError::new("boolean value is not a timestamp")),
            Literal::Blob(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => self.quote_text(text),
                Err(_) => Err(EscapeError::new(
                    "binary value in a timestamp column is not valid UTF-8",
                )),
            },
            Literal::Null => Ok("NULL".to_string()),
        }
    }

    /// Render a column default as a `DEFAULT` operand.
    fn render_default(
        &self,
        default: &ColumnDefault,
        portable: &PortableType,
    ) -> Result<String, EscapeError> {
        match default {
            ColumnDefault::Literal(value) => self.escape_value(value, portable),
            ColumnDefault::CurrentTimestamp => Ok(self.current_timestamp().to_string()),
            ColumnDefault::UnixEpochNow => Ok(self.unix_epoch_now().to_string()),
        }
    }
}

/// Interpret a stored value as a boolean.
pub fn truthiness(value: &Literal) -> Result<bool, EscapeError> {
    match value {
        Literal::Bool(flag) => Ok(*flag),
        Literal::Int(number) => Ok(*number != 0),
        Literal::Float(number) if !number.is_nan() => Ok(*number != 0.0),
        Literal::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "1" | "t" | "true" | "y" | "yes" | "on" => Ok(true),
            "0" | "f" | "false" | "n" | "no" | "off" => Ok(false),
            _ => Err(EscapeError::new(format!(
                "text `{text}` is not a boolean"
            ))),
        },
        other => Err(EscapeError::new(format!(
            "{} value is not a boolean",
            other.kind()
        ))),
    }
}

/// Standard SQL string literal: single quotes doubled, NUL rejected.
pub(crate) fn quote_standard(text: &str, dialect: Dialect) -> Result<String, EscapeError> {
    if text.contains('\0') {
        return Err(EscapeError::new(format!(
            "NUL character cannot appear in a {dialect} string literal"
        )));
    }
    Ok(format!("'{}'", text.replace('\'', "''")))
}

/// Double-quoted identifier with embedded quotes doubled.
pub(crate) fn quote_double(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub(crate) fn join_quoted(strategy: &dyn DialectStrategy, names: &[String]) -> String {
    names
        .iter()
        .map(|name| strategy.quote_identifier(name))
        .collect::<Vec<_>>()
        .join(", ")
}
