use serde::{Deserialize, Serialize};

use crossdump_core::{ConflictMode, Error, Result, TypeOverride};

/// Bookkeeping tables of the migration runner, never dumped unless named.
pub const INTERNAL_TABLES: &[&str] = &["knex_migrations", "knex_migrations_lock"];

/// Options for one dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpOptions {
    /// Prepend the comment banner naming both dialects and the generation time.
    pub include_header: bool,
    /// Emit `CREATE TABLE` and `CREATE VIEW` statements.
    pub include_schema: bool,
    /// Relations to dump, in output order. `None` means every non-internal
    /// relation in catalog order.
    pub tables: Option<Vec<String>>,
    /// Rows per INSERT batch; `0` skips data entirely.
    pub chunk_size: u64,
    pub conflict_mode: ConflictMode,
    /// Drop unsupported constraints and defaults with a warning instead of failing.
    pub lenient_constraints: bool,
    /// Extra tables skipped when `tables` is not given.
    pub exclude_tables: Vec<String>,
    pub type_overrides: Vec<TypeOverride>,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            include_header: true,
            include_schema: true,
            tables: None,
            chunk_size: 100,
            conflict_mode: ConflictMode::None,
            lenient_constraints: false,
            exclude_tables: Vec::new(),
            type_overrides: Vec::new(),
        }
    }
}

impl DumpOptions {
    /// Options for a DDL-only dump.
    pub fn schema_only() -> Self {
        Self {
            chunk_size: 0,
            ..Self::default()
        }
    }

    pub fn with_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables = Some(tables.into_iter().map(Into::into).collect());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(tables) = &self.tables {
            if tables.iter().any(|name| name.trim().is_empty()) {
                return Err(Error::InvalidOptions(
                    "`tables` contains an empty name".to_string(),
                ));
            }
        }
        for item in &self.type_overrides {
            if item.table.trim().is_empty() || item.column.trim().is_empty() {
                return Err(Error::InvalidOptions(format!(
                    "type override `{}.{}` needs both a table and a column",
                    item.table, item.column
                )));
            }
        }
        Ok(())
    }

    /// Whether `name` is skipped when no explicit table list is given.
    pub fn is_internal(&self, name: &str) -> bool {
        name.starts_with("sqlite_")
            || INTERNAL_TABLES.contains(&name)
            || self.exclude_tables.iter().any(|excluded| excluded == name)
    }
}
