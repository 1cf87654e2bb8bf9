use serde::{Deserialize, Serialize};

use crate::constraints::{ForeignKey, PrimaryKey, UniqueConstraint};
use crate::literal::Literal;
use crate::types::PortableType;

/// Kind of relation listed in the source catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Table,
    View,
}

/// A named table or view as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub name: String,
    pub kind: RelationKind,
}

impl Relation {
    pub fn table(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: RelationKind::Table,
        }
    }

    pub fn view(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: RelationKind::View,
        }
    }
}

/// Column default that survives translation between dialects.
///
/// Sequence defaults (`nextval(...)`) never appear here; they become
/// [`ColumnDefinition::is_auto_increment`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ColumnDefault {
    Literal(Literal),
    /// `CURRENT_TIMESTAMP` and its spellings.
    CurrentTimestamp,
    /// Seconds since the Unix epoch at insert time.
    UnixEpochNow,
}

/// Column metadata for a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub portable_type: PortableType,
    pub nullable: bool,
    pub default_value: Option<ColumnDefault>,
    pub is_auto_increment: bool,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, portable_type: PortableType) -> Self {
        Self {
            name: name.into(),
            portable_type,
            nullable: true,
            default_value: None,
            is_auto_increment: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_default(mut self, default: ColumnDefault) -> Self {
        self.default_value = Some(default);
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.is_auto_increment = true;
        self
    }
}

/// Normalized, dialect-agnostic table model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    /// Columns in source ordinal order.
    pub columns: Vec<ColumnDefinition>,
    pub primary_key: Option<PrimaryKey>,
    pub foreign_keys: Vec<ForeignKey>,
    pub unique_constraints: Vec<UniqueConstraint>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: None,
            foreign_keys: Vec::new(),
            unique_constraints: Vec::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.name.clone()).collect()
    }

    /// Columns that identify a row for conflict handling: the primary key,
    /// else the first unique constraint.
    pub fn conflict_key(&self) -> Option<&[String]> {
        self.primary_key
            .as_ref()
            .map(|pk| pk.columns.as_slice())
            .or_else(|| {
                self.unique_constraints
                    .first()
                    .map(|unique| unique.columns.as_slice())
            })
            .filter(|columns| !columns.is_empty())
    }

    /// Whether the column takes part in any key or reference.
    pub fn is_key_column(&self, name: &str) -> bool {
        let in_pk = self
            .primary_key
            .as_ref()
            .is_some_and(|pk| pk.columns.iter().any(|column| column == name));
        in_pk
            || self
                .unique_constraints
                .iter()
                .any(|unique| unique.columns.iter().any(|column| column == name))
            || self
                .foreign_keys
                .iter()
                .any(|fk| fk.columns.iter().any(|column| column == name))
    }
}

/// A view copied as opaque SELECT text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDefinition {
    pub name: String,
    /// Explicit column names from `CREATE VIEW v (a, b)`, empty when absent.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    pub source_select_text: String,
}

/// Caller-declared PortableType for one column, overriding the catalog type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeOverride {
    pub table: String,
    pub column: String,
    pub portable_type: PortableType,
}

impl TypeOverride {
    pub fn lookup<'a>(
        overrides: &'a [TypeOverride],
        table: &str,
        column: &str,
    ) -> Option<&'a TypeOverride> {
        overrides
            .iter()
            .find(|item| item.table == table && item.column == column)
    }
}
