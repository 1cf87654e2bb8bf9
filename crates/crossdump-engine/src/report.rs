use serde::Serialize;

use crossdump_core::{Dialect, Location};

/// Something the dump dropped in lenient mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DumpWarning {
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub detail: String,
}

impl DumpWarning {
    pub fn new(location: Location, detail: impl Into<String>) -> Self {
        Self {
            table: location.table,
            column: location.column,
            detail: detail.into(),
        }
    }
}

/// Counts of emitted objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DumpStats {
    pub tables: usize,
    pub views: usize,
    pub rows: u64,
}

/// A finished dump with everything learned while producing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DumpOutput {
    pub source: Dialect,
    pub target: Dialect,
    pub sql: String,
    pub warnings: Vec<DumpWarning>,
    pub stats: DumpStats,
}
