//! Core model and rendering rules for crossdump.
//!
//! This crate holds the dialect-neutral schema model, the per-dialect
//! strategies and the type mapper. Nothing here performs I/O.

pub mod constraints;
pub mod defaults;
pub mod dialect;
pub mod error;
pub mod graph;
pub mod literal;
pub mod schema;
pub mod typemap;
pub mod types;
pub mod validation;

pub use constraints::{FkAction, ForeignKey, PrimaryKey, UniqueConstraint};
pub use defaults::{ParsedDefault, parse_default};
pub use dialect::{ConflictMode, Dialect, DialectStrategy, ParseDialectError};
pub use error::{Error, Location, Result, Route};
pub use graph::{DependencyReport, GraphSummary, dependency_order};
pub use literal::{EscapeError, Literal};
pub use schema::{
    ColumnDefault, ColumnDefinition, Relation, RelationKind, TableSchema, TypeOverride,
    ViewDefinition,
};
pub use typemap::{UnmappedType, native_to_portable, portable_to_native};
pub use types::PortableType;
pub use validation::validate_table;
