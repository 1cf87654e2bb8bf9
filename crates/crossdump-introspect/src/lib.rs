//! Read-only source adapters.
//!
//! Each adapter wraps a caller-supplied `sqlx` pool and turns catalog rows
//! into the dialect-neutral model from `crossdump-core`.

pub mod adapter;
pub mod mysql;
pub mod options;
pub mod postgres;
pub mod sqlite;

mod grouping;
mod mapping;
mod paging;

pub use adapter::{IntrospectedTable, RowPage, SourceAdapter, UnsupportedItem};
pub use mysql::MySqlAdapter;
pub use options::IntrospectOptions;
pub use postgres::PostgresAdapter;
pub use sqlite::SqliteAdapter;
