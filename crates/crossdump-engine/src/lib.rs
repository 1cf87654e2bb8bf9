//! Rendering and orchestration of cross-dialect SQL dumps.
//!
//! The engine reads through a [`SourceAdapter`](crossdump_introspect::SourceAdapter)
//! and returns the script as a string; it never writes files or opens
//! connections of its own.

pub mod data;
pub mod dump;
pub mod options;
pub mod report;
pub mod schema;

pub use data::InsertRenderer;
pub use dump::{HEADER_TITLE, generate_sql_dump, generate_sql_dump_report};
pub use options::{DumpOptions, INTERNAL_TABLES};
pub use report::{DumpOutput, DumpStats, DumpWarning};
pub use schema::{render_create_table, render_create_view};
