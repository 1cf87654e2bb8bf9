use std::fmt;

use thiserror::Error;

use crate::dialect::Dialect;

/// Source and target dialect of a dump, attached to every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub source: Dialect,
    pub target: Dialect,
}

impl Route {
    pub fn new(source: Dialect, target: Dialect) -> Self {
        Self { source, target }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// Table (and optionally column) an error refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub table: String,
    pub column: Option<String>,
}

impl Location {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: None,
        }
    }

    pub fn column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: Some(column.into()),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.column {
            Some(column) => write!(f, "{}.{}", self.table, column),
            None => write!(f, "{}", self.table),
        }
    }
}

/// Error type shared across crossdump crates.
///
/// Every dump failure is fatal: callers never receive a partial script.
#[derive(Debug, Error)]
pub enum Error {
    /// A catalog or row query failed against the source connection.
    #[error("introspection of {object} failed ({route}): {message}")]
    Introspection {
        route: Route,
        object: String,
        message: String,
    },
    /// A native column type has no portable mapping.
    #[error("unsupported {dialect} type `{raw_type}` at {location} ({route})")]
    UnsupportedType {
        route: Route,
        location: Location,
        dialect: Dialect,
        raw_type: String,
    },
    /// A constraint or default the model cannot represent.
    #[error("unsupported constraint at {location} ({route}): {detail}")]
    UnsupportedConstraint {
        route: Route,
        location: Location,
        detail: String,
    },
    /// A value cannot be serialized for the target dialect.
    #[error("cannot escape value at {location} ({route}): {reason}")]
    Escaping {
        route: Route,
        location: Location,
        reason: String,
    },
    /// The introspected schema violates internal invariants.
    #[error("invalid schema at {location} ({route}): {message}")]
    InvalidSchema {
        route: Route,
        location: Location,
        message: String,
    },
    /// Dump options are malformed.
    #[error("invalid dump options: {0}")]
    InvalidOptions(String),
}

/// Convenience alias for results returned by crossdump crates.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn introspection(
        route: Route,
        object: impl Into<String>,
        message: impl ToString,
    ) -> Self {
        Error::Introspection {
            route,
            object: object.into(),
            message: message.to_string(),
        }
    }

    pub fn unsupported_constraint(
        route: Route,
        location: Location,
        detail: impl Into<String>,
    ) -> Self {
        Error::UnsupportedConstraint {
            route,
            location,
            detail: detail.into(),
        }
    }
}
