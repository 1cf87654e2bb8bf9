//! Native <-> portable column type mapping.
//!
//! Both directions are total: every `(Dialect, PortableType)` pair has a native
//! spelling, and every native type either maps to one `PortableType` or is
//! reported as [`UnmappedType`].

use thiserror::Error;

use crate::dialect::Dialect;
use crate::types::PortableType;

/// A native type string with no portable mapping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{dialect} type `{raw_type}` has no portable mapping")]
pub struct UnmappedType {
    pub dialect: Dialect,
    pub raw_type: String,
}

/// Native type split into its name, first numeric argument and modifiers.
#[derive(Debug, PartialEq, Eq)]
struct NativeType {
    base: String,
    width: Option<u32>,
    unsigned: bool,
    array: bool,
}

fn parse_native(raw: &str) -> NativeType {
    let mut lowered = raw.trim().to_ascii_lowercase();
    let array = lowered.ends_with("[]");
    if array {
        lowered.truncate(lowered.len() - 2);
    }

    let mut unsigned = false;
    let words: Vec<&str> = lowered
        .split_whitespace()
        .filter(|word| match *word {
            "unsigned" => {
                unsigned = true;
                false
            }
            "signed" | "zerofill" => false,
            _ => true,
        })
        .collect();
    let cleaned = words.join(" ");

    let (head, args, rest) = match (cleaned.find('('), cleaned.rfind(')')) {
        (Some(open), Some(close)) if close > open => (
            &cleaned[..open],
            Some(&cleaned[open + 1..close]),
            &cleaned[close + 1..],
        ),
        _ => (cleaned.as_str(), None, ""),
    };

    let base = format!("{} {}", head.trim(), rest.trim()).trim().to_string();
    let width = args
        .and_then(|args| args.split(',').next())
        .and_then(|first| first.trim().parse().ok());

    NativeType {
        base,
        width,
        unsigned,
        array,
    }
}

/// Map a native column type reported by `dialect`'s catalog to a portable type.
pub fn native_to_portable(dialect: Dialect, raw: &str) -> Result<PortableType, UnmappedType> {
    let native = parse_native(raw);
    let unmapped = || UnmappedType {
        dialect,
        raw_type: raw.trim().to_string(),
    };
    if native.array {
        return Err(unmapped());
    }
    let mapped = match dialect {
        Dialect::Sqlite => sqlite_to_portable(&native),
        Dialect::Mysql => mysql_to_portable(&native),
        Dialect::Postgresql => postgres_to_portable(&native),
    };
    mapped.ok_or_else(unmapped)
}

fn varchar(width: Option<u32>) -> PortableType {
    match width {
        Some(width) if width > 0 => PortableType::VarChar(width),
        _ => PortableType::Text,
    }
}

fn sqlite_to_portable(native: &NativeType) -> Option<PortableType> {
    let mapped = match native.base.as_str() {
        "integer" | "int" | "tinyint" | "smallint" | "mediumint" | "int2" => {
            PortableType::Integer
        }
        "bigint" | "int8" | "unsigned big int" => PortableType::BigInt,
        "real" | "double" | "double precision" | "float" | "numeric" | "decimal" => {
            PortableType::Real
        }
        "text" | "clob" | "json" => PortableType::Text,
        "varchar" | "char" | "character" | "nchar" | "nvarchar" | "varying character"
        | "native character" => varchar(native.width),
        "boolean" | "bool" => PortableType::Boolean,
        "datetime" | "timestamp" | "date" => PortableType::Timestamp,
        // No declared type means BLOB affinity.
        "blob" | "" => PortableType::Blob,
        _ => return None,
    };
    Some(mapped)
}

fn mysql_to_portable(native: &NativeType) -> Option<PortableType> {
    let mapped = match native.base.as_str() {
        "tinyint" if native.width == Some(1) => PortableType::Boolean,
        "bool" | "boolean" => PortableType::Boolean,
        "bit" if native.width.is_none_or(|width| width == 1) => PortableType::Boolean,
        "tinyint" | "smallint" | "mediumint" | "year" => PortableType::Integer,
        "int" | "integer" if native.unsigned => PortableType::BigInt,
        "int" | "integer" => PortableType::Integer,
        // Values above i64::MAX have no portable form.
        "bigint" if native.unsigned => return None,
        "bigint" => PortableType::BigInt,
        "float" | "double" | "double precision" | "real" | "decimal" | "numeric" => {
            PortableType::Real
        }
        "varchar" | "char" => varchar(native.width),
        "tinytext" | "text" | "mediumtext" | "longtext" | "json" | "enum" | "set" => {
            PortableType::Text
        }
        "datetime" | "timestamp" | "date" => PortableType::Timestamp,
        "tinyblob" | "blob" | "mediumblob" | "longblob" | "binary" | "varbinary" => {
            PortableType::Blob
        }
        _ => return None,
    };
    Some(mapped)
}

fn postgres_to_portable(native: &NativeType) -> Option<PortableType> {
    let base = native.base.as_str();
    if base.starts_with("timestamp") {
        return Some(PortableType::Timestamp);
    }
    let mapped = match base {
        "smallint" | "int2" | "integer" | "int" | "int4" | "serial" | "serial4"
        | "smallserial" | "serial2" => PortableType::Integer,
        "bigint" | "int8" | "bigserial" | "serial8" => PortableType::BigInt,
        "real" | "float4" | "double precision" | "float8" | "float" | "numeric" | "decimal" => {
            PortableType::Real
        }
        "text" | "json" | "jsonb" | "citext" => PortableType::Text,
        "character varying" | "varchar" | "character" | "char" | "bpchar" => {
            varchar(native.width)
        }
        "uuid" => PortableType::VarChar(36),
        "boolean" | "bool" => PortableType::Boolean,
        "date" => PortableType::Timestamp,
        "bytea" => PortableType::Blob,
        _ => return None,
    };
    Some(mapped)
}

/// Whether a PostgreSQL type name is a serial pseudo-type.
pub fn is_serial_type(raw: &str) -> bool {
    matches!(
        parse_native(raw).base.as_str(),
        "serial" | "serial4" | "bigserial" | "serial8" | "smallserial" | "serial2"
    )
}

/// Native column type for `portable` in `dialect`.
pub fn portable_to_native(dialect: Dialect, portable: &PortableType) -> String {
    let native = match (dialect, portable) {
        (Dialect::Sqlite, PortableType::Integer | PortableType::BigInt) => "INTEGER",
        (Dialect::Sqlite, PortableType::Real) => "REAL",
        // SQLite does not enforce VARCHAR widths.
        (Dialect::Sqlite, PortableType::Text | PortableType::VarChar(_)) => "TEXT",
        (Dialect::Sqlite, PortableType::Boolean) => "INTEGER",
        (Dialect::Sqlite, PortableType::Timestamp) => "DATETIME",
        (Dialect::Sqlite, PortableType::Blob) => "BLOB",

        (Dialect::Mysql, PortableType::Integer) => "INT",
        (Dialect::Mysql, PortableType::BigInt) => "BIGINT",
        (Dialect::Mysql, PortableType::Real) => "DOUBLE",
        (Dialect::Mysql, PortableType::Text) => "TEXT",
        (Dialect::Mysql, PortableType::VarChar(width)) => return format!("VARCHAR({width})"),
        (Dialect::Mysql, PortableType::Boolean) => "TINYINT(1)",
        (Dialect::Mysql, PortableType::Timestamp) => "DATETIME",
        (Dialect::Mysql, PortableType::Blob) => "LONGBLOB",

        (Dialect::Postgresql, PortableType::Integer) => "INTEGER",
        (Dialect::Postgresql, PortableType::BigInt) => "BIGINT",
        (Dialect::Postgresql, PortableType::Real) => "DOUBLE PRECISION",
        (Dialect::Postgresql, PortableType::Text) => "TEXT",
        (Dialect::Postgresql, PortableType::VarChar(width)) => {
            return format!("VARCHAR({width})");
        }
        (Dialect::Postgresql, PortableType::Boolean) => "BOOLEAN",
        (Dialect::Postgresql, PortableType::Timestamp) => "TIMESTAMP",
        (Dialect::Postgresql, PortableType::Blob) => "BYTEA",
    };
    native.to_string()
}
