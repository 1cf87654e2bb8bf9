//! Column resolution shared by every adapter.

use crossdump_core::{
    ColumnDefault, Dialect, Error, Location, ParsedDefault, PortableType, Result, TypeOverride,
    native_to_portable, parse_default,
};

use crate::adapter::UnsupportedItem;
use crate::options::IntrospectOptions;

/// Portable type of `table.column`, honoring caller overrides first.
pub(crate) fn resolve_type(
    source: Dialect,
    opts: &IntrospectOptions,
    table: &str,
    column: &str,
    raw_type: &str,
) -> Result<PortableType> {
    if let Some(found) = TypeOverride::lookup(&opts.type_overrides, table, column) {
        return Ok(found.portable_type);
    }
    native_to_portable(source, raw_type).map_err(|err| Error::UnsupportedType {
        route: opts.route(source),
        location: Location::column(table, column),
        dialect: err.dialect,
        raw_type: err.raw_type,
    })
}

/// Column default after classification.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ResolvedDefault {
    pub value: Option<ColumnDefault>,
    /// The default was a sequence and implies auto-increment.
    pub sequence: bool,
}

/// Turn a parsed default into model form, recording expressions that
/// cannot be carried over.
pub(crate) fn resolve_default(
    parsed: ParsedDefault,
    location: Location,
    unsupported: &mut Vec<UnsupportedItem>,
) -> ResolvedDefault {
    match parsed {
        ParsedDefault::Absent => ResolvedDefault::default(),
        ParsedDefault::Value(value) => ResolvedDefault {
            value: Some(value),
            sequence: false,
        },
        ParsedDefault::Sequence => ResolvedDefault {
            value: None,
            sequence: true,
        },
        ParsedDefault::Unrecognized(raw) => {
            unsupported.push(UnsupportedItem::new(
                location,
                format!("default expression `{raw}` has no portable form"),
            ));
            ResolvedDefault::default()
        }
    }
}

/// Shorthand for defaults taken verbatim from a catalog column.
pub(crate) fn resolve_raw_default(
    raw: Option<&str>,
    location: Location,
    unsupported: &mut Vec<UnsupportedItem>,
) -> ResolvedDefault {
    match raw {
        Some(raw) => resolve_default(parse_default(raw), location, unsupported),
        None => ResolvedDefault::default(),
    }
}
