use std::fmt;

use serde::{Deserialize, Serialize};

/// Dialect-neutral column type every native type is mapped through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortableType {
    Integer,
    #[serde(rename = "bigint")]
    BigInt,
    Real,
    Text,
    /// Bounded string; the width is kept for targets that enforce it.
    #[serde(rename = "varchar")]
    VarChar(u32),
    Boolean,
    Timestamp,
    Blob,
}

impl PortableType {
    pub fn is_integral(&self) -> bool {
        matches!(self, PortableType::Integer | PortableType::BigInt)
    }

    pub fn is_textual(&self) -> bool {
        matches!(self, PortableType::Text | PortableType::VarChar(_))
    }
}

impl fmt::Display for PortableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortableType::Integer => f.write_str("integer"),
            PortableType::BigInt => f.write_str("bigint"),
            PortableType::Real => f.write_str("real"),
            PortableType::Text => f.write_str("text"),
            PortableType::VarChar(width) => write!(f, "varchar({width})"),
            PortableType::Boolean => f.write_str("boolean"),
            PortableType::Timestamp => f.write_str("timestamp"),
            PortableType::Blob => f.write_str("blob"),
        }
    }
}
