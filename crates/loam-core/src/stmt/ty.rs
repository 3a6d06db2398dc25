use super::StorageClass;
use std::fmt;

/// The declared type of a mapped attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Bool,

    /// 32-bit integer attribute.
    Int,

    /// 64-bit integer attribute.
    BigInt,

    /// 32-bit float attribute.
    Float,

    /// 64-bit float attribute.
    Double,

    Text,

    /// Point in time, stored as milliseconds since the epoch.
    Timestamp,

    Enum(EnumType),

    /// Anything else: stored opaquely.
    Blob,
}

/// An enumeration attribute type. Stored as the constant's name; integer
/// storage is decoded by ordinal.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub variants: Vec<String>,
}

impl Type {
    /// The storage class a column of this type occupies in the database.
    pub fn storage_class(&self) -> StorageClass {
        match self {
            Self::Bool | Self::Int | Self::BigInt | Self::Timestamp => StorageClass::Integer,
            Self::Float | Self::Double => StorageClass::Real,
            Self::Text | Self::Enum(_) => StorageClass::Text,
            Self::Blob => StorageClass::Blob,
        }
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, Self::Enum(_))
    }
}

impl Type {
    pub fn enumeration(name: &str, variants: &[&str]) -> Self {
        Self::Enum(EnumType {
            name: name.to_string(),
            variants: variants.iter().map(|v| v.to_string()).collect(),
        })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Int => f.write_str("i32"),
            Self::BigInt => f.write_str("i64"),
            Self::Float => f.write_str("f32"),
            Self::Double => f.write_str("f64"),
            Self::Text => f.write_str("text"),
            Self::Timestamp => f.write_str("timestamp"),
            Self::Enum(ty) => write!(f, "enum {}", ty.name),
            Self::Blob => f.write_str("blob"),
        }
    }
}
