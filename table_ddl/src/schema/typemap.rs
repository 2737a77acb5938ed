//! Mapping of PostgreSQL type names to the canonical type vocabulary

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Portable column types emitted in generated DDL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalType {
    SmallInt,
    Int,
    BigInt,
    SmallSerial,
    Serial,
    BigSerial,
    Decimal,
    Float,
    Double,
    Char,
    Varchar,
    Text,
    Json,
    Jsonb,
    Date,
    Time,
    TimeTz,
    Timestamp,
    TimestampTz,
    Bool,
    Bytea,
    /// Unknown vendor name, lower-cased and passed through
    Other(String),
}

impl CanonicalType {
    /// Decimal family, parameterized by precision and scale
    pub fn is_decimal(&self) -> bool {
        matches!(self, CanonicalType::Decimal)
    }

    /// Character families parameterized by a length
    pub fn is_sized_character(&self) -> bool {
        matches!(self, CanonicalType::Char | CanonicalType::Varchar)
    }
}

impl fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            CanonicalType::SmallInt => "SMALLINT",
            CanonicalType::Int => "INT",
            CanonicalType::BigInt => "BIGINT",
            CanonicalType::SmallSerial => "SMALLSERIAL",
            CanonicalType::Serial => "SERIAL",
            CanonicalType::BigSerial => "BIGSERIAL",
            CanonicalType::Decimal => "DECIMAL",
            CanonicalType::Float => "REAL",
            CanonicalType::Double => "DOUBLE PRECISION",
            CanonicalType::Char => "CHAR",
            CanonicalType::Varchar => "VARCHAR",
            CanonicalType::Text => "TEXT",
            CanonicalType::Json => "JSON",
            CanonicalType::Jsonb => "JSONB",
            CanonicalType::Date => "DATE",
            CanonicalType::Time => "TIME",
            CanonicalType::TimeTz => "TIMETZ",
            CanonicalType::Timestamp => "TIMESTAMP",
            CanonicalType::TimestampTz => "TIMESTAMPTZ",
            CanonicalType::Bool => "BOOL",
            CanonicalType::Bytea => "BYTEA",
            CanonicalType::Other(name) => name.as_str(),
        };
        f.write_str(tag)
    }
}

static VENDOR_TYPES: Lazy<HashMap<&'static str, CanonicalType>> = Lazy::new(|| {
    use CanonicalType::*;

    HashMap::from([
        // Integer types; serial pseudo-types collapse to their storage type
        ("smallint", SmallInt),
        ("int2", SmallInt),
        ("smallserial", SmallInt),
        ("int", Int),
        ("integer", Int),
        ("int4", Int),
        ("serial", Int),
        ("bigint", BigInt),
        ("int8", BigInt),
        ("bigserial", BigInt),
        // Exact numerics
        ("decimal", Decimal),
        ("numeric", Decimal),
        ("money", Decimal),
        // Floating point
        ("real", Float),
        ("float4", Float),
        ("float", Float),
        ("double", Double),
        ("double precision", Double),
        ("float8", Double),
        // Character types
        ("char", Char),
        ("character", Char),
        ("bpchar", Char),
        ("varchar", Varchar),
        ("character varying", Varchar),
        ("text", Text),
        ("json", Json),
        ("jsonb", Jsonb),
        // Date/time types
        ("date", Date),
        ("time", Time),
        ("time without time zone", Time),
        ("timetz", TimeTz),
        ("time with time zone", TimeTz),
        ("timestamp", Timestamp),
        ("timestamp without time zone", Timestamp),
        ("timestamptz", TimestampTz),
        ("timestamp with time zone", TimestampTz),
        // Boolean
        ("bool", Bool),
        ("boolean", Bool),
        // Binary
        ("bytea", Bytea),
    ])
});

/// Map a vendor type name to its canonical type.
///
/// Never fails: names outside the table come back as
/// [`CanonicalType::Other`] holding the lower-cased input.
pub fn map_type(vendor_type: &str) -> CanonicalType {
    let key = vendor_type.trim().to_lowercase();
    match VENDOR_TYPES.get(key.as_str()) {
        Some(canonical) => canonical.clone(),
        None => CanonicalType::Other(key),
    }
}

/// Swap an integer type for its auto-increment counterpart
pub fn promote_to_auto_increment(canonical: CanonicalType) -> CanonicalType {
    match canonical {
        CanonicalType::SmallInt => CanonicalType::SmallSerial,
        CanonicalType::Int => CanonicalType::Serial,
        CanonicalType::BigInt => CanonicalType::BigSerial,
        other => other,
    }
}
