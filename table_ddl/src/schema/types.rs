//! Type definitions for catalog rows and resolved table structures

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::schema::typemap::CanonicalType;

/// A loosely typed scalar as returned by a catalog query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CatalogValue {
    Null,
    Text(String),
    Int(i64),
    Bool(bool),
}

impl From<&str> for CatalogValue {
    fn from(value: &str) -> Self {
        CatalogValue::Text(value.to_string())
    }
}

impl From<String> for CatalogValue {
    fn from(value: String) -> Self {
        CatalogValue::Text(value)
    }
}

impl From<i64> for CatalogValue {
    fn from(value: i64) -> Self {
        CatalogValue::Int(value)
    }
}

impl From<i32> for CatalogValue {
    fn from(value: i32) -> Self {
        CatalogValue::Int(value as i64)
    }
}

impl From<bool> for CatalogValue {
    fn from(value: bool) -> Self {
        CatalogValue::Bool(value)
    }
}

impl<T: Into<CatalogValue>> From<Option<T>> for CatalogValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CatalogValue::Null)
    }
}

/// One catalog row: column name to value, in select-list order.
///
/// The getters never fail. A missing column or a value of the wrong
/// kind yields the type's empty value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogRow {
    values: IndexMap<String, CatalogValue>,
}

impl CatalogRow {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, column: &str, value: impl Into<CatalogValue>) -> Self {
        self.insert(column, value);
        self
    }

    /// Set a column value
    pub fn insert(&mut self, column: &str, value: impl Into<CatalogValue>) {
        self.values.insert(column.to_string(), value.into());
    }

    /// Raw access to a value
    pub fn get(&self, column: &str) -> Option<&CatalogValue> {
        self.values.get(column)
    }

    /// Text value, or empty string
    pub fn get_str(&self, column: &str) -> String {
        match self.values.get(column) {
            Some(CatalogValue::Text(s)) => s.clone(),
            _ => String::new(),
        }
    }

    /// Text value, `None` when null, missing or blank
    pub fn get_opt_str(&self, column: &str) -> Option<String> {
        let value = self.get_str(column);
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// Integer value, or zero
    pub fn get_int(&self, column: &str) -> i64 {
        match self.values.get(column) {
            Some(CatalogValue::Int(i)) => *i,
            _ => 0,
        }
    }

    /// Integer value, `None` when null or not an integer
    pub fn get_opt_int(&self, column: &str) -> Option<i64> {
        match self.values.get(column) {
            Some(CatalogValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    /// Boolean value, or false
    pub fn get_bool(&self, column: &str) -> bool {
        matches!(self.values.get(column), Some(CatalogValue::Bool(true)))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A table column as reported by `information_schema.columns`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub ordinal_position: i64,
    pub name: String,
    pub vendor_type: String,
    pub canonical_type: CanonicalType,
    pub numeric_precision: Option<i64>,
    pub numeric_scale: Option<i64>,
    pub character_maximum_length: Option<i64>,
    pub nullable: bool,
    pub default: Option<String>,
    pub comment: Option<String>,
    pub is_primary_key: bool,
    /// Sequence feeding a `nextval(...)` default
    pub sequence: Option<String>,
}

impl ColumnDescriptor {
    /// Build a column from its catalog row
    pub fn from_row(row: &CatalogRow) -> Self {
        let vendor_type = row.get_str("data_type");
        Self {
            ordinal_position: row.get_int("ordinal_position"),
            name: row.get_str("column_name"),
            canonical_type: crate::schema::typemap::map_type(&vendor_type),
            vendor_type,
            numeric_precision: row.get_opt_int("numeric_precision"),
            numeric_scale: row.get_opt_int("numeric_scale"),
            character_maximum_length: row.get_opt_int("character_maximum_length"),
            nullable: row.get_str("is_nullable") != "NO",
            default: row.get_opt_str("column_default"),
            comment: row.get_opt_str("comment"),
            is_primary_key: false,
            sequence: None,
        }
    }

    /// Whether the default draws from a sequence
    pub fn is_auto_increment(&self) -> bool {
        self.sequence.is_some()
    }
}

/// Index access methods that can be rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexAlgorithm {
    BTree,
    Hash,
}

impl IndexAlgorithm {
    /// Parse the upper-cased `pg_am.amname`
    pub fn parse(index: &str, algorithm: &str) -> Result<Self> {
        match algorithm.trim().to_uppercase().as_str() {
            "BTREE" => Ok(IndexAlgorithm::BTree),
            "HASH" => Ok(IndexAlgorithm::Hash),
            _ => Err(Error::unsupported_algorithm(index, algorithm)),
        }
    }
}

impl fmt::Display for IndexAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexAlgorithm::BTree => write!(f, "BTREE"),
            IndexAlgorithm::Hash => write!(f, "HASH"),
        }
    }
}

/// An index on the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub name: String,
    pub algorithm: IndexAlgorithm,
    pub is_unique: bool,
    pub definition: String,
    /// Comma separated key list, embeddable in `( ... )`, catalog quoting kept
    pub columns: String,
    /// Key elements with identifier quotes removed
    pub key_columns: Vec<String>,
    /// Predicate of a partial index
    pub condition: Option<String>,
    pub comment: Option<String>,
}

/// A foreign-key constraint; the definition is kept as the catalog renders it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyDescriptor {
    pub name: String,
    pub definition: String,
}

/// Everything needed to render one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTable {
    pub name: String,
    pub comment: Option<String>,
    pub columns: Vec<ColumnDescriptor>,
    /// Unquoted key columns of the `<table>_pkey` index, empty when there is none
    pub primary_key: Vec<String>,
    /// Secondary indexes only
    pub indexes: Vec<IndexDescriptor>,
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
}

impl ResolvedTable {
    /// Whether the primary key is carried by a column attribute
    pub fn has_column_primary_key(&self) -> bool {
        self.columns.iter().any(|c| c.is_primary_key)
    }
}
