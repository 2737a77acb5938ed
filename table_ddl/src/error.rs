//! Error types for table_ddl

use thiserror::Error;

/// Result type for table_ddl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for table_ddl
#[derive(Error, Debug)]
pub enum Error {
    /// The catalog has no comment row or no column rows for the table
    #[error("Table {table} does not exist")]
    NotFound { table: String },

    #[error("Catalog query failed: {0}")]
    QueryFailure(#[from] sqlx::Error),

    #[error("Index {index} uses unsupported algorithm {algorithm}")]
    UnsupportedIndexAlgorithm { index: String, algorithm: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unexpected catalog result: {0}")]
    UnexpectedResult(String),

    #[error("Logging error: {0}")]
    LoggingError(String),
}

impl Error {
    /// Create a NotFound error for a table
    pub fn not_found(table: impl Into<String>) -> Self {
        Error::NotFound {
            table: table.into(),
        }
    }

    /// Create an UnsupportedIndexAlgorithm error
    pub fn unsupported_algorithm(index: impl Into<String>, algorithm: impl Into<String>) -> Self {
        Error::UnsupportedIndexAlgorithm {
            index: index.into(),
            algorithm: algorithm.into(),
        }
    }
}

/// Convert TOML deserialization errors to table_ddl errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::ConfigError(format!("Failed to parse config file: {}", error))
    }
}
