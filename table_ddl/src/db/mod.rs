//! Database module for table_ddl
//!
//! This module handles the connection the catalog is read through.

pub mod connection;

// Re-export key types
pub use connection::DatabaseConnection;
