//! Schema module for table_ddl
//!
//! This module reads the catalog of one table, resolves its structure and
//! renders it as DDL.

pub mod database;
pub mod generator;
pub mod inspector;
pub mod reader;
pub mod resolver;
pub mod typemap;
pub mod types;

// Re-export key types
pub use database::DatabaseInspector;
pub use generator::DdlBuilder;
pub use inspector::SchemaInspector;
pub use reader::{CatalogQuery, CatalogReader, RawCatalog};
pub use resolver::StructuralResolver;
pub use typemap::{map_type, promote_to_auto_increment, CanonicalType};
pub use types::{
    CatalogRow, CatalogValue, ColumnDescriptor, ForeignKeyDescriptor, IndexAlgorithm,
    IndexDescriptor, ResolvedTable,
};
