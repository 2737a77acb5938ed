//! Schema inspector
//!
//! Entry point for rebuilding a table's DDL: reads the catalog, resolves
//! the structure and renders it.

use crate::config::DEFAULT_SCHEMA;
use crate::error::Result;
use crate::schema::generator::DdlBuilder;
use crate::schema::reader::{CatalogQuery, CatalogReader};
use crate::schema::resolver::StructuralResolver;
use crate::schema::types::ResolvedTable;

/// Rebuilds table definitions from a catalog
pub struct SchemaInspector<'a, C: CatalogQuery + ?Sized> {
    catalog: &'a C,
    schema: String,
}

impl<'a, C: CatalogQuery + ?Sized> SchemaInspector<'a, C> {
    /// Create an inspector for tables in `schema`
    pub fn new(catalog: &'a C, schema: &str) -> Self {
        Self {
            catalog,
            schema: schema.to_string(),
        }
    }

    /// Create an inspector for the `public` schema
    pub fn public(catalog: &'a C) -> Self {
        Self::new(catalog, DEFAULT_SCHEMA)
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Read and resolve `table` without rendering it
    pub async fn inspect(&self, table: &str) -> Result<ResolvedTable> {
        tracing::debug!(table = table, schema = %self.schema, "Reading catalog");

        let raw = CatalogReader::new(self.catalog, &self.schema)
            .read(table)
            .await?;

        tracing::debug!(
            table = table,
            columns = raw.columns.len(),
            indexes = raw.indexes.len(),
            foreign_keys = raw.foreign_keys.len(),
            "Catalog rows loaded"
        );

        StructuralResolver::resolve(raw)
    }

    /// Full DDL for `table`
    pub async fn create_table_sql(&self, table: &str) -> Result<String> {
        let resolved = self.inspect(table).await?;
        Ok(DdlBuilder::new(&resolved).build())
    }
}
