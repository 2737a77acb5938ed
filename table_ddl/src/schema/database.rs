//! Database-level catalog lookups

use crate::config::DEFAULT_SCHEMA;
use crate::error::{Error, Result};
use crate::schema::reader::CatalogQuery;

pub(crate) const VERSION_SQL: &str = "SELECT version() AS version";

pub(crate) const ENCODING_SQL: &str = "SHOW SERVER_ENCODING";

pub(crate) const COLLATION_SQL: &str =
    "SELECT CAST(datcollate AS text) AS datcollate FROM pg_database WHERE datname = current_database()";

pub(crate) const TABLES_SQL: &str = r#"
    SELECT CAST(table_name AS text) AS table_name
    FROM information_schema.tables
    WHERE table_schema = $1
      AND table_type = 'BASE TABLE'
    ORDER BY table_name
"#;

/// Server and database facts that are not tied to one table
pub struct DatabaseInspector<'a, C: CatalogQuery + ?Sized> {
    catalog: &'a C,
    schema: String,
}

impl<'a, C: CatalogQuery + ?Sized> DatabaseInspector<'a, C> {
    pub fn new(catalog: &'a C, schema: &str) -> Self {
        Self {
            catalog,
            schema: schema.to_string(),
        }
    }

    pub fn public(catalog: &'a C) -> Self {
        Self::new(catalog, DEFAULT_SCHEMA)
    }

    /// `version()` of the server
    pub async fn server_version(&self) -> Result<String> {
        self.single_value(VERSION_SQL, "version").await
    }

    /// Encoding of the current database
    pub async fn server_encoding(&self) -> Result<String> {
        self.single_value(ENCODING_SQL, "server_encoding").await
    }

    /// Collation of the current database
    pub async fn collation(&self) -> Result<String> {
        self.single_value(COLLATION_SQL, "datcollate").await
    }

    /// Base tables of the inspected schema, sorted by name
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let rows = self.catalog.query(TABLES_SQL, &[self.schema.as_str()]).await?;
        Ok(rows
            .iter()
            .map(|row| row.get_str("table_name"))
            .filter(|name| !name.is_empty())
            .collect())
    }

    async fn single_value(&self, sql: &str, column: &str) -> Result<String> {
        let rows = self.catalog.query(sql, &[]).await?;
        rows.first()
            .map(|row| row.get_str(column))
            .ok_or_else(|| Error::UnexpectedResult(format!("no row returned for {}", column)))
    }
}
