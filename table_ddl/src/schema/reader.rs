//! Catalog reader
//!
//! Issues the catalog queries needed to rebuild one table and hands back
//! the raw rows.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::schema::types::CatalogRow;

/// Capability to run a parameterized catalog query.
///
/// Parameters are bound positionally to `$1`, `$2`, ... and are never
/// spliced into the SQL text.
#[async_trait]
pub trait CatalogQuery: Send + Sync {
    /// Run `sql` with `params` and return every row
    async fn query(&self, sql: &str, params: &[&str]) -> Result<Vec<CatalogRow>>;
}

pub(crate) const TABLE_COMMENT_SQL: &str = r#"
    SELECT CAST(obj_description(c.oid, 'pg_class') AS text) AS comment
    FROM pg_class c
    JOIN pg_namespace n ON n.oid = c.relnamespace
    WHERE c.relname = $1
      AND n.nspname = $2
      AND c.relkind IN ('r', 'p')
"#;

pub(crate) const COLUMNS_SQL: &str = r#"
    SELECT
        CAST(col.ordinal_position AS int8) AS ordinal_position,
        CAST(col.column_name AS text) AS column_name,
        CAST(col.udt_name AS text) AS data_type,
        CAST(col.numeric_precision AS int8) AS numeric_precision,
        CAST(col.numeric_scale AS int8) AS numeric_scale,
        CAST(col.character_maximum_length AS int8) AS character_maximum_length,
        CAST(col.is_nullable AS text) AS is_nullable,
        CAST(col.column_default AS text) AS column_default,
        CAST(pg_catalog.col_description(
            format('%I.%I', col.table_schema::text, col.table_name::text)::regclass::oid,
            col.ordinal_position
        ) AS text) AS comment
    FROM information_schema.columns col
    WHERE col.table_name = $1
      AND col.table_schema = $2
    ORDER BY col.ordinal_position
"#;

pub(crate) const INDEXES_SQL: &str = r#"
    SELECT
        CAST(ix.relname AS text) AS index_name,
        CAST(upper(am.amname) AS text) AS index_algorithm,
        i.indisunique AS is_unique,
        pg_get_indexdef(i.indexrelid) AS index_definition,
        CAST(pg_catalog.obj_description(i.indexrelid, 'pg_class') AS text) AS comment
    FROM pg_index i
    JOIN pg_class t ON t.oid = i.indrelid
    JOIN pg_class ix ON ix.oid = i.indexrelid
    JOIN pg_namespace n ON t.relnamespace = n.oid
    JOIN pg_am am ON ix.relam = am.oid
    WHERE t.relname = $1
      AND n.nspname = $2
    ORDER BY ix.relname
"#;

pub(crate) const FOREIGN_KEYS_SQL: &str = r#"
    SELECT
        CAST(c.conname AS text) AS foreign_key,
        pg_get_constraintdef(c.oid) AS definition
    FROM pg_constraint c
    JOIN pg_class t ON t.oid = c.conrelid
    JOIN pg_namespace n ON n.oid = c.connamespace
    WHERE c.contype = 'f'
      AND t.relname = $1
      AND n.nspname = $2
    ORDER BY c.conname
"#;

/// Raw row sets for one table
#[derive(Debug, Clone, Default)]
pub struct RawCatalog {
    pub table: String,
    pub comment: Option<String>,
    pub columns: Vec<CatalogRow>,
    pub indexes: Vec<CatalogRow>,
    pub foreign_keys: Vec<CatalogRow>,
}

/// Reads the catalog rows describing a table
pub struct CatalogReader<'a, C: CatalogQuery + ?Sized> {
    catalog: &'a C,
    schema: &'a str,
}

impl<'a, C: CatalogQuery + ?Sized> CatalogReader<'a, C> {
    /// Create a reader over `catalog`, scoped to `schema`
    pub fn new(catalog: &'a C, schema: &'a str) -> Self {
        Self { catalog, schema }
    }

    /// Read everything about `table`.
    ///
    /// Queries run in order and the first failure aborts the read.
    pub async fn read(&self, table: &str) -> Result<RawCatalog> {
        let comment = self.read_table_comment(table).await?;

        let columns = self.read_columns(table).await?;
        if columns.is_empty() {
            return Err(Error::not_found(table));
        }

        let indexes = self.read_indexes(table).await?;
        let foreign_keys = self.read_foreign_keys(table).await?;

        Ok(RawCatalog {
            table: table.to_string(),
            comment,
            columns,
            indexes,
            foreign_keys,
        })
    }

    /// Table comment; no row at all means the table is missing
    pub async fn read_table_comment(&self, table: &str) -> Result<Option<String>> {
        let rows = self
            .catalog
            .query(TABLE_COMMENT_SQL, &[table, self.schema])
            .await?;

        match rows.first() {
            Some(row) => Ok(row.get_opt_str("comment")),
            None => Err(Error::not_found(table)),
        }
    }

    pub async fn read_columns(&self, table: &str) -> Result<Vec<CatalogRow>> {
        self.catalog.query(COLUMNS_SQL, &[table, self.schema]).await
    }

    pub async fn read_indexes(&self, table: &str) -> Result<Vec<CatalogRow>> {
        self.catalog.query(INDEXES_SQL, &[table, self.schema]).await
    }

    pub async fn read_foreign_keys(&self, table: &str) -> Result<Vec<CatalogRow>> {
        self.catalog
            .query(FOREIGN_KEYS_SQL, &[table, self.schema])
            .await
    }
}
