//! Database connection handling
//!
//! This module provides the PostgreSQL pool and its [`CatalogQuery`]
//! implementation.

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Column, PgPool, Row, TypeInfo, ValueRef};
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::schema::reader::CatalogQuery;
use crate::schema::types::{CatalogRow, CatalogValue};

/// Pooled connection to a PostgreSQL server
#[derive(Debug, Clone)]
pub struct DatabaseConnection {
    pool: PgPool,
}

impl DatabaseConnection {
    /// Create a new database connection from configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool_size = config.pool_size.unwrap_or(5);
        let timeout_seconds = config.timeout_seconds.unwrap_or(30);

        let pool = PgPoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(Duration::from_secs(timeout_seconds))
            .connect(&config.url)
            .await?;

        tracing::debug!(pool_size = pool_size, "Connected to database");
        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CatalogQuery for DatabaseConnection {
    async fn query(&self, sql: &str, params: &[&str]) -> Result<Vec<CatalogRow>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(*param);
        }

        let rows = query.fetch_all(&self.pool).await?;
        tracing::trace!(rows = rows.len(), "Catalog query returned");

        rows.iter().map(decode_row).collect()
    }
}

/// Decode every column of a row into a [`CatalogValue`]
fn decode_row(row: &PgRow) -> Result<CatalogRow> {
    let mut decoded = CatalogRow::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let value = if row.try_get_raw(idx)?.is_null() {
            CatalogValue::Null
        } else {
            match column.type_info().name() {
                "BOOL" => CatalogValue::Bool(row.try_get::<bool, _>(idx)?),
                "INT2" => CatalogValue::Int(row.try_get::<i16, _>(idx)? as i64),
                "INT4" => CatalogValue::Int(row.try_get::<i32, _>(idx)? as i64),
                "INT8" => CatalogValue::Int(row.try_get::<i64, _>(idx)?),
                "TEXT" | "VARCHAR" | "NAME" | "BPCHAR" | "CHAR" => {
                    CatalogValue::Text(row.try_get::<String, _>(idx)?)
                }
                // Queries cast everything they read to the types above
                other => {
                    tracing::debug!(
                        column = column.name(),
                        type_name = other,
                        "Skipping column of unmapped type"
                    );
                    CatalogValue::Null
                }
            }
        };
        decoded.insert(column.name(), value);
    }
    Ok(decoded)
}
