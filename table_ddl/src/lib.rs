//! table_ddl: rebuild re-runnable DDL for a table from the PostgreSQL catalog
//!
//! The catalog is read through the [`CatalogQuery`] capability, resolved
//! into a [`ResolvedTable`] and rendered with [`DdlBuilder`]. Any
//! `CatalogQuery` can be plugged in; [`DatabaseConnection`] is the sqlx
//! backed one.

pub mod config;
pub mod db;
pub mod error;
pub mod schema;
pub mod utils;


// Re-export main types for easier access
pub use config::Config;
pub use db::connection::DatabaseConnection;
pub use error::{Error, Result};
pub use schema::database::DatabaseInspector;
pub use schema::generator::DdlBuilder;
pub use schema::inspector::SchemaInspector;
pub use schema::reader::CatalogQuery;
pub use schema::types::ResolvedTable;

/// Initialize table_ddl with the specified configuration file
pub async fn init(config_path: &str) -> Result<TableDdlClient> {
    let config = config::load_from_file(config_path)?;
    TableDdlClient::new(config).await
}

/// Server facts reported by [`TableDdlClient::database_info`]
#[derive(Debug, Clone, serde::Serialize)]
pub struct DatabaseInfo {
    pub version: String,
    pub encoding: String,
    pub collation: String,
}

/// The main client for rebuilding table DDL
pub struct TableDdlClient {
    config: Config,
    db_connection: DatabaseConnection,
}

impl TableDdlClient {
    /// Create a new client from configuration
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let db_connection = DatabaseConnection::connect(&config.database).await?;

        Ok(Self {
            config,
            db_connection,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn inspector(&self) -> SchemaInspector<'_, DatabaseConnection> {
        SchemaInspector::new(&self.db_connection, self.config.database.schema_name())
    }

    fn database_inspector(&self) -> DatabaseInspector<'_, DatabaseConnection> {
        DatabaseInspector::new(&self.db_connection, self.config.database.schema_name())
    }

    /// DDL for a single table
    pub async fn create_table_sql(&self, table: &str) -> Result<String> {
        self.inspector().create_table_sql(table).await
    }

    /// Resolved structure of a single table
    pub async fn describe_table(&self, table: &str) -> Result<ResolvedTable> {
        self.inspector().inspect(table).await
    }

    /// Tables in the configured schema
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        self.database_inspector().list_tables().await
    }

    /// Version, encoding and collation of the connected database
    pub async fn database_info(&self) -> Result<DatabaseInfo> {
        let inspector = self.database_inspector();
        Ok(DatabaseInfo {
            version: inspector.server_version().await?,
            encoding: inspector.server_encoding().await?,
            collation: inspector.collation().await?,
        })
    }
}
