use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use table_ddl::config::{self, Config};
use table_ddl::utils::logging::init_logging;
use table_ddl::TableDdlClient;

/// Rebuild CREATE TABLE statements from a PostgreSQL catalog
#[derive(Parser, Debug)]
#[command(name = "table_ddl", version, about)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "table_ddl.toml")]
    config: String,

    /// Connection URL, overrides database.url
    #[arg(long, env = "DATABASE_URL")]
    url: Option<String>,

    /// Schema to inspect, overrides database.schema
    #[arg(long)]
    schema: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print or write the DDL of tables
    Dump {
        /// Tables to dump
        tables: Vec<String>,

        /// Dump every table in the schema
        #[arg(long)]
        all: bool,

        /// Write one <table>.sql file per table into this directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print the resolved structure of a table as JSON
    Describe { table: String },
    /// Print server version, encoding and collation
    Info,
    /// List tables in the schema
    Tables,
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = if Path::new(&cli.config).exists() {
        config::load_from_file(&cli.config)?
    } else if let Some(url) = &cli.url {
        Config::from_url(url)
    } else {
        bail!(
            "config file {} not found and no --url given",
            cli.config
        );
    };

    if let Some(url) = &cli.url {
        config.database.url = url.clone();
    }
    if let Some(schema) = &cli.schema {
        config.database.schema = Some(schema.clone());
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(&config.logging)?;

    let client = TableDdlClient::new(config).await?;

    match cli.command {
        Command::Dump { tables, all, out } => {
            let tables = if all {
                client.list_tables().await?
            } else if tables.is_empty() {
                bail!("no tables given, pass table names or --all");
            } else {
                tables
            };

            let out = out.or_else(|| {
                client
                    .config()
                    .output
                    .as_ref()
                    .map(|o| PathBuf::from(&o.directory))
            });
            if let Some(dir) = &out {
                fs::create_dir_all(dir)
                    .with_context(|| format!("creating {}", dir.display()))?;
            }

            for table in &tables {
                let sql = client
                    .create_table_sql(table)
                    .await
                    .with_context(|| format!("rebuilding DDL for {}", table))?;

                match &out {
                    Some(dir) => {
                        let path = dir.join(format!("{}.sql", table));
                        fs::write(&path, &sql)
                            .with_context(|| format!("writing {}", path.display()))?;
                        tracing::info!(table = %table, path = %path.display(), "DDL written");
                    }
                    None => println!("{}", sql),
                }
            }
        }
        Command::Describe { table } => {
            let resolved = client.describe_table(&table).await?;
            println!("{}", serde_json::to_string_pretty(&resolved)?);
        }
        Command::Info => {
            let info = client.database_info().await?;
            println!("version:   {}", info.version);
            println!("encoding:  {}", info.encoding);
            println!("collation: {}", info.collation);
        }
        Command::Tables => {
            for table in client.list_tables().await? {
                println!("{}", table);
            }
        }
    }

    Ok(())
}
