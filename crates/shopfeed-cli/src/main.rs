use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod import;

#[derive(Debug, Parser)]
#[command(name = "shopfeed-cli")]
#[command(about = "Product import command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Import products into the catalog.
    Import {
        #[command(subcommand)]
        command: ImportCommands,
    },
    /// Database maintenance.
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum ImportCommands {
    /// Import a single product from a marketplace URL.
    Url {
        url: String,
        /// Parse and print the record without writing to the database.
        #[arg(long)]
        dry_run: bool,
    },
    /// Discover and import every product linked from a catalog page.
    Catalog {
        url: String,
        #[arg(long)]
        dry_run: bool,
    },
    /// Import products from a CSV file.
    Csv {
        path: std::path::PathBuf,
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Verify database connectivity.
    Ping,
    /// Apply pending migrations.
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = shopfeed_core::load_app_config()
        .map_err(|e| anyhow::anyhow!("configuration error: {e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    match cli.command {
        Commands::Import { command } => match command {
            ImportCommands::Url { url, dry_run } => {
                import::run_import_url(&config, &url, dry_run).await
            }
            ImportCommands::Catalog { url, dry_run } => {
                import::run_import_catalog(&config, &url, dry_run).await
            }
            ImportCommands::Csv { path, dry_run } => {
                import::run_import_csv(&config, &path, dry_run).await
            }
        },
        Commands::Db { command } => match command {
            DbCommands::Ping => {
                let pool = connect(&config).await?;
                shopfeed_db::health_check(&pool).await?;
                println!("database is reachable");
                Ok(())
            }
            DbCommands::Migrate => {
                let pool = connect(&config).await?;
                let applied = shopfeed_db::run_migrations(&pool).await?;
                println!("applied {applied} migrations");
                Ok(())
            }
        },
    }
}

async fn connect(config: &shopfeed_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool = shopfeed_db::connect_pool(
        &config.database_url,
        shopfeed_db::PoolConfig::from_app_config(config),
    )
    .await?;
    Ok(pool)
}
