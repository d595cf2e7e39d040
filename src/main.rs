use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::{fs::File, path::PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use venue_manager::{
    api::{self, AppState},
    config::{AppConfig, database, seed, settings},
    core::{catalog_csv, outlet},
    errors::Result,
};

#[derive(Debug, Parser)]
#[command(name = "venue-manager", version, about = "POS, inventory, karaoke rooms and payroll")]
struct Cli {
    /// Path to config.toml
    #[arg(long, short, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Import a product catalogue CSV into an outlet
    Import {
        /// Outlet name
        #[arg(long = "outlet")]
        outlet_name: String,
        /// CSV file exported from the POS
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Tracing first, so config errors are logged
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 2. .env is optional; variables can come from the environment
    dotenv().ok();

    let cli = Cli::parse();
    let app_config = settings::load_config_or_default(&cli.config)
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 3. Database and seed data
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;
    seed::seed_from_config(&db, &app_config)
        .await
        .inspect_err(|e| error!("Failed to seed database: {}", e))?;

    match cli.command {
        Command::Serve => serve(db, app_config).await,
        Command::Import { outlet_name, file } => {
            let outlet = outlet::get_outlet_by_name(&db, &outlet_name).await?;
            let summary = catalog_csv::import_products(&db, &outlet, File::open(&file)?).await?;
            info!(
                created = summary.created,
                updated = summary.updated,
                skipped = summary.skipped,
                "Import finished"
            );
            for reason in &summary.errors {
                info!("Skipped {}", reason);
            }
            Ok(())
        }
    }
}

async fn serve(db: sea_orm::DatabaseConnection, app_config: AppConfig) -> Result<()> {
    let bind_address = app_config.server.bind_address.clone();
    let app = api::router(AppState::new(db, app_config));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down");
        })
        .await?;
    Ok(())
}
