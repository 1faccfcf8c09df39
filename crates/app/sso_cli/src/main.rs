// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use clap::Parser;
use cli::{Cli, Commands};
use sqlx::postgres::PgPoolOptions;
use sso_core::auth::password::PasswordHasher;
use sso_core::store::PgStore;

mod cli;
mod logging;
mod seed;

fn main() -> Result<()> {
    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init()?;

    let args = Cli::parse();

    match args.command {
        Commands::Seed {
            database_url,
            password,
            bcrypt_cost,
        } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(run_seed(&database_url, &password, bcrypt_cost))?;
        }
        Commands::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

async fn run_seed(database_url: &str, password: &str, bcrypt_cost: u32) -> Result<()> {
    if !(4..=31).contains(&bcrypt_cost) {
        return Err(Error::Custom(format!("invalid bcrypt cost: {bcrypt_cost}")));
    }

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url)
        .await?;
    let store = PgStore::new(pool);
    store.migrate().await?;

    let report = seed::seed(&store, &PasswordHasher::new(bcrypt_cost), password).await?;
    log::info!(
        "Seeding complete: {} created, {} already present",
        report.created.len(),
        report.skipped.len()
    );
    if report.created.iter().any(|e| e == seed::ADMIN_EMAIL) {
        log::info!("Admin login: {} / {}", seed::ADMIN_EMAIL, password);
    }

    Ok(())
}
