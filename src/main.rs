mod config;
mod db;
mod password;
mod resolver;
mod shell;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use sqlx::MySqlPool;

use crate::config::DbConfig;
use crate::resolver::{DbEndpoint, Resolver};

/// IDE Judge user administration shell
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Print connection resolution diagnostics
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("{} {err:#}", "Error:".red());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    dotenvy::dotenv().ok();
    let config = DbConfig::from_env()?;

    let resolver = Resolver::new(cli.debug);
    let endpoint = resolver
        .endpoint_for(config.host.clone(), config.port)
        .await;

    shell::print_banner();
    println!();
    println!("Checking database connection...");

    let pool = connect_or_hint(&config, &endpoint).await?;
    println!(
        "{} {}:{}/{}",
        "Connected:".green(),
        endpoint.host,
        endpoint.port,
        config.database
    );

    shell::run(&pool).await
}

/// Connect and run the startup health check. This is the only fatal
/// database interaction; it fails with hints for the usual suspects.
async fn connect_or_hint(config: &DbConfig, endpoint: &DbEndpoint) -> Result<MySqlPool> {
    match try_connect(config, endpoint).await {
        Ok(pool) => Ok(pool),
        Err(err) => {
            eprintln!("{}", "Could not reach the database. Check that:".yellow());
            eprintln!("  - the MySQL container is running (docker ps)");
            eprintln!(
                "  - the database is reachable at {}:{}",
                endpoint.host, endpoint.port
            );
            eprintln!("  - DB_USER and DB_PASSWORD are correct");
            Err(err)
        }
    }
}

async fn try_connect(config: &DbConfig, endpoint: &DbEndpoint) -> Result<MySqlPool> {
    let pool = db::connect(config, endpoint).await?;
    db::health_check(&pool).await?;
    Ok(pool)
}
