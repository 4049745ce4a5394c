pub mod models;
pub mod users;

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::MySqlPool;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};

use crate::config::DbConfig;
use crate::resolver::DbEndpoint;

/// Build the connection pool for the resolved endpoint.
pub async fn connect(config: &DbConfig, endpoint: &DbEndpoint) -> Result<MySqlPool> {
    let options = MySqlConnectOptions::new()
        .host(&endpoint.host)
        .port(endpoint.port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.database);

    let pool = MySqlPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await
        .with_context(|| {
            format!(
                "connecting to {}:{}/{}",
                endpoint.host, endpoint.port, config.database
            )
        })?;

    Ok(pool)
}

/// Cheap round-trip to confirm the server actually answers queries.
pub async fn health_check(pool: &MySqlPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .context("database health check")?;
    Ok(())
}
