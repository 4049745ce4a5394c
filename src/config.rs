use anyhow::{Context, Result};

/// Database connection settings, read once from the environment at startup.
///
/// `host` and `port` stay `None` unless the operator set them explicitly;
/// the connection resolver fills in whatever was left unset.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl DbConfig {
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("DB_HOST").ok().filter(|v| !v.is_empty());
        let port = std::env::var("DB_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok());
        let user = std::env::var("DB_USER").unwrap_or_else(|_| "root".to_string());
        let password =
            std::env::var("DB_PASSWORD").context("DB_PASSWORD must be set (it has no default)")?;
        let database = std::env::var("DB_NAME").unwrap_or_else(|_| "ide_judge_db".to_string());

        Ok(Self {
            host,
            port,
            user,
            password,
            database,
        })
    }
}
