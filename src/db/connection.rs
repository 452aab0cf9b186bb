use std::time::Duration;

use anyhow::Context;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

use crate::config::DatabaseConfig;

pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(cfg.url.clone());
    options
        .max_connections(cfg.max_connections)
        .min_connections(cfg.min_idle)
        .connect_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    info!(backend = backend_name(&cfg.url), "connecting to database");
    let db = Database::connect(options)
        .await
        .context("failed to connect to database")?;

    info!("syncing database schema from entities");
    db.get_schema_registry("contacts_server::db::entities::*")
        .sync(&db)
        .await
        .context("failed to sync database schema")?;
    Ok(db)
}

fn backend_name(url: &str) -> &'static str {
    if url.starts_with("sqlite:") {
        "sqlite"
    } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        "postgres"
    } else {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::backend_name;

    #[test]
    fn detects_backend_from_url_scheme() {
        assert_eq!(backend_name("sqlite::memory:"), "sqlite");
        assert_eq!(backend_name("postgres://user@localhost/contacts"), "postgres");
        assert_eq!(backend_name("postgresql://localhost/contacts"), "postgres");
        assert_eq!(backend_name("mysql://localhost/contacts"), "unknown");
    }
}
