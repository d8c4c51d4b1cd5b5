//! Throwaway Postgres servers for live tests, via `postgresql_embedded`.

use postgresql_embedded::PostgreSQL;

use crate::error::CatalogDbError;
use crate::facade::Database;
use crate::postgres::DatabaseSettings;

/// A running embedded `PostgreSQL` instance.
pub struct EmbeddedPostgres {
    pub postgresql: PostgreSQL,
    pub port: u16,
    pub database_url: String,
    pub settings: DatabaseSettings,
}

impl EmbeddedPostgres {
    /// A database handle on this server, without auto-bootstrap.
    ///
    /// # Errors
    /// Returns the pool construction error.
    pub fn database(&self) -> Result<Database, CatalogDbError> {
        Database::connect(&self.settings)
    }

    /// Stop the server and delete its data directory.
    pub async fn stop(self) {
        let _ = self.postgresql.stop().await;
    }
}

/// Download (or reuse the bundled) binaries, start a server and create `db_name`.
///
/// # Errors
/// Returns an error if the server cannot be set up or started, the database cannot be
/// created, or the post-start connectivity check fails.
pub async fn setup_postgres_embedded(
    db_name: &str,
) -> Result<EmbeddedPostgres, Box<dyn std::error::Error>> {
    let mut postgresql = PostgreSQL::default();
    postgresql.setup().await?;
    postgresql.start().await?;
    postgresql.create_database(db_name).await?;

    let port = postgresql.settings().port;
    let host = postgresql.settings().host.clone();
    let user = postgresql.settings().username.clone();
    let password = postgresql.settings().password.clone();
    let database_url = format!("postgres://{user}:{password}@{host}:{port}/{db_name}");

    let mut settings = DatabaseSettings {
        pool_size: 4,
        auto_bootstrap: false,
        ..DatabaseSettings::default()
    };
    settings.pg.url = Some(database_url.clone());

    // quick connectivity check
    let pool = settings.create_pool()?;
    pool.get().await?.execute("SELECT 1", &[]).await?;
    tracing::info!(port, "embedded postgres started");

    Ok(EmbeddedPostgres {
        postgresql,
        port,
        database_url,
        settings,
    })
}
