use std::time::Duration;

use deadpool_postgres::{Config as PgConfig, Pool, PoolConfig, Runtime};
use tokio_postgres::NoTls;

use crate::error::CatalogDbError;

const DEFAULT_PORT: u16 = 5432;
const DEFAULT_POOL_SIZE: usize = 10;

/// Connection and behavior settings, normally read from the environment.
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub pg: PgConfig,
    pub pool_size: usize,
    /// How long a checkout may wait for a free connection; `None` waits forever.
    pub pool_timeout: Option<Duration>,
    /// Run the bootstrap DDL the first time the process connects.
    pub auto_bootstrap: bool,
    /// Default for `?` -> `$N` translation when a call doesn't override it.
    pub translate_placeholders: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            pg: PgConfig::new(),
            pool_size: DEFAULT_POOL_SIZE,
            pool_timeout: None,
            auto_bootstrap: true,
            translate_placeholders: true,
        }
    }
}

impl DatabaseSettings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    /// Returns `CatalogDbError::ConfigError` if a numeric variable doesn't parse or required
    /// connection fields are missing.
    pub fn from_env() -> Result<Self, CatalogDbError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    ///
    /// `DATABASE_URL` wins over the discrete `PG*` variables. Empty values count as unset.
    ///
    /// # Errors
    /// Returns `CatalogDbError::ConfigError` if a numeric variable doesn't parse or required
    /// connection fields are missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CatalogDbError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut pg = PgConfig::new();
        if let Some(url) = get("DATABASE_URL") {
            pg.url = Some(url);
        } else {
            pg.host = get("PGHOST");
            pg.port = Some(match get("PGPORT") {
                Some(raw) => parse_number::<u16>("PGPORT", &raw)?,
                None => DEFAULT_PORT,
            });
            pg.user = get("PGUSER");
            pg.password = get("PGPASSWORD");
            pg.dbname = get("PGDATABASE");
        }

        let pool_size = match get("DB_POOL_SIZE") {
            Some(raw) => parse_number::<usize>("DB_POOL_SIZE", &raw)?,
            None => DEFAULT_POOL_SIZE,
        };
        if pool_size == 0 {
            return Err(CatalogDbError::ConfigError(
                "DB_POOL_SIZE must be at least 1".to_string(),
            ));
        }
        let pool_timeout = get("DB_POOL_TIMEOUT_SECS")
            .map(|raw| parse_number::<u64>("DB_POOL_TIMEOUT_SECS", &raw))
            .transpose()?
            .map(Duration::from_secs);

        let settings = Self {
            pg,
            pool_size,
            pool_timeout,
            auto_bootstrap: parse_flag(get("DB_AUTO_BOOTSTRAP").as_deref(), true),
            translate_placeholders: parse_flag(get("DB_TRANSLATE").as_deref(), true),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Check that a pool can be built from these settings.
    ///
    /// # Errors
    /// Returns `CatalogDbError::ConfigError` naming the first missing field.
    pub fn validate(&self) -> Result<(), CatalogDbError> {
        if self.pg.url.is_some() {
            return Ok(());
        }

        if self.pg.host.is_none() {
            return Err(CatalogDbError::ConfigError(
                "host is required (set DATABASE_URL or PGHOST)".to_string(),
            ));
        }
        if self.pg.user.is_none() {
            return Err(CatalogDbError::ConfigError(
                "user is required (set DATABASE_URL or PGUSER)".to_string(),
            ));
        }
        if self.pg.dbname.is_none() {
            return Err(CatalogDbError::ConfigError(
                "dbname is required (set DATABASE_URL or PGDATABASE)".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the deadpool pool. No connection is opened until the first checkout.
    ///
    /// # Errors
    /// Returns `CatalogDbError::ConfigError` for invalid settings or
    /// `CatalogDbError::ConnectionError` if pool creation fails.
    pub fn create_pool(&self) -> Result<Pool, CatalogDbError> {
        self.validate()?;

        let mut pool_config = PoolConfig::new(self.pool_size);
        pool_config.timeouts.wait = self.pool_timeout;

        let mut pg = self.pg.clone();
        pg.pool = Some(pool_config);
        pg.create_pool(Some(Runtime::Tokio1), NoTls).map_err(|e| {
            CatalogDbError::ConnectionError(format!("Failed to create Postgres pool: {e}"))
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, CatalogDbError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| CatalogDbError::ConfigError(format!("{key} is not a valid number: {raw:?}")))
}

/// `0`, `false`, `no` and `off` (any case) turn a flag off; anything else turns it on.
fn parse_flag(raw: Option<&str>, default: bool) -> bool {
    match raw {
        None => default,
        Some(value) => !matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn discrete_variables_with_defaults() {
        let settings = DatabaseSettings::from_lookup(lookup(&[
            ("PGHOST", "db.internal"),
            ("PGUSER", "library"),
            ("PGPASSWORD", "secret"),
            ("PGDATABASE", "catalog"),
        ]))
        .unwrap();
        assert_eq!(settings.pg.host.as_deref(), Some("db.internal"));
        assert_eq!(settings.pg.port, Some(5432));
        assert_eq!(settings.pg.dbname.as_deref(), Some("catalog"));
        assert_eq!(settings.pool_size, 10);
        assert_eq!(settings.pool_timeout, None);
        assert!(settings.auto_bootstrap);
        assert!(settings.translate_placeholders);
    }

    #[test]
    fn database_url_takes_precedence() {
        let settings = DatabaseSettings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://u:p@localhost/catalog"),
            ("PGHOST", "ignored"),
        ]))
        .unwrap();
        assert_eq!(
            settings.pg.url.as_deref(),
            Some("postgres://u:p@localhost/catalog")
        );
        assert_eq!(settings.pg.host, None);
    }

    #[test]
    fn missing_fields_are_config_errors() {
        let err = DatabaseSettings::from_lookup(lookup(&[("PGHOST", "h"), ("PGUSER", "u")]))
            .unwrap_err();
        assert!(matches!(err, CatalogDbError::ConfigError(ref m) if m.contains("dbname")));

        let err = DatabaseSettings::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, CatalogDbError::ConfigError(ref m) if m.contains("host")));
    }

    #[test]
    fn pool_and_flag_variables() {
        let settings = DatabaseSettings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/catalog"),
            ("DB_POOL_SIZE", "4"),
            ("DB_POOL_TIMEOUT_SECS", "3"),
            ("DB_AUTO_BOOTSTRAP", "Off"),
            ("DB_TRANSLATE", "0"),
        ]))
        .unwrap();
        assert_eq!(settings.pool_size, 4);
        assert_eq!(settings.pool_timeout, Some(Duration::from_secs(3)));
        assert!(!settings.auto_bootstrap);
        assert!(!settings.translate_placeholders);
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = DatabaseSettings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/catalog"),
            ("DB_POOL_SIZE", "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, CatalogDbError::ConfigError(ref m) if m.contains("DB_POOL_SIZE")));

        let err = DatabaseSettings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/catalog"),
            ("DB_POOL_SIZE", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, CatalogDbError::ConfigError(_)));
    }

    #[test]
    fn flag_parsing() {
        assert!(parse_flag(None, true));
        assert!(!parse_flag(None, false));
        assert!(parse_flag(Some("1"), false));
        assert!(parse_flag(Some("yes"), false));
        for off in ["0", "false", "NO", " off "] {
            assert!(!parse_flag(Some(off), true), "{off}");
        }
    }

    #[tokio::test]
    async fn pool_is_built_lazily() {
        let settings = DatabaseSettings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://nobody@127.0.0.1:1/none"),
            ("DB_POOL_SIZE", "2"),
        ]))
        .unwrap();
        let pool = settings.create_pool().unwrap();
        assert_eq!(pool.status().max_size, 2);
    }
}
