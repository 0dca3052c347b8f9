//! Config module contains the app settings: `config/base.toml` overlaid by
//! `config/<environment>.toml`, overlaid by the deployment environment
//! variables (`POSTGRES_*`, `REDIS_*`, `SECRET_KEY`, ...).

use std::env;

use config_crate::{Config as RawConfig, ConfigError, File};

/// Env vars recognized on top of the config files, mapped onto config keys.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("POSTGRES_SERVER", "postgres.server"),
    ("POSTGRES_PORT", "postgres.port"),
    ("POSTGRES_DB", "postgres.db"),
    ("POSTGRES_USER", "postgres.user"),
    ("POSTGRES_PASSWORD", "postgres.password"),
    ("REDIS_HOST", "redis.host"),
    ("REDIS_PORT", "redis.port"),
    ("REDIS_DB", "redis.db"),
    ("SECRET_KEY", "app.secret_key"),
    ("ENVIRONMENT", "app.environment"),
    ("DEBUG", "app.debug"),
    ("CORS_ORIGINS", "app.cors_origins"),
    ("UPLOAD_DIR", "app.upload_dir"),
    ("MAX_UPLOAD_SIZE", "app.max_upload_size"),
    ("SENTRY_DSN", "sentry.dsn"),
];

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: Server,
    pub postgres: Postgres,
    pub redis: Redis,
    pub app: App,
    pub sentry: Option<Sentry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Server {
    pub host: String,
    pub port: String,
    pub thread_count: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Postgres {
    pub server: String,
    pub port: u16,
    pub db: String,
    pub user: String,
    pub password: String,
}

impl Postgres {
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.server, self.port, self.db
        )
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Redis {
    pub host: String,
    pub port: u16,
    pub db: i64,
}

impl Redis {
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct App {
    pub environment: String,
    pub debug: bool,
    pub secret_key: String,
    /// Comma-separated origin list.
    pub cors_origins: String,
    pub upload_dir: String,
    pub max_upload_size: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Sentry {
    pub dsn: String,
}

impl Config {
    /// Creates config from `config/base.toml`, overwritten by
    /// `config/<env>.toml` where env comes from `ENVIRONMENT`, overwritten by
    /// the env vars of the deployment contract.
    pub fn new() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        Config::with_env(environment)
    }

    pub fn with_env(environment: impl Into<String>) -> Result<Self, ConfigError> {
        let mut s = RawConfig::new();

        s.merge(File::with_name("config/base"))?;
        s.merge(File::with_name(&format!("config/{}", environment.into())).required(false))?;
        for &(var, key) in ENV_OVERRIDES {
            if let Ok(value) = env::var(var) {
                s.set(key, value)?;
            }
        }
        s.try_into()
    }
}
