use core_config::{AppInfo, FromEnv, app_info, env_optional, env_parse, server::ServerConfig};

// Import database configs from the database library
use database::postgres::PostgresConfig;

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub environment: Environment,
    /// Present only when `DATABASE_URL` is set
    pub database: Option<PostgresConfig>,
    pub run_migrations: bool,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // Uses defaults: HOST=0.0.0.0, PORT=8080

        // Optional - falls back to in-memory storage when unset
        let database = match env_optional("DATABASE_URL") {
            Some(_) => Some(PostgresConfig::from_env()?),
            None => None,
        };
        let run_migrations = env_parse("DATABASE_RUN_MIGRATIONS", true)?;

        Ok(Self {
            app: app_info!(),
            server,
            environment,
            database,
            run_migrations,
        })
    }
}
