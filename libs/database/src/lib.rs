//! PostgreSQL connectivity shared by the lineage services.
//!
//! # Features
//!
//! - Connection pool configuration loaded through `core_config::FromEnv`
//! - Connect with exponential backoff, for databases that come up after the app
//! - Migration runner generic over any `MigratorTrait`
//! - `SELECT 1` health check for readiness endpoints
//!
//! # Example
//!
//! ```ignore
//! use core_config::FromEnv;
//! use database::postgres::{self, PostgresConfig};
//! use migration::Migrator;
//!
//! let config = PostgresConfig::from_env()?;
//! let db = postgres::connect_from_config_with_retry(config, None).await?;
//! postgres::run_migrations::<Migrator>(&db, "lineage_api").await?;
//! ```

pub mod error;
pub mod postgres;
pub mod retry;

pub use error::{DatabaseError, DatabaseResult};
pub use retry::{RetryConfig, retry, retry_with_backoff};
