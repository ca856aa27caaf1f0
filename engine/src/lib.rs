//! Distribution Ledger Platform - Settlement Engine
//!
//! Stock batch lifecycle and commission settlement for a multi-tier
//! distribution business (distributors, agents, sub-agents, salesmen,
//! shops). Movements are recorded in atomic batches; price and commission
//! computation is deferred to an explicit settlement step that chains each
//! metric's settled movements into a running balance and distributes the
//! net proceeds across the commission hierarchy.

use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

pub mod config;
pub mod error;
pub mod services;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, AppResult};

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Connect a pool using the database section of the configuration.
pub async fn connect(config: &Config) -> Result<sqlx::PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await
}
